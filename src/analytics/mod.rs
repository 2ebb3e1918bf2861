//! Date bucketing and aggregation arithmetic behind the reporting endpoints.
//!
//! Nothing here touches the database. The storage layer pulls the relevant
//! facts (creation/completion days, story points, logged minutes) with plain
//! queries and hands them to these functions, which keeps the calendar math
//! testable with fixed dates.

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::models::{
    Burndown, BurndownPoint, MemberProductivity, RollupBucket, Sprint, SprintVelocity,
    WeeklyCount,
};

/// An inclusive date range.
pub type Period = (NaiveDate, NaiveDate);

/// The lifecycle of a card, reduced to what the rollups need.
#[derive(Debug, Clone)]
pub struct CardFacts {
    pub created_on: NaiveDate,
    pub completed_on: Option<NaiveDate>,
    pub story_points: i64,
}

#[derive(Debug, Clone)]
pub struct TimeFacts {
    pub logged_on: NaiveDate,
    pub minutes: i64,
}

/// A card committed to a sprint.
#[derive(Debug, Clone)]
pub struct SprintCard {
    pub story_points: i64,
    pub completed_on: Option<NaiveDate>,
}

/// Everything one user did on a board, before windowing.
#[derive(Debug, Clone)]
pub struct MemberFacts {
    pub user_id: Uuid,
    pub name: String,
    /// Completion day and story points of each card assigned to the user.
    pub completions: Vec<(NaiveDate, i64)>,
    pub time: Vec<TimeFacts>,
}

/// Resolve an optional window size to `1..=max`, falling back to `default`.
pub fn window(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, max)
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_signed(Duration::days(i64::from(
        day.weekday().num_days_from_monday(),
    )))
}

/// First day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_signed(Duration::days(i64::from(day.day0())))
}

fn next_month_start(day: NaiveDate) -> Option<NaiveDate> {
    // Day 32 past the first of any month always lands in the next month.
    month_start(month_start(day)?.checked_add_signed(Duration::days(32))?)
}

/// `weeks` consecutive Monday-start weeks, oldest first, ending with the week
/// that contains `as_of`. `None` when a period falls outside the calendar.
pub fn week_periods(as_of: NaiveDate, weeks: u32) -> Option<Vec<Period>> {
    let last = week_start(as_of)?;
    (0..i64::from(weeks))
        .rev()
        .map(|back| {
            let start = last.checked_sub_signed(Duration::weeks(back))?;
            Some((start, start.checked_add_signed(Duration::days(6))?))
        })
        .collect()
}

/// `months` consecutive calendar months, oldest first, ending with the month
/// that contains `as_of`.
pub fn month_periods(as_of: NaiveDate, months: u32) -> Option<Vec<Period>> {
    let mut periods = Vec::with_capacity(months as usize);
    let mut start = month_start(as_of)?;
    for _ in 0..months {
        let end = next_month_start(start)?.checked_sub_signed(Duration::days(1))?;
        periods.push((start, end));
        start = month_start(start.checked_sub_signed(Duration::days(1))?)?;
    }
    periods.reverse();
    Some(periods)
}

/// Index of the period containing `day`, if any. `periods` must be sorted and
/// non-overlapping.
fn period_index(periods: &[Period], day: NaiveDate) -> Option<usize> {
    let idx = periods.partition_point(|(_, end)| *end < day);
    periods
        .get(idx)
        .filter(|(start, _)| *start <= day)
        .map(|_| idx)
}

/// Count created/completed cards and logged minutes into each period.
pub fn rollup(periods: &[Period], cards: &[CardFacts], time: &[TimeFacts]) -> Vec<RollupBucket> {
    let mut buckets: Vec<RollupBucket> = periods
        .iter()
        .map(|&(start, end)| RollupBucket {
            period_start: start,
            period_end: end,
            created: 0,
            completed: 0,
            points_completed: 0,
            minutes_logged: 0,
        })
        .collect();

    for card in cards {
        if let Some(i) = period_index(periods, card.created_on) {
            buckets[i].created += 1;
        }
        if let Some(i) = card.completed_on.and_then(|d| period_index(periods, d)) {
            buckets[i].completed += 1;
            buckets[i].points_completed += card.story_points;
        }
    }

    for log in time {
        if let Some(i) = period_index(periods, log.logged_on) {
            buckets[i].minutes_logged += log.minutes;
        }
    }

    buckets
}

/// Daily burndown for a sprint.
///
/// The ideal line falls linearly from the total to zero on the last day.
/// Actual values count cards completed on or before each day (including ones
/// finished before the sprint started) and are `None` after `as_of`.
pub fn burndown(sprint: &Sprint, cards: &[SprintCard], as_of: NaiveDate) -> Burndown {
    let total_points: i64 = cards.iter().map(|c| c.story_points).sum();
    let total_cards = cards.len() as i64;
    let span = (sprint.end_date - sprint.start_date).num_days().max(0);

    let days = (0..=span)
        .map(|offset| {
            let date = sprint.start_date + Duration::days(offset);
            let ideal_points = if span == 0 {
                0.0
            } else {
                total_points as f64 * (span - offset) as f64 / span as f64
            };

            let (remaining_points, remaining_cards) = if date > as_of {
                (None, None)
            } else {
                let done: Vec<&SprintCard> = cards
                    .iter()
                    .filter(|c| c.completed_on.is_some_and(|d| d <= date))
                    .collect();
                let done_points: i64 = done.iter().map(|c| c.story_points).sum();
                (
                    Some(total_points - done_points),
                    Some(total_cards - done.len() as i64),
                )
            };

            BurndownPoint {
                date,
                ideal_points,
                remaining_points,
                remaining_cards,
            }
        })
        .collect();

    Burndown {
        sprint_id: sprint.id,
        start_date: sprint.start_date,
        end_date: sprint.end_date,
        total_points,
        total_cards,
        days,
    }
}

/// Committed versus delivered points for a sprint. Only cards completed
/// inside the sprint window count as delivered.
pub fn sprint_velocity(sprint: &Sprint, cards: &[SprintCard]) -> SprintVelocity {
    let delivered: Vec<&SprintCard> = cards
        .iter()
        .filter(|c| {
            c.completed_on
                .is_some_and(|d| d >= sprint.start_date && d <= sprint.end_date)
        })
        .collect();

    SprintVelocity {
        sprint_id: sprint.id,
        name: sprint.name.clone(),
        start_date: sprint.start_date,
        end_date: sprint.end_date,
        committed_points: cards.iter().map(|c| c.story_points).sum(),
        completed_points: delivered.iter().map(|c| c.story_points).sum(),
        completed_cards: delivered.len() as i64,
    }
}

pub fn average_points(sprints: &[SprintVelocity]) -> f64 {
    if sprints.is_empty() {
        return 0.0;
    }
    let total: i64 = sprints.iter().map(|s| s.completed_points).sum();
    total as f64 / sprints.len() as f64
}

/// Per-member totals over `weeks`, plus a weekly completed-card series.
///
/// Sorted by cards completed (descending), then by name.
pub fn productivity(weeks: &[Period], members: Vec<MemberFacts>) -> Vec<MemberProductivity> {
    let mut out: Vec<MemberProductivity> = members
        .into_iter()
        .map(|member| {
            let mut weekly: Vec<WeeklyCount> = weeks
                .iter()
                .map(|&(start, _)| WeeklyCount {
                    week_start: start,
                    completed: 0,
                })
                .collect();
            let mut cards_completed = 0;
            let mut points_completed = 0;

            for &(day, points) in &member.completions {
                if let Some(i) = period_index(weeks, day) {
                    weekly[i].completed += 1;
                    cards_completed += 1;
                    points_completed += points;
                }
            }

            let minutes_logged = member
                .time
                .iter()
                .filter(|t| period_index(weeks, t.logged_on).is_some())
                .map(|t| t.minutes)
                .sum();

            MemberProductivity {
                user_id: member.user_id,
                name: member.name,
                cards_completed,
                points_completed,
                minutes_logged,
                weekly,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.cards_completed
            .cmp(&a.cards_completed)
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SprintStatus;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sprint(start: NaiveDate, end: NaiveDate) -> Sprint {
        Sprint {
            id: Uuid::new_v4(),
            board_id: Uuid::new_v4(),
            name: "Sprint 1".to_string(),
            goal: None,
            start_date: start,
            end_date: end,
            status: SprintStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn week_start_is_monday() {
        // 2026-10-19 is a Monday.
        assert_eq!(week_start(date(2026, 10, 19)), Some(date(2026, 10, 19)));
        assert_eq!(week_start(date(2026, 10, 25)), Some(date(2026, 10, 19)));
        assert_eq!(week_start(date(2026, 10, 18)), Some(date(2026, 10, 12)));
    }

    #[test]
    fn week_periods_end_with_current_week() {
        let periods = week_periods(date(2026, 10, 21), 3);
        assert_eq!(
            periods,
            Some(vec![
                (date(2026, 10, 5), date(2026, 10, 11)),
                (date(2026, 10, 12), date(2026, 10, 18)),
                (date(2026, 10, 19), date(2026, 10, 25)),
            ])
        );
    }

    #[test]
    fn month_periods_cross_year_boundary() {
        let periods = month_periods(date(2026, 2, 14), 3);
        assert_eq!(
            periods,
            Some(vec![
                (date(2025, 12, 1), date(2025, 12, 31)),
                (date(2026, 1, 1), date(2026, 1, 31)),
                (date(2026, 2, 1), date(2026, 2, 28)),
            ])
        );
    }

    #[test]
    fn periods_past_the_calendar_edge_are_none() {
        assert_eq!(month_periods(NaiveDate::MAX, 1), None);
        assert_eq!(month_periods(NaiveDate::MIN + Duration::days(40), 3), None);
    }

    #[test]
    fn window_clamps_and_defaults() {
        assert_eq!(window(None, 8, 52), 8);
        assert_eq!(window(Some(0), 8, 52), 1);
        assert_eq!(window(Some(400), 8, 52), 52);
    }

    #[test]
    fn rollup_buckets_created_completed_and_time() {
        let periods = week_periods(date(2026, 10, 21), 2).unwrap();
        let cards = vec![
            CardFacts {
                created_on: date(2026, 10, 13),
                completed_on: Some(date(2026, 10, 20)),
                story_points: 3,
            },
            CardFacts {
                created_on: date(2026, 10, 20),
                completed_on: None,
                story_points: 5,
            },
            // Outside the window entirely.
            CardFacts {
                created_on: date(2026, 9, 1),
                completed_on: Some(date(2026, 9, 2)),
                story_points: 8,
            },
        ];
        let time = vec![
            TimeFacts {
                logged_on: date(2026, 10, 14),
                minutes: 30,
            },
            TimeFacts {
                logged_on: date(2026, 10, 21),
                minutes: 45,
            },
        ];

        let buckets = rollup(&periods, &cards, &time);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].created, 1);
        assert_eq!(buckets[0].completed, 0);
        assert_eq!(buckets[0].minutes_logged, 30);
        assert_eq!(buckets[1].created, 1);
        assert_eq!(buckets[1].completed, 1);
        assert_eq!(buckets[1].points_completed, 3);
        assert_eq!(buckets[1].minutes_logged, 45);
    }

    #[test]
    fn burndown_tracks_remaining_and_hides_future_days() {
        let s = sprint(date(2026, 10, 19), date(2026, 10, 23));
        let cards = vec![
            SprintCard {
                story_points: 5,
                completed_on: Some(date(2026, 10, 20)),
            },
            SprintCard {
                story_points: 3,
                completed_on: None,
            },
            SprintCard {
                story_points: 2,
                completed_on: Some(date(2026, 10, 18)),
            },
        ];

        let chart = burndown(&s, &cards, date(2026, 10, 21));

        assert_eq!(chart.total_points, 10);
        assert_eq!(chart.days.len(), 5);
        assert_eq!(chart.days[0].ideal_points, 10.0);
        assert_eq!(chart.days[4].ideal_points, 0.0);
        assert_eq!(chart.days[0].remaining_points, Some(8));
        assert_eq!(chart.days[1].remaining_points, Some(3));
        assert_eq!(chart.days[1].remaining_cards, Some(1));
        assert_eq!(chart.days[2].remaining_points, Some(3));
        assert_eq!(chart.days[3].remaining_points, None);
        assert_eq!(chart.days[4].remaining_cards, None);
    }

    #[test]
    fn single_day_sprint_has_zero_ideal() {
        let s = sprint(date(2026, 10, 19), date(2026, 10, 19));
        let chart = burndown(&s, &[], date(2026, 10, 19));
        assert_eq!(chart.days.len(), 1);
        assert_eq!(chart.days[0].ideal_points, 0.0);
        assert_eq!(chart.days[0].remaining_points, Some(0));
    }

    #[test]
    fn velocity_only_counts_work_finished_inside_the_sprint() {
        let s = sprint(date(2026, 10, 5), date(2026, 10, 16));
        let cards = vec![
            SprintCard {
                story_points: 5,
                completed_on: Some(date(2026, 10, 10)),
            },
            SprintCard {
                story_points: 3,
                completed_on: Some(date(2026, 10, 17)),
            },
            SprintCard {
                story_points: 2,
                completed_on: None,
            },
        ];

        let v = sprint_velocity(&s, &cards);
        assert_eq!(v.committed_points, 10);
        assert_eq!(v.completed_points, 5);
        assert_eq!(v.completed_cards, 1);
    }

    #[test]
    fn average_of_no_sprints_is_zero() {
        assert_eq!(average_points(&[]), 0.0);
    }

    #[test]
    fn productivity_sorts_by_completed_then_name() {
        let weeks = week_periods(date(2026, 10, 21), 2).unwrap();
        let members = vec![
            MemberFacts {
                user_id: Uuid::new_v4(),
                name: "Zoe".to_string(),
                completions: vec![(date(2026, 10, 13), 2)],
                time: vec![],
            },
            MemberFacts {
                user_id: Uuid::new_v4(),
                name: "Adam".to_string(),
                completions: vec![(date(2026, 10, 20), 1)],
                time: vec![TimeFacts {
                    logged_on: date(2026, 10, 20),
                    minutes: 90,
                }],
            },
            MemberFacts {
                user_id: Uuid::new_v4(),
                name: "Mia".to_string(),
                completions: vec![(date(2026, 10, 13), 1), (date(2026, 10, 19), 5)],
                time: vec![TimeFacts {
                    logged_on: date(2026, 1, 1),
                    minutes: 60,
                }],
            },
        ];

        let report = productivity(&weeks, members);

        let names: Vec<&str> = report.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Mia", "Adam", "Zoe"]);
        assert_eq!(report[0].cards_completed, 2);
        assert_eq!(report[0].points_completed, 6);
        assert_eq!(report[0].minutes_logged, 0);
        assert_eq!(report[0].weekly[0].completed, 1);
        assert_eq!(report[0].weekly[1].completed, 1);
        assert_eq!(report[1].minutes_logged, 90);
    }
}
