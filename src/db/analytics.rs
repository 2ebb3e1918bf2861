//! Reporting queries. SQL does the grouping and counting; calendar bucketing
//! is delegated to [`crate::analytics`].

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use super::activity::recent_board_activity;
use super::boards::board_by_id;
use super::cards::{card_from_row, CARD_COLUMNS};
use super::sprints::{sprint_by_id, sprints_for_board};
use super::{
    date_string, parse_date, parse_datetime, parse_uuid, require_date, Database, StoreError,
};
use crate::analytics::{self, CardFacts, MemberFacts, Period, SprintCard, TimeFacts};
use crate::models::*;

const DASHBOARD_WEEKS: u32 = 4;
const DASHBOARD_ACTIVITY: u32 = 10;
const DUE_SOON_DAYS: i64 = 7;

fn status_counts(conn: &Connection, board_id: Uuid) -> Result<Vec<StatusCount>> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*), COALESCE(SUM(story_points), 0) FROM cards
         WHERE board_id = ? AND archived = 0 GROUP BY status",
    )?;
    let rows: HashMap<String, (i64, i64)> = stmt
        .query_map([board_id.to_string()], |row| {
            Ok((row.get(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<Result<_, _>>()?;

    Ok(CardStatus::ALL
        .iter()
        .map(|&status| {
            let (count, story_points) = rows.get(status.as_str()).copied().unwrap_or_default();
            StatusCount {
                status,
                count,
                story_points,
            }
        })
        .collect())
}

fn priority_counts(conn: &Connection, board_id: Uuid) -> Result<Vec<PriorityCount>> {
    let mut stmt = conn.prepare(
        "SELECT priority, COUNT(*), COALESCE(SUM(story_points), 0) FROM cards
         WHERE board_id = ? AND archived = 0 GROUP BY priority",
    )?;
    let rows: HashMap<String, (i64, i64)> = stmt
        .query_map([board_id.to_string()], |row| {
            Ok((row.get(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<Result<_, _>>()?;

    Ok(CardPriority::ALL
        .iter()
        .map(|&priority| {
            let (count, story_points) = rows.get(priority.as_str()).copied().unwrap_or_default();
            PriorityCount {
                priority,
                count,
                story_points,
            }
        })
        .collect())
}

fn board_stats(conn: &Connection, board_id: Uuid, as_of: NaiveDate) -> Result<BoardStats> {
    let (total_cards, completed_cards, overdue_cards, total_story_points, completed_story_points): (
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'done'), 0),
                COALESCE(SUM(due_date IS NOT NULL AND due_date < ?2 AND status != 'done'), 0),
                COALESCE(SUM(story_points), 0),
                COALESCE(SUM(CASE WHEN status = 'done' THEN story_points END), 0)
         FROM cards WHERE board_id = ?1 AND archived = 0",
        (board_id.to_string(), date_string(as_of)),
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        },
    )?;

    let (checklist_total, checklist_completed): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(i.is_completed), 0)
         FROM checklist_items i JOIN cards c ON c.id = i.card_id
         WHERE c.board_id = ? AND c.archived = 0",
        [board_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let minutes_logged: i64 = conn.query_row(
        "SELECT COALESCE(SUM(t.minutes), 0)
         FROM time_logs t JOIN cards c ON c.id = t.card_id
         WHERE c.board_id = ? AND c.archived = 0",
        [board_id.to_string()],
        |row| row.get(0),
    )?;

    let completion_rate = if total_cards == 0 {
        0.0
    } else {
        completed_cards as f64 / total_cards as f64
    };

    Ok(BoardStats {
        board_id,
        as_of,
        total_cards,
        completed_cards,
        overdue_cards,
        completion_rate,
        total_story_points,
        completed_story_points,
        by_status: status_counts(conn, board_id)?,
        by_priority: priority_counts(conn, board_id)?,
        checklist_total,
        checklist_completed,
        minutes_logged,
    })
}

fn card_facts(conn: &Connection, board_id: Uuid) -> Result<Vec<CardFacts>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, completed_at, COALESCE(story_points, 0) FROM cards
         WHERE board_id = ? AND archived = 0",
    )?;
    let facts = stmt
        .query_map([board_id.to_string()], |row| {
            Ok(CardFacts {
                created_on: parse_datetime(row.get(0)?).date_naive(),
                completed_on: row
                    .get::<_, Option<String>>(1)?
                    .map(|s| parse_datetime(s).date_naive()),
                story_points: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(facts)
}

fn time_facts(conn: &Connection, board_id: Uuid) -> Result<Vec<TimeFacts>> {
    let mut stmt = conn.prepare(
        "SELECT t.logged_on, t.minutes FROM time_logs t JOIN cards c ON c.id = t.card_id
         WHERE c.board_id = ? AND c.archived = 0",
    )?;
    let facts = stmt
        .query_map([board_id.to_string()], |row| {
            Ok(TimeFacts {
                logged_on: parse_date(row.get(0)?),
                minutes: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(facts)
}

fn sprint_cards(conn: &Connection, sprint_id: Uuid) -> Result<Vec<SprintCard>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(story_points, 0), completed_at FROM cards
         WHERE sprint_id = ? AND archived = 0",
    )?;
    let cards = stmt
        .query_map([sprint_id.to_string()], |row| {
            Ok(SprintCard {
                story_points: row.get(0)?,
                completed_on: row
                    .get::<_, Option<String>>(1)?
                    .map(|s| parse_datetime(s).date_naive()),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cards)
}

fn rollup(conn: &Connection, board_id: Uuid, periods: &[analytics::Period]) -> Result<Vec<RollupBucket>> {
    let cards = card_facts(conn, board_id)?;
    let time = time_facts(conn, board_id)?;
    Ok(analytics::rollup(periods, &cards, &time))
}

fn burndown(conn: &Connection, sprint: &Sprint, as_of: NaiveDate) -> Result<Burndown> {
    let cards = sprint_cards(conn, sprint.id)?;
    Ok(analytics::burndown(sprint, &cards, as_of))
}

/// Board members, assignees and time loggers, with their completions and
/// logged time on this board.
fn member_facts(conn: &Connection, board_id: Uuid) -> Result<Vec<MemberFacts>> {
    let mut facts: HashMap<Uuid, MemberFacts> = HashMap::new();

    let mut stmt = conn.prepare(
        "SELECT u.id, u.name FROM users u WHERE u.id IN (
            SELECT user_id FROM board_members WHERE board_id = ?1
            UNION
            SELECT a.user_id FROM card_assignees a JOIN cards c ON c.id = a.card_id WHERE c.board_id = ?1
            UNION
            SELECT t.user_id FROM time_logs t JOIN cards c ON c.id = t.card_id WHERE c.board_id = ?1
         )",
    )?;
    let users = stmt
        .query_map([board_id.to_string()], |row| {
            Ok((parse_uuid(row.get(0)?), row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (user_id, name) in users {
        facts.insert(
            user_id,
            MemberFacts {
                user_id,
                name,
                completions: Vec::new(),
                time: Vec::new(),
            },
        );
    }

    let mut stmt = conn.prepare(
        "SELECT a.user_id, c.completed_at, COALESCE(c.story_points, 0)
         FROM card_assignees a JOIN cards c ON c.id = a.card_id
         WHERE c.board_id = ? AND c.archived = 0 AND c.completed_at IS NOT NULL",
    )?;
    let completions = stmt
        .query_map([board_id.to_string()], |row| {
            Ok((
                parse_uuid(row.get(0)?),
                parse_datetime(row.get(1)?).date_naive(),
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (user_id, day, points) in completions {
        if let Some(member) = facts.get_mut(&user_id) {
            member.completions.push((day, points));
        }
    }

    let mut stmt = conn.prepare(
        "SELECT t.user_id, t.logged_on, t.minutes
         FROM time_logs t JOIN cards c ON c.id = t.card_id
         WHERE c.board_id = ? AND c.archived = 0",
    )?;
    let logs = stmt
        .query_map([board_id.to_string()], |row| {
            Ok((
                parse_uuid(row.get(0)?),
                TimeFacts {
                    logged_on: parse_date(row.get(1)?),
                    minutes: row.get(2)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (user_id, log) in logs {
        if let Some(member) = facts.get_mut(&user_id) {
            member.time.push(log);
        }
    }

    Ok(facts.into_values().collect())
}

fn periods_or_invalid(periods: Option<Vec<Period>>) -> Result<Vec<Period>> {
    periods.ok_or_else(|| {
        StoreError::Invalid("Reporting window falls outside the supported calendar".to_string())
            .into()
    })
}

fn due_soon(conn: &Connection, board_id: Uuid, as_of: NaiveDate) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards c
         WHERE c.board_id = ? AND c.archived = 0 AND c.status != 'done'
           AND c.due_date IS NOT NULL AND c.due_date >= ? AND c.due_date <= ?
         ORDER BY c.due_date, c.position",
        CARD_COLUMNS
    ))?;
    let horizon = as_of
        .checked_add_signed(Duration::days(DUE_SOON_DAYS))
        .filter(|day| day.year() <= 9999)
        .map(date_string)
        .unwrap_or_else(|| "9999-12-31".to_string());
    let cards = stmt
        .query_map(
            (
                board_id.to_string(),
                date_string(as_of),
                horizon,
            ),
            card_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cards)
}

impl Database {
    pub fn stats_by_status(&self, board_id: Uuid) -> Result<Option<Vec<StatusCount>>> {
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }
        status_counts(&conn, board_id).map(Some)
    }

    pub fn stats_by_priority(&self, board_id: Uuid) -> Result<Option<Vec<PriorityCount>>> {
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }
        priority_counts(&conn, board_id).map(Some)
    }

    pub fn board_stats(&self, board_id: Uuid, as_of: NaiveDate) -> Result<Option<BoardStats>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }
        board_stats(&conn, board_id, as_of).map(Some)
    }

    /// Created/completed cards and logged minutes per Monday-start week.
    pub fn weekly_rollup(
        &self,
        board_id: Uuid,
        weeks: u32,
        as_of: NaiveDate,
    ) -> Result<Option<Vec<RollupBucket>>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }
        let periods = periods_or_invalid(analytics::week_periods(as_of, weeks))?;
        rollup(&conn, board_id, &periods).map(Some)
    }

    /// Created/completed cards and logged minutes per calendar month.
    pub fn monthly_rollup(
        &self,
        board_id: Uuid,
        months: u32,
        as_of: NaiveDate,
    ) -> Result<Option<Vec<RollupBucket>>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }
        let periods = periods_or_invalid(analytics::month_periods(as_of, months))?;
        rollup(&conn, board_id, &periods).map(Some)
    }

    pub fn burndown(&self, sprint_id: Uuid, as_of: NaiveDate) -> Result<Option<Burndown>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        let Some(sprint) = sprint_by_id(&conn, sprint_id)? else {
            return Ok(None);
        };
        burndown(&conn, &sprint, as_of).map(Some)
    }

    /// Velocity over the `count` most recent finished sprints: those marked
    /// completed or whose end date is before `as_of`.
    pub fn velocity(
        &self,
        board_id: Uuid,
        count: u32,
        as_of: NaiveDate,
    ) -> Result<Option<VelocityReport>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }

        let mut finished: Vec<Sprint> = sprints_for_board(&conn, board_id)?
            .into_iter()
            .filter(|s| s.status == SprintStatus::Completed || s.end_date < as_of)
            .collect();
        finished.sort_by_key(|s| (s.end_date, s.start_date));
        let skip = finished.len().saturating_sub(count as usize);

        let sprints = finished
            .iter()
            .skip(skip)
            .map(|sprint| {
                let cards = sprint_cards(&conn, sprint.id)?;
                Ok(analytics::sprint_velocity(sprint, &cards))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(VelocityReport {
            board_id,
            average_points: analytics::average_points(&sprints),
            sprints,
        }))
    }

    pub fn productivity(
        &self,
        board_id: Uuid,
        weeks: u32,
        as_of: NaiveDate,
    ) -> Result<Option<ProductivityReport>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        if board_by_id(&conn, board_id)?.is_none() {
            return Ok(None);
        }

        let periods = periods_or_invalid(analytics::week_periods(as_of, weeks))?;
        let members = analytics::productivity(&periods, member_facts(&conn, board_id)?);
        let (period_start, period_end) = match (periods.first(), periods.last()) {
            (Some(first), Some(last)) => (first.0, last.1),
            _ => (as_of, as_of),
        };

        Ok(Some(ProductivityReport {
            board_id,
            period_start,
            period_end,
            members,
        }))
    }

    pub fn dashboard(&self, board_id: Uuid, as_of: NaiveDate) -> Result<Option<Dashboard>> {
        require_date(as_of, "As-of date")?;
        let conn = self.lock()?;
        let Some(board) = board_by_id(&conn, board_id)? else {
            return Ok(None);
        };

        let stats = board_stats(&conn, board_id, as_of)?;
        let weeks = periods_or_invalid(analytics::week_periods(as_of, DASHBOARD_WEEKS))?;
        let weekly = rollup(&conn, board_id, &weeks)?;
        let active_sprint = sprints_for_board(&conn, board_id)?
            .into_iter()
            .filter(|s| s.status == SprintStatus::Active)
            .max_by_key(|s| s.start_date)
            .map(|sprint| burndown(&conn, &sprint, as_of))
            .transpose()?;

        Ok(Some(Dashboard {
            board,
            stats,
            weekly,
            active_sprint,
            recent_activity: recent_board_activity(&conn, board_id, DASHBOARD_ACTIVITY)?,
            due_soon: due_soon(&conn, board_id, as_of)?,
        }))
    }
}
