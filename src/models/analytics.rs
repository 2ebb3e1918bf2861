use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Board, Card, CardActivity, CardPriority, CardStatus};

/// Card count and story point total for one status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: CardStatus,
    pub count: i64,
    pub story_points: i64,
}

/// Card count and story point total for one priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityCount {
    pub priority: CardPriority,
    pub count: i64,
    pub story_points: i64,
}

/// Headline numbers for a board. Archived cards are excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardStats {
    pub board_id: Uuid,
    pub as_of: NaiveDate,
    pub total_cards: i64,
    pub completed_cards: i64,
    /// Cards past their due date that are not done.
    pub overdue_cards: i64,
    /// `completed_cards / total_cards`, or 0 for an empty board.
    pub completion_rate: f64,
    pub total_story_points: i64,
    pub completed_story_points: i64,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub checklist_total: i64,
    pub checklist_completed: i64,
    pub minutes_logged: i64,
}

/// One time bucket of a weekly or monthly rollup. Both bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollupBucket {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub created: i64,
    pub completed: i64,
    pub points_completed: i64,
    pub minutes_logged: i64,
}

/// Window parameters shared by the analytics endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    /// Reference day; defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
    /// Number of weeks for weekly rollups and productivity.
    pub weeks: Option<u32>,
    /// Number of months for monthly rollups.
    pub months: Option<u32>,
    /// Number of finished sprints for velocity.
    pub sprints: Option<u32>,
}

impl AnalyticsQuery {
    pub fn as_of_or_today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// One day of a sprint burndown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BurndownPoint {
    pub date: NaiveDate,
    pub ideal_points: f64,
    /// `None` for days after `as_of`.
    pub remaining_points: Option<i64>,
    pub remaining_cards: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Burndown {
    pub sprint_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_points: i64,
    pub total_cards: i64,
    pub days: Vec<BurndownPoint>,
}

/// Committed versus delivered work for one finished sprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SprintVelocity {
    pub sprint_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub committed_points: i64,
    pub completed_points: i64,
    pub completed_cards: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityReport {
    pub board_id: Uuid,
    /// Oldest sprint first.
    pub sprints: Vec<SprintVelocity>,
    pub average_points: f64,
}

/// Completed cards for one Monday-start week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyCount {
    pub week_start: NaiveDate,
    pub completed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProductivity {
    pub user_id: Uuid,
    pub name: String,
    pub cards_completed: i64,
    pub points_completed: i64,
    pub minutes_logged: i64,
    pub weekly: Vec<WeeklyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductivityReport {
    pub board_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub members: Vec<MemberProductivity>,
}

/// Everything the board dashboard renders in one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub board: Board,
    pub stats: BoardStats,
    pub weekly: Vec<RollupBucket>,
    pub active_sprint: Option<Burndown>,
    pub recent_activity: Vec<CardActivity>,
    /// Cards due within the next seven days that are not done, soonest first.
    pub due_soon: Vec<Card>,
}
