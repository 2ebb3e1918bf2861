use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time a user spent on a card on a given day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: Uuid,
    pub card_id: Uuid,
    pub user_id: Uuid,
    pub minutes: i64,
    pub note: Option<String>,
    pub logged_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for logging time. `logged_on` defaults to today (UTC).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTimeLogInput {
    pub user_id: Uuid,
    pub minutes: i64,
    pub note: Option<String>,
    pub logged_on: Option<NaiveDate>,
}
