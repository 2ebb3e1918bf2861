use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sub-task on a card.
///
/// Items are ordered by `position` (contiguous from 0 within a card).
/// `completed_at` is set when the item is ticked and cleared when it is reopened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub card_id: Uuid,
    pub content: String,
    pub is_completed: bool,
    pub position: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding an item to the end of a card's checklist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateChecklistItemInput {
    pub content: String,
}

/// Input for editing or ticking a checklist item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChecklistItemInput {
    pub content: Option<String>,
    pub is_completed: Option<bool>,
}
