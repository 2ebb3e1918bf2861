use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An append-only audit entry recording a mutation of a card.
///
/// Entries are written in the same transaction as the mutation they describe
/// and are never updated or deleted individually. They outlive the card they
/// refer to; only deleting the whole board removes them.
///
/// `details` carries action-specific context, e.g. `{"from_list": ..., "to_list": ...}`
/// for [`ActivityAction::Moved`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardActivity {
    pub id: Uuid,
    pub card_id: Uuid,
    pub board_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: ActivityAction,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Moved,
    StatusChanged,
    PriorityChanged,
    AssigneeAdded,
    AssigneeRemoved,
    LabelAdded,
    LabelRemoved,
    ChecklistItemAdded,
    ChecklistItemCompleted,
    ChecklistItemReopened,
    ChecklistReordered,
    CommentAdded,
    TimeLogged,
    SprintChanged,
    Archived,
    Deleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Moved => "moved",
            Self::StatusChanged => "status_changed",
            Self::PriorityChanged => "priority_changed",
            Self::AssigneeAdded => "assignee_added",
            Self::AssigneeRemoved => "assignee_removed",
            Self::LabelAdded => "label_added",
            Self::LabelRemoved => "label_removed",
            Self::ChecklistItemAdded => "checklist_item_added",
            Self::ChecklistItemCompleted => "checklist_item_completed",
            Self::ChecklistItemReopened => "checklist_item_reopened",
            Self::ChecklistReordered => "checklist_reordered",
            Self::CommentAdded => "comment_added",
            Self::TimeLogged => "time_logged",
            Self::SprintChanged => "sprint_changed",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "created" => Self::Created,
            "updated" => Self::Updated,
            "moved" => Self::Moved,
            "status_changed" => Self::StatusChanged,
            "priority_changed" => Self::PriorityChanged,
            "assignee_added" => Self::AssigneeAdded,
            "assignee_removed" => Self::AssigneeRemoved,
            "label_added" => Self::LabelAdded,
            "label_removed" => Self::LabelRemoved,
            "checklist_item_added" => Self::ChecklistItemAdded,
            "checklist_item_completed" => Self::ChecklistItemCompleted,
            "checklist_item_reopened" => Self::ChecklistItemReopened,
            "checklist_reordered" => Self::ChecklistReordered,
            "comment_added" => Self::CommentAdded,
            "time_logged" => Self::TimeLogged,
            "sprint_changed" => Self::SprintChanged,
            "archived" => Self::Archived,
            "deleted" => Self::Deleted,
            other => return Err(format!("unknown activity action '{}'", other)),
        };
        Ok(action)
    }
}

/// Pagination for activity feeds. Newest entries come first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityQuery {
    /// Defaults to 50, capped at 200.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
