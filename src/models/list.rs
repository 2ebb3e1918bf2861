use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{nullable, Card};

/// An ordered column on a board.
///
/// Positions are contiguous from 0 within a board. `wip_limit`, when set,
/// caps how many non-archived cards can be moved into the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardList {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    pub position: i64,
    pub wip_limit: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a list. New lists are appended after the last one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateListInput {
    pub name: String,
    pub wip_limit: Option<i64>,
}

/// Input for updating a list. Send `"wip_limit": null` to remove the limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateListInput {
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub wip_limit: Option<Option<i64>>,
}

/// A complete ordering for a set of siblings (lists on a board, checklist
/// items on a card). Must name every sibling exactly once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderInput {
    pub ids: Vec<Uuid>,
}

/// A list with its cards in position order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: BoardList,
    pub cards: Vec<Card>,
}
