//! Request and response types for MCP tools.
//!
//! Ids and dates travel as strings so agents can pass them verbatim; the
//! server parses and validates them.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{Board, BoardDetail, CardStatus};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListBoardsRequest {
    #[schemars(description = "Include archived boards. Defaults to false.")]
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetBoardRequest {
    #[schemars(description = "The UUID of the board")]
    pub board_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCardRequest {
    #[schemars(description = "The UUID of the list to append the card to")]
    pub list_id: String,
    #[schemars(description = "Short card title")]
    pub title: String,
    #[schemars(description = "Optional longer description")]
    #[serde(default)]
    pub description: Option<String>,
    #[schemars(description = "One of 'low', 'medium', 'high', 'urgent'. Defaults to 'medium'.")]
    #[serde(default)]
    pub priority: Option<String>,
    #[schemars(description = "Estimate in story points (non-negative)")]
    #[serde(default)]
    pub story_points: Option<i64>,
    #[schemars(description = "Due date as YYYY-MM-DD")]
    #[serde(default)]
    pub due_date: Option<String>,
    #[schemars(description = "UUID of the user performing the action, recorded in the activity log")]
    #[serde(default)]
    pub actor_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveCardRequest {
    #[schemars(description = "The UUID of the card to move")]
    pub card_id: String,
    #[schemars(description = "The UUID of the destination list (same board)")]
    pub list_id: String,
    #[schemars(description = "Zero-based position in the destination list. Defaults to the end.")]
    #[serde(default)]
    pub position: Option<i64>,
    #[schemars(description = "UUID of the user performing the action")]
    #[serde(default)]
    pub actor_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCardStatusRequest {
    #[schemars(description = "The UUID of the card")]
    pub card_id: String,
    #[schemars(description = "One of 'todo', 'in_progress', 'review', 'done'")]
    pub status: String,
    #[schemars(description = "UUID of the user performing the action")]
    #[serde(default)]
    pub actor_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddChecklistItemRequest {
    #[schemars(description = "The UUID of the card")]
    pub card_id: String,
    #[schemars(description = "Text of the checklist item")]
    pub content: String,
    #[schemars(description = "UUID of the user performing the action")]
    #[serde(default)]
    pub actor_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToggleChecklistItemRequest {
    #[schemars(description = "The UUID of the checklist item")]
    pub item_id: String,
    #[schemars(
        description = "Desired completion state. Omit to flip the current state."
    )]
    #[serde(default)]
    pub completed: Option<bool>,
    #[schemars(description = "UUID of the user performing the action")]
    #[serde(default)]
    pub actor_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddCommentRequest {
    #[schemars(description = "The UUID of the card")]
    pub card_id: String,
    #[schemars(description = "Comment text")]
    pub body: String,
    #[schemars(description = "UUID of the comment author")]
    #[serde(default)]
    pub author_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCardActivityRequest {
    #[schemars(description = "The UUID of the card")]
    pub card_id: String,
    #[schemars(description = "Maximum entries to return, newest first. Defaults to 50, max 200.")]
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BoardDashboardRequest {
    #[schemars(description = "The UUID of the board")]
    pub board_id: String,
    #[schemars(description = "Reference day as YYYY-MM-DD. Defaults to today (UTC).")]
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SprintBurndownRequest {
    #[schemars(description = "The UUID of the sprint")]
    pub sprint_id: String,
    #[schemars(description = "Reference day as YYYY-MM-DD. Defaults to today (UTC).")]
    #[serde(default)]
    pub as_of: Option<String>,
}

// ============================================================
// Response Types
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub archived: bool,
}

impl From<Board> for BoardSummary {
    fn from(board: Board) -> Self {
        Self {
            id: board.id.to_string(),
            name: board.name,
            description: board.description,
            archived: board.archived,
        }
    }
}

/// A board laid out as columns, with just enough of each card to act on it.
#[derive(Debug, Serialize, Deserialize)]
pub struct BoardOverview {
    pub id: String,
    pub name: String,
    pub lists: Vec<ListOverview>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListOverview {
    pub id: String,
    pub name: String,
    pub wip_limit: Option<i64>,
    pub cards: Vec<CardSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: String,
    pub title: String,
    pub status: CardStatus,
    pub priority: String,
    pub story_points: Option<i64>,
    pub due_date: Option<String>,
}

impl From<BoardDetail> for BoardOverview {
    fn from(detail: BoardDetail) -> Self {
        Self {
            id: detail.board.id.to_string(),
            name: detail.board.name,
            lists: detail
                .lists
                .into_iter()
                .map(|l| ListOverview {
                    id: l.list.id.to_string(),
                    name: l.list.name,
                    wip_limit: l.list.wip_limit,
                    cards: l
                        .cards
                        .into_iter()
                        .map(|c| CardSummary {
                            id: c.id.to_string(),
                            title: c.title,
                            status: c.status,
                            priority: c.priority.as_str().to_string(),
                            story_points: c.story_points,
                            due_date: c.due_date.map(|d| d.to_string()),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
