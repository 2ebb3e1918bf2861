use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{nullable, ChecklistItem, Label, User};

/// A unit of work on a board.
///
/// A card lives in exactly one list and is ordered within it by `position`.
/// `status` is tracked independently of the list so boards can name their
/// columns freely; entering [`CardStatus::Done`] stamps `completed_at`, which
/// drives every completion-based report (rollups, burndown, velocity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub board_id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: CardStatus,
    pub priority: CardPriority,
    pub position: i64,
    pub story_points: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub sprint_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workflow status of a card.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl CardStatus {
    pub const ALL: [CardStatus; 4] = [Self::Todo, Self::InProgress, Self::Review, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown card status '{}'", other)),
        }
    }
}

/// Priority of a card, lowest first.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl CardPriority {
    pub const ALL: [CardPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for CardPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown card priority '{}'", other)),
        }
    }
}

/// Input for creating a card. The card is appended to the end of its list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCardInput {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `Todo`.
    pub status: Option<CardStatus>,
    /// Defaults to `Medium`.
    pub priority: Option<CardPriority>,
    pub story_points: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub sprint_id: Option<Uuid>,
}

/// Input for updating a card. All fields are optional for partial updates.
///
/// Nullable fields distinguish an absent key (keep the current value) from an
/// explicit `null` (clear it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCardInput {
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub status: Option<CardStatus>,
    pub priority: Option<CardPriority>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub story_points: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub sprint_id: Option<Option<Uuid>>,
    pub archived: Option<bool>,
}

/// Input for moving a card to a list (possibly its current one).
///
/// `position` is clamped to the destination's bounds; omitted means "append".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveCardInput {
    pub list_id: Uuid,
    pub position: Option<i64>,
}

/// Input for assigning a user to a card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignUserInput {
    pub user_id: Uuid,
}

/// Input for attaching a label to a card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardLabelInput {
    pub label_id: Uuid,
}

/// A card with everything the card-detail view shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetail {
    #[serde(flatten)]
    pub card: Card,
    pub assignees: Vec<User>,
    pub labels: Vec<Label>,
    pub checklist: Vec<ChecklistItem>,
    pub comment_count: i64,
    pub minutes_logged: i64,
}

/// Filters for searching cards on a board. All filters are combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardFilter {
    pub status: Option<CardStatus>,
    pub priority: Option<CardPriority>,
    /// Only cards assigned to this user.
    pub assignee: Option<Uuid>,
    /// Only cards carrying this label.
    pub label: Option<Uuid>,
    /// Only cards committed to this sprint.
    pub sprint: Option<Uuid>,
    /// Case-insensitive substring match on title and description.
    pub q: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}
