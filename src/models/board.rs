use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{nullable, Label, ListWithCards, User};

/// A Kanban board: the top-level container for lists, cards, labels and sprints.
///
/// Archived boards are hidden from the default listing but keep all of their
/// data and remain reachable by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new board.
///
/// When `owner_id` is set the user is also added as an `owner` member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBoardInput {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
}

/// Input for updating an existing board. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBoardInput {
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub archived: Option<bool>,
}

/// The role a user holds on a board.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    #[default]
    Member,
    Viewer,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown member role '{}'", other)),
        }
    }
}

/// Membership of a user on a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardMember {
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub added_at: DateTime<Utc>,
}

/// Input for adding (or re-roling) a board member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddMemberInput {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: MemberRole,
}

/// A board with everything needed to render it: ordered lists with their
/// cards, the board's labels and its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub lists: Vec<ListWithCards>,
    pub labels: Vec<Label>,
    pub members: Vec<User>,
}
