use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A board-scoped tag. Label names are unique within a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    /// Display color, e.g. `#e11d48`.
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLabelInput {
    pub name: String,
    pub color: Option<String>,
}
