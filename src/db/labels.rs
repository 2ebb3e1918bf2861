use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;
use uuid::Uuid;

use super::boards::require_board;
use super::cards::require_card;
use super::{log_activity, parse_uuid, require_text, Database, StoreError};
use crate::models::*;

const DEFAULT_COLOR: &str = "#64748b";

fn label_from_row(row: &Row) -> rusqlite::Result<Label> {
    Ok(Label {
        id: parse_uuid(row.get(0)?),
        board_id: parse_uuid(row.get(1)?),
        name: row.get(2)?,
        color: row.get(3)?,
    })
}

pub(super) fn labels_for_board(conn: &Connection, board_id: Uuid) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT id, board_id, name, color FROM labels WHERE board_id = ? ORDER BY name",
    )?;
    let labels = stmt
        .query_map([board_id.to_string()], label_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels)
}

pub(super) fn labels_for_card(conn: &Connection, card_id: Uuid) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.board_id, l.name, l.color FROM labels l
         JOIN card_labels cl ON cl.label_id = l.id
         WHERE cl.card_id = ? ORDER BY l.name",
    )?;
    let labels = stmt
        .query_map([card_id.to_string()], label_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels)
}

fn label_by_id(conn: &Connection, id: Uuid) -> Result<Option<Label>> {
    let label = conn
        .query_row(
            "SELECT id, board_id, name, color FROM labels WHERE id = ?",
            [id.to_string()],
            label_from_row,
        )
        .optional()?;
    Ok(label)
}

/// Accepts `#rgb` and `#rrggbb`.
fn is_hex_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

impl Database {
    pub fn get_labels(&self, board_id: Uuid) -> Result<Vec<Label>> {
        let conn = self.lock()?;
        labels_for_board(&conn, board_id)
    }

    pub fn create_label(&self, board_id: Uuid, input: CreateLabelInput) -> Result<Label> {
        require_text(&input.name, "Label name")?;
        let color = input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
        if !is_hex_color(&color) {
            return Err(StoreError::Invalid(format!("Invalid label color '{}'", color)).into());
        }

        let conn = self.lock()?;
        require_board(&conn, board_id)?;

        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO labels (id, board_id, name, color) VALUES (?, ?, ?, ?)",
            (id.to_string(), board_id.to_string(), &input.name, &color),
        )?;

        Ok(Label {
            id,
            board_id,
            name: input.name,
            color,
        })
    }

    pub fn delete_label(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM labels WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn get_card_labels(&self, card_id: Uuid) -> Result<Vec<Label>> {
        let conn = self.lock()?;
        labels_for_card(&conn, card_id)
    }

    /// Attach a label to a card. Returns `false` if it was already attached.
    pub fn add_card_label(&self, card_id: Uuid, label_id: Uuid, actor: Option<Uuid>) -> Result<bool> {
        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;
        let label = label_by_id(&conn, label_id)?.ok_or(StoreError::NotFound("Label"))?;
        if label.board_id != card.board_id {
            return Err(
                StoreError::Invalid("Label belongs to a different board".to_string()).into(),
            );
        }

        let tx = conn.transaction()?;
        let rows = tx.execute(
            "INSERT OR IGNORE INTO card_labels (card_id, label_id) VALUES (?, ?)",
            (card_id.to_string(), label_id.to_string()),
        )?;
        if rows > 0 {
            log_activity(
                &tx,
                card_id,
                card.board_id,
                actor,
                ActivityAction::LabelAdded,
                json!({ "label_id": label_id, "name": label.name }),
            )?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }

    pub fn remove_card_label(
        &self,
        card_id: Uuid,
        label_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<bool> {
        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;

        let tx = conn.transaction()?;
        let rows = tx.execute(
            "DELETE FROM card_labels WHERE card_id = ? AND label_id = ?",
            (card_id.to_string(), label_id.to_string()),
        )?;
        if rows > 0 {
            log_activity(
                &tx,
                card_id,
                card.board_id,
                actor,
                ActivityAction::LabelRemoved,
                json!({ "label_id": label_id }),
            )?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::is_hex_color;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#E11D48"));
        assert!(!is_hex_color("e11d48"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#ggg"));
    }
}
