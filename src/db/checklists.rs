use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;
use uuid::Uuid;

use super::cards::require_card;
use super::{
    log_activity, now, parse_datetime, parse_uuid, require_text, timestamp, validate_order,
    Database,
};
use crate::models::*;

const ITEM_COLUMNS: &str =
    "id, card_id, content, is_completed, position, completed_at, created_at, updated_at";

fn item_from_row(row: &Row) -> rusqlite::Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: parse_uuid(row.get(0)?),
        card_id: parse_uuid(row.get(1)?),
        content: row.get(2)?,
        is_completed: row.get::<_, i32>(3)? != 0,
        position: row.get(4)?,
        completed_at: row.get::<_, Option<String>>(5)?.map(parse_datetime),
        created_at: parse_datetime(row.get(6)?),
        updated_at: parse_datetime(row.get(7)?),
    })
}

pub(super) fn items_for_card(conn: &Connection, card_id: Uuid) -> Result<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM checklist_items WHERE card_id = ? ORDER BY position",
        ITEM_COLUMNS
    ))?;
    let items = stmt
        .query_map([card_id.to_string()], item_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

fn item_by_id(conn: &Connection, id: Uuid) -> Result<Option<ChecklistItem>> {
    let item = conn
        .query_row(
            &format!("SELECT {} FROM checklist_items WHERE id = ?", ITEM_COLUMNS),
            [id.to_string()],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

impl Database {
    pub fn get_checklist(&self, card_id: Uuid) -> Result<Vec<ChecklistItem>> {
        let conn = self.lock()?;
        items_for_card(&conn, card_id)
    }

    pub fn get_checklist_item(&self, id: Uuid) -> Result<Option<ChecklistItem>> {
        let conn = self.lock()?;
        item_by_id(&conn, id)
    }

    pub fn create_checklist_item(
        &self,
        card_id: Uuid,
        input: CreateChecklistItemInput,
        actor: Option<Uuid>,
    ) -> Result<ChecklistItem> {
        require_text(&input.content, "Checklist item")?;

        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;

        let position: i64 = conn.query_row(
            "SELECT COUNT(*) FROM checklist_items WHERE card_id = ?",
            [card_id.to_string()],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4();
        let now = now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO checklist_items (id, card_id, content, is_completed, position, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?, ?)",
            (
                id.to_string(),
                card_id.to_string(),
                &input.content,
                position,
                timestamp(now),
                timestamp(now),
            ),
        )?;
        log_activity(
            &tx,
            card_id,
            card.board_id,
            actor,
            ActivityAction::ChecklistItemAdded,
            json!({ "item_id": id, "content": input.content }),
        )?;
        tx.commit()?;

        Ok(ChecklistItem {
            id,
            card_id,
            content: input.content,
            is_completed: false,
            position,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Edit an item's text and/or tick state. Ticking stamps `completed_at`,
    /// unticking clears it; each toggle is logged.
    pub fn update_checklist_item(
        &self,
        id: Uuid,
        input: UpdateChecklistItemInput,
        actor: Option<Uuid>,
    ) -> Result<Option<ChecklistItem>> {
        let mut conn = self.lock()?;
        let Some(existing) = item_by_id(&conn, id)? else {
            return Ok(None);
        };
        if let Some(content) = &input.content {
            require_text(content, "Checklist item")?;
        }
        let card = require_card(&conn, existing.card_id)?;

        let now = now();
        let content = input.content.unwrap_or_else(|| existing.content.clone());
        let is_completed = input.is_completed.unwrap_or(existing.is_completed);
        let completed_at = match (existing.is_completed, is_completed) {
            (false, true) => Some(now),
            (_, false) => None,
            (true, true) => existing.completed_at,
        };

        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE checklist_items SET content = ?, is_completed = ?, completed_at = ?, updated_at = ?
             WHERE id = ?",
            (
                &content,
                is_completed as i32,
                completed_at.map(timestamp),
                timestamp(now),
                id.to_string(),
            ),
        )?;
        if is_completed != existing.is_completed {
            let action = if is_completed {
                ActivityAction::ChecklistItemCompleted
            } else {
                ActivityAction::ChecklistItemReopened
            };
            log_activity(
                &tx,
                card.id,
                card.board_id,
                actor,
                action,
                json!({ "item_id": id, "content": content }),
            )?;
        }
        tx.commit()?;

        Ok(Some(ChecklistItem {
            content,
            is_completed,
            completed_at,
            updated_at: now,
            ..existing
        }))
    }

    pub fn delete_checklist_item(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let Some(item) = item_by_id(&conn, id)? else {
            return Ok(false);
        };

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM checklist_items WHERE id = ?", [id.to_string()])?;
        tx.execute(
            "UPDATE checklist_items SET position = position - 1 WHERE card_id = ? AND position > ?",
            (item.card_id.to_string(), item.position),
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Rewrite item positions to match `ids`, which must name every item on
    /// the card exactly once. All positions change in one transaction.
    pub fn reorder_checklist(
        &self,
        card_id: Uuid,
        input: ReorderInput,
        actor: Option<Uuid>,
    ) -> Result<Vec<ChecklistItem>> {
        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;

        let existing: Vec<Uuid> = items_for_card(&conn, card_id)?
            .iter()
            .map(|i| i.id)
            .collect();
        validate_order(&existing, &input.ids)?;

        let now = timestamp(now());
        let tx = conn.transaction()?;
        for (position, id) in input.ids.iter().enumerate() {
            tx.execute(
                "UPDATE checklist_items SET position = ?, updated_at = ? WHERE id = ?",
                (position as i64, &now, id.to_string()),
            )?;
        }
        log_activity(
            &tx,
            card_id,
            card.board_id,
            actor,
            ActivityAction::ChecklistReordered,
            json!({ "order": input.ids }),
        )?;
        tx.commit()?;

        items_for_card(&conn, card_id)
    }
}
