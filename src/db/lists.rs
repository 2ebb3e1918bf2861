use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::boards::require_board;
use super::{
    now, parse_datetime, parse_uuid, require_text, timestamp, validate_order, Database,
    StoreError,
};
use crate::models::*;

const LIST_COLUMNS: &str = "id, board_id, name, position, wip_limit, created_at, updated_at";

fn list_from_row(row: &Row) -> rusqlite::Result<BoardList> {
    Ok(BoardList {
        id: parse_uuid(row.get(0)?),
        board_id: parse_uuid(row.get(1)?),
        name: row.get(2)?,
        position: row.get(3)?,
        wip_limit: row.get(4)?,
        created_at: parse_datetime(row.get(5)?),
        updated_at: parse_datetime(row.get(6)?),
    })
}

pub(super) fn lists_for_board(conn: &Connection, board_id: Uuid) -> Result<Vec<BoardList>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lists WHERE board_id = ? ORDER BY position",
        LIST_COLUMNS
    ))?;
    let lists = stmt
        .query_map([board_id.to_string()], list_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lists)
}

pub(super) fn list_by_id(conn: &Connection, id: Uuid) -> Result<Option<BoardList>> {
    let list = conn
        .query_row(
            &format!("SELECT {} FROM lists WHERE id = ?", LIST_COLUMNS),
            [id.to_string()],
            list_from_row,
        )
        .optional()?;
    Ok(list)
}

pub(super) fn require_list(conn: &Connection, id: Uuid) -> Result<BoardList> {
    list_by_id(conn, id)?.ok_or_else(|| StoreError::NotFound("List").into())
}

fn validate_wip_limit(limit: Option<i64>) -> Result<()> {
    if matches!(limit, Some(n) if n < 1) {
        return Err(StoreError::Invalid("WIP limit must be at least 1".to_string()).into());
    }
    Ok(())
}

impl Database {
    pub fn get_lists(&self, board_id: Uuid) -> Result<Vec<BoardList>> {
        let conn = self.lock()?;
        lists_for_board(&conn, board_id)
    }

    pub fn get_list(&self, id: Uuid) -> Result<Option<BoardList>> {
        let conn = self.lock()?;
        list_by_id(&conn, id)
    }

    /// Append a list after the board's last list.
    pub fn create_list(&self, board_id: Uuid, input: CreateListInput) -> Result<BoardList> {
        require_text(&input.name, "List name")?;
        validate_wip_limit(input.wip_limit)?;

        let conn = self.lock()?;
        require_board(&conn, board_id)?;

        let position: i64 = conn.query_row(
            "SELECT COUNT(*) FROM lists WHERE board_id = ?",
            [board_id.to_string()],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4();
        let now = now();

        conn.execute(
            "INSERT INTO lists (id, board_id, name, position, wip_limit, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                board_id.to_string(),
                &input.name,
                position,
                input.wip_limit,
                timestamp(now),
                timestamp(now),
            ),
        )?;

        Ok(BoardList {
            id,
            board_id,
            name: input.name,
            position,
            wip_limit: input.wip_limit,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_list(&self, id: Uuid, input: UpdateListInput) -> Result<Option<BoardList>> {
        let conn = self.lock()?;
        let Some(existing) = list_by_id(&conn, id)? else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            require_text(name, "List name")?;
        }
        if let Some(limit) = input.wip_limit {
            validate_wip_limit(limit)?;
        }

        let now = now();
        let name = input.name.unwrap_or(existing.name);
        let wip_limit = input.wip_limit.unwrap_or(existing.wip_limit);

        conn.execute(
            "UPDATE lists SET name = ?, wip_limit = ?, updated_at = ? WHERE id = ?",
            (&name, wip_limit, timestamp(now), id.to_string()),
        )?;

        Ok(Some(BoardList {
            name,
            wip_limit,
            updated_at: now,
            ..existing
        }))
    }

    /// Delete a list and its cards, closing the gap in list positions.
    pub fn delete_list(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let Some(list) = list_by_id(&conn, id)? else {
            return Ok(false);
        };

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM lists WHERE id = ?", [id.to_string()])?;
        tx.execute(
            "UPDATE lists SET position = position - 1 WHERE board_id = ? AND position > ?",
            (list.board_id.to_string(), list.position),
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Rewrite list positions to match `ids`, which must name every list on
    /// the board exactly once.
    pub fn reorder_lists(&self, board_id: Uuid, input: ReorderInput) -> Result<Vec<BoardList>> {
        let mut conn = self.lock()?;
        require_board(&conn, board_id)?;

        let existing: Vec<Uuid> = lists_for_board(&conn, board_id)?
            .iter()
            .map(|l| l.id)
            .collect();
        validate_order(&existing, &input.ids)?;

        let now = timestamp(now());
        let tx = conn.transaction()?;
        for (position, id) in input.ids.iter().enumerate() {
            tx.execute(
                "UPDATE lists SET position = ?, updated_at = ? WHERE id = ?",
                (position as i64, &now, id.to_string()),
            )?;
        }
        tx.commit()?;

        lists_for_board(&conn, board_id)
    }
}
