use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;
use uuid::Uuid;

use super::cards::require_card;
use super::{log_activity, now, parse_datetime, parse_uuid, require_text, timestamp, Database};
use crate::models::*;

const COMMENT_COLUMNS: &str = "id, card_id, author_id, body, created_at, updated_at";

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: parse_uuid(row.get(0)?),
        card_id: parse_uuid(row.get(1)?),
        author_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        body: row.get(3)?,
        created_at: parse_datetime(row.get(4)?),
        updated_at: parse_datetime(row.get(5)?),
    })
}

fn comment_by_id(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
    let comment = conn
        .query_row(
            &format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS),
            [id.to_string()],
            comment_from_row,
        )
        .optional()?;
    Ok(comment)
}

impl Database {
    /// Comments on a card, oldest first.
    pub fn get_comments(&self, card_id: Uuid) -> Result<Vec<Comment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE card_id = ? ORDER BY created_at, rowid",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map([card_id.to_string()], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn create_comment(
        &self,
        card_id: Uuid,
        input: CommentInput,
        author: Option<Uuid>,
    ) -> Result<Comment> {
        require_text(&input.body, "Comment")?;

        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;
        let id = Uuid::new_v4();
        let now = now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO comments (id, card_id, author_id, body, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                card_id.to_string(),
                author.map(|u| u.to_string()),
                &input.body,
                timestamp(now),
                timestamp(now),
            ),
        )?;
        log_activity(
            &tx,
            card_id,
            card.board_id,
            author,
            ActivityAction::CommentAdded,
            json!({ "comment_id": id }),
        )?;
        tx.commit()?;

        Ok(Comment {
            id,
            card_id,
            author_id: author,
            body: input.body,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_comment(&self, id: Uuid, input: CommentInput) -> Result<Option<Comment>> {
        require_text(&input.body, "Comment")?;

        let conn = self.lock()?;
        let Some(existing) = comment_by_id(&conn, id)? else {
            return Ok(None);
        };

        let now = now();
        conn.execute(
            "UPDATE comments SET body = ?, updated_at = ? WHERE id = ?",
            (&input.body, timestamp(now), id.to_string()),
        )?;

        Ok(Some(Comment {
            body: input.body,
            updated_at: now,
            ..existing
        }))
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM comments WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
