use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::cards::cards_for_list;
use super::labels::labels_for_board;
use super::lists::lists_for_board;
use super::users::{user_by_id, user_from_row, USER_COLUMNS};
use super::{now, parse_datetime, parse_uuid, require_text, timestamp, Database, StoreError};
use crate::models::*;

const BOARD_COLUMNS: &str = "id, name, description, owner_id, archived, created_at, updated_at";

fn board_from_row(row: &Row) -> rusqlite::Result<Board> {
    Ok(Board {
        id: parse_uuid(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get::<_, Option<String>>(3)?.map(parse_uuid),
        archived: row.get::<_, i32>(4)? != 0,
        created_at: parse_datetime(row.get(5)?),
        updated_at: parse_datetime(row.get(6)?),
    })
}

pub(super) fn board_by_id(conn: &Connection, id: Uuid) -> Result<Option<Board>> {
    let board = conn
        .query_row(
            &format!("SELECT {} FROM boards WHERE id = ?", BOARD_COLUMNS),
            [id.to_string()],
            board_from_row,
        )
        .optional()?;
    Ok(board)
}

pub(super) fn require_board(conn: &Connection, id: Uuid) -> Result<Board> {
    board_by_id(conn, id)?.ok_or_else(|| StoreError::NotFound("Board").into())
}

fn member_users(conn: &Connection, board_id: Uuid) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users u
         JOIN board_members m ON m.user_id = u.id
         WHERE m.board_id = ? ORDER BY u.name",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([board_id.to_string()], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

fn upsert_member(conn: &Connection, board_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<()> {
    conn.execute(
        "INSERT INTO board_members (board_id, user_id, role, added_at) VALUES (?, ?, ?, ?)
         ON CONFLICT (board_id, user_id) DO UPDATE SET role = excluded.role",
        (
            board_id.to_string(),
            user_id.to_string(),
            role.as_str(),
            timestamp(now()),
        ),
    )?;
    Ok(())
}

impl Database {
    // ============================================================
    // Board operations
    // ============================================================

    pub fn get_all_boards(&self, include_archived: bool) -> Result<Vec<Board>> {
        let conn = self.lock()?;
        let sql = if include_archived {
            format!("SELECT {} FROM boards ORDER BY name", BOARD_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM boards WHERE archived = 0 ORDER BY name",
                BOARD_COLUMNS
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let boards = stmt
            .query_map([], board_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(boards)
    }

    pub fn get_board(&self, id: Uuid) -> Result<Option<Board>> {
        let conn = self.lock()?;
        board_by_id(&conn, id)
    }

    /// The board with its lists (and their non-archived cards), labels and members.
    pub fn get_board_detail(&self, id: Uuid) -> Result<Option<BoardDetail>> {
        let conn = self.lock()?;
        let Some(board) = board_by_id(&conn, id)? else {
            return Ok(None);
        };

        let lists = lists_for_board(&conn, id)?
            .into_iter()
            .map(|list| {
                let cards = cards_for_list(&conn, list.id)?;
                Ok(ListWithCards { list, cards })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(BoardDetail {
            board,
            lists,
            labels: labels_for_board(&conn, id)?,
            members: member_users(&conn, id)?,
        }))
    }

    pub fn create_board(&self, input: CreateBoardInput) -> Result<Board> {
        require_text(&input.name, "Board name")?;

        let mut conn = self.lock()?;
        if let Some(owner) = input.owner_id {
            user_by_id(&conn, owner)?.ok_or(StoreError::NotFound("User"))?;
        }

        let id = Uuid::new_v4();
        let now = now();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO boards (id, name, description, owner_id, archived, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                input.owner_id.map(|u| u.to_string()),
                timestamp(now),
                timestamp(now),
            ),
        )?;
        if let Some(owner) = input.owner_id {
            upsert_member(&tx, id, owner, MemberRole::Owner)?;
        }
        tx.commit()?;

        tracing::info!("Created board {} ({})", input.name, id);
        Ok(Board {
            id,
            name: input.name,
            description: input.description,
            owner_id: input.owner_id,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_board(&self, id: Uuid, input: UpdateBoardInput) -> Result<Option<Board>> {
        let conn = self.lock()?;
        let Some(existing) = board_by_id(&conn, id)? else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            require_text(name, "Board name")?;
        }

        let now = now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.unwrap_or(existing.description);
        let archived = input.archived.unwrap_or(existing.archived);

        conn.execute(
            "UPDATE boards SET name = ?, description = ?, archived = ?, updated_at = ? WHERE id = ?",
            (
                &name,
                &description,
                archived as i32,
                timestamp(now),
                id.to_string(),
            ),
        )?;

        Ok(Some(Board {
            id,
            name,
            description,
            owner_id: existing.owner_id,
            archived,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a board. Lists, cards, labels, sprints and the activity log go with it.
    pub fn delete_board(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM boards WHERE id = ?", [id.to_string()])?;
        if rows > 0 {
            tracing::info!("Deleted board {}", id);
        }
        Ok(rows > 0)
    }

    // ============================================================
    // Board member operations
    // ============================================================

    pub fn get_board_members(&self, board_id: Uuid) -> Result<Vec<BoardMember>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT board_id, user_id, role, added_at FROM board_members
             WHERE board_id = ? ORDER BY added_at",
        )?;
        let members = stmt
            .query_map([board_id.to_string()], |row| {
                Ok(BoardMember {
                    board_id: parse_uuid(row.get(0)?),
                    user_id: parse_uuid(row.get(1)?),
                    role: row.get::<_, String>(2)?.parse().unwrap_or_default(),
                    added_at: parse_datetime(row.get(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Add a user to a board, or change their role if they are already a member.
    pub fn add_board_member(&self, board_id: Uuid, input: AddMemberInput) -> Result<BoardMember> {
        let conn = self.lock()?;
        require_board(&conn, board_id)?;
        user_by_id(&conn, input.user_id)?.ok_or(StoreError::NotFound("User"))?;

        upsert_member(&conn, board_id, input.user_id, input.role)?;

        let member = conn.query_row(
            "SELECT added_at FROM board_members WHERE board_id = ? AND user_id = ?",
            (board_id.to_string(), input.user_id.to_string()),
            |row| row.get::<_, String>(0),
        )?;
        Ok(BoardMember {
            board_id,
            user_id: input.user_id,
            role: input.role,
            added_at: parse_datetime(member),
        })
    }

    pub fn remove_board_member(&self, board_id: Uuid, user_id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM board_members WHERE board_id = ? AND user_id = ?",
            (board_id.to_string(), user_id.to_string()),
        )?;
        Ok(rows > 0)
    }
}
