use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use serde_json::json;
use uuid::Uuid;

use super::checklists::items_for_card;
use super::labels::labels_for_card;
use super::lists::require_list;
use super::sprints::sprint_by_id;
use super::users::{user_by_id, user_from_row, USER_COLUMNS};
use super::{
    date_string, log_activity, now, parse_date, parse_datetime, parse_uuid, require_date,
    require_text, timestamp, Database, StoreError,
};
use crate::models::*;

pub(super) const CARD_COLUMNS: &str = "c.id, c.board_id, c.list_id, c.title, c.description, \
     c.status, c.priority, c.position, c.story_points, c.due_date, c.sprint_id, c.completed_at, \
     c.created_by, c.archived, c.created_at, c.updated_at";

pub(super) fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: parse_uuid(row.get(0)?),
        board_id: parse_uuid(row.get(1)?),
        list_id: parse_uuid(row.get(2)?),
        title: row.get(3)?,
        description: row.get(4)?,
        status: row.get::<_, String>(5)?.parse().unwrap_or_default(),
        priority: row.get::<_, String>(6)?.parse().unwrap_or_default(),
        position: row.get(7)?,
        story_points: row.get(8)?,
        due_date: row.get::<_, Option<String>>(9)?.map(parse_date),
        sprint_id: row.get::<_, Option<String>>(10)?.map(parse_uuid),
        completed_at: row.get::<_, Option<String>>(11)?.map(parse_datetime),
        created_by: row.get::<_, Option<String>>(12)?.map(parse_uuid),
        archived: row.get::<_, i32>(13)? != 0,
        created_at: parse_datetime(row.get(14)?),
        updated_at: parse_datetime(row.get(15)?),
    })
}

pub(super) fn card_by_id(conn: &Connection, id: Uuid) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            &format!("SELECT {} FROM cards c WHERE c.id = ?", CARD_COLUMNS),
            [id.to_string()],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

pub(super) fn require_card(conn: &Connection, id: Uuid) -> Result<Card> {
    card_by_id(conn, id)?.ok_or_else(|| StoreError::NotFound("Card").into())
}

/// Non-archived cards of a list in position order.
pub(super) fn cards_for_list(conn: &Connection, list_id: Uuid) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cards c WHERE c.list_id = ? AND c.archived = 0 ORDER BY c.position",
        CARD_COLUMNS
    ))?;
    let cards = stmt
        .query_map([list_id.to_string()], card_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cards)
}

/// Number of cards (archived included) occupying positions in a list.
fn slots_in_list(conn: &Connection, list_id: Uuid) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE list_id = ?",
        [list_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn active_in_list(conn: &Connection, list_id: Uuid) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE list_id = ? AND archived = 0",
        [list_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn validate_sprint(conn: &Connection, board_id: Uuid, sprint_id: Option<Uuid>) -> Result<()> {
    if let Some(sprint_id) = sprint_id {
        let sprint = sprint_by_id(conn, sprint_id)?.ok_or(StoreError::NotFound("Sprint"))?;
        if sprint.board_id != board_id {
            return Err(
                StoreError::Invalid("Sprint belongs to a different board".to_string()).into(),
            );
        }
    }
    Ok(())
}

fn validate_points(points: Option<i64>) -> Result<()> {
    if matches!(points, Some(p) if p < 0) {
        return Err(StoreError::Invalid("Story points must not be negative".to_string()).into());
    }
    Ok(())
}

fn escape_like(q: &str) -> String {
    let mut out = String::with_capacity(q.len() + 2);
    out.push('%');
    for ch in q.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl Database {
    // ============================================================
    // Card queries
    // ============================================================

    pub fn get_cards_by_list(&self, list_id: Uuid) -> Result<Vec<Card>> {
        let conn = self.lock()?;
        cards_for_list(&conn, list_id)
    }

    pub fn get_card(&self, id: Uuid) -> Result<Option<Card>> {
        let conn = self.lock()?;
        card_by_id(&conn, id)
    }

    pub fn get_card_detail(&self, id: Uuid) -> Result<Option<CardDetail>> {
        let conn = self.lock()?;
        let Some(card) = card_by_id(&conn, id)? else {
            return Ok(None);
        };

        let (comment_count, minutes_logged): (i64, i64) = conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM comments WHERE card_id = ?1),
                (SELECT COALESCE(SUM(minutes), 0) FROM time_logs WHERE card_id = ?1)",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(Some(CardDetail {
            assignees: assignees_for_card(&conn, id)?,
            labels: labels_for_card(&conn, id)?,
            checklist: items_for_card(&conn, id)?,
            comment_count,
            minutes_logged,
            card,
        }))
    }

    /// Cards on a board matching every filter that is set, in board order
    /// (list position, then card position).
    pub fn search_cards(&self, board_id: Uuid, filter: &CardFilter) -> Result<Vec<Card>> {
        let conn = self.lock()?;

        let mut sql = format!("SELECT {} FROM cards c WHERE c.board_id = ?", CARD_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(board_id.to_string())];

        if !filter.include_archived {
            sql.push_str(" AND c.archived = 0");
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND c.status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND c.priority = ?");
            params.push(Box::new(priority.as_str()));
        }
        if let Some(assignee) = filter.assignee {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM card_assignees a WHERE a.card_id = c.id AND a.user_id = ?)",
            );
            params.push(Box::new(assignee.to_string()));
        }
        if let Some(label) = filter.label {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM card_labels cl WHERE cl.card_id = c.id AND cl.label_id = ?)",
            );
            params.push(Box::new(label.to_string()));
        }
        if let Some(sprint) = filter.sprint {
            sql.push_str(" AND c.sprint_id = ?");
            params.push(Box::new(sprint.to_string()));
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            sql.push_str(
                " AND (c.title LIKE ? ESCAPE '\\' OR COALESCE(c.description, '') LIKE ? ESCAPE '\\')",
            );
            let pattern = escape_like(q);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }
        sql.push_str(" ORDER BY (SELECT l.position FROM lists l WHERE l.id = c.list_id), c.position");

        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params_ref.as_slice(), card_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    // ============================================================
    // Card mutations
    // ============================================================

    /// Append a card to the end of a list.
    pub fn create_card(
        &self,
        list_id: Uuid,
        input: CreateCardInput,
        actor: Option<Uuid>,
    ) -> Result<Card> {
        require_text(&input.title, "Card title")?;
        validate_points(input.story_points)?;
        if let Some(due_date) = input.due_date {
            require_date(due_date, "Due date")?;
        }

        let mut conn = self.lock()?;
        let list = require_list(&conn, list_id)?;
        validate_sprint(&conn, list.board_id, input.sprint_id)?;

        let id = Uuid::new_v4();
        let now = now();
        let status = input.status.unwrap_or_default();
        let priority = input.priority.unwrap_or_default();
        let completed_at = (status == CardStatus::Done).then_some(now);
        let position = slots_in_list(&conn, list_id)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO cards (id, board_id, list_id, title, description, status, priority, position,
                                story_points, due_date, sprint_id, completed_at, created_by, archived,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
            rusqlite::params![
                id.to_string(),
                list.board_id.to_string(),
                list_id.to_string(),
                &input.title,
                &input.description,
                status.as_str(),
                priority.as_str(),
                position,
                input.story_points,
                input.due_date.map(date_string),
                input.sprint_id.map(|u| u.to_string()),
                completed_at.map(timestamp),
                actor.map(|u| u.to_string()),
                timestamp(now),
                timestamp(now),
            ],
        )?;
        log_activity(
            &tx,
            id,
            list.board_id,
            actor,
            ActivityAction::Created,
            json!({ "title": input.title, "list_id": list_id }),
        )?;
        tx.commit()?;

        Ok(Card {
            id,
            board_id: list.board_id,
            list_id,
            title: input.title,
            description: input.description,
            status,
            priority,
            position,
            story_points: input.story_points,
            due_date: input.due_date,
            sprint_id: input.sprint_id,
            completed_at,
            created_by: actor,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update, recording one activity entry per kind of change.
    pub fn update_card(
        &self,
        id: Uuid,
        input: UpdateCardInput,
        actor: Option<Uuid>,
    ) -> Result<Option<Card>> {
        let mut conn = self.lock()?;
        let Some(existing) = card_by_id(&conn, id)? else {
            return Ok(None);
        };

        if let Some(title) = &input.title {
            require_text(title, "Card title")?;
        }
        if let Some(points) = input.story_points {
            validate_points(points)?;
        }
        if let Some(Some(due_date)) = input.due_date {
            require_date(due_date, "Due date")?;
        }
        if let Some(sprint_id) = input.sprint_id {
            validate_sprint(&conn, existing.board_id, sprint_id)?;
        }

        let now = now();
        let mut card = existing.clone();
        if let Some(title) = input.title {
            card.title = title;
        }
        if let Some(description) = input.description {
            card.description = description;
        }
        if let Some(points) = input.story_points {
            card.story_points = points;
        }
        if let Some(due_date) = input.due_date {
            card.due_date = due_date;
        }
        if let Some(sprint_id) = input.sprint_id {
            card.sprint_id = sprint_id;
        }
        if let Some(priority) = input.priority {
            card.priority = priority;
        }
        if let Some(archived) = input.archived {
            card.archived = archived;
        }
        if let Some(status) = input.status {
            card.status = status;
            card.completed_at = match (existing.status, status) {
                (CardStatus::Done, CardStatus::Done) => existing.completed_at,
                (_, CardStatus::Done) => Some(now),
                _ => None,
            };
        }
        card.updated_at = now;

        let mut changed = Vec::new();
        if card.title != existing.title {
            changed.push("title");
        }
        if card.description != existing.description {
            changed.push("description");
        }
        if card.story_points != existing.story_points {
            changed.push("story_points");
        }
        if card.due_date != existing.due_date {
            changed.push("due_date");
        }
        if !card.archived && existing.archived {
            changed.push("archived");
        }

        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE cards SET title = ?, description = ?, status = ?, priority = ?, story_points = ?,
                              due_date = ?, sprint_id = ?, completed_at = ?, archived = ?, updated_at = ?
             WHERE id = ?",
            rusqlite::params![
                &card.title,
                &card.description,
                card.status.as_str(),
                card.priority.as_str(),
                card.story_points,
                card.due_date.map(date_string),
                card.sprint_id.map(|u| u.to_string()),
                card.completed_at.map(timestamp),
                card.archived as i32,
                timestamp(now),
                id.to_string(),
            ],
        )?;

        if !changed.is_empty() {
            log_activity(
                &tx,
                id,
                card.board_id,
                actor,
                ActivityAction::Updated,
                json!({ "fields": changed }),
            )?;
        }
        if card.status != existing.status {
            log_activity(
                &tx,
                id,
                card.board_id,
                actor,
                ActivityAction::StatusChanged,
                json!({ "from": existing.status, "to": card.status }),
            )?;
        }
        if card.priority != existing.priority {
            log_activity(
                &tx,
                id,
                card.board_id,
                actor,
                ActivityAction::PriorityChanged,
                json!({ "from": existing.priority, "to": card.priority }),
            )?;
        }
        if card.sprint_id != existing.sprint_id {
            log_activity(
                &tx,
                id,
                card.board_id,
                actor,
                ActivityAction::SprintChanged,
                json!({ "from": existing.sprint_id, "to": card.sprint_id }),
            )?;
        }
        if card.archived && !existing.archived {
            log_activity(&tx, id, card.board_id, actor, ActivityAction::Archived, json!({}))?;
        }
        tx.commit()?;

        Ok(Some(card))
    }

    /// Move a card within its list or to another list on the same board.
    ///
    /// Positions in both the source and destination lists stay contiguous.
    /// Moving into a different list respects that list's WIP limit.
    pub fn move_card(
        &self,
        id: Uuid,
        input: MoveCardInput,
        actor: Option<Uuid>,
    ) -> Result<Option<Card>> {
        let mut conn = self.lock()?;
        let Some(card) = card_by_id(&conn, id)? else {
            return Ok(None);
        };
        let dest = require_list(&conn, input.list_id)?;

        if dest.board_id != card.board_id {
            return Err(StoreError::Invalid(
                "Cards can only move between lists on the same board".to_string(),
            )
            .into());
        }

        let same_list = dest.id == card.list_id;
        if !same_list && !card.archived {
            if let Some(limit) = dest.wip_limit {
                if active_in_list(&conn, dest.id)? >= limit {
                    return Err(StoreError::Conflict(format!(
                        "List '{}' has reached its WIP limit of {}",
                        dest.name, limit
                    ))
                    .into());
                }
            }
        }

        let now = now();
        let tx = conn.transaction()?;
        let target = if same_list {
            let last = slots_in_list(&tx, card.list_id)? - 1;
            let target = input.position.unwrap_or(last).clamp(0, last);
            if target < card.position {
                tx.execute(
                    "UPDATE cards SET position = position + 1
                     WHERE list_id = ? AND position >= ? AND position < ?",
                    (card.list_id.to_string(), target, card.position),
                )?;
            } else if target > card.position {
                tx.execute(
                    "UPDATE cards SET position = position - 1
                     WHERE list_id = ? AND position > ? AND position <= ?",
                    (card.list_id.to_string(), card.position, target),
                )?;
            }
            target
        } else {
            tx.execute(
                "UPDATE cards SET position = position - 1 WHERE list_id = ? AND position > ?",
                (card.list_id.to_string(), card.position),
            )?;
            let len = slots_in_list(&tx, dest.id)?;
            let target = input.position.unwrap_or(len).clamp(0, len);
            tx.execute(
                "UPDATE cards SET position = position + 1 WHERE list_id = ? AND position >= ?",
                (dest.id.to_string(), target),
            )?;
            target
        };

        if same_list && target == card.position {
            // Nothing moved; leave the log alone.
            return Ok(Some(card));
        }

        tx.execute(
            "UPDATE cards SET list_id = ?, position = ?, updated_at = ? WHERE id = ?",
            (dest.id.to_string(), target, timestamp(now), id.to_string()),
        )?;
        log_activity(
            &tx,
            id,
            card.board_id,
            actor,
            ActivityAction::Moved,
            json!({
                "from_list": card.list_id,
                "to_list": dest.id,
                "from_position": card.position,
                "to_position": target,
            }),
        )?;
        tx.commit()?;

        tracing::debug!("Moved card {} to list {} at {}", id, dest.id, target);
        Ok(Some(Card {
            list_id: dest.id,
            position: target,
            updated_at: now,
            ..card
        }))
    }

    /// Delete a card. Its activity history is kept and gains a `deleted` entry.
    pub fn delete_card(&self, id: Uuid, actor: Option<Uuid>) -> Result<bool> {
        let mut conn = self.lock()?;
        let Some(card) = card_by_id(&conn, id)? else {
            return Ok(false);
        };

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cards WHERE id = ?", [id.to_string()])?;
        tx.execute(
            "UPDATE cards SET position = position - 1 WHERE list_id = ? AND position > ?",
            (card.list_id.to_string(), card.position),
        )?;
        log_activity(
            &tx,
            id,
            card.board_id,
            actor,
            ActivityAction::Deleted,
            json!({ "title": card.title, "list_id": card.list_id }),
        )?;
        tx.commit()?;
        Ok(true)
    }

    // ============================================================
    // Assignees
    // ============================================================

    pub fn get_card_assignees(&self, card_id: Uuid) -> Result<Vec<User>> {
        let conn = self.lock()?;
        assignees_for_card(&conn, card_id)
    }

    /// Assign a user to a card. Returns `false` if they were already assigned.
    pub fn assign_user(&self, card_id: Uuid, user_id: Uuid, actor: Option<Uuid>) -> Result<bool> {
        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;
        user_by_id(&conn, user_id)?.ok_or(StoreError::NotFound("User"))?;

        let tx = conn.transaction()?;
        let rows = tx.execute(
            "INSERT OR IGNORE INTO card_assignees (card_id, user_id, assigned_at) VALUES (?, ?, ?)",
            (card_id.to_string(), user_id.to_string(), timestamp(now())),
        )?;
        if rows > 0 {
            log_activity(
                &tx,
                card_id,
                card.board_id,
                actor,
                ActivityAction::AssigneeAdded,
                json!({ "user_id": user_id }),
            )?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }

    pub fn unassign_user(
        &self,
        card_id: Uuid,
        user_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<bool> {
        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;

        let tx = conn.transaction()?;
        let rows = tx.execute(
            "DELETE FROM card_assignees WHERE card_id = ? AND user_id = ?",
            (card_id.to_string(), user_id.to_string()),
        )?;
        if rows > 0 {
            log_activity(
                &tx,
                card_id,
                card.board_id,
                actor,
                ActivityAction::AssigneeRemoved,
                json!({ "user_id": user_id }),
            )?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }
}

fn assignees_for_card(conn: &Connection, card_id: Uuid) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users u
         JOIN card_assignees a ON a.user_id = u.id
         WHERE a.card_id = ? ORDER BY u.name",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([card_id.to_string()], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
