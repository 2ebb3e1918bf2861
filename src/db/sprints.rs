use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::boards::require_board;
use super::{
    date_string, now, parse_date, parse_datetime, parse_uuid, require_date, require_text,
    timestamp, Database, StoreError,
};
use crate::models::*;

/// Longest sprint, in days between start and end, that can be scheduled.
const MAX_SPRINT_DAYS: i64 = 366;

const SPRINT_COLUMNS: &str = "id, board_id, name, goal, start_date, end_date, status, created_at";

fn sprint_from_row(row: &Row) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: parse_uuid(row.get(0)?),
        board_id: parse_uuid(row.get(1)?),
        name: row.get(2)?,
        goal: row.get(3)?,
        start_date: parse_date(row.get(4)?),
        end_date: parse_date(row.get(5)?),
        status: row.get::<_, String>(6)?.parse().unwrap_or_default(),
        created_at: parse_datetime(row.get(7)?),
    })
}

pub(super) fn sprint_by_id(conn: &Connection, id: Uuid) -> Result<Option<Sprint>> {
    let sprint = conn
        .query_row(
            &format!("SELECT {} FROM sprints WHERE id = ?", SPRINT_COLUMNS),
            [id.to_string()],
            sprint_from_row,
        )
        .optional()?;
    Ok(sprint)
}

pub(super) fn sprints_for_board(conn: &Connection, board_id: Uuid) -> Result<Vec<Sprint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sprints WHERE board_id = ? ORDER BY start_date, name",
        SPRINT_COLUMNS
    ))?;
    let sprints = stmt
        .query_map([board_id.to_string()], sprint_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sprints)
}

fn validate_dates(sprint: &Sprint) -> Result<()> {
    require_date(sprint.start_date, "Sprint start date")?;
    require_date(sprint.end_date, "Sprint end date")?;
    if sprint.end_date < sprint.start_date {
        return Err(
            StoreError::Invalid("Sprint end date must not precede its start date".to_string())
                .into(),
        );
    }
    if (sprint.end_date - sprint.start_date).num_days() > MAX_SPRINT_DAYS {
        return Err(StoreError::Invalid(format!(
            "Sprint must not span more than {} days",
            MAX_SPRINT_DAYS
        ))
        .into());
    }
    Ok(())
}

impl Database {
    pub fn get_sprints(&self, board_id: Uuid) -> Result<Vec<Sprint>> {
        let conn = self.lock()?;
        sprints_for_board(&conn, board_id)
    }

    pub fn get_sprint(&self, id: Uuid) -> Result<Option<Sprint>> {
        let conn = self.lock()?;
        sprint_by_id(&conn, id)
    }

    pub fn create_sprint(&self, board_id: Uuid, input: CreateSprintInput) -> Result<Sprint> {
        require_text(&input.name, "Sprint name")?;

        let sprint = Sprint {
            id: Uuid::new_v4(),
            board_id,
            name: input.name,
            goal: input.goal,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status.unwrap_or_default(),
            created_at: now(),
        };
        validate_dates(&sprint)?;

        let conn = self.lock()?;
        require_board(&conn, board_id)?;

        conn.execute(
            "INSERT INTO sprints (id, board_id, name, goal, start_date, end_date, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                sprint.id.to_string(),
                board_id.to_string(),
                &sprint.name,
                &sprint.goal,
                date_string(sprint.start_date),
                date_string(sprint.end_date),
                sprint.status.as_str(),
                timestamp(sprint.created_at),
            ),
        )?;

        Ok(sprint)
    }

    pub fn update_sprint(&self, id: Uuid, input: UpdateSprintInput) -> Result<Option<Sprint>> {
        let conn = self.lock()?;
        let Some(existing) = sprint_by_id(&conn, id)? else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            require_text(name, "Sprint name")?;
        }

        let mut sprint = Sprint {
            name: input.name.unwrap_or(existing.name),
            start_date: input.start_date.unwrap_or(existing.start_date),
            end_date: input.end_date.unwrap_or(existing.end_date),
            status: input.status.unwrap_or(existing.status),
            ..existing
        };
        if let Some(goal) = input.goal {
            sprint.goal = goal;
        }
        validate_dates(&sprint)?;

        conn.execute(
            "UPDATE sprints SET name = ?, goal = ?, start_date = ?, end_date = ?, status = ? WHERE id = ?",
            (
                &sprint.name,
                &sprint.goal,
                date_string(sprint.start_date),
                date_string(sprint.end_date),
                sprint.status.as_str(),
                id.to_string(),
            ),
        )?;

        Ok(Some(sprint))
    }

    /// Delete a sprint. Its cards stay on the board with `sprint_id` cleared.
    pub fn delete_sprint(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM sprints WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
