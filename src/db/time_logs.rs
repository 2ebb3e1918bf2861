use anyhow::Result;
use rusqlite::Row;
use serde_json::json;
use uuid::Uuid;

use super::cards::require_card;
use super::users::user_by_id;
use super::{
    date_string, log_activity, now, parse_date, parse_datetime, parse_uuid, require_date,
    timestamp, today, Database, StoreError,
};
use crate::models::*;

fn time_log_from_row(row: &Row) -> rusqlite::Result<TimeLog> {
    Ok(TimeLog {
        id: parse_uuid(row.get(0)?),
        card_id: parse_uuid(row.get(1)?),
        user_id: parse_uuid(row.get(2)?),
        minutes: row.get(3)?,
        note: row.get(4)?,
        logged_on: parse_date(row.get(5)?),
        created_at: parse_datetime(row.get(6)?),
    })
}

impl Database {
    pub fn get_time_logs(&self, card_id: Uuid) -> Result<Vec<TimeLog>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, card_id, user_id, minutes, note, logged_on, created_at
             FROM time_logs WHERE card_id = ? ORDER BY logged_on DESC, created_at DESC",
        )?;
        let logs = stmt
            .query_map([card_id.to_string()], time_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub fn create_time_log(
        &self,
        card_id: Uuid,
        input: CreateTimeLogInput,
        actor: Option<Uuid>,
    ) -> Result<TimeLog> {
        if input.minutes <= 0 {
            return Err(StoreError::Invalid("Minutes must be positive".to_string()).into());
        }
        let logged_on = input.logged_on.unwrap_or_else(today);
        require_date(logged_on, "Logged-on date")?;

        let mut conn = self.lock()?;
        let card = require_card(&conn, card_id)?;
        user_by_id(&conn, input.user_id)?.ok_or(StoreError::NotFound("User"))?;

        let id = Uuid::new_v4();
        let now = now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO time_logs (id, card_id, user_id, minutes, note, logged_on, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                card_id.to_string(),
                input.user_id.to_string(),
                input.minutes,
                &input.note,
                date_string(logged_on),
                timestamp(now),
            ),
        )?;
        log_activity(
            &tx,
            card_id,
            card.board_id,
            actor.or(Some(input.user_id)),
            ActivityAction::TimeLogged,
            json!({ "minutes": input.minutes, "logged_on": logged_on }),
        )?;
        tx.commit()?;

        Ok(TimeLog {
            id,
            card_id,
            user_id: input.user_id,
            minutes: input.minutes,
            note: input.note,
            logged_on,
            created_at: now,
        })
    }

    pub fn delete_time_log(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM time_logs WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
