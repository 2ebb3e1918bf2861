use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{now, parse_datetime, parse_uuid, require_text, timestamp, Database};
use crate::models::*;

pub(super) const USER_COLUMNS: &str = "u.id, u.name, u.email, u.created_at";

pub(super) fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_datetime(row.get(3)?),
    })
}

pub(super) fn user_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS),
            [id.to_string()],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    pub fn get_all_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users u ORDER BY u.name",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.lock()?;
        user_by_id(&conn, id)
    }

    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        require_text(&input.name, "Name")?;
        require_text(&input.email, "Email")?;

        let conn = self.lock()?;
        let id = Uuid::new_v4();
        let now = now();
        let email = input.email.trim().to_lowercase();

        conn.execute(
            "INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)",
            (id.to_string(), &input.name, &email, timestamp(now)),
        )?;

        Ok(User {
            id,
            name: input.name,
            email,
            created_at: now,
        })
    }

    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}
