//! SQLite-backed storage for boards and everything on them.
//!
//! A single connection sits behind a mutex. Public methods lock once and hand
//! the connection (or a transaction) to private helpers that take `&Connection`,
//! so multi-step mutations never re-enter the lock and activity entries are
//! committed together with the change they describe.

mod activity;
mod analytics;
mod boards;
mod cards;
mod checklists;
mod comments;
mod labels;
mod lists;
mod schema;
mod sprints;
mod time_logs;
mod users;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ActivityAction;

/// Domain failures surfaced to callers, carried inside `anyhow::Error`.
///
/// The HTTP layer downcasts to this type to pick a status code; anything
/// else is treated as an internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database named by `BOARDWALK_DB`, or `boardwalk.db` in the
    /// platform data directory.
    pub fn open_default() -> Result<Self> {
        if let Ok(path) = std::env::var("BOARDWALK_DB") {
            return Self::open(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("", "", "boardwalk")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("boardwalk.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Current time at the precision we store, so values read back compare equal.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Fixed-width RFC 3339 (`2026-10-19T08:30:00.000Z`) so stored timestamps
/// sort lexicographically.
pub(crate) fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_default()
}

fn date_string(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Dates are stored as four-digit `YYYY-MM-DD` text, so only years 1 to 9999
/// can be stored or reported on.
fn require_date(day: NaiveDate, field: &str) -> Result<()> {
    if !(1..=9999).contains(&day.year()) {
        return Err(StoreError::Invalid(format!(
            "{} must fall between 0001-01-01 and 9999-12-31",
            field
        ))
        .into());
    }
    Ok(())
}

/// Append an entry to the activity log. Callers pass the transaction that
/// performs the mutation being recorded.
fn log_activity(
    conn: &Connection,
    card_id: Uuid,
    board_id: Uuid,
    actor: Option<Uuid>,
    action: ActivityAction,
    details: serde_json::Value,
) -> Result<()> {
    conn.execute(
        "INSERT INTO card_activities (id, card_id, board_id, actor_id, action, details, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            card_id.to_string(),
            board_id.to_string(),
            actor.map(|u| u.to_string()),
            action.as_str(),
            details.to_string(),
            timestamp(now()),
        ),
    )?;
    tracing::debug!("Card {} activity: {}", card_id, action.as_str());
    Ok(())
}

/// Check that `ids` names every sibling exactly once.
fn validate_order(existing: &[Uuid], ids: &[Uuid]) -> Result<()> {
    let mut want: Vec<Uuid> = existing.to_vec();
    let mut got: Vec<Uuid> = ids.to_vec();
    want.sort();
    got.sort();
    if want != got {
        return Err(StoreError::Invalid(
            "Order must list every item exactly once".to_string(),
        )
        .into());
    }
    Ok(())
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{} must not be empty", field)).into());
    }
    Ok(())
}
