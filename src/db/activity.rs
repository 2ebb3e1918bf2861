use anyhow::Result;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::models::*;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

fn activity_from_row(row: &Row) -> rusqlite::Result<CardActivity> {
    let details: String = row.get(5)?;
    Ok(CardActivity {
        id: parse_uuid(row.get(0)?),
        card_id: parse_uuid(row.get(1)?),
        board_id: parse_uuid(row.get(2)?),
        actor_id: row.get::<_, Option<String>>(3)?.map(parse_uuid),
        action: row
            .get::<_, String>(4)?
            .parse()
            .unwrap_or(ActivityAction::Updated),
        details: serde_json::from_str(&details).unwrap_or_default(),
        created_at: parse_datetime(row.get(6)?),
    })
}

fn page(query: &ActivityQuery) -> (i64, i64) {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (i64::from(limit), i64::from(query.offset.unwrap_or(0)))
}

/// Newest-first activity where `column = id`. `column` is a fixed identifier,
/// never user input.
fn activity_where(
    conn: &Connection,
    column: &str,
    id: Uuid,
    query: &ActivityQuery,
) -> Result<Vec<CardActivity>> {
    let (limit, offset) = page(query);
    let mut stmt = conn.prepare(&format!(
        "SELECT id, card_id, board_id, actor_id, action, details, created_at
         FROM card_activities WHERE {} = ?
         ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        column
    ))?;
    let entries = stmt
        .query_map((id.to_string(), limit, offset), activity_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub(super) fn recent_board_activity(
    conn: &Connection,
    board_id: Uuid,
    limit: u32,
) -> Result<Vec<CardActivity>> {
    activity_where(
        conn,
        "board_id",
        board_id,
        &ActivityQuery {
            limit: Some(limit),
            offset: None,
        },
    )
}

impl Database {
    pub fn get_card_activity(&self, card_id: Uuid, query: &ActivityQuery) -> Result<Vec<CardActivity>> {
        let conn = self.lock()?;
        activity_where(&conn, "card_id", card_id, query)
    }

    pub fn get_board_activity(
        &self,
        board_id: Uuid,
        query: &ActivityQuery,
    ) -> Result<Vec<CardActivity>> {
        let conn = self.lock()?;
        activity_where(&conn, "board_id", board_id, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_caps() {
        assert_eq!(page(&ActivityQuery::default()), (50, 0));
        assert_eq!(
            page(&ActivityQuery {
                limit: Some(1000),
                offset: Some(20)
            }),
            (200, 20)
        );
        assert_eq!(
            page(&ActivityQuery {
                limit: Some(0),
                offset: None
            }),
            (1, 0)
        );
    }
}
