use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::internal_error;
use crate::db::Database;
use crate::models::*;

pub async fn get_card_activity(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<CardActivity>>, (StatusCode, String)> {
    db.get_card_activity(id, &query)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_board_activity(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<CardActivity>>, (StatusCode, String)> {
    db.get_board_activity(id, &query)
        .map(Json)
        .map_err(internal_error)
}
