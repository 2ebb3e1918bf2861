use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found};
use crate::db::Database;
use crate::models::*;

pub async fn list_board_lists(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BoardList>>, (StatusCode, String)> {
    db.get_lists(id).map(Json).map_err(internal_error)
}

pub async fn create_list(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateListInput>,
) -> Result<(StatusCode, Json<BoardList>), (StatusCode, String)> {
    db.create_list(id, input)
        .map(|l| (StatusCode::CREATED, Json(l)))
        .map_err(internal_error)
}

pub async fn reorder_lists(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReorderInput>,
) -> Result<Json<Vec<BoardList>>, (StatusCode, String)> {
    db.reorder_lists(id, input)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_list(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardList>, (StatusCode, String)> {
    db.get_list(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("List"))
}

pub async fn update_list(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateListInput>,
) -> Result<Json<BoardList>, (StatusCode, String)> {
    db.update_list(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("List"))
}

pub async fn delete_list(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_list(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("List"))
    }
}
