use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{internal_error, not_found};
use crate::db::Database;
use crate::models::*;

#[derive(Debug, Default, Deserialize)]
pub struct BoardListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn list_boards(
    State(db): State<Database>,
    Query(query): Query<BoardListQuery>,
) -> Result<Json<Vec<Board>>, (StatusCode, String)> {
    db.get_all_boards(query.include_archived)
        .map(Json)
        .map_err(internal_error)
}

/// The board with its lists (and their cards), labels and members.
pub async fn get_board(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<BoardDetail>, (StatusCode, String)> {
    db.get_board_detail(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn create_board(
    State(db): State<Database>,
    Json(input): Json<CreateBoardInput>,
) -> Result<(StatusCode, Json<Board>), (StatusCode, String)> {
    db.create_board(input)
        .map(|b| (StatusCode::CREATED, Json(b)))
        .map_err(internal_error)
}

pub async fn update_board(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBoardInput>,
) -> Result<Json<Board>, (StatusCode, String)> {
    db.update_board(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn delete_board(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_board(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Board"))
    }
}

// ============================================================
// Members
// ============================================================

pub async fn list_board_members(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BoardMember>>, (StatusCode, String)> {
    db.get_board_members(id).map(Json).map_err(internal_error)
}

pub async fn add_board_member(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddMemberInput>,
) -> Result<(StatusCode, Json<BoardMember>), (StatusCode, String)> {
    db.add_board_member(id, input)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(internal_error)
}

pub async fn remove_board_member(
    State(db): State<Database>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.remove_board_member(id, user_id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Member"))
    }
}
