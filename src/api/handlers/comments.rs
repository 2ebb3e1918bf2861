use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, Actor};
use crate::db::Database;
use crate::models::*;

pub async fn list_comments(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, (StatusCode, String)> {
    db.get_comments(id).map(Json).map_err(internal_error)
}

/// The actor, if any, becomes the comment's author.
pub async fn create_comment(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), (StatusCode, String)> {
    db.create_comment(id, input, actor)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn update_comment(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CommentInput>,
) -> Result<Json<Comment>, (StatusCode, String)> {
    db.update_comment(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Comment"))
}

pub async fn delete_comment(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_comment(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Comment"))
    }
}
