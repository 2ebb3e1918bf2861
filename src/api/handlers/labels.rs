use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found};
use crate::db::Database;
use crate::models::*;

pub async fn list_labels(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Label>>, (StatusCode, String)> {
    db.get_labels(id).map(Json).map_err(internal_error)
}

pub async fn create_label(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateLabelInput>,
) -> Result<(StatusCode, Json<Label>), (StatusCode, String)> {
    db.create_label(id, input)
        .map(|l| (StatusCode::CREATED, Json(l)))
        .map_err(internal_error)
}

pub async fn delete_label(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_label(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Label"))
    }
}
