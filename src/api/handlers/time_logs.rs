use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, Actor};
use crate::db::Database;
use crate::models::*;

pub async fn list_time_logs(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimeLog>>, (StatusCode, String)> {
    db.get_time_logs(id).map(Json).map_err(internal_error)
}

pub async fn create_time_log(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateTimeLogInput>,
) -> Result<(StatusCode, Json<TimeLog>), (StatusCode, String)> {
    db.create_time_log(id, input, actor)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(internal_error)
}

pub async fn delete_time_log(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_time_log(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Time log"))
    }
}
