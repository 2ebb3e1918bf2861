use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found};
use crate::db::Database;
use crate::models::*;

pub async fn list_sprints(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Sprint>>, (StatusCode, String)> {
    db.get_sprints(id).map(Json).map_err(internal_error)
}

pub async fn create_sprint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateSprintInput>,
) -> Result<(StatusCode, Json<Sprint>), (StatusCode, String)> {
    db.create_sprint(id, input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(internal_error)
}

pub async fn get_sprint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Sprint>, (StatusCode, String)> {
    db.get_sprint(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Sprint"))
}

pub async fn update_sprint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSprintInput>,
) -> Result<Json<Sprint>, (StatusCode, String)> {
    db.update_sprint(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Sprint"))
}

pub async fn delete_sprint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_sprint(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Sprint"))
    }
}

pub async fn sprint_burndown(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Burndown>, (StatusCode, String)> {
    db.burndown(id, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Sprint"))
}
