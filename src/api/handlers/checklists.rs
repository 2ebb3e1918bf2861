use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, Actor};
use crate::db::Database;
use crate::models::*;

pub async fn list_checklist(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChecklistItem>>, (StatusCode, String)> {
    db.get_checklist(id).map(Json).map_err(internal_error)
}

pub async fn create_checklist_item(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateChecklistItemInput>,
) -> Result<(StatusCode, Json<ChecklistItem>), (StatusCode, String)> {
    db.create_checklist_item(id, input, actor)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(internal_error)
}

pub async fn reorder_checklist(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<ReorderInput>,
) -> Result<Json<Vec<ChecklistItem>>, (StatusCode, String)> {
    db.reorder_checklist(id, input, actor)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_checklist_item(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChecklistItem>, (StatusCode, String)> {
    db.get_checklist_item(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Checklist item"))
}

pub async fn update_checklist_item(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateChecklistItemInput>,
) -> Result<Json<ChecklistItem>, (StatusCode, String)> {
    db.update_checklist_item(id, input, actor)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Checklist item"))
}

pub async fn delete_checklist_item(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_checklist_item(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Checklist item"))
    }
}
