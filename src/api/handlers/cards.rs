use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found, Actor};
use crate::db::Database;
use crate::models::*;

pub async fn list_cards(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Card>>, (StatusCode, String)> {
    db.get_cards_by_list(id).map(Json).map_err(internal_error)
}

pub async fn search_cards(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(filter): Query<CardFilter>,
) -> Result<Json<Vec<Card>>, (StatusCode, String)> {
    db.search_cards(id, &filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_card(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateCardInput>,
) -> Result<(StatusCode, Json<Card>), (StatusCode, String)> {
    db.create_card(id, input, actor)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

/// The card with its assignees, labels, checklist and counters.
pub async fn get_card(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<CardDetail>, (StatusCode, String)> {
    db.get_card_detail(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Card"))
}

pub async fn update_card(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCardInput>,
) -> Result<Json<Card>, (StatusCode, String)> {
    db.update_card(id, input, actor)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Card"))
}

pub async fn move_card(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<MoveCardInput>,
) -> Result<Json<Card>, (StatusCode, String)> {
    db.move_card(id, input, actor)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Card"))
}

pub async fn delete_card(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_card(id, actor).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Card"))
    }
}

// ============================================================
// Assignees
// ============================================================

pub async fn list_card_assignees(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    db.get_card_assignees(id).map(Json).map_err(internal_error)
}

/// Returns the card's assignees; 201 if the user was newly assigned.
pub async fn assign_user(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<AssignUserInput>,
) -> Result<(StatusCode, Json<Vec<User>>), (StatusCode, String)> {
    let added = db
        .assign_user(id, input.user_id, actor)
        .map_err(internal_error)?;
    let assignees = db.get_card_assignees(id).map_err(internal_error)?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(assignees)))
}

pub async fn unassign_user(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db
        .unassign_user(id, user_id, actor)
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Assignee"))
    }
}

// ============================================================
// Card labels
// ============================================================

pub async fn list_card_labels(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Label>>, (StatusCode, String)> {
    db.get_card_labels(id).map(Json).map_err(internal_error)
}

/// Returns the card's labels; 201 if the label was newly attached.
pub async fn add_card_label(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<CardLabelInput>,
) -> Result<(StatusCode, Json<Vec<Label>>), (StatusCode, String)> {
    let added = db
        .add_card_label(id, input.label_id, actor)
        .map_err(internal_error)?;
    let labels = db.get_card_labels(id).map_err(internal_error)?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(labels)))
}

pub async fn remove_card_label(
    State(db): State<Database>,
    Actor(actor): Actor,
    Path((id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db
        .remove_card_label(id, label_id, actor)
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Card label"))
    }
}
