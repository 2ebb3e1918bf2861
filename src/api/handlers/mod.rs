mod activity;
mod analytics;
mod boards;
mod cards;
mod checklists;
mod comments;
mod labels;
mod lists;
mod sprints;
mod time_logs;
mod users;

pub use activity::*;
pub use analytics::*;
pub use boards::*;
pub use cards::*;
pub use checklists::*;
pub use comments::*;
pub use labels::*;
pub use lists::*;
pub use sprints::*;
pub use time_logs::*;
pub use users::*;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::StoreError;

/// Header naming the user on whose behalf a request is made.
pub const ACTOR_HEADER: &str = "x-actor-id";

// ============================================================
// Error Handling
// ============================================================

/// Map a storage error to a response.
///
/// Domain errors carry a message meant for the client. Anything else is
/// logged in full and answered with a generic 500.
fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(err) = e.downcast_ref::<StoreError>() {
        let status = match err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
        };
        tracing::warn!("Rejected request: {}", err);
        return (status, err.to_string());
    }

    if let Some(rusqlite::Error::SqliteFailure(failure, _)) = e.downcast_ref::<rusqlite::Error>() {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            tracing::warn!("Constraint violation: {}", e);
            return (
                StatusCode::CONFLICT,
                "Conflicts with existing data".to_string(),
            );
        }
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(entity: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", entity))
}

// ============================================================
// Actor
// ============================================================

/// The user taken from the `X-Actor-Id` header, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actor(pub Option<Uuid>);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACTOR_HEADER) else {
            return Ok(Actor(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(|id| Actor(Some(id)))
            .ok_or((
                StatusCode::BAD_REQUEST,
                "X-Actor-Id must be a UUID".to_string(),
            ))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
