mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::db::Database;
pub use handlers::{Actor, ACTOR_HEADER};
pub use middleware::{RateLimiter, SecurityConfig};

/// Router with security disabled, for local use and tests.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, SecurityConfig::disabled())
}

pub fn create_router_with_config(db: Database, config: SecurityConfig) -> Router {
    let mut api = Router::new()
        // Users
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route("/users/{id}", get(handlers::get_user).delete(handlers::delete_user))
        // Boards
        .route("/boards", get(handlers::list_boards).post(handlers::create_board))
        .route(
            "/boards/{id}",
            get(handlers::get_board)
                .put(handlers::update_board)
                .delete(handlers::delete_board),
        )
        .route(
            "/boards/{id}/members",
            get(handlers::list_board_members).post(handlers::add_board_member),
        )
        .route(
            "/boards/{id}/members/{user_id}",
            delete(handlers::remove_board_member),
        )
        // Lists
        .route(
            "/boards/{id}/lists",
            get(handlers::list_board_lists).post(handlers::create_list),
        )
        .route("/boards/{id}/lists/order", put(handlers::reorder_lists))
        .route(
            "/lists/{id}",
            get(handlers::get_list)
                .put(handlers::update_list)
                .delete(handlers::delete_list),
        )
        // Cards
        .route(
            "/lists/{id}/cards",
            get(handlers::list_cards).post(handlers::create_card),
        )
        .route("/boards/{id}/cards", get(handlers::search_cards))
        .route(
            "/cards/{id}",
            get(handlers::get_card)
                .put(handlers::update_card)
                .delete(handlers::delete_card),
        )
        .route("/cards/{id}/move", post(handlers::move_card))
        .route(
            "/cards/{id}/assignees",
            get(handlers::list_card_assignees).post(handlers::assign_user),
        )
        .route(
            "/cards/{id}/assignees/{user_id}",
            delete(handlers::unassign_user),
        )
        .route(
            "/cards/{id}/labels",
            get(handlers::list_card_labels).post(handlers::add_card_label),
        )
        .route(
            "/cards/{id}/labels/{label_id}",
            delete(handlers::remove_card_label),
        )
        // Labels
        .route(
            "/boards/{id}/labels",
            get(handlers::list_labels).post(handlers::create_label),
        )
        .route("/labels/{id}", delete(handlers::delete_label))
        // Checklist
        .route(
            "/cards/{id}/checklist",
            get(handlers::list_checklist).post(handlers::create_checklist_item),
        )
        .route("/cards/{id}/checklist/order", put(handlers::reorder_checklist))
        .route(
            "/checklist-items/{id}",
            get(handlers::get_checklist_item)
                .put(handlers::update_checklist_item)
                .delete(handlers::delete_checklist_item),
        )
        // Comments
        .route(
            "/cards/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/comments/{id}",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
        // Activity
        .route("/cards/{id}/activity", get(handlers::get_card_activity))
        .route("/boards/{id}/activity", get(handlers::get_board_activity))
        // Time logs
        .route(
            "/cards/{id}/time-logs",
            get(handlers::list_time_logs).post(handlers::create_time_log),
        )
        .route("/time-logs/{id}", delete(handlers::delete_time_log))
        // Sprints
        .route(
            "/boards/{id}/sprints",
            get(handlers::list_sprints).post(handlers::create_sprint),
        )
        .route(
            "/sprints/{id}",
            get(handlers::get_sprint)
                .put(handlers::update_sprint)
                .delete(handlers::delete_sprint),
        )
        .route("/sprints/{id}/burndown", get(handlers::sprint_burndown))
        // Analytics
        .route("/boards/{id}/stats", get(handlers::board_stats))
        .route("/boards/{id}/stats/status", get(handlers::stats_by_status))
        .route("/boards/{id}/stats/priority", get(handlers::stats_by_priority))
        .route("/boards/{id}/rollups/weekly", get(handlers::weekly_rollup))
        .route("/boards/{id}/rollups/monthly", get(handlers::monthly_rollup))
        .route("/boards/{id}/velocity", get(handlers::velocity))
        .route("/boards/{id}/productivity", get(handlers::productivity))
        .route("/boards/{id}/dashboard", get(handlers::dashboard))
        .layer(from_fn_with_state(config.clone(), middleware::auth_middleware));

    // Outside auth, so rejected credentials still count against the client.
    if let Some(limiter) = &config.rate_limiter {
        api = api.layer(from_fn_with_state(
            limiter.clone(),
            middleware::rate_limit_middleware,
        ));
    }

    let public = Router::new().route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api.merge(public))
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer())
        .with_state(db)
}
