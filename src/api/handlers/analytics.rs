//! Reporting endpoints. Window sizes arrive as query parameters and are
//! clamped here before reaching the store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{internal_error, not_found};
use crate::analytics::window;
use crate::db::Database;
use crate::models::*;

const WEEKS_DEFAULT: u32 = 8;
const WEEKS_MAX: u32 = 52;
const MONTHS_DEFAULT: u32 = 6;
const MONTHS_MAX: u32 = 24;
const SPRINTS_DEFAULT: u32 = 5;
const SPRINTS_MAX: u32 = 20;
const PRODUCTIVITY_WEEKS_DEFAULT: u32 = 4;
const PRODUCTIVITY_WEEKS_MAX: u32 = 26;

pub async fn board_stats(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<BoardStats>, (StatusCode, String)> {
    db.board_stats(id, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn stats_by_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusCount>>, (StatusCode, String)> {
    db.stats_by_status(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn stats_by_priority(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PriorityCount>>, (StatusCode, String)> {
    db.stats_by_priority(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn weekly_rollup(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<RollupBucket>>, (StatusCode, String)> {
    let weeks = window(query.weeks, WEEKS_DEFAULT, WEEKS_MAX);
    db.weekly_rollup(id, weeks, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn monthly_rollup(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<RollupBucket>>, (StatusCode, String)> {
    let months = window(query.months, MONTHS_DEFAULT, MONTHS_MAX);
    db.monthly_rollup(id, months, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn velocity(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<VelocityReport>, (StatusCode, String)> {
    let sprints = window(query.sprints, SPRINTS_DEFAULT, SPRINTS_MAX);
    db.velocity(id, sprints, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn productivity(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ProductivityReport>, (StatusCode, String)> {
    let weeks = window(
        query.weeks,
        PRODUCTIVITY_WEEKS_DEFAULT,
        PRODUCTIVITY_WEEKS_MAX,
    );
    db.productivity(id, weeks, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}

pub async fn dashboard(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Dashboard>, (StatusCode, String)> {
    db.dashboard(id, query.as_of_or_today())
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Board"))
}
