use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;

use crate::service::{SyncError, parse_limit};

use super::types::{
    ApiResult, DrawPath, ResultsQuery, RouterState, err_response, ok_json, ok_value,
};

pub(super) async fn root() -> &'static str {
    "Lotofácil results API is up."
}

pub(super) async fn health() -> ApiResult {
    ok_value(json!({"status": "ok"}))
}

pub(super) async fn get_results(
    State(state): State<RouterState>,
    Query(query): Query<ResultsQuery>,
) -> ApiResult {
    let limit = parse_limit(query.limit.as_deref());
    match state.store.latest_draws(limit) {
        Ok(draws) => ok_json(&draws),
        Err(e) => {
            log::error!("Failed to load latest {limit} draws: {e}");
            err_response(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
        }
    }
}

pub(super) async fn get_result(
    State(state): State<RouterState>,
    Path(path): Path<DrawPath>,
) -> ApiResult {
    match state.store.get_draw(path.concurso) {
        Ok(Some(draw)) => ok_json(&draw),
        Ok(None) => err_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("draw {} is not stored", path.concurso),
        ),
        Err(e) => err_response(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string()),
    }
}

/// Sync trigger for external schedulers; accepts any method
pub(super) async fn trigger_sync(State(state): State<RouterState>) -> ApiResult {
    log::info!("Sync triggered over HTTP");

    match state.synchronizer.sync().await {
        Ok(summary) => ok_json(&summary),
        Err(e @ SyncError::Upstream(_)) => {
            err_response(StatusCode::BAD_GATEWAY, "upstream_unreachable", e.to_string())
        }
        Err(e @ SyncError::Storage(_)) => {
            err_response(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
        }
    }
}

pub(super) async fn not_found() -> ApiResult {
    err_response(StatusCode::NOT_FOUND, "not_found", "no such route")
}
