use axum::{Json, http::StatusCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::CaixaProvider;
use crate::db::Datastore;
use crate::service::Synchronizer;

#[derive(Clone)]
pub(super) struct RouterState {
    pub(super) store: Datastore,
    pub(super) synchronizer: Arc<Synchronizer<CaixaProvider, Datastore>>,
}

#[derive(Serialize, JsonSchema)]
pub(super) struct ApiResponse {
    success: bool,
    data: Option<Value>,
    error: Option<ApiError>,
}

#[derive(Serialize, JsonSchema)]
pub(super) struct ApiError {
    code: &'static str,
    message: String,
}

pub(super) type ApiResult = (StatusCode, Json<ApiResponse>);

pub(super) fn ok_value(value: Value) -> ApiResult {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: Some(value),
            error: None,
        }),
    )
}

/// Serialize `data` into a success envelope
pub(super) fn ok_json<T: Serialize>(data: &T) -> ApiResult {
    match serde_json::to_value(data) {
        Ok(value) => ok_value(value),
        Err(e) => err_response(StatusCode::INTERNAL_SERVER_ERROR, "serialize", e.to_string()),
    }
}

pub(super) fn err_response(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> ApiResult {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }),
    )
}

#[derive(Deserialize, JsonSchema)]
pub(super) struct ResultsQuery {
    /// How many of the most recent draws to return (default 10, at most 100)
    pub(super) limit: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(super) struct DrawPath {
    pub(super) concurso: i64,
}
