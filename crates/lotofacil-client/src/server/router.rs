use std::sync::Arc;

use aide::axum::{ApiRouter, routing::get};
use aide::openapi::{Info, OpenApi};
use aide::scalar::Scalar;
use axum::{
    Extension, Json, Router,
    routing::{any as axum_any, get as axum_get},
};

use super::handlers::{get_result, get_results, health, not_found, root, trigger_sync};
use super::types::RouterState;

pub(super) fn build_router(state: RouterState) -> Router {
    let mut api = OpenApi {
        info: Info {
            title: "Lotofácil results API".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            ..Default::default()
        },
        ..Default::default()
    };

    let app = ApiRouter::new()
        .route(
            "/api/docs",
            Scalar::new("/api/docs/openapi.json")
                .with_title("Lotofácil API Docs")
                .axum_route(),
        )
        .api_route("/health", get(health))
        .api_route("/api/resultados", get(get_results))
        .api_route("/api/resultados/:concurso", get(get_result))
        .with_state(state.clone())
        .finish_api(&mut api);

    let api = Arc::new(api);
    app.route("/", axum_get(root))
        .route(
            "/api/worker/run",
            axum_any(trigger_sync).with_state(state),
        )
        .route("/api/docs/openapi.json", axum_get(serve_openapi))
        .fallback(not_found)
        .layer(Extension(api))
}

async fn serve_openapi(Extension(api): Extension<Arc<OpenApi>>) -> Json<OpenApi> {
    Json((*api).clone())
}
