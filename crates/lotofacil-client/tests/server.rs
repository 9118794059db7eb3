use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use lotofacil_client::api::{ApiProvider, CaixaProvider, DrawData};
use lotofacil_client::server::{HttpServer, HttpServerConfig};
use lotofacil_client::{Datastore, Synchronizer};
use serde_json::Value;

type Published = Arc<Mutex<BTreeMap<i64, DrawData>>>;

const NUMBERS: [u8; 15] = [1, 3, 4, 6, 8, 9, 10, 11, 13, 14, 16, 18, 20, 23, 25];

fn publish(published: &Published, draw_numbers: impl IntoIterator<Item = i64>) {
    let mut draws = published.lock().expect("lock");
    for n in draw_numbers {
        draws.insert(n, DrawData::new(n, "05/12/2025", &NUMBERS));
    }
}

async fn latest(State(published): State<Published>) -> Response {
    let draws = published.lock().expect("lock");
    match draws.values().next_back() {
        Some(draw) => Json(draw.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn specified(State(published): State<Published>, Path(n): Path<i64>) -> Response {
    let draws = published.lock().expect("lock");
    match draws.get(&n) {
        Some(draw) => Json(draw.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Caixa-shaped upstream serving whatever is in `published`
async fn spawn_upstream(published: Published) -> anyhow::Result<SocketAddr> {
    let app = Router::new()
        .route("/lotofacil", get(latest))
        .route("/lotofacil/:n", get(specified))
        .with_state(published);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

/// Address nothing listens on
async fn closed_port() -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

struct TestApp {
    base: String,
    store: Datastore,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

async fn spawn_app(upstream: SocketAddr) -> anyhow::Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let url = dir.path().join("resultados.db").display().to_string();
    let store = Datastore::connect(&url)?;
    store.migrate()?;

    let provider =
        CaixaProvider::with_base_url(ApiProvider::Custom, &format!("http://{upstream}/lotofacil"));
    let synchronizer = Synchronizer::new(provider, store.clone());
    let config = HttpServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
    };

    let (addr, _handle) = HttpServer::new(store.clone(), synchronizer, &config)
        .start()
        .await?;

    Ok(TestApp {
        base: format!("http://{addr}"),
        store,
        client: reqwest::Client::new(),
        _dir: dir,
    })
}

impl TestApp {
    async fn get(&self, path: &str) -> anyhow::Result<(StatusCode, Value)> {
        let resp = self.client.get(format!("{}{path}", self.base)).send().await?;
        let status = StatusCode::from_u16(resp.status().as_u16())?;
        Ok((status, resp.json().await?))
    }

    async fn run_worker(&self, method: reqwest::Method) -> anyhow::Result<(StatusCode, Value)> {
        let resp = self
            .client
            .request(method, format!("{}/api/worker/run", self.base))
            .send()
            .await?;
        let status = StatusCode::from_u16(resp.status().as_u16())?;
        Ok((status, resp.json().await?))
    }
}

#[tokio::test]
async fn worker_fills_missing_draws_and_results_are_served() -> anyhow::Result<()> {
    let published = Published::default();
    publish(&published, [1, 2, 3]);
    let app = spawn_app(spawn_upstream(published.clone()).await?).await?;

    let (status, body) = app.run_worker(reqwest::Method::POST).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["recordsAdded"], 3);
    assert_eq!(body["data"]["lastKnownDraw"], 3);
    assert_eq!(app.store.count_draws()?, 3);

    let (status, body) = app.get("/api/resultados?limit=1").await?;
    assert_eq!(status, StatusCode::OK);
    let draws = body["data"].as_array().expect("array of draws");
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0]["concurso"], 3);
    assert_eq!(draws[0]["data"], "2025-12-05");
    assert_eq!(
        draws[0]["dezenas"],
        "01 03 04 06 08 09 10 11 13 14 16 18 20 23 25"
    );

    let (status, body) = app.get("/api/resultados/2").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["concurso"], 2);

    let (status, body) = app.get("/api/resultados/99").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    Ok(())
}

#[tokio::test]
async fn worker_accepts_any_method_and_is_idempotent() -> anyhow::Result<()> {
    let published = Published::default();
    publish(&published, [1, 2]);
    let app = spawn_app(spawn_upstream(published.clone()).await?).await?;

    let (status, body) = app.run_worker(reqwest::Method::GET).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["recordsAdded"], 2);

    let (status, body) = app.run_worker(reqwest::Method::PUT).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["recordsAdded"], 0);
    assert_eq!(body["data"]["message"], "already up to date");

    publish(&published, [3]);
    let (status, body) = app.run_worker(reqwest::Method::DELETE).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["recordsAdded"], 1);
    assert_eq!(body["data"]["previousLocalMax"], 2);
    assert_eq!(app.store.count_draws()?, 3);
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() -> anyhow::Result<()> {
    let app = spawn_app(closed_port().await?).await?;

    let (status, body) = app.run_worker(reqwest::Method::POST).await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "upstream_unreachable");
    assert_eq!(app.store.count_draws()?, 0);
    Ok(())
}

#[tokio::test]
async fn limit_defaults_and_caps() -> anyhow::Result<()> {
    let published = Published::default();
    publish(&published, 1..=12);
    let app = spawn_app(spawn_upstream(published).await?).await?;
    app.run_worker(reqwest::Method::POST).await?;

    for (query, expected) in [("", 10), ("?limit=abc", 10), ("?limit=0", 10), ("?limit=500", 12)] {
        let (status, body) = app.get(&format!("/api/resultados{query}")).await?;
        assert_eq!(status, StatusCode::OK, "{query}");
        let draws = body["data"].as_array().expect("array of draws");
        assert_eq!(draws.len(), expected, "{query}");
        assert_eq!(draws[0]["concurso"], 12, "{query}");
    }
    Ok(())
}

#[tokio::test]
async fn health_root_and_unknown_routes() -> anyhow::Result<()> {
    let app = spawn_app(closed_port().await?).await?;

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let resp = app.client.get(format!("{}/", app.base)).send().await?;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp.text().await?.contains("Lotofácil"), "root banner");

    let (status, body) = app.get("/api/nope").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = app.get("/api/docs/openapi.json").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
