use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use crate::api::CaixaProvider;
use crate::db::Datastore;
use crate::service::Synchronizer;

mod handlers;
mod router;
mod types;

use types::RouterState;

pub const HTTP_HOST: &str = "LOTOFACIL_HTTP_HOST";
pub const HTTP_PORT: &str = "LOTOFACIL_HTTP_PORT";
/// Port variable set by most hosting platforms, used when `LOTOFACIL_HTTP_PORT` is absent
pub const PLATFORM_PORT: &str = "PORT";

#[derive(Clone)]
pub struct HttpServer {
    state: RouterState,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(
        store: Datastore,
        synchronizer: Synchronizer<CaixaProvider, Datastore>,
        config: &HttpServerConfig,
    ) -> Self {
        Self {
            state: RouterState {
                store,
                synchronizer: Arc::new(synchronizer),
            },
            addr: config.socket_addr(),
        }
    }

    /// Bind and serve in a background task. Returns the bound address, which
    /// differs from the configured one when port 0 was asked for.
    pub async fn start(&self) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
        let app = router::build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let addr = listener.local_addr()?;
        log::info!("HTTP server listening on {addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("HTTP server stopped: {e}");
            }
        });

        Ok((addr, handle))
    }

    /// Serve until `shutdown` resolves, letting in-flight requests finish
    pub async fn serve_until<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router::build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        log::info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        log::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
        }
    }
}

impl HttpServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup(HTTP_HOST).unwrap_or(defaults.host);
        let port = lookup(HTTP_PORT)
            .or_else(|| lookup(PLATFORM_PORT))
            .and_then(|value| match value.trim().parse() {
                Ok(port) => Some(port),
                Err(e) => {
                    log::warn!("Invalid HTTP port {value}: {e}, using {}", defaults.port);
                    None
                }
            })
            .unwrap_or(defaults.port);

        Self { host, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        let ip: IpAddr = self.host.parse().unwrap_or_else(|_| {
            log::warn!("Invalid HTTP host {}, binding to localhost", self.host);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        });
        SocketAddr::new(ip, self.port)
    }
}
