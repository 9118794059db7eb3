//! Lotofácil results mirror
//!
//! Keeps a local `resultados` table in step with the upstream draw API and
//! serves it over HTTP. The synchronizer lives in [`service::sync`], the
//! upstream providers in [`api`], storage in [`db`].

use std::{path::PathBuf, sync::LazyLock};

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod server;
pub mod service;

pub use config::AppConfig;
pub use db::Datastore;
pub use service::sync::{SyncError, SyncSummary, Synchronizer};

/// Path of the loaded `.env` file, resolved once per process
pub static ENV_GUARD: LazyLock<anyhow::Result<PathBuf>> = LazyLock::new(|| {
    dotenvy::dotenv().map_err(|e| anyhow::anyhow!("Failed to load .env file: {e}"))
});

/// Directory holding `api.toml` and `api/`: next to `.env`, or the working directory
pub fn config_root() -> PathBuf {
    match ENV_GUARD.as_ref() {
        Ok(env_file_path) => env_file_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        Err(e) => {
            log::debug!("{e}, falling back to the working directory");
            PathBuf::from(".")
        }
    }
}

/// Load `.env` and install the logger.
///
/// `level` overrides `RUST_LOG` when given. Calling it twice is harmless.
pub fn setup(level: Option<log::LevelFilter>) {
    LazyLock::force(&ENV_GUARD);

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }

    if let Err(e) = builder.try_init() {
        log::debug!("Logger already initialised: {e}");
    }
}

#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
