use std::path::Path;

use anyhow::Context as _;

use crate::api::{ApiConfig, ApiProvider, CaixaProvider};
use crate::db::Datastore;
use crate::server::HttpServerConfig;
use crate::service::Synchronizer;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const PROVIDER: &str = "LOTOFACIL_PROVIDER";
pub const SYNC_MAX_BACKFILL: &str = "LOTOFACIL_SYNC_MAX_BACKFILL";

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub http: HttpServerConfig,
    pub provider: ApiProvider,
    /// `None` backfills every missing draw in one run
    pub max_backfill: Option<usize>,
    pub api: ApiConfig,
}

impl AppConfig {
    /// Read settings from the environment (after `.env`) and the API config files
    pub fn from_env() -> anyhow::Result<Self> {
        let root = crate::config_root();
        Self::from_lookup(|key| std::env::var(key).ok(), &root)
    }

    pub fn from_lookup<F>(lookup: F, config_root: &Path) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .with_context(|| format!("{DATABASE_URL} must be set"))?;

        let provider = match lookup(PROVIDER) {
            Some(value) => value
                .parse::<ApiProvider>()
                .map_err(|e| anyhow::anyhow!("{PROVIDER}: {e}"))?,
            None => ApiProvider::Caixa,
        };

        let max_backfill = match lookup(SYNC_MAX_BACKFILL) {
            Some(value) => {
                let cap = value
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("{SYNC_MAX_BACKFILL} must be a number, got {value}"))?;
                if cap == 0 {
                    anyhow::bail!("{SYNC_MAX_BACKFILL} must be greater than 0");
                }
                Some(cap)
            }
            None => None,
        };

        let api = ApiConfig::load(config_root)?;

        Ok(Self {
            database_url,
            http: HttpServerConfig::from_lookup(&lookup),
            provider,
            max_backfill,
            api,
        })
    }

    /// Open the database and apply the schema
    pub fn open_datastore(&self) -> anyhow::Result<Datastore> {
        let store = Datastore::connect(&self.database_url)?;
        store.migrate()?;
        Ok(store)
    }

    pub fn build_synchronizer(
        &self,
        store: Datastore,
    ) -> anyhow::Result<Synchronizer<CaixaProvider, Datastore>> {
        let provider = CaixaProvider::from_config(&self.api, self.provider)?;
        Ok(Synchronizer::new(provider, store).with_max_backfill(self.max_backfill))
    }
}
