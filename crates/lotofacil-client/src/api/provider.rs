use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use strum_macros::{Display, EnumIter};
use tokio::sync::{Mutex, Semaphore};

use super::rest::caixa::common::DrawData;

pub mod caixa;

/// Upstream services able to serve Lotofácil draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ApiProvider {
    /// Official Caixa lottery portal
    #[strum(to_string = "caixa")]
    Caixa,
    /// Caixa-compatible mirror configured by the operator
    #[strum(to_string = "custom")]
    Custom,
}

impl ApiProvider {
    /// Get the QPS limit for this provider
    pub fn qps_limit(&self) -> usize {
        match self {
            Self::Caixa => 5,
            Self::Custom => 20,
        }
    }

    /// Get the unique identifier for this provider
    pub fn id(&self) -> &'static str {
        match self {
            Self::Caixa => "caixa",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for ApiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "caixa" => Ok(Self::Caixa),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Invalid provider: {s}")),
        }
    }
}

/// Request that can be executed through a provider (protocol-agnostic)
#[expect(async_fn_in_trait)]
pub trait ProviderRequest: Send + 'static {
    type Response: Send + 'static;

    async fn execute(self) -> anyhow::Result<Self::Response>;
}

/// Source of upstream draws used by the synchronizer
#[expect(async_fn_in_trait)]
pub trait DrawProvider: Send + Sync {
    fn provider_type(&self) -> ApiProvider;

    /// Current latest draw. An error here means there is nothing to reconcile against.
    async fn latest_draw(&self) -> anyhow::Result<DrawData>;

    /// A specific draw, `None` when upstream does not know it yet
    async fn specified_draw(&self, draw_number: i64) -> anyhow::Result<Option<DrawData>>;
}

/// QPS-limited executor shared by all requests of one provider
#[derive(Debug)]
pub struct QpsLimitedExecutor {
    provider: ApiProvider,
    qps_limit: usize,
    semaphore: Arc<Semaphore>,
    last_request_time: Arc<Mutex<Option<Instant>>>,
}

impl QpsLimitedExecutor {
    pub fn new(provider: ApiProvider) -> Self {
        Self::with_qps(provider, provider.qps_limit())
    }

    pub fn with_qps(provider: ApiProvider, qps_limit: usize) -> Self {
        Self {
            provider,
            qps_limit,
            semaphore: Arc::new(Semaphore::new(1)),
            last_request_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Execute a request with QPS limiting
    pub async fn execute<R>(&self, request: R) -> anyhow::Result<R::Response>
    where
        R: ProviderRequest,
    {
        // one request in flight per provider
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to acquire semaphore permit: {e}"))?;

        let delay = {
            let last_time = self.last_request_time.lock().await;
            match (*last_time, self.qps_limit) {
                (None, _) => Duration::ZERO,
                (Some(_), 0) => {
                    log::warn!(
                        "QPS limit for provider {} is 0, skipping delay calculation",
                        self.provider.id()
                    );
                    Duration::ZERO
                }
                (Some(last_time), qps) => {
                    let min_interval = Duration::from_secs_f64(1.0 / qps as f64);
                    min_interval.saturating_sub(last_time.elapsed())
                }
            }
        };

        if delay > Duration::ZERO {
            log::debug!(
                "Provider {} QPS limiting: waiting {delay:?}",
                self.provider.id()
            );
            tokio::time::sleep(delay).await;
        }

        log::debug!("Executing request for provider: {}", self.provider.id());
        let response = request.execute().await;

        *self.last_request_time.lock().await = Some(Instant::now());

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl ProviderRequest for Noop {
        type Response = ();

        async fn execute(self) -> anyhow::Result<Self::Response> {
            Ok(())
        }
    }

    #[test]
    fn provider_names_round_trip() {
        for provider in [ApiProvider::Caixa, ApiProvider::Custom] {
            assert_eq!(provider.id().parse::<ApiProvider>(), Ok(provider));
            assert_eq!(provider.to_string(), provider.id());
        }
        assert!("megasena".parse::<ApiProvider>().is_err());
    }

    #[tokio::test]
    async fn first_request_is_not_delayed() -> anyhow::Result<()> {
        let executor = QpsLimitedExecutor::with_qps(ApiProvider::Custom, 1);

        let start = Instant::now();
        executor.execute(Noop).await?;

        assert!(start.elapsed() < Duration::from_millis(500));
        Ok(())
    }

    #[tokio::test]
    async fn consecutive_requests_are_spaced_by_qps() -> anyhow::Result<()> {
        let executor = QpsLimitedExecutor::with_qps(ApiProvider::Custom, 10);

        let start = Instant::now();
        for _ in 0..4 {
            executor.execute(Noop).await?;
        }

        // three gaps of at least 100ms each
        assert!(
            start.elapsed() >= Duration::from_millis(280),
            "took only {:?}",
            start.elapsed()
        );
        Ok(())
    }
}
