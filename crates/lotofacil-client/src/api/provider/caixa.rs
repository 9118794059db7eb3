use strum_macros::Display;

use super::{ApiProvider, DrawProvider, QpsLimitedExecutor};
use crate::api::{
    ApiCommon, ApiConfig, Protocol,
    rest::caixa::{
        common::DrawData, latest_draw::LatestDrawRequest, specified_draw::SpecifiedDrawRequest,
    },
};

/// Draw provider speaking the Caixa portal wire format.
///
/// Serves both the official portal and `custom` mirrors of it; only the
/// endpoints and the QPS budget differ.
#[derive(Debug)]
pub struct CaixaProvider {
    provider: ApiProvider,
    client: reqwest::Client,
    latest: ApiCommon,
    specified: ApiCommon,
    executor: QpsLimitedExecutor,
}

#[derive(Debug, Clone, Copy, Display)]
pub enum CaixaApi {
    #[strum(to_string = "latest_draw")]
    LatestDraw,
    #[strum(to_string = "specified_draw")]
    SpecifiedDraw,
}

impl CaixaProvider {
    pub fn from_config(config: &ApiConfig, provider: ApiProvider) -> anyhow::Result<Self> {
        let latest = create_api_common(config, provider, CaixaApi::LatestDraw)?;
        let specified = create_api_common(config, provider, CaixaApi::SpecifiedDraw)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = latest.timeout().max(specified.timeout()) {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        log::debug!(
            "Provider {} uses {} (latest) and {} (specified)",
            provider.id(),
            latest.url(),
            specified.url()
        );

        Ok(Self {
            provider,
            client,
            latest,
            specified,
            executor: QpsLimitedExecutor::new(provider),
        })
    }

    /// Provider for a Caixa-compatible service at `base_url`, without retries
    pub fn with_base_url(provider: ApiProvider, base_url: &str) -> Self {
        let common = |api: CaixaApi| ApiCommon {
            name: api.to_string(),
            url: base_url.trim_end_matches('/').to_owned(),
            timeout_ms: None,
            max_retries: 0,
        };

        Self {
            provider,
            client: reqwest::Client::new(),
            latest: common(CaixaApi::LatestDraw),
            specified: common(CaixaApi::SpecifiedDraw),
            executor: QpsLimitedExecutor::new(provider),
        }
    }
}

fn create_api_common(
    config: &ApiConfig,
    provider: ApiProvider,
    api: CaixaApi,
) -> anyhow::Result<ApiCommon> {
    let rest = config.get_api_config(provider, Protocol::Rest, &api.to_string())?;

    Ok(ApiCommon {
        name: rest.api_name,
        url: rest.base_url.trim_end_matches('/').to_owned(),
        timeout_ms: rest.timeout_ms,
        max_retries: rest.max_retries.unwrap_or(0),
    })
}

impl DrawProvider for CaixaProvider {
    fn provider_type(&self) -> ApiProvider {
        self.provider
    }

    async fn latest_draw(&self) -> anyhow::Result<DrawData> {
        let request = LatestDrawRequest::new(self.client.clone(), &self.latest);
        self.executor.execute(request).await
    }

    async fn specified_draw(&self, draw_number: i64) -> anyhow::Result<Option<DrawData>> {
        let request = SpecifiedDrawRequest::new(self.client.clone(), &self.specified, draw_number);
        self.executor.execute(request).await
    }
}
