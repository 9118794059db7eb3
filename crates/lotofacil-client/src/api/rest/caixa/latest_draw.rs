use crate::api::{ApiCommon, provider::ProviderRequest};

use super::common::{DrawData, fetch_draw};

/// `GET {base}`: the most recent draw
#[derive(Debug)]
pub struct LatestDrawRequest {
    client: reqwest::Client,
    common: ApiCommon,
}

impl LatestDrawRequest {
    pub fn new(client: reqwest::Client, common: &ApiCommon) -> Self {
        Self {
            client,
            common: common.clone(),
        }
    }
}

impl ProviderRequest for LatestDrawRequest {
    type Response = DrawData;

    async fn execute(self) -> anyhow::Result<Self::Response> {
        fetch_draw(
            &self.client,
            &self.common,
            self.common.url(),
            "LatestDrawRequest",
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("Latest draw not found at {}", self.common.url()))
    }
}
