use crate::api::{ApiCommon, provider::ProviderRequest};

use super::common::{DrawData, fetch_draw};

/// `GET {base}/{draw_number}`: one draw, absent until the operator publishes it
#[derive(Debug)]
pub struct SpecifiedDrawRequest {
    client: reqwest::Client,
    common: ApiCommon,
    draw_number: i64,
}

impl SpecifiedDrawRequest {
    pub fn new(client: reqwest::Client, common: &ApiCommon, draw_number: i64) -> Self {
        Self {
            client,
            common: common.clone(),
            draw_number,
        }
    }

    fn url(&self) -> String {
        format!("{}/{}", self.common.url(), self.draw_number)
    }
}

impl ProviderRequest for SpecifiedDrawRequest {
    type Response = Option<DrawData>;

    async fn execute(self) -> anyhow::Result<Self::Response> {
        let url = self.url();
        let data = fetch_draw(&self.client, &self.common, &url, "SpecifiedDrawRequest").await?;

        match data {
            Some(data) if data.draw_number != self.draw_number => Err(anyhow::anyhow!(
                "Asked for draw {} but upstream answered with draw {}",
                self.draw_number,
                data.draw_number
            )),
            other => Ok(other),
        }
    }
}
