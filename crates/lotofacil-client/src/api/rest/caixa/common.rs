use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::ApiCommon;
use crate::models::{Draw, DrawError};

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// One draw as published by the Caixa portal
///
/// Only the fields the mirror stores are kept; the portal sends many more.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DrawData {
    #[serde(rename = "numero")]
    pub draw_number: i64,
    /// `DD/MM/YYYY`
    #[serde(rename = "dataApuracao")]
    pub draw_date: String,
    /// Drawn numbers in the order the operator published them
    #[serde(rename = "listaDezenas")]
    pub numbers: Vec<Dezena>,
}

/// A drawn number, sent as `"05"` by the portal and as `5` by some mirrors
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Dezena {
    Number(u64),
    Text(String),
}

impl Dezena {
    pub fn value(&self) -> Result<u8, DrawError> {
        match self {
            Self::Number(n) => u8::try_from(*n).map_err(|_| DrawError::NumberOutOfRange(*n)),
            Self::Text(s) => s
                .trim()
                .parse::<u8>()
                .map_err(|_| DrawError::InvalidNumber(s.clone())),
        }
    }
}

impl DrawData {
    pub fn new(draw_number: i64, draw_date: &str, numbers: &[u8]) -> Self {
        Self {
            draw_number,
            draw_date: draw_date.to_owned(),
            numbers: numbers
                .iter()
                .map(|n| Dezena::Text(format!("{n:02}")))
                .collect(),
        }
    }
}

impl TryFrom<&DrawData> for Draw {
    type Error = DrawError;

    fn try_from(data: &DrawData) -> Result<Self, Self::Error> {
        let numbers = data
            .numbers
            .iter()
            .map(Dezena::value)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(data.draw_number, &data.draw_date, &numbers)
    }
}

impl TryFrom<DrawData> for Draw {
    type Error = DrawError;

    fn try_from(data: DrawData) -> Result<Self, Self::Error> {
        Self::try_from(&data)
    }
}

enum Attempt {
    Done(Option<DrawData>),
    Retry(anyhow::Error),
}

/// GET one draw from `url`, retrying transport errors and 5xx answers up to
/// `common.max_retries` times. 404 yields `Ok(None)`.
pub(super) async fn fetch_draw(
    client: &reqwest::Client,
    common: &ApiCommon,
    url: &str,
    request_name: &str,
) -> anyhow::Result<Option<DrawData>> {
    let mut attempt = 0;
    loop {
        match fetch_once(client, url, request_name).await? {
            Attempt::Done(data) => return Ok(data),
            Attempt::Retry(e) if attempt < common.max_retries => {
                attempt += 1;
                log::warn!(
                    "{request_name} attempt {attempt}/{} failed: {e}",
                    common.max_retries
                );
                tokio::time::sleep(RETRY_BACKOFF * attempt as u32).await;
            }
            Attempt::Retry(e) => return Err(e),
        }
    }
}

async fn fetch_once(
    client: &reqwest::Client,
    url: &str,
    request_name: &str,
) -> anyhow::Result<Attempt> {
    let response = match client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return Ok(Attempt::Retry(anyhow::anyhow!(
                "{request_name} request failed: {e}"
            )));
        }
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        log::debug!("{request_name}: {url} answered 404");
        return Ok(Attempt::Done(None));
    }

    if !status.is_success() {
        let error_message = format!("{request_name} failed with status: {status}");
        let text = response.text().await.unwrap_or_default();
        log::error!("{error_message}\n==== Response: ====\n {text}");

        let error = anyhow::anyhow!("{error_message}");
        return if status.is_server_error() {
            Ok(Attempt::Retry(error))
        } else {
            Err(error)
        };
    }

    let response_text = response.text().await?;
    let data: DrawData = serde_json::from_str(&response_text)
        .map_err(|e| anyhow::anyhow!("Failed to parse {request_name} JSON response: {e}"))?;

    Ok(Attempt::Done(Some(data)))
}
