use std::{str::FromStr, time::Duration};

pub mod config;
pub mod provider;
pub mod rest;

pub use config::ApiConfig;
pub use provider::caixa::CaixaProvider;
pub use provider::{ApiProvider, DrawProvider};
pub use rest::caixa::common::DrawData;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, Deserialize, Serialize)]
pub enum Protocol {
    #[strum(to_string = "rest")]
    Rest,
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "REST" => Ok(Self::Rest),
            _ => Err(format!("Invalid protocol: {s}")),
        }
    }
}

/// Resolved endpoint of one upstream API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiCommon {
    pub name: String,
    pub url: String,
    pub timeout_ms: Option<usize>,
    pub max_retries: usize,
}

impl ApiCommon {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(|ms| Duration::from_millis(ms as u64))
    }
}
