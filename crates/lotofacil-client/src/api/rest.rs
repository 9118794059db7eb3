use serde::{Deserialize, Serialize};

pub mod caixa;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RestConfig {
    pub api_name: String,
    pub base_url: String,
    pub timeout_ms: Option<usize>,
    pub max_retries: Option<usize>,
}

impl RestConfig {
    pub fn new(api_name: &str, base_url: &str) -> Self {
        Self {
            api_name: api_name.to_owned(),
            base_url: base_url.to_owned(),
            timeout_ms: None,
            max_retries: None,
        }
    }
}
