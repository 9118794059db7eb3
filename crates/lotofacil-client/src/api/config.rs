use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use super::{Protocol, provider::ApiProvider, rest::RestConfig};

const API_CONFIG_FILE: &str = "api.toml";
const API_DIR: &str = "api";

/// Official Lotofácil endpoint of the Caixa lottery portal
pub const CAIXA_LOTOFACIL_URL: &str =
    "https://servicebus2.caixa.gov.br/portaldeloterias/api/lotofacil";

/// Get all valid protocol names for error reporting
fn get_valid_protocols() -> Vec<String> {
    Protocol::iter().map(|p| p.to_string()).collect()
}

/// Get all valid provider names for error reporting
fn get_valid_providers() -> Vec<&'static str> {
    ApiProvider::iter().map(|p| p.id()).collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub caixa: Option<ProviderConfig>,
    #[serde(default)]
    pub custom: Option<ProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub rest: HashMap<String, RestConfig>,
}

impl ProviderConfig {
    /// Merge another `ProviderConfig` into this one
    /// Existing entries in self take priority over entries in other
    pub fn merge_with(&mut self, other: Self) {
        #[expect(clippy::iter_over_hash_type)]
        for (key, value) in other.rest {
            self.rest.entry(key).or_insert(value);
        }
    }
}

impl ApiConfig {
    /// Load `api.toml` and `api/*.toml` under `root`, completing the Caixa
    /// provider with the built-in endpoints where the files leave gaps.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut config = Self::new(root.join(API_CONFIG_FILE), root.join(API_DIR))?;

        if config.is_empty() {
            log::info!(
                "No API configuration found under {}, using built-in Caixa endpoints",
                root.display()
            );
        }

        config.merge_provider_config(ApiProvider::Caixa, Self::builtin_caixa());
        Ok(config)
    }

    fn builtin_caixa() -> ProviderConfig {
        let mut rest = HashMap::new();
        for api in [
            super::provider::caixa::CaixaApi::LatestDraw,
            super::provider::caixa::CaixaApi::SpecifiedDraw,
        ] {
            let name = api.to_string();
            let mut rest_config = RestConfig::new(&name, CAIXA_LOTOFACIL_URL);
            rest_config.timeout_ms = Some(15_000);
            rest_config.max_retries = Some(2);
            rest.insert(name, rest_config);
        }
        ProviderConfig { rest }
    }

    /// Create `ApiConfig` with multi-file support
    /// Loads main config from `api.toml` and additional configs from `api/`
    pub fn new<P: AsRef<Path>>(api_toml: P, api_dir: P) -> Result<Self> {
        // main config file is optional
        let mut config = if api_toml.as_ref().exists() {
            let config = Self::new_api_toml(&api_toml)?;
            log::debug!("Loaded main config from: {}", api_toml.as_ref().display());
            config
        } else {
            log::debug!(
                "Main config file not found: {}",
                api_toml.as_ref().display()
            );
            Self::default()
        };

        let provider_configs = Self::load_provider_configs_from_dir(&api_dir)?;

        #[expect(clippy::iter_over_hash_type)]
        for (api_provider, provider_config) in provider_configs {
            config.merge_provider_config(api_provider, provider_config);
        }

        Ok(config)
    }

    pub fn new_api_toml<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path_str = config_path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path_str}"))?;

        let toml_value: toml::Value = toml::from_str(&content).with_context(|| {
            format!("Failed to parse TOML content in main config file: {config_path_str}")
        })?;

        Self::validate_providers(&toml_value, &config_path)?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {config_path_str}"))?;

        Ok(config)
    }

    /// Top-level keys of `api.toml` must be provider names
    fn validate_providers<P: AsRef<Path>>(toml_value: &toml::Value, config_path: P) -> Result<()> {
        let table = toml_value.as_table().ok_or_else(|| {
            anyhow::anyhow!(
                "Main config file {} must contain a TOML table at root level",
                config_path.as_ref().display()
            )
        })?;

        let invalid_keys: Vec<&String> = table
            .keys()
            .filter(|key| key.parse::<ApiProvider>().is_err())
            .collect();

        if !invalid_keys.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid provider names found in {}: {invalid_keys:?}.\nValid providers are: {:?}",
                config_path.as_ref().display(),
                get_valid_providers()
            ));
        }

        Ok(())
    }

    /// Load provider configurations from `api/<provider_name>.toml` files
    fn load_provider_configs_from_dir<P: AsRef<Path>>(
        api_dir: P,
    ) -> Result<HashMap<ApiProvider, ProviderConfig>> {
        let mut provider_configs = HashMap::new();

        if !api_dir.as_ref().exists() {
            log::debug!("API directory not found: {}", api_dir.as_ref().display());
            return Ok(provider_configs);
        }

        let entries = fs::read_dir(&api_dir).with_context(|| {
            format!(
                "Failed to read API directory: {}",
                api_dir.as_ref().display()
            )
        })?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }
            let Some(file_stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let Ok(api_provider) = file_stem.parse::<ApiProvider>() else {
                log::warn!("Unknown provider name '{file_stem}' found in config file, ignoring");
                continue;
            };

            match Self::load_provider_config_in_dir(&path) {
                Ok(config) => {
                    provider_configs.insert(api_provider, config);
                    log::debug!("Successfully loaded config for provider: {file_stem}");
                }
                Err(e) => {
                    log::warn!("Failed to load config for provider {file_stem}: {e}");
                }
            }
        }

        Ok(provider_configs)
    }

    /// Load a single provider config file
    fn load_provider_config_in_dir<P: AsRef<Path>>(config_path: P) -> Result<ProviderConfig> {
        let content = fs::read_to_string(&config_path).with_context(|| {
            format!(
                "Failed to read provider config file: {}",
                config_path.as_ref().display()
            )
        })?;

        let toml_value: toml::Value = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML content in: {}",
                config_path.as_ref().display()
            )
        })?;

        Self::validate_protocol_folder_toml(&toml_value, &config_path)?;

        let config: ProviderConfig = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse provider TOML config: {}",
                config_path.as_ref().display()
            )
        })?;

        Ok(config)
    }

    /// Top-level keys of `api/<provider>.toml` must be protocol names
    fn validate_protocol_folder_toml<P: AsRef<Path>>(
        toml_value: &toml::Value,
        config_path: P,
    ) -> Result<()> {
        let table = toml_value.as_table().ok_or_else(|| {
            anyhow::anyhow!(
                "Provider config file {} must contain a TOML table at root level",
                config_path.as_ref().display()
            )
        })?;

        let invalid_keys: Vec<&String> = table
            .keys()
            .filter(|key| key.parse::<Protocol>().is_err())
            .collect();

        if !invalid_keys.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid protocol names found in {}: {invalid_keys:?}. Valid protocols are: {:?}",
                config_path.as_ref().display(),
                get_valid_protocols()
            ));
        }

        Ok(())
    }

    fn merge_provider_config(&mut self, provider: ApiProvider, provider_config: ProviderConfig) {
        let slot = match provider {
            ApiProvider::Caixa => &mut self.caixa,
            ApiProvider::Custom => &mut self.custom,
        };

        if let Some(existing) = slot {
            existing.merge_with(provider_config);
        } else {
            *slot = Some(provider_config);
        }
    }

    /// Check if the config is empty (no providers configured)
    fn is_empty(&self) -> bool {
        self.caixa.is_none() && self.custom.is_none()
    }

    /// Get the REST configuration of one API of a provider
    pub fn get_api_config(
        &self,
        provider: ApiProvider,
        protocol: Protocol,
        api_name: &str,
    ) -> Result<RestConfig> {
        let provider_config = self.get_provider_config(provider)?;

        match protocol {
            Protocol::Rest => provider_config.rest.get(api_name).cloned().with_context(|| {
                format!(
                    "REST API '{api_name}' not found for provider '{}'",
                    provider.id()
                )
            }),
        }
    }

    fn get_provider_config(&self, provider: ApiProvider) -> Result<&ProviderConfig> {
        match provider {
            ApiProvider::Caixa => self
                .caixa
                .as_ref()
                .with_context(|| "Caixa provider config not found"),
            ApiProvider::Custom => self
                .custom
                .as_ref()
                .with_context(|| "Custom provider config not found"),
        }
    }
}
