// src/config/loader.rs

use crate::config::{AppConfig, ConfigValidator, ProviderConfig};
use crate::error::{AppError, Result};
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

const PROVIDER_ENV_PREFIX: &str = "SEARCH_KEYS_PROVIDER_";
const API_KEYS_SUFFIX: &str = "_API_KEYS";
const DEFAULT_PROVIDER_ENV: &str = "SEARCH_KEYS_DEFAULT_PROVIDER";
const SEED_ENV: &str = "SEARCH_KEYS_SEED";

/// Load configuration from file or environment variables
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!("Configuration file not found, using defaults and environment");
        AppConfig::default()
    };

    override_with_env(&mut config, env::vars());

    ConfigValidator::validate(&config)?;

    debug!(
        providers = config.providers.len(),
        keys = config.total_keys(),
        "Configuration loaded and validated successfully"
    );
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::ConfigNotFound {
                path: config_path.display().to_string(),
            }
        } else {
            AppError::Io(e)
        }
    })?;

    if content.trim().is_empty() {
        warn!("Config file '{}' is empty. Using defaults.", config_path.display());
        return Ok(AppConfig::default());
    }

    Ok(serde_yaml::from_str(&content)?)
}

fn provider_name_from_env(env_key: &str) -> Option<String> {
    env_key
        .strip_prefix(PROVIDER_ENV_PREFIX)?
        .strip_suffix(API_KEYS_SUFFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
}

/// Applies `SEARCH_KEYS_*` variables on top of the file configuration.
pub(crate) fn override_with_env(
    config: &mut AppConfig,
    vars: impl IntoIterator<Item = (String, String)>,
) {
    let mut env_providers: Vec<(String, String)> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            if key == DEFAULT_PROVIDER_ENV {
                let name = value.trim();
                if !name.is_empty() {
                    info!(provider = %name, "Overriding default provider from environment");
                    config.default_provider = Some(name.to_string());
                }
                None
            } else if key == SEED_ENV {
                match value.trim().parse::<u64>() {
                    Ok(seed) => {
                        info!(seed, "Overriding selector seed from environment");
                        config.selector.seed = Some(seed);
                    }
                    Err(_) => warn!("Invalid {} environment variable: {}", SEED_ENV, value),
                }
                None
            } else {
                provider_name_from_env(&key).map(|name| (name, value))
            }
        })
        .collect();
    // Stable registration order regardless of the environment's iteration order.
    env_providers.sort();

    for (name, api_keys) in env_providers {
        match config.providers.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                info!(provider = %name, "Overriding provider keys from environment");
                existing.api_keys = api_keys;
            }
            None => {
                info!(provider = %name, "Adding provider from environment");
                config.providers.push(ProviderConfig::new(name, api_keys));
            }
        }
    }
}
