// src/config/validation.rs

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::storage::registry::{preview_key, split_keys};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        debug!("Starting configuration validation");

        if let Err(e) = Self::validate_providers(config) {
            warn!("Provider validation failed: {}", e);
            return Err(e);
        }

        if let Err(e) = Self::validate_default_provider(config) {
            warn!("Default provider validation failed: {}", e);
            return Err(e);
        }

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_providers(config: &AppConfig) -> Result<()> {
        let mut names = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for provider in &config.providers {
            if provider.name.trim().is_empty() {
                return Err(AppError::config_validation(
                    "Provider name cannot be empty",
                    Some("providers.name"),
                ));
            }
            if !names.insert(provider.name.as_str()) {
                return Err(AppError::config_validation(
                    format!("Duplicate provider name: {}", provider.name),
                    Some("providers.name"),
                ));
            }

            if provider.key_count() == 0 {
                warn!("Provider '{}' has no API keys configured", provider.name);
            }

            // Later providers win at registration time.
            for key in split_keys(&provider.api_keys) {
                if let Some(previous) = owners.insert(key, provider.name.as_str()) {
                    if previous != provider.name {
                        warn!(
                            "API key {} is listed for both '{}' and '{}'; '{}' wins",
                            preview_key(key),
                            previous,
                            provider.name,
                            provider.name
                        );
                    }
                }
            }
        }

        debug!(
            "Validated {} providers with {} distinct keys",
            config.providers.len(),
            owners.len()
        );
        Ok(())
    }

    fn validate_default_provider(config: &AppConfig) -> Result<()> {
        match &config.default_provider {
            Some(name) if config.provider(name).is_none() => Err(AppError::config_validation(
                format!("Default provider '{name}' is not a configured provider"),
                Some("default_provider"),
            )),
            _ => Ok(()),
        }
    }
}
