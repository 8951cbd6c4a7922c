//! Configuration loader for YAML files and environment resolution
//!
//! Loads the YAML document, resolves the upstream credential and overrides from
//! the process environment, then validates the result.

use crate::config::types::AppConfig;
use crate::errors::ChatError;
use std::env;
use std::path::Path;
use tokio::fs;

pub const MODEL_OVERRIDE_ENV: &str = "AGRIVISION_MODEL";
pub const API_BASE_OVERRIDE_ENV: &str = "AGRIVISION_API_BASE";

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path` when given, otherwise start from defaults.
    pub async fn load(path: Option<&Path>) -> Result<AppConfig, ChatError> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => {
                let mut config = AppConfig::default();
                Self::resolve_environment(&mut config);
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ChatError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            ChatError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<AppConfig, ChatError> {
        let mut config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        Self::resolve_environment(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Fill the API key from its env var and apply env overrides.
    fn resolve_environment(config: &mut AppConfig) {
        if config.llm.api_key.is_none() {
            config.llm.api_key = env::var(&config.llm.api_key_env)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        if config.llm.api_key.is_none() {
            log::warn!(
                "{} is not set; chat requests will fail until it is configured",
                config.llm.api_key_env
            );
        }

        if let Ok(model) = env::var(MODEL_OVERRIDE_ENV) {
            if !model.trim().is_empty() {
                log::info!("Model overridden from {}: {}", MODEL_OVERRIDE_ENV, model);
                config.llm.model = model;
            }
        }
        if let Ok(api_base) = env::var(API_BASE_OVERRIDE_ENV) {
            if !api_base.trim().is_empty() {
                log::info!("API base overridden from {}: {}", API_BASE_OVERRIDE_ENV, api_base);
                config.llm.api_base = api_base;
            }
        }
    }
}
