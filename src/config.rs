use crate::retry::RetryConfig;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Cloud translator (Azure Translator v3), None when not configured
    pub cloud: Option<CloudConfig>,

    // Local translation model (Argos Translate)
    pub local: LocalModelConfig,

    // Connectivity retry policy for the cloud translator
    pub cloud_retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub endpoint: String,
    pub subscription_key: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModelConfig {
    /// Executable that translates text with an installed model
    pub translate_bin: String,
    /// Package manager used to install a model for a language pair
    pub package_manager_bin: String,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            translate_bin: "argos-translate".to_string(),
            package_manager_bin: "argospm".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = LocalModelConfig::default();

        let retry_delay = match non_empty_var("CLOUD_RETRY_DELAY_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse()
                    .with_context(|| format!("CLOUD_RETRY_DELAY_SECS is not a number: {}", value))?,
            ),
            None => Duration::from_secs(5),
        };
        let max_attempts = match non_empty_var("CLOUD_RETRY_MAX_ATTEMPTS") {
            Some(value) => {
                let attempts: u32 = value.parse().with_context(|| {
                    format!("CLOUD_RETRY_MAX_ATTEMPTS is not a number: {}", value)
                })?;
                // 0 means no cap
                (attempts > 0).then_some(attempts)
            }
            None => None,
        };

        Ok(Self {
            // Cloud - all three settings are required for the backend to be usable
            cloud: match (
                non_empty_var("AZURE_TRANSLATOR_ENDPOINT"),
                non_empty_var("AZURE_TRANSLATOR_KEY"),
                non_empty_var("AZURE_TRANSLATOR_REGION"),
            ) {
                (Some(endpoint), Some(subscription_key), Some(region)) => Some(CloudConfig {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                    subscription_key,
                    region,
                }),
                _ => None,
            },

            // Local model
            local: LocalModelConfig {
                translate_bin: non_empty_var("ARGOS_TRANSLATE_BIN")
                    .unwrap_or(defaults.translate_bin),
                package_manager_bin: non_empty_var("ARGOSPM_BIN")
                    .unwrap_or(defaults.package_manager_bin),
            },

            cloud_retry: RetryConfig::fixed_unbounded(retry_delay).with_max_attempts(max_attempts),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
