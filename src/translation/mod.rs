//! Translation gateway: one call shape over the local-model and cloud backends.
//!
//! The local backend runs an installed Argos Translate model, installing the
//! model for a language pair on first use. The cloud backend calls Azure
//! Translator and retries connectivity failures per its `RetryConfig`.

mod cloud;
mod local;

pub use cloud::CloudTranslator;
pub use local::LocalModel;

use crate::config::Config;
use crate::i18n::Language;
use anyhow::bail;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which translation engine to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    #[default]
    LocalModel,
    CloudApi,
}

impl Backend {
    pub fn tag(self) -> &'static str {
        match self {
            Backend::LocalModel => "local-model",
            Backend::CloudApi => "cloud-api",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "local-model" | "argos" => Ok(Backend::LocalModel),
            "cloud-api" | "azure" => Ok(Backend::CloudApi),
            other => bail!(
                "Unknown translation backend '{}' (expected local-model or cloud-api)",
                other
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("cloud translator is not configured (set AZURE_TRANSLATOR_ENDPOINT, AZURE_TRANSLATOR_KEY and AZURE_TRANSLATOR_REGION)")]
    MissingCloudConfig,

    #[error("no installable translation model for {from} -> {to}: {detail}")]
    ModelUnavailable {
        from: Language,
        to: Language,
        detail: String,
    },

    #[error("local translation failed: {0}")]
    LocalModel(String),

    #[error("could not reach the cloud translator: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("invalid cloud translator request: {0}")]
    InvalidRequest(#[source] reqwest::Error),

    #[error("cloud translator reported error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("unexpected cloud translator response: {0}")]
    MalformedResponse(String),
}

impl TranslateError {
    /// Only connectivity failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, TranslateError::Connection(_))
    }
}

/// Anything that can translate text with a chosen backend.
#[allow(async_fn_in_trait)]
pub trait TranslationGateway {
    async fn translate(
        &self,
        text: &str,
        from: Language,
        to: Language,
        backend: Backend,
    ) -> Result<String, TranslateError>;
}

/// The production gateway over the two real backends.
pub struct Gateway {
    local: LocalModel,
    cloud: Option<CloudTranslator>,
}

impl Gateway {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::new();
        Self {
            local: LocalModel::new(config.local.clone()),
            cloud: config
                .cloud
                .clone()
                .map(|cloud| CloudTranslator::new(client, cloud, config.cloud_retry.clone())),
        }
    }
}

impl TranslationGateway for Gateway {
    async fn translate(
        &self,
        text: &str,
        from: Language,
        to: Language,
        backend: Backend,
    ) -> Result<String, TranslateError> {
        if text.trim().is_empty() || from == to {
            return Ok(text.to_string());
        }

        match backend {
            Backend::LocalModel => self.local.translate(text, from, to).await,
            Backend::CloudApi => match &self.cloud {
                Some(cloud) => cloud.translate(text, from, to).await,
                None => Err(TranslateError::MissingCloudConfig),
            },
        }
    }
}
