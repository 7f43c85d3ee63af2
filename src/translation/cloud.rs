use super::TranslateError;
use crate::config::CloudConfig;
use crate::i18n::Language;
use crate::retry::{with_retry_if, RetryConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Azure Translator v3 request item
#[derive(Debug, Serialize)]
struct TranslateItem<'a> {
    text: &'a str,
}

/// Azure answers either with one result per item or with an error object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranslateResponse {
    Failure { error: ApiError },
    Results(Vec<ItemResult>),
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ItemResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Client for the Azure Translator text API.
pub struct CloudTranslator {
    client: reqwest::Client,
    config: CloudConfig,
    retry: RetryConfig,
}

impl CloudTranslator {
    pub fn new(client: reqwest::Client, config: CloudConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            config,
            retry,
        }
    }

    /// Translate `text`, retrying connectivity failures per the retry policy.
    ///
    /// An error object returned by the API is not retried.
    pub async fn translate(
        &self,
        text: &str,
        from: Language,
        to: Language,
    ) -> Result<String, TranslateError> {
        let translated = with_retry_if(
            &self.retry,
            &format!("Cloud translation {}->{}", from, to),
            || self.request(text, from, to),
            TranslateError::is_transient,
        )
        .await?;

        debug!("Cloud {}->{}: {:?} -> {:?}", from, to, text, translated);
        Ok(translated)
    }

    async fn request(
        &self,
        text: &str,
        from: Language,
        to: Language,
    ) -> Result<String, TranslateError> {
        let url = format!("{}/translate", self.config.endpoint);

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", "3.0"), ("from", from.code()), ("to", to.code())])
            .header("Ocp-Apim-Subscription-Key", &self.config.subscription_key)
            .header("Ocp-Apim-Subscription-Region", &self.config.region)
            .header("X-ClientTraceId", Uuid::new_v4().to_string())
            .json(&[TranslateItem { text }])
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(TranslateError::Connection)?;

        parse_response(status, &body)
    }
}

fn send_error(error: reqwest::Error) -> TranslateError {
    if error.is_builder() {
        TranslateError::InvalidRequest(error)
    } else {
        TranslateError::Connection(error)
    }
}

fn parse_response(status: StatusCode, body: &str) -> Result<String, TranslateError> {
    match serde_json::from_str::<TranslateResponse>(body) {
        Ok(TranslateResponse::Failure { error }) => Err(TranslateError::Api {
            code: error.code,
            message: error.message,
        }),
        Ok(TranslateResponse::Results(results)) => results
            .into_iter()
            .next()
            .and_then(|result| result.translations.into_iter().next())
            .map(|translation| translation.text)
            .ok_or_else(|| {
                TranslateError::MalformedResponse("response contained no translations".to_string())
            }),
        Err(_) => Err(TranslateError::MalformedResponse(format!(
            "HTTP {}: {}",
            status, body
        ))),
    }
}
