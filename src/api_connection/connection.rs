use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },

    #[error("{source_name} did not answer within {after:?}")]
    Timeout {
        source_name: &'static str,
        after: Duration,
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// One client per process; the per-request timeout bounds a slow upstream.
pub fn build_http_client(
    request_timeout: Duration,
    user_agent: &str,
) -> Result<Client, ApiConnectionError> {
    let client = Client::builder()
        .timeout(request_timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// GETs `url` and decodes a JSON body, turning non-2xx responses into `ApiError`.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, ApiConnectionError> {
    let response = client.get(url).query(query).send().await?;

    if response.status().is_success() {
        let body = response.text().await?;
        let decoded = serde_json::from_str::<T>(&body)?;
        Ok(decoded)
    } else {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(ApiConnectionError::ApiError { status, error_body })
    }
}
