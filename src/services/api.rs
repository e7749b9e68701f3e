// src/services/api.rs

//! Shared HTTP plumbing for every remote endpoint.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Configured client bound to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    /// Create a client with the configured user agent and timeout.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base: base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// `GET` a JSON document.
    ///
    /// `failure` is the message shown when the server gives no reason of its own.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        failure: &str,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        log::debug!("GET {}", url);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok(serde_json::from_value(interpret(status, &bytes, failure)?)?)
    }

    /// Send a JSON body and decode the JSON answer.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B, failure: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        log::debug!("{} {}", method, url);

        let response = self.client.request(method, url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok(serde_json::from_value(interpret(status, &bytes, failure)?)?)
    }
}

/// Normalize a base URL so relative endpoint paths join beneath it.
fn base_url(raw: &str) -> Result<Url> {
    let mut base = raw.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?)
}

/// Classify a response body.
///
/// - Non-success status: `Network`, carrying the payload's `error` text if any
/// - Success with an `error` payload: `Server`
/// - Empty success body: `null`
pub(crate) fn interpret(status: StatusCode, bytes: &[u8], failure: &str) -> Result<Value> {
    let trimmed = bytes.trim_ascii();
    let parsed: Option<Value> = if trimmed.is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_slice(trimmed).ok()
    };

    if !status.is_success() {
        let message = parsed
            .as_ref()
            .and_then(error_text)
            .unwrap_or_else(|| format!("{failure} ({status})"));
        return Err(AppError::network(message));
    }

    let value = parsed.ok_or_else(|| AppError::server(format!("{failure}: malformed response")))?;
    if let Some(message) = error_text(&value) {
        return Err(AppError::server(message));
    }
    Ok(value)
}

fn error_text(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}
