//! Thin wrapper around the `reqwest::Client` used to reach the upstream
//! OpenAI-compatible API.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::config::ProxyConfig;
use crate::error::ProxyError;

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.upstream_base_url.trim_end_matches('/').to_string(),
            api_key: config.upstream_api_key.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, ProxyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let value = format!("Bearer {}", key.expose_secret());
            let value = HeaderValue::from_str(&value)
                .map_err(|e| ProxyError::InvalidRequestBody(format!("invalid API key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Build (but don't send) a POST request to `/chat/completions` upstream,
    /// with `Accept: text/event-stream` when `streaming` is set.
    pub fn post_chat_completions(
        &self,
        body: &serde_json::Value,
        streaming: bool,
    ) -> Result<reqwest::RequestBuilder, ProxyError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut headers = self.headers()?;
        if streaming {
            headers.insert("accept", HeaderValue::from_static("text/event-stream"));
        }
        Ok(self.http.post(url).headers(headers).json(body))
    }
}
