//! Environment-variable configuration, read once at startup.

use secrecy::SecretString;

use crate::error::ProxyError;

const DEFAULT_PORT: u16 = 8787;

/// Proxy configuration, resolved once from the process environment.
#[derive(Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub upstream_base_url: String,
    pub upstream_api_key: Option<SecretString>,
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("port", &self.port)
            .field("upstream_base_url", &self.upstream_base_url)
            .field(
                "upstream_api_key",
                &self.upstream_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl ProxyConfig {
    /// Read configuration from the environment. Fails only if
    /// `HEALER_UPSTREAM_BASE_URL` is unset, since the proxy has nowhere to
    /// forward requests without it.
    pub fn from_env() -> Result<Self, ProxyError> {
        let port = std::env::var("HEALER_PROXY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let upstream_base_url =
            std::env::var("HEALER_UPSTREAM_BASE_URL").map_err(|_| ProxyError::MissingUpstreamBaseUrl)?;

        let upstream_api_key = std::env::var("HEALER_UPSTREAM_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from);

        let default_model = std::env::var("HEALER_DEFAULT_MODEL").ok();

        Ok(Self {
            port,
            upstream_base_url,
            upstream_api_key,
            default_model,
        })
    }
}
