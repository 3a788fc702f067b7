//! Library surface for the proxy binary, split out so integration tests can
//! build a real [`Router`] against a mocked upstream without going through
//! `main`.

#![deny(unsafe_code)]

mod config;
mod error;
mod handlers;
mod schema_strip;
mod streaming;
mod upstream;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use upstream::UpstreamClient;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Arc<UpstreamClient>,
}

/// Build the `axum` application: one production route,
/// `POST /v1/chat/completions`.
pub fn build_app(config: ProxyConfig) -> Router {
    let upstream = UpstreamClient::new(&config);
    let state = AppState {
        config: Arc::new(config),
        upstream: Arc::new(upstream),
    };

    Router::new()
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .with_state(state)
}
