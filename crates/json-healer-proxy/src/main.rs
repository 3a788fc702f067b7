//! OpenAI-compatible HTTP/SSE proxy that heals truncated JSON completions
//! against a caller-supplied JSON Schema before they reach the client.

use json_healer_proxy::{ProxyConfig, build_app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ProxyConfig::from_env()?;
    let port = config.port;
    tracing::info!(?config, "starting json-healer-proxy");

    let app = build_app(config);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
