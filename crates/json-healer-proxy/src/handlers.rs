//! The `POST /v1/chat/completions` handler: dispatches between the
//! streaming and non-streaming healing paths based on the request body.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use json_healer_core::{Healer, SchemaNode};
use serde_json::Value;

use crate::AppState;
use crate::error::ProxyError;
use crate::schema_strip;
use crate::streaming::heal_sse_stream;

/// What a Healer should do with this request's completion content, derived
/// from `response_format`.
enum HealingMode {
    /// No recognized `response_format`: bytes pass through untouched and no
    /// `Healer` is ever constructed.
    None,
    /// `response_format.type == "json_object"`: structural repair only.
    Structural,
    /// `response_format.type == "json_schema"`: repair plus `required`-key
    /// injection against the carried schema.
    Schema(Arc<SchemaNode>),
}

pub async fn chat_completions(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Response, ProxyError> {
    if !body.is_object() {
        return Err(ProxyError::InvalidRequestBody(
            "request body must be a JSON object".to_string(),
        ));
    }

    if body.get("model").and_then(Value::as_str).is_none()
        && let Some(default_model) = &state.config.default_model
    {
        body["model"] = Value::String(default_model.clone());
    }

    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    let mode = healing_mode(&mut body);

    let request = state
        .upstream
        .post_chat_completions(&body, streaming)
        .map_err(|e| {
            ProxyError::InvalidRequestBody(format!("failed to build upstream request: {e}"))
        })?;

    let response = request.send().await.map_err(ProxyError::UpstreamUnreachable)?;
    let status = response.status();

    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(ProxyError::UpstreamStatus { status, body });
    }

    let schema = match mode {
        HealingMode::None => return pass_through(response, streaming).await,
        HealingMode::Structural => None,
        HealingMode::Schema(schema) => Some(schema),
    };

    if streaming {
        Ok(heal_sse_stream(response.bytes_stream(), schema).into_response())
    } else {
        heal_non_streaming(response, schema).await
    }
}

/// Determine the healing mode from `response_format`, stripping `default`
/// from any carried JSON Schema before the request body goes upstream.
fn healing_mode(body: &mut Value) -> HealingMode {
    let Some(format_type) = body
        .get("response_format")
        .and_then(|rf| rf.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return HealingMode::None;
    };

    match format_type.as_str() {
        "json_schema" => {
            let Some(schema) = body
                .get_mut("response_format")
                .and_then(|rf| rf.get_mut("json_schema"))
                .and_then(|js| js.get_mut("schema"))
            else {
                return HealingMode::None;
            };
            let healer_schema = Arc::new(SchemaNode::from_value(schema.clone()));
            schema_strip::strip_defaults(schema);
            HealingMode::Schema(healer_schema)
        }
        "json_object" => HealingMode::Structural,
        _ => HealingMode::None,
    }
}

async fn pass_through(response: reqwest::Response, streaming: bool) -> Result<Response, ProxyError> {
    let status = response.status();
    if streaming {
        let headers = response.headers().clone();
        let body = axum::body::Body::from_stream(response.bytes_stream());
        Ok((status, headers, body).into_response())
    } else {
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(ProxyError::UpstreamUnreachable)?;
        Ok((status, headers, bytes).into_response())
    }
}

async fn heal_non_streaming(
    response: reqwest::Response,
    schema: Option<Arc<SchemaNode>>,
) -> Result<Response, ProxyError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(ProxyError::UpstreamUnreachable)?;

    let mut body: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(_) => return Ok((status, bytes).into_response()),
    };

    let mut healer = Healer::new(schema);
    if let Some(content) = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        let healed = healer.process(content) + &healer.finish();
        if let Some(slot) = body
            .get_mut("choices")
            .and_then(|c| c.get_mut(0))
            .and_then(|c| c.get_mut("message"))
            .and_then(|m| m.get_mut("content"))
        {
            *slot = Value::String(healed);
        }
    }

    Ok((status, Json(body)).into_response())
}
