//! Re-emission of the upstream SSE stream with `choices[0].delta.content`
//! healed in flight.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, Sse};
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt, TryStreamExt};
use json_healer_core::{Healer, SchemaNode};

const DONE_MARKER: &str = "[DONE]";

/// Turn an upstream byte stream of OpenAI-style SSE frames into a re-healed
/// SSE stream suitable for returning directly from an `axum` handler.
///
/// Frames whose `data:` payload doesn't parse as JSON, or doesn't carry a
/// `choices[0].delta.content` string, pass through untouched. At `[DONE]`,
/// any non-empty [`Healer::finish`] tail is emitted as one extra delta frame
/// immediately before the `[DONE]` frame is forwarded.
pub fn heal_sse_stream<S>(
    byte_stream: S,
    schema: Option<Arc<SchemaNode>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let mut healer = Healer::new(schema);
    let mut byte_stream = byte_stream
        .map_err(|e| std::io::Error::other(e.to_string()))
        .eventsource();

    let out = async_stream::stream! {
        while let Some(item) = byte_stream.next().await {
            let event = match item {
                Ok(ev) => ev,
                Err(e) => {
                    tracing::debug!(error = %e, "SSE transport error, ending stream");
                    return;
                }
            };

            let data = event.data.trim();
            if data == DONE_MARKER {
                let tail = healer.finish();
                if !tail.is_empty() {
                    yield Ok(Event::default().data(wrap_delta(&tail)));
                }
                yield Ok(Event::default().data(DONE_MARKER));
                return;
            }
            if data.is_empty() {
                continue;
            }

            let Ok(mut payload) = serde_json::from_str::<serde_json::Value>(data) else {
                tracing::debug!("unparseable SSE payload, passing through unchanged");
                yield Ok(Event::default().data(event.data));
                continue;
            };

            let content = payload
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("delta"))
                .and_then(|d| d.get("content"))
                .and_then(|v| v.as_str());

            let Some(content) = content else {
                yield Ok(Event::default().data(event.data));
                continue;
            };

            let healed = healer.process(content);
            if let Some(slot) = payload
                .get_mut("choices")
                .and_then(|c| c.get_mut(0))
                .and_then(|c| c.get_mut("delta"))
                .and_then(|d| d.get_mut("content"))
            {
                *slot = serde_json::Value::String(healed);
            }
            yield Ok(Event::default().data(payload.to_string()));
        }

        let tail = healer.finish();
        if !tail.is_empty() {
            yield Ok(Event::default().data(wrap_delta(&tail)));
        }
    };

    Sse::new(out)
}

/// Shape a healed tail as a standalone `choices[0].delta.content` frame.
fn wrap_delta(tail: &str) -> String {
    serde_json::json!({
        "choices": [{"index": 0, "delta": {"content": tail}, "finish_reason": null}]
    })
    .to_string()
}
