//! End-to-end tests against a real, locally-bound `axum::serve` instance,
//! with the upstream OpenAI-compatible API mocked via `wiremock`.

use json_healer_proxy::{ProxyConfig, build_app};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_proxy(upstream_base_url: String) -> String {
    let config = ProxyConfig {
        port: 0,
        upstream_base_url,
        upstream_api_key: None,
        default_model: None,
    };
    let app = build_app(config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn non_streaming_completion_is_healed_in_place() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"a\":1"},
                "finish_reason": "length"
            }]
        })))
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy(upstream.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{proxy}/v1/chat/completions"))
        .json(&json!({
            "model": "gpt-4o-mini",
            "messages": [],
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "thing", "schema": {"required": ["a", "b"]}}
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let content = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert_eq!(content, "{\"a\":1,\"b\":null}");
}

#[tokio::test]
async fn json_object_mode_heals_structurally_with_no_schema() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"a\":[1,2"},
                "finish_reason": "length"
            }]
        })))
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy(upstream.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{proxy}/v1/chat/completions"))
        .json(&json!({
            "model": "gpt-4o-mini",
            "messages": [],
            "response_format": {"type": "json_object"}
        }))
        .send()
        .await
        .unwrap();

    let body: Value = resp.json().await.unwrap();
    let content = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert_eq!(content, "{\"a\":[1,2]}");
}

#[tokio::test]
async fn absent_response_format_passes_through_byte_for_byte() {
    let upstream = MockServer::start().await;
    let upstream_body = json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "plain text, not JSON"},
            "finish_reason": "stop"
        }]
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body.clone()))
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy(upstream.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{proxy}/v1/chat/completions"))
        .json(&json!({"model": "gpt-4o-mini", "messages": []}))
        .send()
        .await
        .unwrap();

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, upstream_body);
}

#[tokio::test]
async fn upstream_error_status_is_reproduced_verbatim() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "rate limited", "type": "rate_limit_error"}
        })))
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy(upstream.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{proxy}/v1/chat/completions"))
        .json(&json!({"model": "gpt-4o-mini", "messages": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 429);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "rate_limit_error");
}

#[tokio::test]
async fn streaming_completion_heals_and_injects_final_tail_frame() {
    let upstream = MockServer::start().await;
    let sse_body = concat!(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"{\\\"a\\\":1\"},\"finish_reason\":null}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(sse_body, "text/event-stream"),
        )
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy(upstream.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{proxy}/v1/chat/completions"))
        .json(&json!({
            "model": "gpt-4o-mini",
            "messages": [],
            "stream": true,
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "thing", "schema": {"required": ["a", "b"]}}
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let text = resp.text().await.unwrap();

    assert!(text.contains("\"role\":\"assistant\""));
    assert!(text.contains("{\\\"a\\\":1"));
    assert!(text.contains(",\\\"b\\\":null}"));
    assert!(text.trim_end().ends_with("data: [DONE]"));
}

#[tokio::test]
async fn schema_strip_removes_defaults_before_forwarding() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{"}, "finish_reason": "length"}]
        })))
        .mount(&upstream)
        .await;

    let proxy = spawn_proxy(upstream.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{proxy}/v1/chat/completions"))
        .json(&json!({
            "model": "gpt-4o-mini",
            "messages": [],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "thing",
                    "schema": {
                        "properties": {"mode": {"default": "dark"}},
                        "required": ["mode"]
                    }
                }
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    // The forwarded schema upstream must have `default` stripped...
    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let forwarded: Value = requests[0].body_json().unwrap();
    let forwarded_schema = &forwarded["response_format"]["json_schema"]["schema"];
    assert_eq!(
        forwarded_schema,
        &json!({"properties": {"mode": {}}, "required": ["mode"]})
    );

    // ...but the Healer must still inject the default into the healed content,
    // proving the stripping pass never touched the schema the Healer was built from.
    let body: Value = resp.json().await.unwrap();
    let content = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert_eq!(content, "{\"mode\":\"dark\"}");
}
