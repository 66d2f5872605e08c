use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::IntoResponse,
    Router,
};
use fastdict_llm::{ChatClient, ChatRequest, ChatResponse, EventStream, StreamEvent};
use tower::ServiceExt;

use fastdict_web::{build_router, error::ApiError, AppState, Config};

/// Replays a canned completion and records what it was asked
struct ScriptedClient {
    chunks: Vec<&'static str>,
    fail: bool,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl ScriptedClient {
    fn new(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            fail: false,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, _request: ChatRequest) -> anyhow::Result<ChatResponse> {
        anyhow::bail!("not used")
    }

    async fn chat_stream(&self, request: ChatRequest) -> anyhow::Result<EventStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);

        if self.fail {
            anyhow::bail!("OpenAI API error (401 Unauthorized): invalid key");
        }

        let mut events: Vec<anyhow::Result<StreamEvent>> = self
            .chunks
            .iter()
            .map(|c| Ok(StreamEvent::Message { content: c.to_string() }))
            .collect();
        events.push(Ok(StreamEvent::Done { finish_reason: Some("stop".to_string()) }));
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.render.filler_bytes = 0;
    config
}

fn app(client: Arc<ScriptedClient>, config: Config) -> Router {
    build_router(Arc::new(AppState::new(config, client)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_empty_query_renders_search_bar_only() {
    let client = Arc::new(ScriptedClient::new(vec!["unused"]));

    let (status, _, body) = get(app(Arc::clone(&client), test_config()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="query""#));
    assert!(!body.contains(r#"class="card""#));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_query_is_treated_as_empty() {
    let client = Arc::new(ScriptedClient::new(vec!["unused"]));

    let (status, _, body) = get(app(Arc::clone(&client), test_config()), "/?query=%20%20").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains(r#"class="card""#));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lookup_page_streams_chunks_in_order() {
    let client = Arc::new(ScriptedClient::new(vec!["字典", "\n\nA dictionary is ", "a reference book."]));

    let (status, headers, body) =
        get(app(Arc::clone(&client), test_config()), "/?query=dictionary").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    assert_eq!(headers["x-accel-buffering"], "no");

    let first = body.find("字典").unwrap();
    let second = body.find("A dictionary is").unwrap();
    let third = body.find("a reference book.").unwrap();
    assert!(first < second && second < third);
    assert!(body.contains("<h2 title=\"dictionary\">dictionary</h2>"));
    assert!(body.contains(r#"<span class="end"></span>"#));
    assert!(body.ends_with("</html>"));

    let request = client.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.model, "gpt-4o-mini");
    assert_eq!(request.messages[0].role(), "system");
    assert_eq!(request.messages[1].content().as_text(), Some("Look up: dictionary"));
}

#[tokio::test]
async fn test_filler_is_sent_ahead_of_content() {
    let client = Arc::new(ScriptedClient::new(vec!["猫"]));
    let mut config = test_config();
    config.render.filler_bytes = 1024;

    let (_, _, body) = get(app(client, config), "/?query=cat").await;

    let filler_at = body.find("class=\"filler\"").unwrap();
    assert!(filler_at < body.find("猫").unwrap());
    assert!(body.matches('\u{200B}').count() * 3 >= 1024);
}

#[tokio::test]
async fn test_repeat_lookup_uses_cache() {
    let client = Arc::new(ScriptedClient::new(vec!["猫", "\n\nA small animal."]));
    let router = app(Arc::clone(&client), test_config());

    let (_, _, first) = get(router.clone(), "/?query=cat").await;
    let (_, _, second) = get(router.clone(), "/?query=%20%20cat%20").await;

    assert!(first.contains("A small animal."));
    assert!(second.contains("猫\n\nA small animal."));
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);

    get(router, "/?query=Cat").await;
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_disabled_calls_upstream_each_time() {
    let client = Arc::new(ScriptedClient::new(vec!["猫"]));
    let mut config = test_config();
    config.cache.enabled = false;
    let router = app(Arc::clone(&client), config);

    get(router.clone(), "/?query=cat").await;
    get(router, "/?query=cat").await;

    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_upstream_failure_renders_error_notice() {
    let client = Arc::new(ScriptedClient::failing());

    let (status, _, body) = get(app(client, test_config()), "/?query=cat").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Something went wrong"));
    assert!(!body.contains("invalid key"));
}

#[tokio::test]
async fn test_overlong_query_rejected() {
    let client = Arc::new(ScriptedClient::new(vec!["unused"]));
    let mut config = test_config();
    config.llm.max_query_chars = 5;

    let (status, headers, body) = get(app(Arc::clone(&client), config), "/?query=abcdefgh").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(body.contains(r#"name="query""#));
    assert!(body.contains("Query is longer than 5 characters"));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sse_lookup() {
    let client = Arc::new(ScriptedClient::new(vec!["猫", " cat"]));

    let (status, headers, body) = get(app(client, test_config()), "/api/lookup?query=cat").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/event-stream");
    assert!(body.contains("event: message\ndata: {\"content\":\"猫\"}"));
    assert!(body.contains("event: done"));
    assert!(body.find("猫").unwrap() < body.find(" cat").unwrap());
}

#[tokio::test]
async fn test_sse_lookup_requires_query() {
    let client = Arc::new(ScriptedClient::new(vec![]));

    let (status, _, body) = get(app(client, test_config()), "/api/lookup").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Missing query"));
}

#[tokio::test]
async fn test_health() {
    let client = Arc::new(ScriptedClient::new(vec![]));

    let (status, _, body) = get(app(client, test_config()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "gpt-4o-mini");
    assert_eq!(json["cache"]["total_entries"], 0);
}

#[tokio::test]
async fn test_api_error_response() {
    let response = ApiError::BadRequest("Test error".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
