// OpenAI chat-completions client (HTTP direct, no SDK)

use crate::streaming::parse_chat_sse_stream;
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, EventStream, TokenUsage};
use crate::types::{Content, ContentPart, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model prefixes that reject `temperature` and want `max_completion_tokens`
const REASONING_MODEL_PREFIXES: &[&str] = &["o1", "o3", "o4", "gpt-5"];

pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at an OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn post_completion(&self, payload: &Value, stream: bool) -> Result<reqwest::Response> {
        let mut request = self.http_client.post(self.completions_url()).json(payload);
        if stream {
            request = request.header(ACCEPT, "text/event-stream");
        }

        let response = request.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

/// Build chat completion request payload
pub(crate) fn build_chat_request(
    model: &str,
    messages: &[Message],
    options: &ChatOptions,
    stream: bool,
) -> Value {
    let mut obj = Map::new();
    obj.insert("model".to_string(), Value::from(model));
    obj.insert(
        "messages".to_string(),
        Value::Array(messages.iter().map(convert_message).collect()),
    );
    obj.insert("stream".to_string(), Value::Bool(stream));

    let is_reasoning_model = REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix));

    if let Some(temp) = options.temperature {
        if !is_reasoning_model {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        let token_field = if is_reasoning_model {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        obj.insert(token_field.to_string(), serde_json::json!(max_tokens));
    }

    Value::Object(obj)
}

fn convert_message(message: &Message) -> Value {
    let (role, content, name) = match message {
        Message::System { content, name } => ("system", content, name),
        Message::Human { content, name } => ("user", content, name),
        Message::AI { content, name } => ("assistant", content, name),
    };

    let mut obj = Map::new();
    obj.insert("role".to_string(), Value::from(role));
    obj.insert("content".to_string(), convert_content(content));
    if let Some(name) = name {
        obj.insert("name".to_string(), Value::from(name.as_str()));
    }
    Value::Object(obj)
}

/// Content goes out as a plain string or as an array of typed parts
fn convert_content(content: &Content) -> Value {
    match content {
        Content::Text(s) => Value::from(s.as_str()),
        Content::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text,
                    }),
                })
                .collect(),
        ),
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = build_chat_request(&request.model, &request.messages, &request.options, false);
        let response = self.post_completion(&payload, false).await?;

        let raw: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            usage: raw.usage.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
            raw: serde_json::to_value(&raw)?,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = build_chat_request(&request.model, &request.messages, &request.options, true);

        tracing::debug!(model = %request.model, "opening chat completion stream");
        let response = self.post_completion(&payload, true).await?;

        Ok(parse_chat_sse_stream(response.bytes_stream()))
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_for_chat_model() {
        let messages = vec![Message::system("be brief"), Message::human("Look up: cat")];
        let options = ChatOptions::new().temperature(0.2).max_tokens(300);

        let payload = build_chat_request("gpt-4o-mini", &messages, &options, true);

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["max_tokens"], 300);
        assert!(payload.get("temperature").is_some());
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "Look up: cat");
    }

    #[test]
    fn test_payload_for_reasoning_model() {
        let options = ChatOptions::new().temperature(0.2).max_tokens(300);

        let payload = build_chat_request("gpt-5-mini", &[Message::human("hi")], &options, false);

        assert!(payload.get("temperature").is_none());
        assert!(payload.get("max_tokens").is_none());
        assert_eq!(payload["max_completion_tokens"], 300);
    }

    #[test]
    fn test_payload_omits_unset_options() {
        let payload = build_chat_request("gpt-4o-mini", &[], &ChatOptions::default(), true);

        let obj = payload.as_object().unwrap();
        assert_eq!(obj.len(), 3);
    }

    #[test]
    fn test_multipart_content() {
        let content = Content::Parts(vec![ContentPart::Text { text: "hello".into() }]);
        let value = convert_content(&content);
        assert_eq!(value[0]["type"], "text");
        assert_eq!(value[0]["text"], "hello");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAIClient::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.completions_url(), "http://localhost:8080/v1/chat/completions");
    }
}
