use std::sync::Arc;
use std::time::Instant;

use fastdict_llm::{ChatClient, ChatOptions, ChatRequest, StreamEvent};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::cache::{cache_key, ResponseCache};
use crate::prompt;
use crate::state::AppState;

const CHANNEL_CAPACITY: usize = 256;

/// What a page view receives while a lookup runs, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum LookupEvent {
    Chunk(String),
    Done { cached: bool },
    Error(String),
}

/// Drives one upstream completion per lookup, consulting the cache first
#[derive(Clone)]
pub struct Lookup {
    client: Arc<dyn ChatClient>,
    cache: Option<Arc<ResponseCache>>,
    model: String,
    options: ChatOptions,
}

impl Lookup {
    pub fn new(
        client: Arc<dyn ChatClient>,
        cache: Option<Arc<ResponseCache>>,
        model: impl Into<String>,
        options: ChatOptions,
    ) -> Self {
        Self {
            client,
            cache,
            model: model.into(),
            options,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.llm_client),
            state.cache.clone(),
            state.config.llm.model.clone(),
            ChatOptions::from(&state.config.llm),
        )
    }

    /// Start the lookup in the background and return its event channel.
    ///
    /// The task keeps draining the upstream stream after the receiver is
    /// dropped so a finished result still reaches the cache.
    pub fn spawn(&self, query: &str) -> mpsc::Receiver<LookupEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let lookup = self.clone();
        let query = query.trim().to_string();

        tokio::spawn(async move {
            lookup.run(query, tx).await;
        });

        rx
    }

    async fn run(self, query: String, tx: mpsc::Sender<LookupEvent>) {
        let started = Instant::now();
        let key = cache_key(&self.model, &query);
        let mut sink = Sink::new(tx);

        if let Some(text) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            tracing::info!(query = %query, "lookup served from cache");
            sink.send(LookupEvent::Chunk(text)).await;
            sink.send(LookupEvent::Done { cached: true }).await;
            return;
        }

        let request = ChatRequest::new(self.model.clone(), prompt::build_messages(&query))
            .with_options(self.options.clone());

        let mut stream = match self.client.chat_stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(query = %query, error = %e, "failed to start lookup");
                sink.send(LookupEvent::Error(e.to_string())).await;
                return;
            }
        };

        let mut text = String::new();
        let mut chunks = 0usize;

        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::Message { content }) => {
                    chunks += 1;
                    text.push_str(&content);
                    sink.send(LookupEvent::Chunk(content)).await;
                }
                Ok(StreamEvent::Done { finish_reason }) => {
                    let complete = matches!(finish_reason.as_deref(), None | Some("stop"));
                    if !complete {
                        tracing::warn!(
                            query = %query,
                            finish_reason = finish_reason.as_deref().unwrap_or("none"),
                            "lookup ended early, not caching"
                        );
                    }
                    if let Some(cache) = &self.cache {
                        if complete && !text.is_empty() {
                            cache.set(key.clone(), text.clone());
                        }
                    }
                    tracing::info!(
                        query = %query,
                        chunks,
                        finish_reason = finish_reason.as_deref().unwrap_or("none"),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        viewer_connected = sink.is_open(),
                        "lookup finished"
                    );
                    sink.send(LookupEvent::Done { cached: false }).await;
                    return;
                }
                Err(e) => {
                    tracing::error!(query = %query, chunks, error = %e, "lookup stream failed");
                    sink.send(LookupEvent::Error(e.to_string())).await;
                    return;
                }
            }
        }

        sink.send(LookupEvent::Error("stream ended unexpectedly".to_string()))
            .await;
    }
}

/// Sender that goes quiet once the viewer has gone away
struct Sink {
    tx: mpsc::Sender<LookupEvent>,
    open: bool,
}

impl Sink {
    fn new(tx: mpsc::Sender<LookupEvent>) -> Self {
        Self { tx, open: true }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn send(&mut self, event: LookupEvent) {
        if self.open && self.tx.send(event).await.is_err() {
            tracing::debug!("viewer disconnected, continuing lookup without output");
            self.open = false;
        }
    }
}
