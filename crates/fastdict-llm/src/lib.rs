pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod config;

pub use traits::{ChatClient, EventStream, ChatRequest, ChatResponse, ChatOptions, TokenUsage};

pub use streaming::{parse_chat_sse_stream, ChatStreamChunk, StreamEvent};
pub use buffer_utils::CircularLineBuffer;
pub use openai::OpenAIClient;
pub use config::{ClientFactory, OpenAIConfig, ProviderConfig};
pub use types::{Message, Content, ContentPart};
