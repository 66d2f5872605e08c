use std::io::Write;

use anyhow::Result;
use fastdict_llm::{ChatClient, ChatRequest, Message, OpenAIClient, StreamEvent};
use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let word = std::env::args().nth(1).unwrap_or_else(|| "serendipity".to_string());
    let client = OpenAIClient::new(api_key)?;

    let request = ChatRequest::new(
        "gpt-4o-mini",
        vec![
            Message::system("Provide the Chinese translation and a brief definition."),
            Message::human(format!("Look up: {}", word)),
        ],
    );

    let mut stream = client.chat_stream(request).await?;

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Message { content } => {
                print!("{}", content);
                std::io::stdout().flush()?;
            }
            StreamEvent::Done { finish_reason } => {
                println!();
                if let Some(reason) = finish_reason {
                    println!("Finish reason: {}", reason);
                }
            }
        }
    }

    Ok(())
}
