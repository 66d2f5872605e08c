//! HTML for the lookup page.
//!
//! The page is sent as one progressively streamed document. Each chunk is
//! followed by a placeholder, and CSS hides every placeholder that is no
//! longer the last element, so `...` only ever shows at the tail while the
//! next chunk is pending.

use std::convert::Infallible;

use futures::Stream;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use tokio::sync::mpsc;

use crate::lookup::LookupEvent;

pub const TITLE: &str = "𝒻𝒶𝓈𝓉 Dictionary";

const ZERO_WIDTH_SPACE: char = '\u{200B}';

const STYLE: &str = r#"
body { margin: 0; background: linear-gradient(to bottom, #fffbeb, #ffffff); color: #1f2937; font-family: Georgia, "Times New Roman", serif; }
.page { display: flex; min-height: 100vh; flex-direction: column; align-items: center; padding: 1rem; }
.container { width: 100%; max-width: 42rem; }
h1 { font-size: 2.25rem; font-weight: 400; text-align: center; margin: 1.5rem 0 2rem; }
.search { margin-bottom: 1.5rem; }
.search input { box-sizing: border-box; width: 100%; border: 1px solid #d1d5db; border-radius: 0.5rem; padding: 0.75rem 1.5rem; font: inherit; font-size: 1.125rem; background: #fff; }
.search input:focus { outline: none; border-color: #6b7280; }
.card { border: 1px solid #e5e7eb; border-radius: 0.5rem; padding: 1.5rem; background: #fff; box-shadow: 0 4px 6px -1px rgba(0,0,0,.1); }
.card-header { display: flex; align-items: center; justify-content: space-between; margin-bottom: 1rem; }
.card-header h2 { font-size: 1.5rem; font-weight: 400; margin: 0; overflow: hidden; white-space: nowrap; text-overflow: ellipsis; }
.pronounce { border: none; background: none; cursor: pointer; font-size: 1.25rem; color: #4b5563; }
.chunk { white-space: pre-wrap; font-size: 1.125rem; line-height: 1.6; color: #374151; }
.ellipsis { color: #4b5563; margin: 0; }
.ellipsis:not(:last-child) { display: none; }
.filler { display: none; }
.error { color: #b91c1c; }
"#;

const SPEAK_SCRIPT: &str = r#"
function fastdictSpeak(el) {
  if (!("speechSynthesis" in window)) return;
  var utterance = new SpeechSynthesisUtterance(el.dataset.text);
  utterance.lang = "en-US";
  window.speechSynthesis.cancel();
  window.speechSynthesis.speak(utterance);
}
"#;

fn head() -> Markup {
    html! {
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            title { (TITLE) }
            style { (PreEscaped(STYLE)) }
            script { (PreEscaped(SPEAK_SCRIPT)) }
        }
    }
}

fn search_bar() -> Markup {
    html! {
        form.search action="/" method="get" {
            input type="text" name="query" autofocus placeholder="Look up a word/phrase..." autocomplete="off";
        }
    }
}

fn pronounce_button(query: &str) -> Markup {
    html! {
        button.pronounce type="button" data-text=(query) aria-label="Pronounce" title="Pronounce" onclick="fastdictSpeak(this)" {
            "🔊"
        }
    }
}

/// Everything up to the point where streamed chunks go
pub fn document_open(query: Option<&str>) -> String {
    let mut out = DOCTYPE.0.to_string();
    out.push_str(r#"<html lang="en">"#);
    out.push_str(&head().into_string());
    out.push_str(r#"<body><main class="page"><div class="container">"#);
    out.push_str(
        &html! {
            h1 { (TITLE) }
            (search_bar())
        }
        .into_string(),
    );

    if let Some(query) = query {
        out.push_str(r#"<div class="card">"#);
        out.push_str(
            &html! {
                div.card-header {
                    h2 title=(query) { (query) }
                    (pronounce_button(query))
                }
            }
            .into_string(),
        );
        out.push_str(r#"<div class="result" aria-live="polite">"#);
    }

    out
}

pub fn document_close(has_card: bool) -> String {
    let mut out = String::new();
    if has_card {
        out.push_str("</div></div>");
    }
    out.push_str("</div></main></body></html>");
    out
}

/// Hidden zero-width padding of at least `bytes` bytes; empty for 0
pub fn filler(bytes: usize) -> String {
    if bytes == 0 {
        return String::new();
    }
    let count = bytes.div_ceil(ZERO_WIDTH_SPACE.len_utf8());
    let padding: String = std::iter::repeat(ZERO_WIDTH_SPACE).take(count).collect();
    html! { span.filler aria-hidden="true" { (padding) } }.into_string()
}

pub fn ellipsis() -> Markup {
    html! { p.ellipsis { "..." } }
}

/// One streamed chunk plus the placeholder for the next one
pub fn chunk(text: &str) -> String {
    html! {
        span.chunk { (text) }
        (ellipsis())
    }
    .into_string()
}

/// Ends the stream; the trailing placeholder stops being last and hides
pub fn stream_end() -> String {
    html! { span.end {} }.into_string()
}

pub fn error_notice() -> String {
    html! {
        span.end {}
        p.error role="alert" { "Something went wrong while looking this up. Please try again." }
    }
    .into_string()
}

/// The page for an empty query: search bar only
pub fn empty_page() -> String {
    let mut out = document_open(None);
    out.push_str(&document_close(false));
    out
}

/// The search bar with a notice for a query that was not looked up
pub fn rejected_page(message: &str) -> String {
    let mut out = document_open(None);
    out.push_str(&html! { p.error role="alert" { (message) } }.into_string());
    out.push_str(&document_close(false));
    out
}

/// Stream a full lookup page, rendering events as they arrive
pub fn stream_page(
    query: String,
    mut events: mpsc::Receiver<LookupEvent>,
    filler_bytes: usize,
) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static {
    async_stream::stream! {
        let mut opening = document_open(Some(&query));
        opening.push_str(&filler(filler_bytes));
        opening.push_str(&ellipsis().into_string());
        yield Ok(opening);

        let mut finished = false;
        while let Some(event) = events.recv().await {
            match event {
                LookupEvent::Chunk(text) => yield Ok(chunk(&text)),
                LookupEvent::Done { .. } => {
                    yield Ok(stream_end());
                    finished = true;
                    break;
                }
                LookupEvent::Error(_) => {
                    yield Ok(error_notice());
                    finished = true;
                    break;
                }
            }
        }

        if !finished {
            yield Ok(error_notice());
        }

        yield Ok(document_close(true));
    }
}
