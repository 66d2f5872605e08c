use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use super::SearchParams;
use crate::{
    error::{ApiError, ApiResult},
    lookup::{Lookup, LookupEvent},
    state::AppState,
};

/// Look up a query and stream the result using Server-Sent Events
pub async fn lookup_stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let query = params
        .validated(&state.config.llm)?
        .ok_or_else(|| ApiError::BadRequest("Missing query".to_string()))?;

    tracing::info!(query = %query, "lookup stream requested");

    let events = ReceiverStream::new(Lookup::from_state(&state).spawn(&query));

    let sse_stream = events.map(|event| Ok::<Event, Infallible>(to_sse_event(event)));

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

pub fn to_sse_event(event: LookupEvent) -> Event {
    match event {
        LookupEvent::Chunk(content) => Event::default()
            .event("message")
            .data(serde_json::json!({ "content": content }).to_string()),
        LookupEvent::Done { cached } => Event::default()
            .event("done")
            .data(serde_json::json!({ "status": "completed", "cached": cached }).to_string()),
        LookupEvent::Error(message) => Event::default()
            .event("error")
            .data(serde_json::json!({ "error": message }).to_string()),
    }
}
