use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::SearchParams;
use crate::{error::ApiError, lookup::Lookup, render, state::AppState};

/// Render the search page, streaming the lookup result into it
pub async fn search_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = match params.validated(&state.config.llm) {
        Ok(Some(query)) => query,
        Ok(None) => return Html(render::empty_page()).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "lookup rejected");
            let status = e.status();
            let ApiError::BadRequest(message) = e;
            return (status, Html(render::rejected_page(&message))).into_response();
        }
    };

    tracing::info!(query = %query, "lookup requested");

    let events = Lookup::from_state(&state).spawn(&query);
    let body = Body::from_stream(render::stream_page(
        query,
        events,
        state.config.render.filler_bytes,
    ));

    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}
