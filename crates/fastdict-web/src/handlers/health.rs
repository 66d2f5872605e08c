use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{cache::CacheStats, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.config.llm.model.clone(),
        cache: state.cache.as_ref().map(|c| c.stats()),
        timestamp: chrono::Utc::now(),
    })
}
