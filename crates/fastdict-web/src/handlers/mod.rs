pub mod health;
pub mod search;
pub mod stream;

use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::{ApiError, ApiResult};

/// `?query=` as submitted by the search form
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

impl SearchParams {
    /// The trimmed query, or None when there is nothing to look up
    pub fn validated(&self, llm: &LlmConfig) -> ApiResult<Option<String>> {
        let query = self.query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        if query.chars().count() > llm.max_query_chars {
            return Err(ApiError::BadRequest(format!(
                "Query is longer than {} characters",
                llm.max_query_chars
            )));
        }
        Ok(Some(query.to_string()))
    }
}
