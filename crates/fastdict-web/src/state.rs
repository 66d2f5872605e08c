use std::sync::Arc;

use fastdict_llm::ChatClient;

use crate::cache::ResponseCache;
use crate::config::Config;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm_client: Arc<dyn ChatClient>,
    /// None when caching is disabled
    pub cache: Option<Arc<ResponseCache>>,
}

impl AppState {
    pub fn new(config: Config, llm_client: Arc<dyn ChatClient>) -> Self {
        let cache = config.cache.enabled.then(|| {
            Arc::new(
                ResponseCache::new(config.cache.ttl()).with_max_entries(config.cache.max_entries),
            )
        });

        Self {
            config: Arc::new(config),
            llm_client,
            cache,
        }
    }
}
