//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::{ApiGateway, CommerceClient, PerformanceTracker, ResponseCache};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the Shop API client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: CommerceClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the response cache and performance tracker from `config` and
    /// wires them into the Shop API client.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let cache = ResponseCache::new(config.cache.ttl, config.cache.max_capacity);
        let tracker = PerformanceTracker::new(
            config.diagnostics.slow_query_threshold,
            config.diagnostics.verbose,
        );
        let gateway = ApiGateway::new(&config.api, cache, tracker);

        Self {
            inner: Arc::new(AppStateInner {
                client: CommerceClient::new(gateway),
                config,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shop API client.
    #[must_use]
    pub fn client(&self) -> &CommerceClient {
        &self.inner.client
    }

    /// Get a reference to the process-wide response cache.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        self.inner.client.gateway().cache()
    }

    /// Products per catalog page.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.config.catalog_page_size
    }
}
