//! Shop API client stack.
//!
//! # Architecture
//!
//! - [`ApiGateway`] sends GraphQL documents with `reqwest`, forwards the
//!   browser's session cookie, and consults the [`ResponseCache`]
//! - [`PerformanceTracker`] wraps every gateway call with latency metrics
//! - [`CommerceClient`] exposes one typed method per remote operation and
//!   discriminates mutation result unions
//! - The commerce backend is the source of truth - NO local persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront::commerce::{ApiGateway, ApiSession, CommerceClient, ResponseCache};
//!
//! let cache = ResponseCache::new(config.cache.ttl, config.cache.max_capacity);
//! let gateway = ApiGateway::new(&config.api, cache, tracker);
//! let client = CommerceClient::new(gateway);
//!
//! // Anonymous catalog read (cacheable)
//! let product = client.product("ergonomic-chair").await?;
//!
//! // Session-bound order read (cookie forwarded, never cached)
//! let session = ApiSession::from_cookie_header(Some(cookie));
//! let order = client.active_order(&session).await?;
//! ```

mod cache;
mod client;
mod errors;
mod gateway;
mod metrics;
pub mod queries;
mod responses;
mod session;
pub mod types;

pub use cache::{CacheSweeper, ResponseCache};
pub use client::CommerceClient;
pub use errors::{ErrorCode, ErrorResult, GENERIC_ERROR_MESSAGE, MutationResult, user_message_for};
pub use gateway::{ApiGateway, RequestOptions};
pub use metrics::{PerformanceTracker, QueryMetrics};
pub use queries::Operation;
pub use session::ApiSession;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the Shop API.
///
/// These cover transport and protocol failures. Structured business errors
/// (the error variant of a mutation result union) are not errors at this
/// level; they arrive as [`MutationResult::Error`].
#[derive(Debug, Error)]
pub enum RemoteApiError {
    /// HTTP request failed (DNS, connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// GraphQL query returned top-level errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A GraphQL error returned by the Shop API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
    /// Server-provided error code from `extensions.code`, if any.
    pub code: Option<String>,
}

impl GraphQLError {
    /// Create an error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            code: None,
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if let Some(code) = &e.code {
                parts.push(format!("[{code}]"));
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl RemoteApiError {
    /// Whether any top-level GraphQL error carries the given extension code.
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        matches!(self, Self::GraphQL(errors) if errors.iter().any(|e| e.code.as_deref() == Some(code)))
    }
}
