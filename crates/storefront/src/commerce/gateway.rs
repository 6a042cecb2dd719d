//! HTTP gateway to the Shop API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use graphql_client::{PathFragment, QueryBody, Response};
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::config::CommerceApiConfig;

use super::cache::ResponseCache;
use super::metrics::PerformanceTracker;
use super::queries::Operation;
use super::session::ApiSession;
use super::{GraphQLError, GraphQLErrorLocation, RemoteApiError};

/// Header carrying the channel token.
const CHANNEL_TOKEN_HEADER: &str = "vendure-token";

/// Query text fragments that mark a document as never cacheable.
const SENSITIVE_MARKERS: &[&str] = &["password", "login", "authenticate"];

/// Per-call cache behaviour.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    /// Allow cache reads and writes for this call.
    pub cache: bool,
    /// Bypass the cache read for this call only.
    pub skip_cache: bool,
    /// Always go to the network (order and customer reads).
    pub fresh: bool,
    /// TTL override for the cache write.
    pub ttl: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            cache: true,
            skip_cache: false,
            fresh: false,
            ttl: None,
        }
    }
}

impl RequestOptions {
    /// Options for reads that must reflect the latest remote state.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            fresh: true,
            ..Self::default()
        }
    }

    /// Options that disable caching entirely.
    #[must_use]
    pub fn no_cache() -> Self {
        Self {
            cache: false,
            ..Self::default()
        }
    }

    const fn reads_cache(&self) -> bool {
        self.cache && !self.skip_cache && !self.fresh
    }
}

/// Sends GraphQL operations to the Shop API.
///
/// Cheap to clone; clones share the HTTP client and the response cache.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<ApiGatewayInner>,
}

struct ApiGatewayInner {
    client: reqwest::Client,
    endpoint: String,
    channel_token: Option<String>,
    cache: ResponseCache,
    tracker: PerformanceTracker,
}

impl ApiGateway {
    /// Create a gateway using the given cache and tracker.
    #[must_use]
    pub fn new(config: &CommerceApiConfig, cache: ResponseCache, tracker: PerformanceTracker) -> Self {
        Self {
            inner: Arc::new(ApiGatewayInner {
                client: reqwest::Client::new(),
                endpoint: config.api_url.clone(),
                channel_token: config
                    .channel_token
                    .as_ref()
                    .map(|t| t.expose_secret().to_string()),
                cache,
                tracker,
            }),
        }
    }

    /// The response cache shared by this gateway.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// The Shop API endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute `operation` and deserialize its `data` into `T`.
    ///
    /// When `session` is given the browser's cookies are forwarded and any
    /// `Set-Cookie` headers are captured into it. Only anonymous calls are
    /// written to the cache, and never mutations or documents touching
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteApiError`] on transport failure, a non-success status,
    /// top-level GraphQL errors, a missing `data` field, or a response that
    /// does not match `T`.
    #[instrument(
        skip(self, variables, session, options),
        fields(operation = operation.name, has_session = session.is_some())
    )]
    pub async fn request<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
        session: Option<&ApiSession>,
        options: RequestOptions,
    ) -> Result<T, RemoteApiError> {
        let start = Instant::now();
        let cacheable = options.cache && !operation.is_mutation();
        let key = cacheable.then(|| ResponseCache::create_key(operation.document, &variables));

        if options.reads_cache()
            && let Some(key) = &key
            && let Some(data) = self.inner.cache.get(key).await
        {
            debug!("Cache hit for operation");
            self.inner.tracker.record(operation.name, start, true, 0);
            return Ok(T::deserialize(data.as_ref())?);
        }

        let result = self.execute(operation, &variables, session).await;
        let size = result.as_ref().map_or(0, |(_, size)| *size);
        self.inner.tracker.record(operation.name, start, false, size);

        let (data, _) = result.inspect_err(|e| {
            error!(
                endpoint = %self.inner.endpoint,
                operation = operation.name,
                variables = %variables,
                has_session = session.is_some(),
                error = %e,
                "Shop API request failed"
            );
        })?;

        let data = Arc::new(data);
        let parsed = T::deserialize(data.as_ref())?;

        if let Some(key) = key
            && session.is_none()
            && !is_sensitive(operation.document)
        {
            self.inner.cache.set(key, data, options.ttl).await;
        }

        Ok(parsed)
    }

    /// Send the request and return the `data` value and the body size.
    async fn execute(
        &self,
        operation: &Operation,
        variables: &Value,
        session: Option<&ApiSession>,
    ) -> Result<(Value, usize), RemoteApiError> {
        let body = QueryBody {
            variables,
            query: operation.document,
            operation_name: operation.name,
        };

        let mut request = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);

        if let Some(token) = &self.inner.channel_token {
            request = request.header(CHANNEL_TOKEN_HEADER, token);
        }

        if let Some(cookie) = session.and_then(ApiSession::cookie_header) {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();

        if let Some(session) = session {
            for value in response.headers().get_all(SET_COOKIE) {
                session.capture_set_cookie(value);
            }
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;
        let size = response_text.len();

        if !status.is_success() {
            error!(
                status = %status,
                body = %truncate(&response_text, 500),
                "Shop API returned non-success status"
            );
            return Err(RemoteApiError::Status {
                status: status.as_u16(),
                body: truncate(&response_text, 200),
            });
        }

        let response: Response<Value> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                error!(
                    error = %e,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shop API response"
                );
                return Err(RemoteApiError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(RemoteApiError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        match response.data {
            Some(data) if !data.is_null() => Ok((data, size)),
            _ => {
                error!(
                    body = %truncate(&response_text, 500),
                    "Shop API response has no data and no errors"
                );
                Err(RemoteApiError::GraphQL(vec![GraphQLError::message(
                    "No data in response",
                )]))
            }
        }
    }
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        code: e
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string),
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(s) => Value::String(s),
                    PathFragment::Index(i) => Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

/// Whether a document touches credentials and must never be cached.
fn is_sensitive(document: &str) -> bool {
    let lower = document.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
