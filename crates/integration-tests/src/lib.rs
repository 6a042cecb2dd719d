//! Integration tests for Shopfront.
//!
//! Each test starts a [`FakeShopApi`] on an ephemeral port, points a real
//! storefront at it with [`TestStorefront::spawn`], and drives the
//! storefront over HTTP with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_catalog` - Catalog reads and the response cache
//! - `storefront_session` - Cookie relay, cart and account mutations
//! - `storefront_checkout` - The checkout flow end to end

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use shopfront::config::StorefrontConfig;
use shopfront::routes;
use shopfront::state::AppState;

pub mod fixtures;

/// A canned Shop API answer.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: Value,
    set_cookies: Vec<String>,
}

impl Reply {
    /// `{"data": data}` with status 200.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "data": data }),
            set_cookies: Vec::new(),
        }
    }

    /// Top-level GraphQL errors with status 200.
    #[must_use]
    pub fn errors(errors: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "data": null, "errors": errors }),
            set_cookies: Vec::new(),
        }
    }

    /// A raw body with an arbitrary status.
    #[must_use]
    pub fn raw(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            set_cookies: Vec::new(),
        }
    }

    /// Add a `Set-Cookie` header.
    #[must_use]
    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookies.push(cookie.to_string());
        self
    }
}

/// One request the fake API received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: String,
    pub variables: Value,
    pub cookie: Option<String>,
    pub channel_token: Option<String>,
}

#[derive(Default)]
struct FakeState {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// An in-process stand-in for the Shop API.
///
/// Replies are queued per operation name. Each call takes the next reply;
/// the last one is repeated once the queue is down to it. Operations with
/// no reply get a GraphQL error.
pub struct FakeShopApi {
    url: String,
    state: Arc<FakeState>,
    server: JoinHandle<()>,
}

impl FakeShopApi {
    /// Start the fake API on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/shop-api", post(handle))
            .with_state(Arc::clone(&state));

        let (addr, server) = serve(app).await;
        Self {
            url: format!("http://{addr}/shop-api"),
            state,
            server,
        }
    }

    /// The endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queue a reply for `operation`.
    pub fn reply(&self, operation: &str, reply: Reply) -> &Self {
        lock(&self.state.replies)
            .entry(operation.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a `{"data": data}` reply for `operation`.
    pub fn reply_data(&self, operation: &str, data: Value) -> &Self {
        self.reply(operation, Reply::data(data))
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    /// Operation names received so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }

    /// How many times `operation` was called.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.state.calls)
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// The most recent call to `operation`.
    #[must_use]
    pub fn last_call(&self, operation: &str) -> Option<RecordedCall> {
        lock(&self.state.calls)
            .iter()
            .rev()
            .find(|c| c.operation == operation)
            .cloned()
    }
}

impl Drop for FakeShopApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let operation = body
        .get("operationName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    lock(&state.calls).push(RecordedCall {
        operation: operation.clone(),
        variables: body.get("variables").cloned().unwrap_or(Value::Null),
        cookie: header_value(header::COOKIE.as_str()),
        channel_token: header_value("vendure-token"),
    });

    let reply = {
        let mut replies = lock(&state.replies);
        replies.get_mut(&operation).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    let Some(reply) = reply else {
        return Json(json!({
            "data": null,
            "errors": [{ "message": format!("No reply queued for {operation}") }]
        }))
        .into_response();
    };

    let mut response = (reply.status, Json(reply.body)).into_response();
    for cookie in reply.set_cookies {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// A storefront served on an ephemeral port, talking to a [`FakeShopApi`].
pub struct TestStorefront {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
    server: JoinHandle<()>,
}

impl TestStorefront {
    /// Start a storefront whose Shop API is `api`.
    pub async fn spawn(api: &FakeShopApi) -> Self {
        Self::spawn_with(api, &[]).await
    }

    /// Start a storefront with extra configuration variables.
    pub async fn spawn_with(api: &FakeShopApi, vars: &[(&str, &str)]) -> Self {
        let mut all = vec![("COMMERCE_API_URL", api.url())];
        all.extend_from_slice(vars);
        let config = StorefrontConfig::from_vars(all).expect("valid test configuration");

        let state = AppState::new(config);
        let (addr, server) = serve(routes::app(state.clone())).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            state,
            server,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("storefront request failed")
    }

    /// POST a form to `path`.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("storefront request failed")
    }
}

impl Drop for TestStorefront {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, server)
}

/// Read a JSON response body.
pub async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.expect("response body is JSON")
}
