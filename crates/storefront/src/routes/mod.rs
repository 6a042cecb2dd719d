//! HTTP route handlers for storefront.
//!
//! Every handler answers with JSON view models. Handlers that call the Shop
//! API on behalf of the shopper relay its `Set-Cookie` headers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Catalog
//! GET  /products                     - Filtered product listing
//! GET  /products/{slug}              - Product detail
//! GET  /collections                  - Collection tree
//! GET  /collections/{slug}           - Collection with filtered listing
//! GET  /search                       - Search results (`q`)
//! POST /filters                      - Apply a filter change (sets HX-Replace-Url)
//! GET  /countries                    - Countries the channel ships to
//!
//! # Cart (HTMX)
//! GET  /cart                         - Active order
//! POST /cart/add                     - Add item (triggers cart-updated)
//! POST /cart/adjust                  - Change quantity, 0 removes
//! POST /cart/remove                  - Remove line
//!
//! # Checkout
//! GET  /checkout                     - Begin or resume checkout
//! POST /checkout/customer            - Guest customer details
//! POST /checkout/shipping-address    - Shipping address
//! GET  /checkout/shipping-methods    - Eligible shipping methods
//! POST /checkout/shipping-method     - Choose shipping method
//! GET  /checkout/payment-methods     - Eligible payment methods
//! POST /checkout/payment             - Pay and place the order
//! GET  /checkout/confirmation/{code} - Placed order with upsells
//! POST /checkout/confirmation/{code}/upsell - Add upsell to a new cart
//!
//! # Account
//! POST /account/login                - Log in
//! POST /account/logout               - Log out
//! POST /account/register             - Register
//! POST /account/verify               - Verify registration
//! POST /account/password-reset/request - Email a reset token
//! POST /account/password-reset       - Reset password
//! GET  /account                      - Active customer with addresses
//! POST /account/profile              - Update profile
//! POST /account/password             - Change password
//! POST /account/email                - Change email address
//! POST /account/addresses            - Create address
//! POST /account/addresses/{id}       - Update address
//! DELETE /account/addresses/{id}     - Delete address
//! ```

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod collections;
pub mod filters;
pub mod forms;
pub mod products;
pub mod search;

use axum::{
    Json, Router,
    http::Request,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::commerce::ApiSession;
use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Answer with a handler result, relaying the Shop API's cookies either way.
pub fn respond<T: Serialize>(api: &ApiSession, result: crate::error::Result<T>) -> Response {
    (api.relay_headers(), result.map(Json)).into_response()
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{slug}", get(collections::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/adjust", post(cart::adjust))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::begin))
        .route("/customer", post(checkout::customer))
        .route("/shipping-address", post(checkout::shipping_address))
        .route("/shipping-methods", get(checkout::shipping_methods))
        .route("/shipping-method", post(checkout::shipping_method))
        .route("/payment-methods", get(checkout::payment_methods))
        .route("/payment", post(checkout::payment))
        .route("/confirmation/{code}", get(checkout::confirmation))
        .route("/confirmation/{code}/upsell", post(checkout::upsell))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .route("/register", post(account::register))
        .route("/verify", post(account::verify))
        .route(
            "/password-reset/request",
            post(account::request_password_reset),
        )
        .route("/password-reset", post(account::reset_password))
        .route("/profile", post(account::update_profile))
        .route("/password", post(account::change_password))
        .route("/email", post(account::change_email))
        .route("/addresses", post(account::create_address))
        .route(
            "/addresses/{id}",
            post(account::update_address).delete(account::delete_address),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .route("/search", get(search::search_page))
        .route("/filters", post(filters::apply))
        .route("/countries", get(account::countries))
        // Cart and checkout
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        // Account
        .nest("/account", account_routes())
}

/// Build the application with its trace, session and request ID layers.
///
/// Sentry layers are added by the binary so tests can drive the router
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the Shop API.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use crate::config::StorefrontConfig;
    use crate::error::AppError;
    use crate::middleware::REQUEST_ID_HEADER;

    #[test]
    fn test_respond_relays_cookies_on_error() {
        let api = ApiSession::default();
        api.capture_set_cookie(&header::HeaderValue::from_static("session=abc; Path=/"));

        let response = respond::<()>(&api, Err(AppError::BadRequest("nope".to_string())));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::SET_COOKIE).unwrap(),
            "session=abc; Path=/"
        );
    }

    fn test_state() -> AppState {
        // Nothing listens on the discard port; these tests never reach the API.
        let config =
            StorefrontConfig::from_vars([("COMMERCE_API_URL", "http://127.0.0.1:9/shop-api")])
                .unwrap();
        AppState::new(config)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_external_filter_path_rejected_without_remote_call() {
        let app = app(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/filters")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("path=%2F%2Fevil.example.com"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
