//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use shopfront_core::FieldErrors;

use crate::checkout::CheckoutError;
use crate::commerce::{ErrorCode, ErrorResult, GENERIC_ERROR_MESSAGE, RemoteApiError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shop API operation failed.
    #[error("Shop API error: {0}")]
    Remote(#[from] RemoteApiError),

    /// The Shop API answered a mutation with a structured error.
    #[error("Rejected: {}", .0.message)]
    Rejected(ErrorResult),

    /// Checkout step failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Form input failed pre-flight validation.
    #[error("Validation error: {0}")]
    Validation(#[from] FieldErrors),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Remote(RemoteApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote(e) if e.has_code("FORBIDDEN") => StatusCode::UNAUTHORIZED,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Rejected(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::Api { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::Payment { .. } => StatusCode::PAYMENT_REQUIRED,
                CheckoutError::Precondition(_)
                | CheckoutError::StateTransition(_)
                | CheckoutError::EmptyCart
                | CheckoutError::StepOutOfOrder(_) => StatusCode::CONFLICT,
                CheckoutError::SessionExpired => StatusCode::GONE,
                CheckoutError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::Unexpected(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body safe to send to the client.
    fn body(self) -> ErrorBody {
        let mut body = ErrorBody {
            error: GENERIC_ERROR_MESSAGE.to_string(),
            code: None,
            fields: None,
        };

        match self {
            Self::Remote(RemoteApiError::NotFound(what)) | Self::NotFound(what) => {
                body.error = format!("Not found: {what}");
            }
            Self::Remote(e) if e.has_code("FORBIDDEN") => {
                body.error = "Please sign in to continue.".to_string();
            }
            Self::Rejected(error) => {
                body.error = error.user_message();
                body.code = Some(error.error_code);
            }
            Self::Validation(fields) | Self::Checkout(CheckoutError::Validation(fields)) => {
                body.error = "Please correct the highlighted fields.".to_string();
                body.fields = Some(fields);
            }
            Self::Checkout(err) => {
                body.error = err.user_message();
                if let CheckoutError::Api { code, .. } | CheckoutError::Payment { code, .. } = err {
                    body.code = Some(code);
                }
            }
            Self::Unauthorized(message) | Self::BadRequest(message) => body.error = message,
            // Don't expose internal error details to clients
            Self::Remote(_) | Self::Session(_) | Self::Internal(_) => {}
        }

        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<ErrorResult> for AppError {
    fn from(error: ErrorResult) -> Self {
        Self::Rejected(error)
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("variant_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
