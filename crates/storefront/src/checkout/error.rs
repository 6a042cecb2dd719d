//! Checkout failures.

use thiserror::Error;

use shopfront_core::FieldErrors;

use crate::commerce::{ErrorCode, ErrorResult, GENERIC_ERROR_MESSAGE, RemoteApiError, user_message_for};

use super::step::StepOutOfOrder;

/// Sentence shown when the remote session or active order is gone.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your checkout session has expired. Please return to your cart and start checkout again.";

/// Why a checkout operation failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input rejected before reaching the network.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Structured error returned by the Shop API.
    #[error("{code}: {message}")]
    Api { code: ErrorCode, message: String },

    /// An earlier step is incomplete.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The order could not be moved to the payment state.
    #[error("order state transition failed: {0}")]
    StateTransition(String),

    /// The payment was rejected.
    #[error("payment failed ({code}): {message}")]
    Payment { code: ErrorCode, message: String },

    /// The remote session or active order no longer exists.
    #[error("checkout session expired")]
    SessionExpired,

    /// Checkout started with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    StepOutOfOrder(#[from] StepOutOfOrder),

    /// The requested order is not visible to this session.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// Transport or response-shape failure.
    #[error("unexpected Shop API failure: {0}")]
    Unexpected(#[from] RemoteApiError),
}

impl CheckoutError {
    /// Map a structured result error. A missing active order means the
    /// session expired.
    #[must_use]
    pub fn from_result(error: ErrorResult) -> Self {
        let message = error.most_specific_message().to_string();
        match error.error_code {
            ErrorCode::NoActiveOrder => Self::SessionExpired,
            code => Self::Api { code, message },
        }
    }

    /// Sentence safe to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "Please correct the highlighted fields.".to_string(),
            Self::Api { code, message } => user_message_for(code, message),
            Self::Payment { code, message } => {
                if message.trim().is_empty() {
                    user_message_for(code, message)
                } else {
                    message.clone()
                }
            }
            Self::Precondition(message) => message.clone(),
            Self::StateTransition(message) => {
                if message.trim().is_empty() {
                    GENERIC_ERROR_MESSAGE.to_string()
                } else {
                    format!("We couldn't prepare your order for payment: {message}")
                }
            }
            Self::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::StepOutOfOrder(_) => {
                "Please complete the previous checkout steps first.".to_string()
            }
            Self::OrderNotFound(_) => "We couldn't find that order.".to_string(),
            Self::Unexpected(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}
