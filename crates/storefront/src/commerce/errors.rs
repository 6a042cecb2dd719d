//! Structured Shop API errors.
//!
//! Every Shop API mutation answers with a union: the success payload, or an
//! error object carrying an `errorCode` and a `message`. [`MutationResult`]
//! discriminates the two by the presence of `errorCode`, and
//! [`user_message_for`] maps known codes to sentences safe to show shoppers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Sentence shown when a failure carries no usable detail.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Known Shop API error codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    InvalidCredentials,
    NotVerified,
    VerificationTokenInvalid,
    VerificationTokenExpired,
    PasswordResetTokenInvalid,
    PasswordResetTokenExpired,
    PasswordValidation,
    PasswordAlreadySet,
    MissingPassword,
    EmailAddressConflict,
    IdentifierChangeTokenInvalid,
    IdentifierChangeTokenExpired,
    NativeAuthStrategy,
    AlreadyLoggedIn,
    GuestCheckout,
    NoActiveOrder,
    OrderModification,
    OrderLimit,
    NegativeQuantity,
    InsufficientStock,
    OrderStateTransition,
    OrderPaymentState,
    IneligibleShippingMethod,
    IneligiblePaymentMethod,
    PaymentFailed,
    PaymentDeclined,
    /// A code this client has no dedicated handling for.
    Other(String),
}

impl ErrorCode {
    /// Wire representation (e.g., `INVALID_CREDENTIALS_ERROR`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS_ERROR",
            Self::NotVerified => "NOT_VERIFIED_ERROR",
            Self::VerificationTokenInvalid => "VERIFICATION_TOKEN_INVALID_ERROR",
            Self::VerificationTokenExpired => "VERIFICATION_TOKEN_EXPIRED_ERROR",
            Self::PasswordResetTokenInvalid => "PASSWORD_RESET_TOKEN_INVALID_ERROR",
            Self::PasswordResetTokenExpired => "PASSWORD_RESET_TOKEN_EXPIRED_ERROR",
            Self::PasswordValidation => "PASSWORD_VALIDATION_ERROR",
            Self::PasswordAlreadySet => "PASSWORD_ALREADY_SET_ERROR",
            Self::MissingPassword => "MISSING_PASSWORD_ERROR",
            Self::EmailAddressConflict => "EMAIL_ADDRESS_CONFLICT_ERROR",
            Self::IdentifierChangeTokenInvalid => "IDENTIFIER_CHANGE_TOKEN_INVALID_ERROR",
            Self::IdentifierChangeTokenExpired => "IDENTIFIER_CHANGE_TOKEN_EXPIRED_ERROR",
            Self::NativeAuthStrategy => "NATIVE_AUTH_STRATEGY_ERROR",
            Self::AlreadyLoggedIn => "ALREADY_LOGGED_IN_ERROR",
            Self::GuestCheckout => "GUEST_CHECKOUT_ERROR",
            Self::NoActiveOrder => "NO_ACTIVE_ORDER_ERROR",
            Self::OrderModification => "ORDER_MODIFICATION_ERROR",
            Self::OrderLimit => "ORDER_LIMIT_ERROR",
            Self::NegativeQuantity => "NEGATIVE_QUANTITY_ERROR",
            Self::InsufficientStock => "INSUFFICIENT_STOCK_ERROR",
            Self::OrderStateTransition => "ORDER_STATE_TRANSITION_ERROR",
            Self::OrderPaymentState => "ORDER_PAYMENT_STATE_ERROR",
            Self::IneligibleShippingMethod => "INELIGIBLE_SHIPPING_METHOD_ERROR",
            Self::IneligiblePaymentMethod => "INELIGIBLE_PAYMENT_METHOD_ERROR",
            Self::PaymentFailed => "PAYMENT_FAILED_ERROR",
            Self::PaymentDeclined => "PAYMENT_DECLINED_ERROR",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "INVALID_CREDENTIALS_ERROR" => Self::InvalidCredentials,
            "NOT_VERIFIED_ERROR" => Self::NotVerified,
            "VERIFICATION_TOKEN_INVALID_ERROR" => Self::VerificationTokenInvalid,
            "VERIFICATION_TOKEN_EXPIRED_ERROR" => Self::VerificationTokenExpired,
            "PASSWORD_RESET_TOKEN_INVALID_ERROR" => Self::PasswordResetTokenInvalid,
            "PASSWORD_RESET_TOKEN_EXPIRED_ERROR" => Self::PasswordResetTokenExpired,
            "PASSWORD_VALIDATION_ERROR" => Self::PasswordValidation,
            "PASSWORD_ALREADY_SET_ERROR" => Self::PasswordAlreadySet,
            "MISSING_PASSWORD_ERROR" => Self::MissingPassword,
            "EMAIL_ADDRESS_CONFLICT_ERROR" => Self::EmailAddressConflict,
            "IDENTIFIER_CHANGE_TOKEN_INVALID_ERROR" => Self::IdentifierChangeTokenInvalid,
            "IDENTIFIER_CHANGE_TOKEN_EXPIRED_ERROR" => Self::IdentifierChangeTokenExpired,
            "NATIVE_AUTH_STRATEGY_ERROR" => Self::NativeAuthStrategy,
            "ALREADY_LOGGED_IN_ERROR" => Self::AlreadyLoggedIn,
            "GUEST_CHECKOUT_ERROR" => Self::GuestCheckout,
            "NO_ACTIVE_ORDER_ERROR" => Self::NoActiveOrder,
            "ORDER_MODIFICATION_ERROR" => Self::OrderModification,
            "ORDER_LIMIT_ERROR" => Self::OrderLimit,
            "NEGATIVE_QUANTITY_ERROR" => Self::NegativeQuantity,
            "INSUFFICIENT_STOCK_ERROR" => Self::InsufficientStock,
            "ORDER_STATE_TRANSITION_ERROR" => Self::OrderStateTransition,
            "ORDER_PAYMENT_STATE_ERROR" => Self::OrderPaymentState,
            "INELIGIBLE_SHIPPING_METHOD_ERROR" => Self::IneligibleShippingMethod,
            "INELIGIBLE_PAYMENT_METHOD_ERROR" => Self::IneligiblePaymentMethod,
            "PAYMENT_FAILED_ERROR" => Self::PaymentFailed,
            "PAYMENT_DECLINED_ERROR" => Self::PaymentDeclined,
            _ => Self::Other(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error variant of a mutation result union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResult {
    pub error_code: ErrorCode,
    #[serde(default)]
    pub message: String,
    /// Payment handler detail on `PAYMENT_FAILED_ERROR` / `PAYMENT_DECLINED_ERROR`.
    #[serde(default)]
    pub payment_error_message: Option<String>,
    /// State machine detail on `ORDER_STATE_TRANSITION_ERROR`.
    #[serde(default)]
    pub transition_error: Option<String>,
}

impl ErrorResult {
    /// Create an error result from a code and message.
    #[must_use]
    pub fn new(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
            payment_error_message: None,
            transition_error: None,
        }
    }

    /// The most specific detail available: payment detail, then transition
    /// detail, then the generic message.
    #[must_use]
    pub fn most_specific_message(&self) -> &str {
        [&self.payment_error_message, &self.transition_error]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|m| !m.trim().is_empty())
            .unwrap_or(&self.message)
    }

    /// Sentence safe to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        user_message_for(&self.error_code, &self.message)
    }
}

/// A mutation response: success payload or structured error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MutationResult<T> {
    /// Tried first: only matches objects with an `errorCode`.
    Error(ErrorResult),
    Success(T),
}

impl<T> MutationResult<T> {
    /// Convert into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorResult`] for the error variant.
    pub fn into_result(self) -> Result<T, ErrorResult> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(error) => Err(error),
        }
    }

    /// Whether this is the success variant.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Map the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationResult<U> {
        match self {
            Self::Success(value) => MutationResult::Success(f(value)),
            Self::Error(error) => MutationResult::Error(error),
        }
    }
}

/// Map an error code to a shopper-facing sentence.
///
/// Unknown codes fall back to the API's own message, and an empty message
/// falls back to a generic sentence.
#[must_use]
pub fn user_message_for(code: &ErrorCode, message: &str) -> String {
    let known = match code {
        ErrorCode::InvalidCredentials => "The email address or password is incorrect.",
        ErrorCode::NotVerified => {
            "Please verify your email address before signing in. Check your inbox for the verification link."
        }
        ErrorCode::VerificationTokenInvalid => {
            "This verification link is invalid. Please request a new one."
        }
        ErrorCode::VerificationTokenExpired => {
            "This verification link has expired. Please request a new one."
        }
        ErrorCode::PasswordResetTokenInvalid => {
            "This password reset link is invalid. Please request a new one."
        }
        ErrorCode::PasswordResetTokenExpired => {
            "This password reset link has expired. Please request a new one."
        }
        ErrorCode::PasswordValidation => {
            "The password does not meet the requirements. Use at least 8 characters with a letter and a number."
        }
        ErrorCode::PasswordAlreadySet => "A password has already been set for this account.",
        ErrorCode::MissingPassword => "Please enter a password.",
        ErrorCode::EmailAddressConflict => {
            "An account with this email address already exists. Please sign in instead."
        }
        ErrorCode::IdentifierChangeTokenInvalid | ErrorCode::IdentifierChangeTokenExpired => {
            "This email change link is no longer valid. Please request a new one."
        }
        ErrorCode::AlreadyLoggedIn => "You are already signed in.",
        ErrorCode::GuestCheckout => "Guest checkout is not available. Please sign in to continue.",
        ErrorCode::NoActiveOrder => "Your session has expired. Please restart checkout.",
        ErrorCode::InsufficientStock => "Not enough stock is available for the requested quantity.",
        ErrorCode::NegativeQuantity => "Quantity cannot be negative.",
        ErrorCode::OrderLimit => "This order has reached the maximum number of items.",
        ErrorCode::OrderModification => "This order can no longer be changed.",
        ErrorCode::IneligibleShippingMethod => {
            "The selected shipping method is not available for this order."
        }
        ErrorCode::IneligiblePaymentMethod => {
            "The selected payment method is not available for this order."
        }
        ErrorCode::PaymentDeclined => "Your payment was declined. Please try another payment method.",
        ErrorCode::PaymentFailed => "Your payment could not be processed. Please try again.",
        ErrorCode::NativeAuthStrategy
        | ErrorCode::OrderStateTransition
        | ErrorCode::OrderPaymentState
        | ErrorCode::Other(_) => {
            return if message.trim().is_empty() {
                GENERIC_ERROR_MESSAGE.to_string()
            } else {
                message.to_string()
            };
        }
    };
    known.to_string()
}
