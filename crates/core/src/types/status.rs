//! Order state as reported by the Shop API.
//!
//! The order state machine is owned by the commerce backend. The storefront
//! only needs to recognize the handful of states checkout branches on; every
//! other state is carried through verbatim.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Remote order state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OrderState {
    /// Initial editable state; lines, customer and addresses may change.
    #[default]
    AddingItems,
    /// Order is locked for payment.
    ArrangingPayment,
    PaymentAuthorized,
    PaymentSettled,
    PartiallyShipped,
    Shipped,
    PartiallyDelivered,
    Delivered,
    Cancelled,
    /// Any state this client does not branch on (custom backend states).
    Other(String),
}

impl OrderState {
    /// Wire name of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AddingItems => "AddingItems",
            Self::ArrangingPayment => "ArrangingPayment",
            Self::PaymentAuthorized => "PaymentAuthorized",
            Self::PaymentSettled => "PaymentSettled",
            Self::PartiallyShipped => "PartiallyShipped",
            Self::Shipped => "Shipped",
            Self::PartiallyDelivered => "PartiallyDelivered",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other(state) => state,
        }
    }

    /// Whether payment has been accepted for the order.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(
            self,
            Self::PaymentAuthorized
                | Self::PaymentSettled
                | Self::PartiallyShipped
                | Self::Shipped
                | Self::PartiallyDelivered
                | Self::Delivered
        )
    }
}

impl From<String> for OrderState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "AddingItems" => Self::AddingItems,
            "ArrangingPayment" => Self::ArrangingPayment,
            "PaymentAuthorized" => Self::PaymentAuthorized,
            "PaymentSettled" => Self::PaymentSettled,
            "PartiallyShipped" => Self::PartiallyShipped,
            "Shipped" => Self::Shipped,
            "PartiallyDelivered" => Self::PartiallyDelivered,
            "Delivered" => Self::Delivered,
            "Cancelled" => Self::Cancelled,
            _ => Self::Other(state),
        }
    }
}

impl From<OrderState> for String {
    fn from(state: OrderState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_states_roundtrip_through_wire_names() {
        for name in ["AddingItems", "ArrangingPayment", "PaymentSettled", "Cancelled"] {
            let state = OrderState::from(name.to_string());
            assert!(!matches!(state, OrderState::Other(_)));
            assert_eq!(state.as_str(), name);
        }
    }

    #[test]
    fn test_custom_state_is_preserved() {
        let state: OrderState = serde_json::from_str("\"ValidatingCustomer\"").unwrap();
        assert_eq!(state, OrderState::Other("ValidatingCustomer".to_string()));
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            "\"ValidatingCustomer\""
        );
    }

    #[test]
    fn test_is_paid() {
        assert!(OrderState::PaymentAuthorized.is_paid());
        assert!(OrderState::Delivered.is_paid());
        assert!(!OrderState::ArrangingPayment.is_paid());
        assert!(!OrderState::AddingItems.is_paid());
    }
}
