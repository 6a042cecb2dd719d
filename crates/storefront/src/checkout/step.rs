//! Checkout step ordering.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A checkout step, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutStep {
    Customer,
    ShippingAddress,
    ShippingMethod,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [Self; 5] = [
        Self::Customer,
        Self::ShippingAddress,
        Self::ShippingMethod,
        Self::Payment,
        Self::Confirmation,
    ];

    /// Kebab-case name, as used in URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::ShippingAddress => "shipping-address",
            Self::ShippingMethod => "shipping-method",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        }
    }

    /// 1-based position for progress indicators.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Customer => 1,
            Self::ShippingAddress => 2,
            Self::ShippingMethod => 3,
            Self::Payment => 4,
            Self::Confirmation => 5,
        }
    }

    /// The step after this one. Confirmation is terminal.
    #[must_use]
    pub const fn next(&self) -> Self {
        match self {
            Self::Customer => Self::ShippingAddress,
            Self::ShippingAddress => Self::ShippingMethod,
            Self::ShippingMethod => Self::Payment,
            Self::Payment | Self::Confirmation => Self::Confirmation,
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step was submitted before the steps it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot submit {submitted} while checkout is at {current}")]
pub struct StepOutOfOrder {
    pub current: CheckoutStep,
    pub submitted: CheckoutStep,
}

/// Where checkout goes after `submitted` succeeds.
///
/// The current step or any completed step may be submitted; resubmitting an
/// earlier step moves the pointer back to the step after it. Confirmation is
/// never submittable.
///
/// # Errors
///
/// Returns [`StepOutOfOrder`] for a step ahead of `current` or for
/// Confirmation.
pub fn transition(
    current: CheckoutStep,
    submitted: CheckoutStep,
) -> Result<CheckoutStep, StepOutOfOrder> {
    if submitted == CheckoutStep::Confirmation || submitted > current {
        return Err(StepOutOfOrder { current, submitted });
    }
    Ok(submitted.next())
}
