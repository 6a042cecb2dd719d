//! Checkout: Customer → Shipping address → Shipping method → Payment →
//! Confirmation.
//!
//! The order itself lives in the Shop API; this module owns only the step
//! pointer and the rules for moving it.

mod api;
mod error;
mod orchestrator;
mod step;

pub use api::{CheckoutApi, ShopApi};
pub use error::{CheckoutError, SESSION_EXPIRED_MESSAGE};
pub use orchestrator::{
    CHECKOUT_SESSION_KEY, CheckoutOrchestrator, CheckoutOverview, CheckoutSession, Confirmation,
    MAX_UPSELLS,
};
pub use step::{CheckoutStep, StepOutOfOrder, transition};
