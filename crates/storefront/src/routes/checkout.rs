//! Checkout route handlers.
//!
//! The order lives in the Shop API; the storefront session only stores the
//! current [`CheckoutSession`] step pointer. Progress is saved after each
//! successful step and left untouched when a step fails.

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{ShippingMethodId, VariantId};

use crate::checkout::{
    CHECKOUT_SESSION_KEY, CheckoutOrchestrator, CheckoutOverview, CheckoutSession, ShopApi,
};
use crate::commerce::{AddressInput, ApiSession, CustomerInput, PaymentInput};
use crate::error::{AppError, Result};
use crate::state::AppState;

use super::cart::CartView;
use super::forms::{AddressForm, CustomerForm};
use super::respond;

/// Shipping method form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodForm {
    #[serde(default)]
    pub shipping_method_id: String,
}

/// Payment form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    #[serde(default)]
    pub method: String,
}

/// Upsell form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsellForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get checkout progress from the session.
async fn load_progress(session: &Session) -> Result<Option<CheckoutSession>> {
    Ok(session.get::<CheckoutSession>(CHECKOUT_SESSION_KEY).await?)
}

/// Save checkout progress to the session.
async fn save_progress(session: &Session, progress: &CheckoutSession) -> Result<()> {
    session.insert(CHECKOUT_SESSION_KEY, progress).await?;
    Ok(())
}

fn orchestrator<'a>(state: &'a AppState, api: &'a ApiSession) -> CheckoutOrchestrator<ShopApi<'a>> {
    CheckoutOrchestrator::new(ShopApi::new(state.client(), api))
}

// =============================================================================
// Handlers
// =============================================================================

/// Start or resume checkout.
#[instrument(skip(state, api, session))]
pub async fn begin(State(state): State<AppState>, api: ApiSession, session: Session) -> Response {
    let result = async {
        let previous = load_progress(&session).await?;
        let overview = orchestrator(&state, &api).begin(previous).await?;
        save_progress(&session, &overview.session).await?;
        Ok::<_, AppError>(overview)
    }
    .await;
    respond(&api, result)
}

/// Submit guest customer details.
#[instrument(skip(state, api, session, form))]
pub async fn customer(
    State(state): State<AppState>,
    api: ApiSession,
    session: Session,
    Form(form): Form<CustomerForm>,
) -> Response {
    let input = CustomerInput::from(form);
    let result = async {
        let mut progress = load_progress(&session).await?.unwrap_or_default();
        let order = orchestrator(&state, &api)
            .submit_customer(&mut progress, &input)
            .await?;
        save_progress(&session, &progress).await?;
        Ok::<_, AppError>(CheckoutOverview {
            session: progress,
            order,
        })
    }
    .await;
    respond(&api, result)
}

/// Submit the shipping address.
#[instrument(skip(state, api, session, form))]
pub async fn shipping_address(
    State(state): State<AppState>,
    api: ApiSession,
    session: Session,
    Form(form): Form<AddressForm>,
) -> Response {
    let input = AddressInput::from(form);
    let result = async {
        let mut progress = load_progress(&session).await?.unwrap_or_default();
        let order = orchestrator(&state, &api)
            .submit_shipping_address(&mut progress, &input)
            .await?;
        save_progress(&session, &progress).await?;
        Ok::<_, AppError>(CheckoutOverview {
            session: progress,
            order,
        })
    }
    .await;
    respond(&api, result)
}

/// Choose a shipping method.
#[instrument(skip(state, api, session))]
pub async fn shipping_method(
    State(state): State<AppState>,
    api: ApiSession,
    session: Session,
    Form(form): Form<ShippingMethodForm>,
) -> Response {
    let method_id = ShippingMethodId::new(form.shipping_method_id.trim());
    let result = async {
        let mut progress = load_progress(&session).await?.unwrap_or_default();
        let order = orchestrator(&state, &api)
            .submit_shipping_method(&mut progress, &method_id)
            .await?;
        save_progress(&session, &progress).await?;
        Ok::<_, AppError>(CheckoutOverview {
            session: progress,
            order,
        })
    }
    .await;
    respond(&api, result)
}

/// Pay for the order. The billing address defaults to the shipping address.
#[instrument(skip(state, api, session))]
pub async fn payment(
    State(state): State<AppState>,
    api: ApiSession,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Response {
    let input = PaymentInput {
        method: form.method.trim().to_string(),
        metadata: json!({}),
    };
    let result = async {
        let mut progress = load_progress(&session).await?.unwrap_or_default();
        let order = orchestrator(&state, &api)
            .submit_payment(&mut progress, &input, None)
            .await?;
        save_progress(&session, &progress).await?;
        Ok::<_, AppError>(CheckoutOverview {
            session: progress,
            order,
        })
    }
    .await;
    respond(&api, result)
}

/// Shipping methods for the active order.
#[instrument(skip(state, api))]
pub async fn shipping_methods(State(state): State<AppState>, api: ApiSession) -> Response {
    let result = orchestrator(&state, &api)
        .shipping_methods()
        .await
        .map_err(Into::into);
    respond(&api, result)
}

/// Eligible payment methods for the active order.
#[instrument(skip(state, api))]
pub async fn payment_methods(State(state): State<AppState>, api: ApiSession) -> Response {
    let result = orchestrator(&state, &api)
        .payment_methods()
        .await
        .map_err(Into::into);
    respond(&api, result)
}

/// Order confirmation with upsell suggestions.
#[instrument(skip(state, api))]
pub async fn confirmation(
    State(state): State<AppState>,
    api: ApiSession,
    Path(code): Path<String>,
) -> Response {
    let result = orchestrator(&state, &api)
        .confirmation(&code)
        .await
        .map_err(Into::into);
    respond(&api, result)
}

/// Add an upsell item to a fresh cart (HTMX).
#[instrument(skip(state, api, session))]
pub async fn upsell(
    State(state): State<AppState>,
    api: ApiSession,
    session: Session,
    Path(code): Path<String>,
    Form(form): Form<UpsellForm>,
) -> Response {
    let variant_id = VariantId::new(form.variant_id.trim());
    let result = async {
        let progress = load_progress(&session).await?.unwrap_or_default();
        let order = orchestrator(&state, &api)
            .add_upsell_item(&progress, &code, &variant_id, form.quantity.unwrap_or(1))
            .await?;
        Ok::<_, AppError>(CartView::from(&order))
    }
    .await;
    super::cart::cart_updated(&api, result)
}
