//! Cart route handlers.
//!
//! The cart is the Shop API's active order, bound to the browser through the
//! API's own session cookie. Mutations answer with the updated cart and an
//! `HX-Trigger: cart-updated` header so other fragments can refresh.

use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopfront_core::{CurrencyCode, FieldErrors, OrderLineId, Price, VariantId};

use crate::commerce::{ApiSession, Order, OrderLine};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

use super::respond;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub variant_name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub code: Option<String>,
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        let zero = Price::new(0, CurrencyCode::default()).display();
        Self {
            code: None,
            items: Vec::new(),
            subtotal: zero.clone(),
            shipping: zero.clone(),
            total: zero,
            item_count: 0,
        }
    }
}

impl CartItemView {
    fn new(line: &OrderLine, currency: CurrencyCode) -> Self {
        let variant = &line.product_variant;
        Self {
            id: line.id.to_string(),
            slug: variant.product.slug.clone(),
            name: variant.product.name.clone(),
            variant_name: variant.name.clone(),
            sku: variant.sku.clone(),
            quantity: line.quantity,
            price: Price::new(line.unit_price_with_tax, currency).display(),
            line_price: Price::new(line.line_price_with_tax, currency).display(),
            image: line.featured_asset.as_ref().map(|a| a.preview.clone()),
        }
    }
}

impl From<&Order> for CartView {
    fn from(order: &Order) -> Self {
        let currency = order.currency_code;
        Self {
            code: Some(order.code.clone()),
            items: order
                .lines
                .iter()
                .map(|line| CartItemView::new(line, currency))
                .collect(),
            subtotal: Price::new(order.sub_total_with_tax, currency).display(),
            shipping: Price::new(order.shipping_with_tax, currency).display(),
            total: order.total().display(),
            item_count: order.total_quantity,
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Adjust quantity form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Display cart.
#[instrument(skip(state, api))]
pub async fn show(State(state): State<AppState>, api: ApiSession) -> Response {
    let result = state
        .client()
        .active_order(&api)
        .await
        .map(|order| order.as_ref().map_or_else(CartView::empty, CartView::from))
        .map_err(AppError::from);
    respond(&api, result)
}

/// Add item to cart (HTMX).
#[instrument(skip(state, api))]
pub async fn add(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let result = add_item(&state, &api, form).await;
    cart_updated(&api, result)
}

async fn add_item(state: &AppState, api: &ApiSession, form: AddToCartForm) -> Result<CartView> {
    let quantity = form.quantity.unwrap_or(1);
    let mut errors = FieldErrors::new();
    if form.variant_id.trim().is_empty() {
        errors.add("variantId", "Please choose an option");
    }
    if quantity == 0 {
        errors.add("quantity", "Quantity must be at least 1");
    }
    errors.into_result()?;

    let variant_id = VariantId::new(form.variant_id.trim());
    let order = state
        .client()
        .add_item_to_order(api, &variant_id, quantity)
        .await?
        .into_result()?;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("variant_id", variant_id.as_str())]),
    );

    Ok(CartView::from(&order))
}

/// Change a line's quantity (HTMX). Zero removes the line.
#[instrument(skip(state, api))]
pub async fn adjust(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<AdjustCartForm>,
) -> Response {
    let line_id = OrderLineId::new(form.line_id);
    let client = state.client();
    let result = if form.quantity == 0 {
        client.remove_order_line(&api, &line_id).await
    } else {
        client.adjust_order_line(&api, &line_id, form.quantity).await
    };

    let result = result
        .map_err(AppError::from)
        .and_then(|r| r.into_result().map_err(AppError::from))
        .map(|order| CartView::from(&order));
    cart_updated(&api, result)
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, api))]
pub async fn remove(
    State(state): State<AppState>,
    api: ApiSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let line_id = OrderLineId::new(form.line_id);
    let result = state
        .client()
        .remove_order_line(&api, &line_id)
        .await
        .map_err(AppError::from)
        .and_then(|r| r.into_result().map_err(AppError::from))
        .map(|order| CartView::from(&order));
    cart_updated(&api, result)
}

/// Respond with the cart, announcing the change on success.
pub(super) fn cart_updated(api: &ApiSession, result: Result<CartView>) -> Response {
    let trigger = result.is_ok().then_some(("HX-Trigger", "cart-updated"));
    (AppendHeaders(trigger), respond(api, result)).into_response()
}
