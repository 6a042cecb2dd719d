//! Multi-step checkout over the remote active order.
//!
//! The orchestrator never holds order data between calls: every step reads
//! or mutates the remote active order and only the step pointer lives in the
//! browser session ([`CheckoutSession`]). The pointer advances only when the
//! remote mutation answers with its success variant.

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use shopfront_core::validation::validate_required;
use shopfront_core::{FieldErrors, OrderState, ShippingMethodId, VariantId};

use crate::commerce::{
    AddressInput, CustomerInput, ErrorCode, MutationResult, Order, OrderAddress, PaymentInput,
    PaymentMethodQuote, Product, RemoteApiError, ShippingMethodQuote,
};

use super::api::CheckoutApi;
use super::error::CheckoutError;
use super::step::{CheckoutStep, transition};

/// Upsell products shown on the confirmation page.
pub const MAX_UPSELLS: usize = 3;

/// Recent products considered for upsells.
const UPSELL_CANDIDATES: u32 = 12;

/// Session key for [`CheckoutSession`].
pub const CHECKOUT_SESSION_KEY: &str = "checkout";

/// Checkout progress, persisted per browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub step: CheckoutStep,
    pub has_customer: bool,
    pub order_code: Option<String>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self {
            step: CheckoutStep::Customer,
            has_customer: false,
            order_code: None,
        }
    }
}

/// Checkout state returned by [`CheckoutOrchestrator::begin`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOverview {
    pub session: CheckoutSession,
    pub order: Order,
}

/// A placed order and follow-up suggestions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub order: Order,
    pub upsells: Vec<Product>,
}

/// Drives the checkout steps against a [`CheckoutApi`].
pub struct CheckoutOrchestrator<A> {
    api: A,
}

impl<A: CheckoutApi> CheckoutOrchestrator<A> {
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Start or resume checkout.
    ///
    /// A finished checkout in `previous` is discarded. The Customer step is
    /// skipped when the order already has a customer.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` when there is no active order or it has no lines.
    #[instrument(skip_all)]
    pub async fn begin(
        &self,
        previous: Option<CheckoutSession>,
    ) -> Result<CheckoutOverview, CheckoutError> {
        let order = self
            .api
            .active_order()
            .await
            .map_err(|e| unexpected(CheckoutStep::Customer, e))?
            .filter(|order| !order.is_empty())
            .ok_or(CheckoutError::EmptyCart)?;

        let has_customer = order.customer.is_some();
        let mut session = previous
            .filter(|s| s.step != CheckoutStep::Confirmation)
            .unwrap_or_default();
        session.has_customer = has_customer;
        session.order_code = None;
        if has_customer && session.step == CheckoutStep::Customer {
            session.step = CheckoutStep::ShippingAddress;
        }

        Ok(CheckoutOverview { session, order })
    }

    /// Attach guest customer details.
    ///
    /// A logged-in shopper already has a customer; the API's
    /// `ALREADY_LOGGED_IN_ERROR` is treated as success.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad input, otherwise the mapped API error.
    #[instrument(skip_all)]
    pub async fn submit_customer(
        &self,
        session: &mut CheckoutSession,
        input: &CustomerInput,
    ) -> Result<Order, CheckoutError> {
        let next = transition(session.step, CheckoutStep::Customer)?;
        input.validate().map_err(CheckoutError::Validation)?;

        let result = self
            .api
            .set_customer_for_order(input)
            .await
            .map_err(|e| unexpected(CheckoutStep::Customer, e))?;

        let order = match result {
            MutationResult::Success(order) => order,
            MutationResult::Error(e) if e.error_code == ErrorCode::AlreadyLoggedIn => {
                self.require_active_order(CheckoutStep::Customer).await?
            }
            MutationResult::Error(e) => return Err(CheckoutError::from_result(e)),
        };

        session.has_customer = true;
        session.step = next;
        Ok(order)
    }

    /// Set the shipping address.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for bad input, otherwise the API error verbatim.
    #[instrument(skip_all)]
    pub async fn submit_shipping_address(
        &self,
        session: &mut CheckoutSession,
        input: &AddressInput,
    ) -> Result<Order, CheckoutError> {
        let next = transition(session.step, CheckoutStep::ShippingAddress)?;
        input.validate().map_err(CheckoutError::Validation)?;

        let order = self
            .api
            .set_order_shipping_address(input)
            .await
            .map_err(|e| unexpected(CheckoutStep::ShippingAddress, e))?
            .into_result()
            .map_err(CheckoutError::from_result)?;

        session.step = next;
        Ok(order)
    }

    /// Choose a shipping method.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank id, otherwise the mapped API error.
    #[instrument(skip(self, session, method_id), fields(method_id = %method_id))]
    pub async fn submit_shipping_method(
        &self,
        session: &mut CheckoutSession,
        method_id: &ShippingMethodId,
    ) -> Result<Order, CheckoutError> {
        let next = transition(session.step, CheckoutStep::ShippingMethod)?;

        let mut errors = FieldErrors::new();
        errors.check(
            "shippingMethodId",
            validate_required(method_id.as_str(), "Shipping method"),
        );
        errors.into_result().map_err(CheckoutError::Validation)?;

        let order = self
            .api
            .set_order_shipping_method(method_id)
            .await
            .map_err(|e| unexpected(CheckoutStep::ShippingMethod, e))?
            .into_result()
            .map_err(CheckoutError::from_result)?;

        session.step = next;
        Ok(order)
    }

    /// Pay for the order.
    ///
    /// Re-reads the active order and checks that a complete shipping address
    /// and a shipping method are set. An order still in `AddingItems` gets a
    /// billing address (the given one, or the shipping address) and is moved
    /// to `ArrangingPayment` first. Only the transition is fatal; a rejected
    /// billing address is logged and ignored.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when the active order is gone, `Precondition` for an
    /// incomplete earlier step, `StateTransition` when the order cannot be
    /// moved to payment, and `Payment` when the payment is rejected.
    #[instrument(skip(self, session, input, billing), fields(method = %input.method))]
    pub async fn submit_payment(
        &self,
        session: &mut CheckoutSession,
        input: &PaymentInput,
        billing: Option<&AddressInput>,
    ) -> Result<Order, CheckoutError> {
        transition(session.step, CheckoutStep::Payment)?;

        let mut errors = FieldErrors::new();
        errors.check("method", validate_required(&input.method, "Payment method"));
        errors.into_result().map_err(CheckoutError::Validation)?;

        let order = self.require_active_order(CheckoutStep::Payment).await?;

        if !order.has_complete_shipping_address() {
            return Err(CheckoutError::Precondition(
                "Please go back and complete your shipping address.".to_string(),
            ));
        }
        if order.shipping_lines.is_empty() {
            return Err(CheckoutError::Precondition(
                "Please go back and choose a shipping method.".to_string(),
            ));
        }

        match order.state {
            OrderState::AddingItems => self.arrange_payment(&order, billing).await?,
            OrderState::ArrangingPayment => {}
            ref other => {
                warn!(order_code = %order.code, state = %other, "Order not payable in its current state");
                return Err(CheckoutError::Precondition(
                    "This order can no longer be paid for. Please return to your cart.".to_string(),
                ));
            }
        }

        let result = self
            .api
            .add_payment_to_order(input)
            .await
            .map_err(|e| unexpected(CheckoutStep::Payment, e))?;

        let placed = match result {
            MutationResult::Success(order) => order,
            MutationResult::Error(e) if e.error_code == ErrorCode::NoActiveOrder => {
                return Err(CheckoutError::SessionExpired);
            }
            MutationResult::Error(e) => {
                return Err(CheckoutError::Payment {
                    message: e.most_specific_message().to_string(),
                    code: e.error_code,
                });
            }
        };

        info!(order_code = %placed.code, state = %placed.state, "Payment added to order");
        session.step = CheckoutStep::Confirmation;
        session.order_code = Some(placed.code.clone());
        Ok(placed)
    }

    /// Billing address (best effort), then the move to `ArrangingPayment`.
    async fn arrange_payment(
        &self,
        order: &Order,
        billing: Option<&AddressInput>,
    ) -> Result<(), CheckoutError> {
        let billing = billing.cloned().or_else(|| {
            order
                .billing_address
                .as_ref()
                .filter(|a| a.is_complete())
                .or(order.shipping_address.as_ref())
                .map(OrderAddress::to_input)
        });

        if let Some(billing) = billing {
            match self.api.set_order_billing_address(&billing).await {
                Ok(MutationResult::Success(_)) => {}
                Ok(MutationResult::Error(e)) => {
                    warn!(code = %e.error_code, message = %e.message, "Billing address rejected; continuing");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to set billing address; continuing");
                }
            }
        }

        self.api
            .transition_order_to_state(&OrderState::ArrangingPayment)
            .await
            .map_err(|e| unexpected(CheckoutStep::Payment, e))?
            .into_result()
            .map_err(|e| match e.error_code {
                ErrorCode::NoActiveOrder => CheckoutError::SessionExpired,
                _ => CheckoutError::StateTransition(e.most_specific_message().to_string()),
            })?;

        Ok(())
    }

    /// The placed order and up to [`MAX_UPSELLS`] products not in it.
    ///
    /// Upsell lookup failures only shorten the list.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` when the order is not visible to this session.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn confirmation(&self, code: &str) -> Result<Confirmation, CheckoutError> {
        let order = self.api.order_by_code(code).await.map_err(|e| match e {
            RemoteApiError::NotFound(_) => CheckoutError::OrderNotFound(code.to_string()),
            e => unexpected(CheckoutStep::Confirmation, e),
        })?;

        let upsells = match self.api.recent_products(UPSELL_CANDIDATES).await {
            Ok(products) => products
                .into_iter()
                .filter(|p| !order.contains_product(&p.id))
                .take(MAX_UPSELLS)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load upsell products");
                Vec::new()
            }
        };

        Ok(Confirmation { order, upsells })
    }

    /// Add an upsell item to a new active order. Checkout progress is not
    /// touched.
    ///
    /// Only the order this session placed offers upsells.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` when `code` is not the order placed in
    /// `session`, `Validation` for a zero quantity, otherwise the mapped API
    /// error.
    #[instrument(skip(self, session), fields(variant_id = %variant_id))]
    pub async fn add_upsell_item(
        &self,
        session: &CheckoutSession,
        code: &str,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Order, CheckoutError> {
        if session.order_code.as_deref() != Some(code) {
            return Err(CheckoutError::OrderNotFound(code.to_string()));
        }
        if quantity == 0 {
            let mut errors = FieldErrors::new();
            errors.add("quantity", "Quantity must be at least 1");
            return Err(CheckoutError::Validation(errors));
        }

        self.api
            .add_item_to_order(variant_id, quantity)
            .await
            .map_err(|e| unexpected(CheckoutStep::Confirmation, e))?
            .into_result()
            .map_err(CheckoutError::from_result)
    }

    /// Shipping methods the active order is eligible for.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` if the API request fails.
    pub async fn shipping_methods(&self) -> Result<Vec<ShippingMethodQuote>, CheckoutError> {
        self.api
            .eligible_shipping_methods()
            .await
            .map_err(|e| unexpected(CheckoutStep::ShippingMethod, e))
    }

    /// Eligible payment methods only.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` if the API request fails.
    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethodQuote>, CheckoutError> {
        let methods = self
            .api
            .eligible_payment_methods()
            .await
            .map_err(|e| unexpected(CheckoutStep::Payment, e))?;
        Ok(methods.into_iter().filter(|m| m.is_eligible).collect())
    }

    async fn require_active_order(&self, step: CheckoutStep) -> Result<Order, CheckoutError> {
        self.api
            .active_order()
            .await
            .map_err(|e| unexpected(step, e))?
            .ok_or(CheckoutError::SessionExpired)
    }
}

fn unexpected(step: CheckoutStep, e: RemoteApiError) -> CheckoutError {
    error!(step = %step, error = %e, "Checkout request failed");
    CheckoutError::Unexpected(e)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::commerce::{ErrorResult, ShippingLine, ShippingLineMethod};
    use shopfront_core::ProductId;

    fn sample_order() -> Order {
        serde_json::from_value(json!({
            "id": "1",
            "code": "ORDER1",
            "state": "AddingItems",
            "active": true,
            "orderPlacedAt": null,
            "currencyCode": "USD",
            "totalQuantity": 1,
            "subTotalWithTax": 1999,
            "shippingWithTax": 0,
            "totalWithTax": 1999,
            "customer": null,
            "shippingAddress": null,
            "billingAddress": null,
            "shippingLines": [],
            "lines": [{
                "id": "10",
                "quantity": 1,
                "unitPriceWithTax": 1999,
                "linePriceWithTax": 1999,
                "featuredAsset": null,
                "productVariant": {
                    "id": "7",
                    "name": "Chair",
                    "sku": "CH-1",
                    "product": {"id": "3", "name": "Chair", "slug": "chair"}
                }
            }]
        }))
        .unwrap()
    }

    fn product(id: &str) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Product {id}"),
            "slug": format!("product-{id}"),
            "description": "",
            "featuredAsset": null,
            "variants": []
        }))
        .unwrap()
    }

    fn complete_address() -> AddressInput {
        AddressInput {
            full_name: "Ada Lovelace".to_string(),
            street_line1: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            postal_code: "N1 9GU".to_string(),
            country_code: "GB".to_string(),
            ..AddressInput::default()
        }
    }

    fn customer() -> CustomerInput {
        CustomerInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email_address: "ada@example.com".to_string(),
            phone_number: None,
        }
    }

    fn payment() -> PaymentInput {
        PaymentInput {
            method: "standard-payment".to_string(),
            metadata: json!({}),
        }
    }

    /// In-memory stand-in for the Shop API's active order.
    #[derive(Default)]
    struct FakeApi {
        order: Mutex<Option<Order>>,
        calls: Mutex<Vec<&'static str>>,
        customer_error: Option<ErrorResult>,
        billing_error: Option<ErrorResult>,
        transition_error: Option<ErrorResult>,
        payment_error: Option<ErrorResult>,
        products: Vec<Product>,
    }

    impl FakeApi {
        fn with_order(order: Order) -> Self {
            Self {
                order: Mutex::new(Some(order)),
                ..Self::default()
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn update(&self, f: impl FnOnce(&mut Order)) -> MutationResult<Order> {
            let mut guard = self.order.lock().unwrap();
            match guard.as_mut() {
                Some(order) => {
                    f(order);
                    MutationResult::Success(order.clone())
                }
                None => MutationResult::Error(ErrorResult::new(
                    ErrorCode::NoActiveOrder,
                    "No active order",
                )),
            }
        }

    }

    #[async_trait]
    impl CheckoutApi for FakeApi {
        async fn active_order(&self) -> Result<Option<Order>, RemoteApiError> {
            self.record("activeOrder");
            Ok(self.order.lock().unwrap().clone())
        }

        async fn set_customer_for_order(
            &self,
            input: &CustomerInput,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("setCustomerForOrder");
            if let Some(e) = &self.customer_error {
                return Ok(MutationResult::Error(e.clone()));
            }
            let customer = json!({
                "id": "5",
                "firstName": input.first_name,
                "lastName": input.last_name,
                "emailAddress": input.email_address
            });
            Ok(self.update(|o| o.customer = Some(serde_json::from_value(customer).unwrap())))
        }

        async fn set_order_shipping_address(
            &self,
            input: &AddressInput,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("setOrderShippingAddress");
            Ok(self.update(|o| {
                o.shipping_address = Some(OrderAddress {
                    full_name: Some(input.full_name.clone()),
                    street_line1: Some(input.street_line1.clone()),
                    city: Some(input.city.clone()),
                    postal_code: Some(input.postal_code.clone()),
                    country_code: Some(input.country_code.clone()),
                    ..OrderAddress::default()
                });
            }))
        }

        async fn set_order_billing_address(
            &self,
            _input: &AddressInput,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("setOrderBillingAddress");
            if let Some(e) = &self.billing_error {
                return Ok(MutationResult::Error(e.clone()));
            }
            Ok(self.update(|_| {}))
        }

        async fn set_order_shipping_method(
            &self,
            method_id: &ShippingMethodId,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("setOrderShippingMethod");
            Ok(self.update(|o| {
                o.shipping_lines = vec![ShippingLine {
                    shipping_method: ShippingLineMethod {
                        id: method_id.clone(),
                        name: "Standard".to_string(),
                    },
                    price_with_tax: 500,
                }];
            }))
        }

        async fn transition_order_to_state(
            &self,
            state: &OrderState,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("transitionOrderToState");
            if let Some(e) = &self.transition_error {
                return Ok(MutationResult::Error(e.clone()));
            }
            Ok(self.update(|o| o.state = state.clone()))
        }

        async fn add_payment_to_order(
            &self,
            _input: &PaymentInput,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("addPaymentToOrder");
            if let Some(e) = &self.payment_error {
                return Ok(MutationResult::Error(e.clone()));
            }
            Ok(self.update(|o| {
                o.state = OrderState::PaymentSettled;
                o.active = false;
            }))
        }

        async fn order_by_code(&self, code: &str) -> Result<Order, RemoteApiError> {
            self.record("orderByCode");
            self.order
                .lock()
                .unwrap()
                .clone()
                .filter(|o| o.code == code)
                .ok_or_else(|| RemoteApiError::NotFound(code.to_string()))
        }

        async fn eligible_shipping_methods(
            &self,
        ) -> Result<Vec<ShippingMethodQuote>, RemoteApiError> {
            Ok(vec![serde_json::from_value(json!({
                "id": "1", "code": "standard", "name": "Standard", "priceWithTax": 500
            }))
            .unwrap()])
        }

        async fn eligible_payment_methods(&self) -> Result<Vec<PaymentMethodQuote>, RemoteApiError> {
            Ok(serde_json::from_value(json!([
                {"id": "1", "code": "card", "name": "Card", "isEligible": true, "eligibilityMessage": null},
                {"id": "2", "code": "invoice", "name": "Invoice", "isEligible": false, "eligibilityMessage": "Business accounts only"}
            ]))
            .unwrap())
        }

        async fn recent_products(&self, take: u32) -> Result<Vec<Product>, RemoteApiError> {
            Ok(self.products.iter().take(take as usize).cloned().collect())
        }

        async fn add_item_to_order(
            &self,
            _variant_id: &VariantId,
            _quantity: u32,
        ) -> Result<MutationResult<Order>, RemoteApiError> {
            self.record("addItemToOrder");
            Ok(MutationResult::Success(sample_order()))
        }
    }

    /// Order ready for payment: address and shipping line set.
    fn payable_order() -> Order {
        let mut order = sample_order();
        order.shipping_address = Some(OrderAddress {
            full_name: Some("Ada".to_string()),
            street_line1: Some("1 Way".to_string()),
            city: Some("London".to_string()),
            postal_code: Some("N1".to_string()),
            country_code: Some("GB".to_string()),
            ..OrderAddress::default()
        });
        order.shipping_lines = vec![ShippingLine {
            shipping_method: ShippingLineMethod {
                id: ShippingMethodId::new("1"),
                name: "Standard".to_string(),
            },
            price_with_tax: 500,
        }];
        order
    }

    fn at_payment() -> CheckoutSession {
        CheckoutSession {
            step: CheckoutStep::Payment,
            has_customer: true,
            order_code: None,
        }
    }

    #[tokio::test]
    async fn test_begin_requires_lines() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::default());
        assert!(matches!(orchestrator.begin(None).await, Err(CheckoutError::EmptyCart)));

        let mut empty = sample_order();
        empty.lines.clear();
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(empty));
        assert!(matches!(orchestrator.begin(None).await, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_begin_skips_customer_step_when_known() {
        let mut order = sample_order();
        order.customer = Some(
            serde_json::from_value(json!({
                "id": "5", "firstName": "Ada", "lastName": "L", "emailAddress": "ada@example.com"
            }))
            .unwrap(),
        );
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(order));

        let overview = orchestrator.begin(None).await.unwrap();
        assert!(overview.session.has_customer);
        assert_eq!(overview.session.step, CheckoutStep::ShippingAddress);
    }

    #[tokio::test]
    async fn test_begin_resumes_unfinished_checkout() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let previous = CheckoutSession {
            step: CheckoutStep::ShippingMethod,
            has_customer: true,
            order_code: None,
        };

        let overview = orchestrator.begin(Some(previous)).await.unwrap();
        assert_eq!(overview.session.step, CheckoutStep::ShippingMethod);

        let finished = CheckoutSession {
            step: CheckoutStep::Confirmation,
            has_customer: true,
            order_code: Some("OLD".to_string()),
        };
        let overview = orchestrator.begin(Some(finished)).await.unwrap();
        assert_eq!(overview.session, CheckoutSession::default());
    }

    #[tokio::test]
    async fn test_full_checkout_flow() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let mut session = orchestrator.begin(None).await.unwrap().session;
        assert_eq!(session.step, CheckoutStep::Customer);

        orchestrator.submit_customer(&mut session, &customer()).await.unwrap();
        assert_eq!(session.step, CheckoutStep::ShippingAddress);

        orchestrator
            .submit_shipping_address(&mut session, &complete_address())
            .await
            .unwrap();
        assert_eq!(session.step, CheckoutStep::ShippingMethod);

        orchestrator
            .submit_shipping_method(&mut session, &ShippingMethodId::new("1"))
            .await
            .unwrap();
        assert_eq!(session.step, CheckoutStep::Payment);

        let placed = orchestrator
            .submit_payment(&mut session, &payment(), None)
            .await
            .unwrap();
        assert_eq!(placed.state, OrderState::PaymentSettled);
        assert_eq!(session.step, CheckoutStep::Confirmation);
        assert_eq!(session.order_code.as_deref(), Some("ORDER1"));

        let calls = orchestrator.api.calls();
        let tail: Vec<_> = calls.iter().rev().take(4).rev().copied().collect();
        assert_eq!(
            tail,
            vec![
                "activeOrder",
                "setOrderBillingAddress",
                "transitionOrderToState",
                "addPaymentToOrder"
            ]
        );
    }

    #[tokio::test]
    async fn test_step_out_of_order_never_reaches_api() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let mut session = CheckoutSession::default();

        let result = orchestrator.submit_payment(&mut session, &payment(), None).await;
        assert!(matches!(result, Err(CheckoutError::StepOutOfOrder(_))));
        assert!(orchestrator.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_validation_never_reaches_api() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let mut session = CheckoutSession::default();
        let input = CustomerInput {
            email_address: "not-an-email".to_string(),
            ..customer()
        };

        let Err(CheckoutError::Validation(errors)) =
            orchestrator.submit_customer(&mut session, &input).await
        else {
            panic!("expected validation error");
        };
        assert!(errors.get("emailAddress").is_some());
        assert!(orchestrator.api.calls().is_empty());
        assert_eq!(session.step, CheckoutStep::Customer);
    }

    #[tokio::test]
    async fn test_already_logged_in_counts_as_success() {
        let api = FakeApi {
            customer_error: Some(ErrorResult::new(ErrorCode::AlreadyLoggedIn, "Already logged in")),
            ..FakeApi::with_order(sample_order())
        };
        let orchestrator = CheckoutOrchestrator::new(api);
        let mut session = CheckoutSession::default();

        orchestrator.submit_customer(&mut session, &customer()).await.unwrap();
        assert_eq!(session.step, CheckoutStep::ShippingAddress);
        assert!(session.has_customer);
    }

    #[tokio::test]
    async fn test_payment_requires_shipping_address_first() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let mut session = at_payment();

        let Err(CheckoutError::Precondition(message)) =
            orchestrator.submit_payment(&mut session, &payment(), None).await
        else {
            panic!("expected precondition error");
        };
        assert!(message.contains("shipping address"));
        assert_eq!(session.step, CheckoutStep::Payment);
        assert!(!orchestrator.api.calls().contains(&"addPaymentToOrder"));
    }

    #[tokio::test]
    async fn test_payment_requires_shipping_method() {
        let mut order = payable_order();
        order.shipping_lines.clear();
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(order));

        let Err(CheckoutError::Precondition(message)) = orchestrator
            .submit_payment(&mut at_payment(), &payment(), None)
            .await
        else {
            panic!("expected precondition error");
        };
        assert!(message.contains("shipping method"));
        assert!(!orchestrator.api.calls().contains(&"addPaymentToOrder"));
    }

    #[tokio::test]
    async fn test_billing_failure_is_not_fatal() {
        let api = FakeApi {
            billing_error: Some(ErrorResult::new(
                ErrorCode::Other("ORDER_MODIFICATION_ERROR".to_string()),
                "nope",
            )),
            ..FakeApi::with_order(payable_order())
        };
        let orchestrator = CheckoutOrchestrator::new(api);

        let placed = orchestrator
            .submit_payment(&mut at_payment(), &payment(), None)
            .await
            .unwrap();
        assert_eq!(placed.state, OrderState::PaymentSettled);
    }

    #[tokio::test]
    async fn test_transition_failure_is_fatal() {
        let mut transition_error =
            ErrorResult::new(ErrorCode::OrderStateTransition, "Cannot transition Order");
        transition_error.transition_error =
            Some("Cannot transition from AddingItems to ArrangingPayment".to_string());
        let api = FakeApi {
            transition_error: Some(transition_error),
            ..FakeApi::with_order(payable_order())
        };
        let orchestrator = CheckoutOrchestrator::new(api);

        let Err(CheckoutError::StateTransition(message)) = orchestrator
            .submit_payment(&mut at_payment(), &payment(), None)
            .await
        else {
            panic!("expected state transition error");
        };
        assert_eq!(message, "Cannot transition from AddingItems to ArrangingPayment");
        assert!(!orchestrator.api.calls().contains(&"addPaymentToOrder"));
    }

    #[tokio::test]
    async fn test_arranging_payment_skips_transition() {
        let mut order = payable_order();
        order.state = OrderState::ArrangingPayment;
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(order));

        orchestrator
            .submit_payment(&mut at_payment(), &payment(), None)
            .await
            .unwrap();
        let calls = orchestrator.api.calls();
        assert!(!calls.contains(&"transitionOrderToState"));
        assert!(!calls.contains(&"setOrderBillingAddress"));
    }

    #[tokio::test]
    async fn test_unpayable_state_is_precondition() {
        let mut order = payable_order();
        order.state = OrderState::PaymentSettled;
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(order));

        let result = orchestrator
            .submit_payment(&mut at_payment(), &payment(), None)
            .await;
        assert!(matches!(result, Err(CheckoutError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_payment_decline_prefers_payment_message() {
        let mut declined = ErrorResult::new(ErrorCode::PaymentDeclined, "The payment was declined");
        declined.payment_error_message = Some("Card expired".to_string());
        let api = FakeApi {
            payment_error: Some(declined),
            ..FakeApi::with_order(payable_order())
        };
        let orchestrator = CheckoutOrchestrator::new(api);
        let mut session = at_payment();

        let Err(error) = orchestrator.submit_payment(&mut session, &payment(), None).await else {
            panic!("expected payment error");
        };
        assert_eq!(error.user_message(), "Card expired");
        let CheckoutError::Payment { code, message } = error else {
            panic!("expected payment error");
        };
        assert_eq!(code, ErrorCode::PaymentDeclined);
        assert_eq!(message, "Card expired");
        assert_eq!(session.step, CheckoutStep::Payment);
        assert!(session.order_code.is_none());
    }

    #[tokio::test]
    async fn test_vanished_order_is_session_expired() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::default());
        let result = orchestrator
            .submit_payment(&mut at_payment(), &payment(), None)
            .await;
        assert!(matches!(result, Err(CheckoutError::SessionExpired)));

        let mut session = CheckoutSession {
            step: CheckoutStep::ShippingAddress,
            ..CheckoutSession::default()
        };
        let result = orchestrator
            .submit_shipping_address(&mut session, &complete_address())
            .await;
        assert!(matches!(result, Err(CheckoutError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_confirmation_upsells_exclude_ordered_products() {
        let api = FakeApi {
            products: vec![product("3"), product("4"), product("5"), product("6"), product("7")],
            ..FakeApi::with_order(sample_order())
        };
        let orchestrator = CheckoutOrchestrator::new(api);

        let confirmation = orchestrator.confirmation("ORDER1").await.unwrap();
        let ids: Vec<&ProductId> = confirmation.upsells.iter().map(|p| &p.id).collect();
        assert_eq!(
            ids,
            vec![&ProductId::new("4"), &ProductId::new("5"), &ProductId::new("6")]
        );

        let missing = orchestrator.confirmation("NOPE").await;
        assert!(matches!(missing, Err(CheckoutError::OrderNotFound(_))));
    }

    fn placed(code: &str) -> CheckoutSession {
        CheckoutSession {
            step: CheckoutStep::Confirmation,
            has_customer: true,
            order_code: Some(code.to_string()),
        }
    }

    #[tokio::test]
    async fn test_upsell_requires_quantity() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let session = placed("ABC123");
        let result = orchestrator
            .add_upsell_item(&session, "ABC123", &VariantId::new("7"), 0)
            .await;
        assert!(matches!(result, Err(CheckoutError::Validation(_))));

        orchestrator
            .add_upsell_item(&session, "ABC123", &VariantId::new("7"), 1)
            .await
            .unwrap();
        assert_eq!(orchestrator.api.calls(), vec!["addItemToOrder"]);
    }

    #[tokio::test]
    async fn test_upsell_only_for_order_placed_in_session() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));

        let result = orchestrator
            .add_upsell_item(&placed("ABC123"), "XYZ789", &VariantId::new("7"), 1)
            .await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound(code)) if code == "XYZ789"));

        let result = orchestrator
            .add_upsell_item(&CheckoutSession::default(), "ABC123", &VariantId::new("7"), 1)
            .await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound(_))));

        assert!(orchestrator.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_payment_methods_only_eligible() {
        let orchestrator = CheckoutOrchestrator::new(FakeApi::with_order(sample_order()));
        let methods = orchestrator.payment_methods().await.unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].code, "card");
        assert_eq!(orchestrator.shipping_methods().await.unwrap().len(), 1);
    }

    #[test]
    fn test_checkout_session_roundtrips_through_session_store() {
        let session = CheckoutSession {
            step: CheckoutStep::ShippingMethod,
            has_customer: true,
            order_code: None,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["step"], "shipping-method");
        assert_eq!(serde_json::from_value::<CheckoutSession>(value).unwrap(), session);
    }
}
