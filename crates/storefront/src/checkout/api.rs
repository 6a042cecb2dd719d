//! Remote operations checkout depends on.

use async_trait::async_trait;

use shopfront_core::{OrderState, ShippingMethodId, VariantId};

use crate::catalog::ProductListOptions;
use crate::commerce::{
    AddressInput, ApiSession, CommerceClient, CustomerInput, MutationResult, Order, PaymentInput,
    PaymentMethodQuote, Product, RemoteApiError, ShippingMethodQuote,
};

/// The Shop API as seen from one browser session during checkout.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn active_order(&self) -> Result<Option<Order>, RemoteApiError>;

    async fn set_customer_for_order(
        &self,
        input: &CustomerInput,
    ) -> Result<MutationResult<Order>, RemoteApiError>;

    async fn set_order_shipping_address(
        &self,
        input: &AddressInput,
    ) -> Result<MutationResult<Order>, RemoteApiError>;

    async fn set_order_billing_address(
        &self,
        input: &AddressInput,
    ) -> Result<MutationResult<Order>, RemoteApiError>;

    async fn set_order_shipping_method(
        &self,
        method_id: &ShippingMethodId,
    ) -> Result<MutationResult<Order>, RemoteApiError>;

    async fn transition_order_to_state(
        &self,
        state: &OrderState,
    ) -> Result<MutationResult<Order>, RemoteApiError>;

    async fn add_payment_to_order(
        &self,
        input: &PaymentInput,
    ) -> Result<MutationResult<Order>, RemoteApiError>;

    async fn order_by_code(&self, code: &str) -> Result<Order, RemoteApiError>;

    async fn eligible_shipping_methods(&self) -> Result<Vec<ShippingMethodQuote>, RemoteApiError>;

    async fn eligible_payment_methods(&self) -> Result<Vec<PaymentMethodQuote>, RemoteApiError>;

    /// The most recently created products.
    async fn recent_products(&self, take: u32) -> Result<Vec<Product>, RemoteApiError>;

    async fn add_item_to_order(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<MutationResult<Order>, RemoteApiError>;
}

/// [`CheckoutApi`] over the real client, bound to the browser's session.
pub struct ShopApi<'a> {
    client: &'a CommerceClient,
    session: &'a ApiSession,
}

impl<'a> ShopApi<'a> {
    #[must_use]
    pub const fn new(client: &'a CommerceClient, session: &'a ApiSession) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl CheckoutApi for ShopApi<'_> {
    async fn active_order(&self) -> Result<Option<Order>, RemoteApiError> {
        self.client.active_order(self.session).await
    }

    async fn set_customer_for_order(
        &self,
        input: &CustomerInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client.set_customer_for_order(self.session, input).await
    }

    async fn set_order_shipping_address(
        &self,
        input: &AddressInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client.set_order_shipping_address(self.session, input).await
    }

    async fn set_order_billing_address(
        &self,
        input: &AddressInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client.set_order_billing_address(self.session, input).await
    }

    async fn set_order_shipping_method(
        &self,
        method_id: &ShippingMethodId,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client.set_order_shipping_method(self.session, method_id).await
    }

    async fn transition_order_to_state(
        &self,
        state: &OrderState,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client.transition_order_to_state(self.session, state).await
    }

    async fn add_payment_to_order(
        &self,
        input: &PaymentInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client.add_payment_to_order(self.session, input).await
    }

    async fn order_by_code(&self, code: &str) -> Result<Order, RemoteApiError> {
        self.client.order_by_code(self.session, code).await
    }

    async fn eligible_shipping_methods(&self) -> Result<Vec<ShippingMethodQuote>, RemoteApiError> {
        self.client.eligible_shipping_methods(self.session).await
    }

    async fn eligible_payment_methods(&self) -> Result<Vec<PaymentMethodQuote>, RemoteApiError> {
        self.client.eligible_payment_methods(self.session).await
    }

    async fn recent_products(&self, take: u32) -> Result<Vec<Product>, RemoteApiError> {
        let products = self.client.products(ProductListOptions::newest(take)).await?;
        Ok(products.items)
    }

    async fn add_item_to_order(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        self.client
            .add_item_to_order(self.session, variant_id, quantity)
            .await
    }
}
