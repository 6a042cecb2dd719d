//! Typed Shop API operations.
//!
//! Catalog reads are anonymous and go through the response cache. Order and
//! customer reads forward the browser session and always hit the network.
//! Mutations are never cached.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::instrument;

use shopfront_core::{AddressId, OrderLineId, OrderState, ShippingMethodId, VariantId};

use crate::catalog::{ListQueryOptions, ProductListOptions};

use super::errors::MutationResult;
use super::gateway::{ApiGateway, RequestOptions};
use super::queries::{self, Operation};
use super::responses::{
    ActiveCustomerData, ActiveOrderData, AddItemToOrderData, AddPaymentToOrderData,
    AdjustOrderLineData, AvailableCountriesData, CollectionData, CollectionWithProductsData,
    CollectionsData, CreateCustomerAddressData, DeleteCustomerAddressData,
    EligiblePaymentMethodsData, EligibleShippingMethodsData, LoginData, LogoutData,
    OrderByCodeData, ProductData, ProductsData, RegisterCustomerAccountData,
    RemoveOrderLineData, RequestPasswordResetData, RequestUpdateCustomerEmailAddressData,
    ResetPasswordData, SearchData, SetCustomerForOrderData, SetOrderBillingAddressData,
    SetOrderShippingAddressData, SetOrderShippingMethodData, TransitionOrderToStateData,
    UpdateCustomerAddressData, UpdateCustomerData, UpdateCustomerPasswordData,
    VerifyCustomerAccountData, password_reset_result, transition_result,
};
use super::session::ApiSession;
use super::types::{
    AddressInput, Collection, CollectionListItem, Country, CurrentUser, Customer,
    CustomerAddress, CustomerInput, Order, PaginatedList, PaymentInput, PaymentMethodQuote,
    Product, RegisterCustomerInput, SearchResponse, ShippingMethodQuote, Success,
    UpdateCustomerInput,
};
use super::RemoteApiError;

/// Collections fetched for the navigation tree.
const COLLECTION_TREE_TAKE: u32 = 100;

/// Typed client for the Shop API.
///
/// Cheap to clone; clones share the gateway.
#[derive(Clone)]
pub struct CommerceClient {
    gateway: ApiGateway,
}

impl CommerceClient {
    /// Create a client over `gateway`.
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// The underlying gateway.
    #[must_use]
    pub const fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    async fn query<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
    ) -> Result<T, RemoteApiError> {
        self.gateway
            .request(operation, variables, None, RequestOptions::default())
            .await
    }

    async fn read<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
        session: &ApiSession,
    ) -> Result<T, RemoteApiError> {
        self.gateway
            .request(operation, variables, Some(session), RequestOptions::fresh())
            .await
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
        session: &ApiSession,
    ) -> Result<T, RemoteApiError> {
        self.gateway
            .request(operation, variables, Some(session), RequestOptions::no_cache())
            .await
    }

    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    /// Run a catalog search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, input))]
    pub async fn search(&self, input: &ListQueryOptions) -> Result<SearchResponse, RemoteApiError> {
        let data: SearchData = self.query(&queries::SEARCH, json!({ "input": input })).await?;
        Ok(data.search)
    }

    /// Run the filter-options search that feeds the catalog sidebar.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, input))]
    pub async fn search_filters(
        &self,
        input: &ListQueryOptions,
    ) -> Result<SearchResponse, RemoteApiError> {
        let data: SearchData = self
            .query(&queries::SEARCH_FILTERS, json!({ "input": input }))
            .await?;
        Ok(data.search)
    }

    /// List products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        options: ProductListOptions,
    ) -> Result<PaginatedList<Product>, RemoteApiError> {
        let data: ProductsData = self
            .query(&queries::GET_PRODUCTS, json!({ "options": options }))
            .await?;
        Ok(data.products)
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RemoteApiError::NotFound` if no product has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product(&self, slug: &str) -> Result<Product, RemoteApiError> {
        let data: ProductData = self.query(&queries::GET_PRODUCT, json!({ "slug": slug })).await?;
        data.product
            .ok_or_else(|| RemoteApiError::NotFound(format!("Product not found: {slug}")))
    }

    /// Get a collection by slug.
    ///
    /// # Errors
    ///
    /// Returns `RemoteApiError::NotFound` if no collection has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn collection(&self, slug: &str) -> Result<Collection, RemoteApiError> {
        let data: CollectionData = self
            .query(&queries::GET_COLLECTION, json!({ "slug": slug }))
            .await?;
        data.collection
            .ok_or_else(|| RemoteApiError::NotFound(format!("Collection not found: {slug}")))
    }

    /// Get a collection together with a filtered product listing.
    ///
    /// # Errors
    ///
    /// Returns `RemoteApiError::NotFound` if no collection has this slug.
    #[instrument(skip(self, input), fields(slug = %slug))]
    pub async fn collection_with_products(
        &self,
        slug: &str,
        input: &ListQueryOptions,
    ) -> Result<(Collection, SearchResponse), RemoteApiError> {
        let data: CollectionWithProductsData = self
            .query(
                &queries::GET_COLLECTION_WITH_PRODUCTS,
                json!({ "slug": slug, "input": input }),
            )
            .await?;
        let collection = data
            .collection
            .ok_or_else(|| RemoteApiError::NotFound(format!("Collection not found: {slug}")))?;
        Ok((collection, data.search))
    }

    /// List collections (flat; see `CollectionNode::build_tree`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn collections(&self) -> Result<Vec<CollectionListItem>, RemoteApiError> {
        let data: CollectionsData = self
            .query(
                &queries::GET_COLLECTIONS,
                json!({ "options": { "take": COLLECTION_TREE_TAKE } }),
            )
            .await?;
        Ok(data.collections.items)
    }

    /// Countries the channel ships to.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn available_countries(&self) -> Result<Vec<Country>, RemoteApiError> {
        let data: AvailableCountriesData = self
            .query(&queries::GET_AVAILABLE_COUNTRIES, json!({}))
            .await?;
        Ok(data.available_countries)
    }

    // =========================================================================
    // Active order (session-bound, never cached)
    // =========================================================================

    /// The session's active order, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn active_order(&self, session: &ApiSession) -> Result<Option<Order>, RemoteApiError> {
        let data: ActiveOrderData = self
            .read(&queries::GET_ACTIVE_ORDER, json!({}), session)
            .await?;
        Ok(data.active_order)
    }

    /// Add a variant to the active order, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(variant_id = %variant_id))]
    pub async fn add_item_to_order(
        &self,
        session: &ApiSession,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: AddItemToOrderData = self
            .mutate(
                &queries::ADD_ITEM_TO_ORDER,
                json!({ "productVariantId": variant_id, "quantity": quantity }),
                session,
            )
            .await?;
        Ok(data.add_item_to_order)
    }

    /// Remove a line from the active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(line_id = %line_id))]
    pub async fn remove_order_line(
        &self,
        session: &ApiSession,
        line_id: &OrderLineId,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: RemoveOrderLineData = self
            .mutate(
                &queries::REMOVE_ORDER_LINE,
                json!({ "orderLineId": line_id }),
                session,
            )
            .await?;
        Ok(data.remove_order_line)
    }

    /// Change the quantity of a line in the active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(line_id = %line_id))]
    pub async fn adjust_order_line(
        &self,
        session: &ApiSession,
        line_id: &OrderLineId,
        quantity: u32,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: AdjustOrderLineData = self
            .mutate(
                &queries::ADJUST_ORDER_LINE,
                json!({ "orderLineId": line_id, "quantity": quantity }),
                session,
            )
            .await?;
        Ok(data.adjust_order_line)
    }

    /// Shipping methods eligible for the active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn eligible_shipping_methods(
        &self,
        session: &ApiSession,
    ) -> Result<Vec<ShippingMethodQuote>, RemoteApiError> {
        let data: EligibleShippingMethodsData = self
            .read(&queries::GET_ELIGIBLE_SHIPPING_METHODS, json!({}), session)
            .await?;
        Ok(data.eligible_shipping_methods)
    }

    /// Payment methods for the active order, with eligibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn eligible_payment_methods(
        &self,
        session: &ApiSession,
    ) -> Result<Vec<PaymentMethodQuote>, RemoteApiError> {
        let data: EligiblePaymentMethodsData = self
            .read(&queries::GET_ELIGIBLE_PAYMENT_METHODS, json!({}), session)
            .await?;
        Ok(data.eligible_payment_methods)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Attach guest customer details to the active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input))]
    pub async fn set_customer_for_order(
        &self,
        session: &ApiSession,
        input: &CustomerInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: SetCustomerForOrderData = self
            .mutate(&queries::SET_CUSTOMER_FOR_ORDER, json!({ "input": input }), session)
            .await?;
        Ok(data.set_customer_for_order)
    }

    /// Set the active order's shipping address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input))]
    pub async fn set_order_shipping_address(
        &self,
        session: &ApiSession,
        input: &AddressInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: SetOrderShippingAddressData = self
            .mutate(&queries::SET_ORDER_SHIPPING_ADDRESS, json!({ "input": input }), session)
            .await?;
        Ok(data.set_order_shipping_address)
    }

    /// Set the active order's billing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input))]
    pub async fn set_order_billing_address(
        &self,
        session: &ApiSession,
        input: &AddressInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: SetOrderBillingAddressData = self
            .mutate(&queries::SET_ORDER_BILLING_ADDRESS, json!({ "input": input }), session)
            .await?;
        Ok(data.set_order_billing_address)
    }

    /// Select the shipping method for the active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(method_id = %method_id))]
    pub async fn set_order_shipping_method(
        &self,
        session: &ApiSession,
        method_id: &ShippingMethodId,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: SetOrderShippingMethodData = self
            .mutate(
                &queries::SET_ORDER_SHIPPING_METHOD,
                json!({ "shippingMethodId": [method_id] }),
                session,
            )
            .await?;
        Ok(data.set_order_shipping_method)
    }

    /// Add a payment to the active order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input), fields(method = %input.method))]
    pub async fn add_payment_to_order(
        &self,
        session: &ApiSession,
        input: &PaymentInput,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: AddPaymentToOrderData = self
            .mutate(&queries::ADD_PAYMENT_TO_ORDER, json!({ "input": input }), session)
            .await?;
        Ok(data.add_payment_to_order)
    }

    /// Move the active order to another state.
    ///
    /// A missing active order comes back as a `NO_ACTIVE_ORDER_ERROR` result.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(state = %state))]
    pub async fn transition_order_to_state(
        &self,
        session: &ApiSession,
        state: &OrderState,
    ) -> Result<MutationResult<Order>, RemoteApiError> {
        let data: TransitionOrderToStateData = self
            .mutate(
                &queries::TRANSITION_ORDER_TO_STATE,
                json!({ "state": state.as_str() }),
                session,
            )
            .await?;
        Ok(transition_result(data.transition_order_to_state))
    }

    /// Look up a placed order by code.
    ///
    /// # Errors
    ///
    /// Returns `RemoteApiError::NotFound` if the order is not visible to this
    /// session.
    #[instrument(skip(self, session), fields(code = %code))]
    pub async fn order_by_code(&self, session: &ApiSession, code: &str) -> Result<Order, RemoteApiError> {
        let data: OrderByCodeData = self
            .read(&queries::GET_ORDER_BY_CODE, json!({ "code": code }), session)
            .await?;
        data.order_by_code
            .ok_or_else(|| RemoteApiError::NotFound(format!("Order not found: {code}")))
    }

    // =========================================================================
    // Customer account
    // =========================================================================

    /// The logged-in customer, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn active_customer(&self, session: &ApiSession) -> Result<Option<Customer>, RemoteApiError> {
        let data: ActiveCustomerData = self
            .read(&queries::GET_ACTIVE_CUSTOMER, json!({}), session)
            .await?;
        Ok(data.active_customer)
    }

    /// Save a new address to the customer account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input))]
    pub async fn create_customer_address(
        &self,
        session: &ApiSession,
        input: &AddressInput,
    ) -> Result<CustomerAddress, RemoteApiError> {
        let data: CreateCustomerAddressData = self
            .mutate(&queries::CREATE_CUSTOMER_ADDRESS, json!({ "input": input }), session)
            .await?;
        Ok(data.create_customer_address)
    }

    /// Update a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input), fields(address_id = %id))]
    pub async fn update_customer_address(
        &self,
        session: &ApiSession,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<CustomerAddress, RemoteApiError> {
        let mut input = serde_json::to_value(input)?;
        if let Value::Object(fields) = &mut input {
            fields.insert("id".to_string(), json!(id));
        }

        let data: UpdateCustomerAddressData = self
            .mutate(&queries::UPDATE_CUSTOMER_ADDRESS, json!({ "input": input }), session)
            .await?;
        Ok(data.update_customer_address)
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(address_id = %id))]
    pub async fn delete_customer_address(
        &self,
        session: &ApiSession,
        id: &AddressId,
    ) -> Result<Success, RemoteApiError> {
        let data: DeleteCustomerAddressData = self
            .mutate(&queries::DELETE_CUSTOMER_ADDRESS, json!({ "id": id }), session)
            .await?;
        Ok(data.delete_customer_address)
    }

    /// Update the customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input))]
    pub async fn update_customer(
        &self,
        session: &ApiSession,
        input: &UpdateCustomerInput,
    ) -> Result<Customer, RemoteApiError> {
        let data: UpdateCustomerData = self
            .mutate(&queries::UPDATE_CUSTOMER, json!({ "input": input }), session)
            .await?;
        Ok(data.update_customer)
    }

    /// Change the customer's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn update_customer_password(
        &self,
        session: &ApiSession,
        current_password: &str,
        new_password: &str,
    ) -> Result<MutationResult<Success>, RemoteApiError> {
        let data: UpdateCustomerPasswordData = self
            .mutate(
                &queries::UPDATE_CUSTOMER_PASSWORD,
                json!({ "currentPassword": current_password, "newPassword": new_password }),
                session,
            )
            .await?;
        Ok(data.update_customer_password)
    }

    /// Start an email address change; the API mails a confirmation link.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn request_update_customer_email_address(
        &self,
        session: &ApiSession,
        password: &str,
        new_email_address: &str,
    ) -> Result<MutationResult<Success>, RemoteApiError> {
        let data: RequestUpdateCustomerEmailAddressData = self
            .mutate(
                &queries::REQUEST_UPDATE_CUSTOMER_EMAIL_ADDRESS,
                json!({ "password": password, "newEmailAddress": new_email_address }),
                session,
            )
            .await?;
        Ok(data.request_update_customer_email_address)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, password), fields(username = %username))]
    pub async fn authenticate(
        &self,
        session: &ApiSession,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<MutationResult<CurrentUser>, RemoteApiError> {
        let data: LoginData = self
            .mutate(
                &queries::LOGIN,
                json!({ "username": username, "password": password, "rememberMe": remember_me }),
                session,
            )
            .await?;
        Ok(data.login)
    }

    /// End the remote session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &ApiSession) -> Result<Success, RemoteApiError> {
        let data: LogoutData = self.mutate(&queries::LOGOUT, json!({}), session).await?;
        Ok(data.logout)
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session, input), fields(email = %input.email_address))]
    pub async fn register_customer_account(
        &self,
        session: &ApiSession,
        input: &RegisterCustomerInput,
    ) -> Result<MutationResult<Success>, RemoteApiError> {
        let data: RegisterCustomerAccountData = self
            .mutate(&queries::REGISTER_CUSTOMER_ACCOUNT, json!({ "input": input }), session)
            .await?;
        Ok(data.register_customer_account)
    }

    /// Verify a new account with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn verify_customer_account(
        &self,
        session: &ApiSession,
        token: &str,
        password: Option<&str>,
    ) -> Result<MutationResult<CurrentUser>, RemoteApiError> {
        let data: VerifyCustomerAccountData = self
            .mutate(
                &queries::VERIFY_CUSTOMER_ACCOUNT,
                json!({ "token": token, "password": password }),
                session,
            )
            .await?;
        Ok(data.verify_customer_account)
    }

    /// Request a password reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(email = %email_address))]
    pub async fn request_password_reset(
        &self,
        session: &ApiSession,
        email_address: &str,
    ) -> Result<MutationResult<Success>, RemoteApiError> {
        let data: RequestPasswordResetData = self
            .mutate(
                &queries::REQUEST_PASSWORD_RESET,
                json!({ "emailAddress": email_address }),
                session,
            )
            .await?;
        Ok(password_reset_result(data.request_password_reset))
    }

    /// Set a new password with the emailed reset token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        session: &ApiSession,
        token: &str,
        password: &str,
    ) -> Result<MutationResult<CurrentUser>, RemoteApiError> {
        let data: ResetPasswordData = self
            .mutate(
                &queries::RESET_PASSWORD,
                json!({ "token": token, "password": password }),
                session,
            )
            .await?;
        Ok(data.reset_password)
    }

    /// Drop every cached response.
    pub fn invalidate_all(&self) {
        self.gateway.cache().clear();
    }
}
