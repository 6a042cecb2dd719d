//! `data` payload shapes, one per Shop API operation.
//!
//! Each wrapper mirrors the root field its document selects. The client
//! unwraps them into domain types; nothing outside `commerce` sees these.

use serde::Deserialize;

use super::errors::{ErrorCode, ErrorResult, MutationResult};
use super::types::{
    Collection, CollectionListItem, Country, CurrentUser, Customer, CustomerAddress, Order,
    PaginatedList, PaymentMethodQuote, Product, SearchResponse, ShippingMethodQuote, Success,
};

macro_rules! response_data {
    ($name:ident { $field:ident: $ty:ty }) => {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub(super) struct $name {
            pub $field: $ty,
        }
    };
}

// Catalog
response_data!(SearchData { search: SearchResponse });
response_data!(ProductsData { products: PaginatedList<Product> });
response_data!(ProductData { product: Option<Product> });
response_data!(CollectionData { collection: Option<Collection> });
response_data!(CollectionsData { collections: PaginatedList<CollectionListItem> });
response_data!(AvailableCountriesData { available_countries: Vec<Country> });

/// Collection and its product listing, fetched in one round trip.
#[derive(Debug, Deserialize)]
pub(super) struct CollectionWithProductsData {
    pub collection: Option<Collection>,
    pub search: SearchResponse,
}

// Active order
response_data!(ActiveOrderData { active_order: Option<Order> });
response_data!(OrderByCodeData { order_by_code: Option<Order> });
response_data!(AddItemToOrderData { add_item_to_order: MutationResult<Order> });
response_data!(RemoveOrderLineData { remove_order_line: MutationResult<Order> });
response_data!(AdjustOrderLineData { adjust_order_line: MutationResult<Order> });
response_data!(EligibleShippingMethodsData { eligible_shipping_methods: Vec<ShippingMethodQuote> });
response_data!(EligiblePaymentMethodsData { eligible_payment_methods: Vec<PaymentMethodQuote> });

// Checkout
response_data!(SetCustomerForOrderData { set_customer_for_order: MutationResult<Order> });
response_data!(SetOrderShippingAddressData { set_order_shipping_address: MutationResult<Order> });
response_data!(SetOrderBillingAddressData { set_order_billing_address: MutationResult<Order> });
response_data!(SetOrderShippingMethodData { set_order_shipping_method: MutationResult<Order> });
response_data!(AddPaymentToOrderData { add_payment_to_order: MutationResult<Order> });
response_data!(TransitionOrderToStateData { transition_order_to_state: Option<MutationResult<Order>> });

// Customer account
response_data!(ActiveCustomerData { active_customer: Option<Customer> });
response_data!(CreateCustomerAddressData { create_customer_address: CustomerAddress });
response_data!(UpdateCustomerAddressData { update_customer_address: CustomerAddress });
response_data!(DeleteCustomerAddressData { delete_customer_address: Success });
response_data!(UpdateCustomerData { update_customer: Customer });
response_data!(UpdateCustomerPasswordData { update_customer_password: MutationResult<Success> });
response_data!(RequestUpdateCustomerEmailAddressData {
    request_update_customer_email_address: MutationResult<Success>
});

// Authentication
response_data!(LoginData { login: MutationResult<CurrentUser> });
response_data!(LogoutData { logout: Success });
response_data!(RegisterCustomerAccountData { register_customer_account: MutationResult<Success> });
response_data!(VerifyCustomerAccountData { verify_customer_account: MutationResult<CurrentUser> });
response_data!(RequestPasswordResetData { request_password_reset: Option<MutationResult<Success>> });
response_data!(ResetPasswordData { reset_password: MutationResult<CurrentUser> });

/// A null transition result means there was no active order to move.
pub(super) fn transition_result(result: Option<MutationResult<Order>>) -> MutationResult<Order> {
    result.unwrap_or_else(|| {
        MutationResult::Error(ErrorResult::new(
            ErrorCode::NoActiveOrder,
            "There is no active order for this session",
        ))
    })
}

/// A null reset result is treated as success; the API never reveals
/// whether the address exists.
pub(super) fn password_reset_result(
    result: Option<MutationResult<Success>>,
) -> MutationResult<Success> {
    result.unwrap_or(MutationResult::Success(Success { success: true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mutation_union_discrimination() {
        let data: AddItemToOrderData = serde_json::from_value(json!({
            "addItemToOrder": {
                "errorCode": "INSUFFICIENT_STOCK_ERROR",
                "message": "Only 2 items were added to the order due to insufficient stock"
            }
        }))
        .unwrap();

        let error = data.add_item_to_order.into_result().unwrap_err();
        assert_eq!(error.error_code, ErrorCode::InsufficientStock);
    }

    #[test]
    fn test_null_transition_is_no_active_order() {
        let data: TransitionOrderToStateData =
            serde_json::from_value(json!({"transitionOrderToState": null})).unwrap();

        let error = transition_result(data.transition_order_to_state)
            .into_result()
            .unwrap_err();
        assert_eq!(error.error_code, ErrorCode::NoActiveOrder);
    }

    #[test]
    fn test_null_password_reset_is_success() {
        let data: RequestPasswordResetData =
            serde_json::from_value(json!({"requestPasswordReset": null})).unwrap();

        assert!(password_reset_result(data.request_password_reset).is_success());
    }

    #[test]
    fn test_missing_product_is_none() {
        let data: ProductData = serde_json::from_value(json!({"product": null})).unwrap();
        assert!(data.product.is_none());
    }
}
