//! GraphQL documents for the Shop API.
//!
//! Each operation lives in `graphql/shop/operations/` and is compiled in
//! together with exactly the fragments it spreads (from
//! `graphql/shop/fragments/`), since the Shop API rejects documents with
//! unused fragments.

/// A named GraphQL operation and its full document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Operation name, sent as `operationName`.
    pub name: &'static str,
    /// Document text including fragment definitions.
    pub document: &'static str,
}

impl Operation {
    /// Whether the document is a mutation.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        self.document.trim_start().starts_with("mutation")
    }
}

macro_rules! shop_document {
    ($operation:literal $(, $fragment:literal)* $(,)?) => {
        concat!(
            include_str!(concat!("../../graphql/shop/operations/", $operation, ".graphql")),
            $(
                "\n",
                include_str!(concat!("../../graphql/shop/fragments/", $fragment, ".graphql")),
            )*
        )
    };
}

macro_rules! operation {
    ($const_name:ident, $name:literal, $file:literal $(, $fragment:literal)* $(,)?) => {
        #[doc = concat!("`", $name, "`")]
        pub const $const_name: Operation = Operation {
            name: $name,
            document: shop_document!($file $(, $fragment)*),
        };
    };
}

// Catalog
operation!(SEARCH, "Search", "search", "search_result", "facet_value_result");
operation!(SEARCH_FILTERS, "SearchFilters", "search_filters", "search_result", "facet_value_result");
operation!(GET_PRODUCTS, "GetProducts", "products", "product_detail", "asset");
operation!(GET_PRODUCT, "GetProduct", "product", "product_detail", "asset");
operation!(GET_COLLECTION, "GetCollection", "collection", "collection", "asset");
operation!(
    GET_COLLECTION_WITH_PRODUCTS,
    "GetCollectionWithProducts",
    "collection_with_products",
    "collection",
    "asset",
    "search_result",
    "facet_value_result",
);
operation!(GET_COLLECTIONS, "GetCollections", "collections", "asset");

// Active order
operation!(GET_ACTIVE_ORDER, "GetActiveOrder", "active_order", "order", "order_address", "asset");
operation!(ADD_ITEM_TO_ORDER, "AddItemToOrder", "add_item_to_order", "order", "order_address", "asset", "error_result");
operation!(REMOVE_ORDER_LINE, "RemoveOrderLine", "remove_order_line", "order", "order_address", "asset", "error_result");
operation!(ADJUST_ORDER_LINE, "AdjustOrderLine", "adjust_order_line", "order", "order_address", "asset", "error_result");
operation!(GET_ELIGIBLE_SHIPPING_METHODS, "GetEligibleShippingMethods", "eligible_shipping_methods");
operation!(GET_ELIGIBLE_PAYMENT_METHODS, "GetEligiblePaymentMethods", "eligible_payment_methods");

// Checkout
operation!(SET_CUSTOMER_FOR_ORDER, "SetCustomerForOrder", "set_customer_for_order", "order", "order_address", "asset", "error_result");
operation!(SET_ORDER_SHIPPING_ADDRESS, "SetOrderShippingAddress", "set_order_shipping_address", "order", "order_address", "asset", "error_result");
operation!(SET_ORDER_BILLING_ADDRESS, "SetOrderBillingAddress", "set_order_billing_address", "order", "order_address", "asset", "error_result");
operation!(SET_ORDER_SHIPPING_METHOD, "SetOrderShippingMethod", "set_order_shipping_method", "order", "order_address", "asset", "error_result");
operation!(ADD_PAYMENT_TO_ORDER, "AddPaymentToOrder", "add_payment_to_order", "order", "order_address", "asset", "error_result");
operation!(TRANSITION_ORDER_TO_STATE, "TransitionOrderToState", "transition_order_to_state", "order", "order_address", "asset", "error_result");
operation!(GET_ORDER_BY_CODE, "GetOrderByCode", "order_by_code", "order", "order_address", "asset");

// Customer account
operation!(GET_ACTIVE_CUSTOMER, "GetActiveCustomer", "active_customer", "customer_address");
operation!(CREATE_CUSTOMER_ADDRESS, "CreateCustomerAddress", "create_customer_address", "customer_address");
operation!(UPDATE_CUSTOMER_ADDRESS, "UpdateCustomerAddress", "update_customer_address", "customer_address");
operation!(DELETE_CUSTOMER_ADDRESS, "DeleteCustomerAddress", "delete_customer_address");
operation!(GET_AVAILABLE_COUNTRIES, "GetAvailableCountries", "available_countries");
operation!(UPDATE_CUSTOMER, "UpdateCustomer", "update_customer");
operation!(UPDATE_CUSTOMER_PASSWORD, "UpdateCustomerPassword", "update_customer_password", "error_result");
operation!(
    REQUEST_UPDATE_CUSTOMER_EMAIL_ADDRESS,
    "RequestUpdateCustomerEmailAddress",
    "request_update_customer_email_address",
    "error_result",
);

// Authentication
operation!(LOGIN, "Login", "login", "error_result");
operation!(LOGOUT, "Logout", "logout");
operation!(REGISTER_CUSTOMER_ACCOUNT, "RegisterCustomerAccount", "register_customer_account", "error_result");
operation!(VERIFY_CUSTOMER_ACCOUNT, "VerifyCustomerAccount", "verify_customer_account", "error_result");
operation!(REQUEST_PASSWORD_RESET, "RequestPasswordReset", "request_password_reset", "error_result");
operation!(RESET_PASSWORD, "ResetPassword", "reset_password", "error_result");

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Operation] = &[
        SEARCH,
        SEARCH_FILTERS,
        GET_PRODUCTS,
        GET_PRODUCT,
        GET_COLLECTION,
        GET_COLLECTION_WITH_PRODUCTS,
        GET_COLLECTIONS,
        GET_ACTIVE_ORDER,
        ADD_ITEM_TO_ORDER,
        REMOVE_ORDER_LINE,
        ADJUST_ORDER_LINE,
        GET_ELIGIBLE_SHIPPING_METHODS,
        GET_ELIGIBLE_PAYMENT_METHODS,
        SET_CUSTOMER_FOR_ORDER,
        SET_ORDER_SHIPPING_ADDRESS,
        SET_ORDER_BILLING_ADDRESS,
        SET_ORDER_SHIPPING_METHOD,
        ADD_PAYMENT_TO_ORDER,
        TRANSITION_ORDER_TO_STATE,
        GET_ORDER_BY_CODE,
        GET_ACTIVE_CUSTOMER,
        CREATE_CUSTOMER_ADDRESS,
        UPDATE_CUSTOMER_ADDRESS,
        DELETE_CUSTOMER_ADDRESS,
        GET_AVAILABLE_COUNTRIES,
        UPDATE_CUSTOMER,
        UPDATE_CUSTOMER_PASSWORD,
        REQUEST_UPDATE_CUSTOMER_EMAIL_ADDRESS,
        LOGIN,
        LOGOUT,
        REGISTER_CUSTOMER_ACCOUNT,
        VERIFY_CUSTOMER_ACCOUNT,
        REQUEST_PASSWORD_RESET,
        RESET_PASSWORD,
    ];

    fn fragment_names(document: &str, marker: &str) -> Vec<String> {
        document
            .split(marker)
            .skip(1)
            .filter_map(|rest| {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                (!name.is_empty()).then_some(name)
            })
            .collect()
    }

    #[test]
    fn test_every_document_names_its_operation() {
        for op in ALL {
            assert!(
                op.document.contains(&format!(" {}", op.name)),
                "{} missing from its document",
                op.name
            );
        }
    }

    #[test]
    fn test_spread_fragments_are_defined_and_used() {
        for op in ALL {
            let spreads = fragment_names(op.document, "...");
            let defined = fragment_names(op.document, "fragment ");

            for spread in spreads.iter().filter(|s| s.as_str() != "on") {
                assert!(defined.contains(spread), "{}: fragment {spread} not included", op.name);
            }
            for fragment in &defined {
                assert!(spreads.contains(fragment), "{}: fragment {fragment} unused", op.name);
            }
        }
    }

    #[test]
    fn test_mutation_detection() {
        assert!(ADD_ITEM_TO_ORDER.is_mutation());
        assert!(LOGIN.is_mutation());
        assert!(!SEARCH.is_mutation());
        assert!(!GET_ACTIVE_ORDER.is_mutation());
    }
}
