//! Shop API payloads shaped like the real ones.

use serde_json::{Value, json};

/// A search result item with a single price.
#[must_use]
pub fn search_item(id: &str, name: &str, price: i64) -> Value {
    json!({
        "productId": id,
        "productName": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": "",
        "productAsset": null,
        "priceWithTax": { "value": price },
        "currencyCode": "USD",
        "facetValueIds": []
    })
}

/// A `search` payload.
#[must_use]
pub fn search(items: &[Value]) -> Value {
    json!({
        "search": {
            "totalItems": items.len(),
            "items": items,
            "facetValues": [{
                "count": items.len(),
                "facetValue": {
                    "id": "10",
                    "name": "Acme",
                    "code": "acme",
                    "facet": { "id": "1", "name": "Brand", "code": "brand" }
                }
            }],
            "collections": []
        }
    })
}

/// A complete shipping address as the API returns it on an order.
#[must_use]
pub fn order_address() -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "company": null,
        "streetLine1": "12 Analytical Way",
        "streetLine2": null,
        "city": "London",
        "province": null,
        "postalCode": "N1 9GU",
        "country": "United Kingdom",
        "countryCode": "GB",
        "phoneNumber": null
    })
}

/// An order with one line of two mugs.
#[must_use]
pub fn order(code: &str, state: &str) -> Value {
    json!({
        "id": "1",
        "code": code,
        "state": state,
        "active": state == "AddingItems" || state == "ArrangingPayment",
        "orderPlacedAt": null,
        "currencyCode": "USD",
        "totalQuantity": 2,
        "subTotalWithTax": 3998,
        "shippingWithTax": 0,
        "totalWithTax": 3998,
        "customer": null,
        "shippingAddress": null,
        "billingAddress": null,
        "shippingLines": [],
        "lines": [{
            "id": "11",
            "quantity": 2,
            "unitPriceWithTax": 1999,
            "linePriceWithTax": 3998,
            "featuredAsset": null,
            "productVariant": {
                "id": "71",
                "name": "Blue",
                "sku": "MUG-B",
                "product": { "id": "7", "name": "Mug", "slug": "mug" }
            }
        }]
    })
}

/// `order` with a customer attached.
#[must_use]
pub fn with_customer(mut order: Value) -> Value {
    order["customer"] = json!({
        "id": "5",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "emailAddress": "ada@example.com"
    });
    order
}

/// `order` with a shipping address and a shipping line.
#[must_use]
pub fn ready_to_pay(mut order: Value) -> Value {
    order["shippingAddress"] = order_address();
    order["shippingLines"] = json!([{
        "shippingMethod": { "id": "1", "name": "Standard" },
        "priceWithTax": 500
    }]);
    order["shippingWithTax"] = json!(500);
    order["totalWithTax"] = json!(4498);
    order
}

/// A structured mutation error.
#[must_use]
pub fn error_result(code: &str, message: &str) -> Value {
    json!({ "errorCode": code, "message": message })
}
