//! Domain types for Shop API data.
//!
//! These types deserialize directly from Shop API responses (camelCase JSON)
//! and serialize back out as the storefront's JSON view models. Money is an
//! integer amount in minor currency units alongside the order or variant
//! currency; use [`shopfront_core::Price`] to format it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::validation::{
    validate_email, validate_name, validate_password, validate_phone, validate_required,
};
use shopfront_core::{
    AddressId, CollectionId, CurrencyCode, CustomerId, FacetId, FacetValueId, OrderId,
    FieldErrors, OrderLineId, OrderState, Price, ProductId, ShippingMethodId, VariantId,
};

// =============================================================================
// Shared
// =============================================================================

/// An image asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    /// Preview URL served by the asset host.
    pub preview: String,
}

/// A paginated list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub total_items: u32,
}

impl<T> Default for PaginatedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
        }
    }
}

/// Generic success payload (`{ success: true }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

// =============================================================================
// Catalog
// =============================================================================

/// A facet (e.g., "Brand").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    pub id: FacetId,
    pub name: String,
    pub code: String,
}

/// A facet value with its owning facet (e.g., "Acme" of "Brand").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetValue {
    pub id: FacetValueId,
    pub name: String,
    pub code: String,
    pub facet: Facet,
}

/// A facet value together with the number of matching products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetValueResult {
    pub count: u32,
    pub facet_value: FacetValue,
}

/// Price of a search result: one price, or a range across variants.
///
/// The Shop API returns either `{ value }` or `{ min, max }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchPrice {
    Single { value: i64 },
    Range { min: i64, max: i64 },
}

impl SearchPrice {
    /// Lowest price covered.
    #[must_use]
    pub const fn min(&self) -> i64 {
        match *self {
            Self::Single { value } => value,
            Self::Range { min, .. } => min,
        }
    }

    /// Highest price covered.
    #[must_use]
    pub const fn max(&self) -> i64 {
        match *self {
            Self::Single { value } => value,
            Self::Range { max, .. } => max,
        }
    }
}

/// One item of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub product_asset: Option<Asset>,
    pub price_with_tax: SearchPrice,
    pub currency_code: CurrencyCode,
    #[serde(default)]
    pub facet_value_ids: Vec<FacetValueId>,
}

impl SearchResultItem {
    /// Lowest price formatted for display.
    #[must_use]
    pub const fn from_price(&self) -> Price {
        Price::new(self.price_with_tax.min(), self.currency_code)
    }
}

/// A collection reference inside a search response, with its product count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResult {
    pub count: u32,
    pub collection: CollectionSummary,
}

/// A catalog search result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total_items: u32,
    pub items: Vec<SearchResultItem>,
    #[serde(default)]
    pub facet_values: Vec<FacetValueResult>,
    #[serde(default)]
    pub collections: Vec<CollectionResult>,
}

/// A purchasable product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub name: String,
    pub sku: String,
    pub price_with_tax: i64,
    pub currency_code: CurrencyCode,
    #[serde(default)]
    pub stock_level: String,
}

impl ProductVariant {
    /// Variant price with tax.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.price_with_tax, self.currency_code)
    }

    /// Whether the variant can be ordered.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock_level != "OUT_OF_STOCK"
    }
}

/// A product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub featured_asset: Option<Asset>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub facet_values: Vec<FacetValue>,
    #[serde(default)]
    pub collections: Vec<CollectionSummary>,
}

impl Product {
    /// Cheapest variant price, if the product has variants.
    #[must_use]
    pub fn from_price(&self) -> Option<Price> {
        self.variants
            .iter()
            .min_by_key(|v| v.price_with_tax)
            .map(ProductVariant::price)
    }
}

/// Minimal collection reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
}

/// Reference to a parent collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionParent {
    pub id: CollectionId,
}

/// A collection as listed by the collections query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionListItem {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub position: i32,
    pub parent: Option<CollectionParent>,
    pub featured_asset: Option<Asset>,
}

/// A collection with its place in the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub featured_asset: Option<Asset>,
    #[serde(default)]
    pub breadcrumbs: Vec<CollectionSummary>,
    #[serde(default)]
    pub children: Vec<CollectionSummary>,
}

/// A node in the collection tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionNode {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub featured_asset: Option<Asset>,
    pub children: Vec<Self>,
}

/// Facet values grouped for the catalog sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetGroups {
    pub brands: Vec<FacetValueResult>,
    pub product_types: Vec<FacetValueResult>,
    /// Remaining facets, one group per facet in first-seen order.
    pub other: Vec<FacetGroup>,
}

/// Values of one generic facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetGroup {
    pub facet: Facet,
    pub values: Vec<FacetValueResult>,
}

// =============================================================================
// Orders
// =============================================================================

/// An address attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub street_line1: Option<String>,
    pub street_line2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub phone_number: Option<String>,
}

impl OrderAddress {
    /// Whether every field needed to ship is present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.street_line1,
            &self.city,
            &self.postal_code,
            &self.country_code,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Convert into an address input, e.g. to reuse the shipping address
    /// as the billing address.
    #[must_use]
    pub fn to_input(&self) -> AddressInput {
        AddressInput {
            full_name: self.full_name.clone().unwrap_or_default(),
            company: self.company.clone(),
            street_line1: self.street_line1.clone().unwrap_or_default(),
            street_line2: self.street_line2.clone(),
            city: self.city.clone().unwrap_or_default(),
            province: self.province.clone(),
            postal_code: self.postal_code.clone().unwrap_or_default(),
            country_code: self.country_code.clone().unwrap_or_default(),
            phone_number: self.phone_number.clone(),
        }
    }
}

/// The customer attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// Product reference on an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
}

/// Variant reference on an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineVariant {
    pub id: VariantId,
    pub name: String,
    pub sku: String,
    pub product: OrderLineProduct,
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: OrderLineId,
    pub quantity: u32,
    pub unit_price_with_tax: i64,
    pub line_price_with_tax: i64,
    pub featured_asset: Option<Asset>,
    pub product_variant: OrderLineVariant,
}

/// Shipping method reference on a shipping line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLineMethod {
    pub id: ShippingMethodId,
    pub name: String,
}

/// A shipping charge attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLine {
    pub shipping_method: ShippingLineMethod,
    pub price_with_tax: i64,
}

/// An order (the active order is the shopper's cart).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub code: String,
    pub state: OrderState,
    #[serde(default)]
    pub active: bool,
    pub order_placed_at: Option<DateTime<Utc>>,
    pub currency_code: CurrencyCode,
    pub total_quantity: u32,
    pub sub_total_with_tax: i64,
    pub shipping_with_tax: i64,
    pub total_with_tax: i64,
    pub customer: Option<OrderCustomer>,
    pub shipping_address: Option<OrderAddress>,
    pub billing_address: Option<OrderAddress>,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Whether the order has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether a complete shipping address is set.
    #[must_use]
    pub fn has_complete_shipping_address(&self) -> bool {
        self.shipping_address
            .as_ref()
            .is_some_and(OrderAddress::is_complete)
    }

    /// Whether the order contains the given product.
    #[must_use]
    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.lines
            .iter()
            .any(|line| &line.product_variant.product.id == product_id)
    }

    /// Order total with tax.
    #[must_use]
    pub const fn total(&self) -> Price {
        Price::new(self.total_with_tax, self.currency_code)
    }
}

/// A shipping method the active order is eligible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodQuote {
    pub id: ShippingMethodId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_with_tax: i64,
}

/// A payment method and whether the active order may use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodQuote {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_eligible: bool,
    pub eligibility_message: Option<String>,
}

// =============================================================================
// Customers
// =============================================================================

/// A country the channel ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: String,
    pub code: String,
    pub name: String,
}

/// Country reference on a saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCountry {
    pub code: String,
    pub name: String,
}

/// An address saved to a customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub id: AddressId,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub street_line1: String,
    pub street_line2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: AddressCountry,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub default_shipping_address: bool,
    #[serde(default)]
    pub default_billing_address: bool,
}

/// The logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub addresses: Vec<CustomerAddress>,
}

/// The authenticated user returned by login and verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub identifier: String,
}

// =============================================================================
// Inputs
// =============================================================================

/// Address fields submitted by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub street_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    pub postal_code: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Guest customer details for an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// New account registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerInput {
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Profile changes for the logged-in customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl AddressInput {
    /// Check required fields and the phone number.
    ///
    /// # Errors
    ///
    /// Returns every invalid field, keyed by its camelCase name.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check("fullName", validate_required(&self.full_name, "Full name"));
        errors.check("streetLine1", validate_required(&self.street_line1, "Street address"));
        errors.check("city", validate_required(&self.city, "City"));
        errors.check("postalCode", validate_required(&self.postal_code, "Postal code"));
        errors.check("countryCode", validate_required(&self.country_code, "Country"));
        if let Some(phone) = &self.phone_number {
            errors.check("phoneNumber", validate_phone(phone));
        }
        errors.into_result()
    }
}

impl CustomerInput {
    /// Check names, email and phone number.
    ///
    /// # Errors
    ///
    /// Returns every invalid field, keyed by its camelCase name.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check("firstName", validate_name(&self.first_name, "First name"));
        errors.check("lastName", validate_name(&self.last_name, "Last name"));
        errors.check("emailAddress", validate_email(&self.email_address));
        if let Some(phone) = &self.phone_number {
            errors.check("phoneNumber", validate_phone(phone));
        }
        errors.into_result()
    }
}

impl RegisterCustomerInput {
    /// Check the new account's details and password policy.
    ///
    /// # Errors
    ///
    /// Returns every invalid field, keyed by its camelCase name.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check("emailAddress", validate_email(&self.email_address));
        errors.check("firstName", validate_name(&self.first_name, "First name"));
        errors.check("lastName", validate_name(&self.last_name, "Last name"));
        errors.check("password", validate_password(&self.password));
        if let Some(phone) = &self.phone_number {
            errors.check("phoneNumber", validate_phone(phone));
        }
        errors.into_result()
    }
}

/// Payment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    /// Payment method code.
    pub method: String,
    /// Method-specific metadata passed through to the payment handler.
    #[serde(default)]
    pub metadata: serde_json::Value,
}
