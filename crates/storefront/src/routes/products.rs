//! Product route handlers.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::{FilterState, QueryScope};
use crate::commerce::{CollectionSummary, Product, ProductVariant};
use crate::error::Result;
use crate::state::AppState;

use super::catalog::{CatalogPage, load_catalog_page};

/// Product display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Option<String>,
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub variants: Vec<VariantView>,
    pub collections: Vec<CollectionSummary>,
}

/// Variant display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: String,
    pub in_stock: bool,
}

impl From<&ProductVariant> for VariantView {
    fn from(variant: &ProductVariant) -> Self {
        Self {
            id: variant.id.to_string(),
            name: variant.name.clone(),
            sku: variant.sku.clone(),
            price: variant.price().display(),
            in_stock: variant.in_stock(),
        }
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            price: product.from_price().map(|p| p.display()),
            featured_image: product.featured_asset.map(|a| a.preview),
            images: product.assets.into_iter().map(|a| a.preview).collect(),
            variants: product.variants.iter().map(VariantView::from).collect(),
            name: product.name,
            slug: product.slug,
            description: product.description,
            collections: product.collections,
        }
    }
}

/// Filtered product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<CatalogPage>> {
    let filters = FilterState::parse(query.as_deref().unwrap_or_default());
    let scope = QueryScope::from_state(&filters);
    let page = load_catalog_page(&state, filters, &scope).await?;
    Ok(Json(page))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state.client().product(&slug).await?;
    Ok(Json(ProductView::from(product)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_view_from_product() {
        let product: Product = serde_json::from_value(json!({
            "id": "7",
            "name": "Ergonomic Chair",
            "slug": "ergonomic-chair",
            "description": "Sit well.",
            "featuredAsset": { "id": "a1", "preview": "https://cdn.example.com/chair.jpg" },
            "assets": [{ "id": "a1", "preview": "https://cdn.example.com/chair.jpg" }],
            "variants": [
                { "id": "71", "name": "Black", "sku": "CH-B", "priceWithTax": 24900, "currencyCode": "USD", "stockLevel": "IN_STOCK" },
                { "id": "72", "name": "Grey", "sku": "CH-G", "priceWithTax": 19900, "currencyCode": "USD", "stockLevel": "OUT_OF_STOCK" }
            ]
        }))
        .unwrap();

        let view = ProductView::from(product);
        assert_eq!(view.price.as_deref(), Some("$199.00"));
        assert_eq!(view.featured_image.as_deref(), Some("https://cdn.example.com/chair.jpg"));
        assert_eq!(view.variants.len(), 2);
        assert!(view.variants.first().unwrap().in_stock);
        assert!(!view.variants.get(1).unwrap().in_stock);
    }
}
