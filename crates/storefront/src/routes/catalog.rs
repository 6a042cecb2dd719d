//! Catalog page assembly shared by the product, collection and search pages.
//!
//! Every listing runs two searches: the filtered, paginated product query and
//! an unfiltered companion over the same scope that supplies the facet counts
//! and the price slider range.

use serde::Serialize;
use tracing::instrument;

use crate::catalog::{
    FilterState, PriceRange, QueryScope, SortKey, build_catalog_queries, price_range, total_pages,
};
use crate::commerce::{CollectionResult, FacetGroups, SearchResponse, SearchResultItem};
use crate::error::Result;
use crate::state::AppState;

/// Product card display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub image: Option<String>,
    pub price: String,
    /// Whether variants are priced differently.
    pub price_varies: bool,
}

impl From<&SearchResultItem> for ProductCard {
    fn from(item: &SearchResultItem) -> Self {
        Self {
            id: item.product_id.to_string(),
            name: item.product_name.clone(),
            slug: item.slug.clone(),
            url: format!("/products/{}", item.slug),
            image: item.product_asset.as_ref().map(|a| a.preview.clone()),
            price: item.from_price().display(),
            price_varies: item.price_with_tax.min() != item.price_with_tax.max(),
        }
    }
}

/// Sort dropdown option.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Build the sort dropdown for the current selection (newest by default).
#[must_use]
pub fn sort_options(selected: Option<SortKey>) -> Vec<SortOption> {
    let selected = selected.unwrap_or(SortKey::Newest);
    SortKey::ALL
        .into_iter()
        .map(|key| SortOption {
            value: key.as_str(),
            label: key.label(),
            selected: key == selected,
        })
        .collect()
}

/// A filtered, paginated product listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<ProductCard>,
    pub total_items: u32,
    pub page: u32,
    pub total_pages: u32,
    pub filters: FilterState,
    pub has_active_filters: bool,
    pub facets: FacetGroups,
    pub price_range: PriceRange,
    pub collections: Vec<CollectionResult>,
    pub sort_options: Vec<SortOption>,
}

impl CatalogPage {
    /// Assemble a page from the product search and the filter-options search.
    #[must_use]
    pub fn new(
        filters: FilterState,
        page_size: u32,
        products: &SearchResponse,
        options: SearchResponse,
    ) -> Self {
        Self {
            products: products.items.iter().map(ProductCard::from).collect(),
            total_items: products.total_items,
            page: filters.page,
            total_pages: total_pages(products.total_items, page_size),
            has_active_filters: filters.has_active_filters(),
            facets: FacetGroups::from_facet_values(&options.facet_values),
            price_range: price_range(&options.items),
            collections: options.collections,
            sort_options: sort_options(filters.sort),
            filters,
        }
    }

    /// A page with no results, used for blank searches.
    #[must_use]
    pub fn empty(filters: FilterState) -> Self {
        Self::new(
            filters,
            1,
            &SearchResponse::default(),
            SearchResponse::default(),
        )
    }
}

/// Run both catalog searches for `filters` within `scope`.
///
/// # Errors
///
/// Returns an error if either search fails.
#[instrument(skip(state, filters, scope), fields(page = filters.page))]
pub async fn load_catalog_page(
    state: &AppState,
    filters: FilterState,
    scope: &QueryScope,
) -> Result<CatalogPage> {
    let page_size = state.page_size();
    let queries = build_catalog_queries(&filters, page_size, scope);

    let client = state.client();
    let (products, options) = tokio::join!(
        client.search(&queries.products),
        client.search_filters(&queries.filters)
    );

    Ok(CatalogPage::new(filters, page_size, &products?, options?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    fn item(id: &str, price: serde_json::Value) -> serde_json::Value {
        json!({
            "productId": id,
            "productName": format!("Product {id}"),
            "slug": format!("product-{id}"),
            "productAsset": { "id": "a1", "preview": "https://cdn.example.com/a1.jpg" },
            "priceWithTax": price,
            "currencyCode": "USD"
        })
    }

    #[test]
    fn test_product_card_formats_price() {
        let response = search(json!({
            "totalItems": 2,
            "items": [
                item("1", json!({ "value": 1999 })),
                item("2", json!({ "min": 1000, "max": 2500 })),
            ]
        }));

        let single = ProductCard::from(response.items.first().unwrap());
        assert_eq!(single.price, "$19.99");
        assert!(!single.price_varies);
        assert_eq!(single.url, "/products/product-1");
        assert_eq!(single.image.as_deref(), Some("https://cdn.example.com/a1.jpg"));

        let range = ProductCard::from(response.items.get(1).unwrap());
        assert_eq!(range.price, "$10.00");
        assert!(range.price_varies);
    }

    #[test]
    fn test_catalog_page_uses_options_for_facets_and_price() {
        let filters = FilterState::parse("priceMin=1500&page=2");
        let products = search(json!({
            "totalItems": 25,
            "items": [item("1", json!({ "value": 1999 }))]
        }));
        let options = search(json!({
            "totalItems": 3,
            "items": [
                item("1", json!({ "value": 1999 })),
                item("2", json!({ "value": 500 })),
                item("3", json!({ "min": 800, "max": 9900 })),
            ],
            "facetValues": [{
                "count": 2,
                "facetValue": {
                    "id": "10", "name": "Acme", "code": "acme",
                    "facet": { "id": "1", "name": "Brand", "code": "brand" }
                }
            }]
        }));

        let page = CatalogPage::new(filters, 12, &products, options);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.price_range, PriceRange { min: 500, max: 9900 });
        assert_eq!(page.facets.brands.len(), 1);
        assert!(page.has_active_filters);
    }

    #[test]
    fn test_empty_page() {
        let page = CatalogPage::empty(FilterState::default());
        assert!(page.products.is_empty());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_active_filters);
    }

    #[test]
    fn test_sort_options_default_to_newest() {
        let options = sort_options(None);
        assert_eq!(options.len(), 4);
        assert!(options.iter().any(|o| o.value == "newest" && o.selected));

        let options = sort_options(Some(SortKey::PriceDesc));
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().unwrap().value, "price-desc");
    }
}
