//! Translation of [`FilterState`] into Shop API list options.
//!
//! Everything here is a pure function of its inputs. A catalog page issues
//! two queries: the filtered product query, and a filter-options query that
//! shares the scope (collection / search term) but carries none of the
//! shopper's facet or price selections. The sidebar is built from the second
//! one so deselected options never disappear from it.

use std::collections::HashMap;

use serde::Serialize;

use shopfront_core::{CollectionId, FacetValueId};

use crate::commerce::{
    CollectionListItem, CollectionNode, FacetGroup, FacetGroups, FacetValueResult,
    SearchResultItem,
};

use super::filter_state::{FilterState, PriceBounds, SortKey};

/// Upper price used when only a lower bound is selected.
pub const PRICE_FILTER_CEILING: u64 = 999_999_999;

/// Window size of the filter-options query.
pub const FILTER_OPTIONS_TAKE: u32 = 100;

/// Price range reported for an empty result set.
pub const EMPTY_PRICE_RANGE: PriceRange = PriceRange {
    min: 0,
    max: 1_000_000,
};

/// Facet code of the brand facet.
pub const BRAND_FACET_CODE: &str = "brand";

/// Facet code of the product type facet.
pub const PRODUCT_TYPE_FACET_CODE: &str = "product-type";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort parameter of a list query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<SortOrder>,
}

impl ListSort {
    /// Newest first.
    pub const DEFAULT: Self = Self {
        price: None,
        created_at: Some(SortOrder::Desc),
    };
}

/// Inclusive price range predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Between {
    pub start: u64,
    pub end: u64,
}

/// Predicate on a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberOperators {
    pub between: Between,
}

/// Filter parameter of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListFilter {
    pub price: NumberOperators,
}

/// How multiple facet values combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

/// Catalog list query options, sent as the search input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryOptions {
    pub take: u32,
    pub skip: u32,
    pub sort: ListSort,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ListFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facet_value_ids: Vec<FacetValueId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_value_operator: Option<LogicalOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<CollectionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_slug: Option<String>,
    pub group_by_product: bool,
}

/// Options for the plain product list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListOptions {
    pub take: u32,
    pub skip: u32,
    pub sort: ListSort,
}

impl ProductListOptions {
    /// The `take` most recently created products.
    #[must_use]
    pub const fn newest(take: u32) -> Self {
        Self {
            take,
            skip: 0,
            sort: ListSort::DEFAULT,
        }
    }
}

/// Result window of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub take: u32,
    pub skip: u32,
}

impl Pagination {
    /// Window for a 1-based `page` of `page_size` items.
    #[must_use]
    pub const fn page(page: u32, page_size: u32) -> Self {
        let page = if page == 0 { 1 } else { page };
        Self {
            take: page_size,
            skip: (page - 1).saturating_mul(page_size),
        }
    }
}

/// What a listing is restricted to, shared by both catalog queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryScope {
    pub term: Option<String>,
    pub collection_id: Option<CollectionId>,
    pub collection_slug: Option<String>,
}

impl QueryScope {
    /// Scope carried in the filter state (search term and collection id).
    #[must_use]
    pub fn from_state(state: &FilterState) -> Self {
        Self {
            term: state.search_term.clone(),
            collection_id: state.collection_id.clone(),
            collection_slug: None,
        }
    }

    /// Restrict to a collection by slug.
    #[must_use]
    pub fn with_collection_slug(mut self, slug: impl Into<String>) -> Self {
        self.collection_slug = Some(slug.into());
        self
    }
}

/// The filtered product query and its filter-options companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQueries {
    pub products: ListQueryOptions,
    pub filters: ListQueryOptions,
}

/// Lowest and highest price in a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

impl PriceRange {
    /// Bounds for canonicalizing price parameters.
    #[must_use]
    pub fn bounds(&self) -> PriceBounds {
        PriceBounds {
            min: u64::try_from(self.min).unwrap_or(0),
            max: u64::try_from(self.max).unwrap_or(0),
        }
    }
}

/// Map a sort key to the list sort. `None` maps to newest first.
#[must_use]
pub const fn sort_for(key: Option<SortKey>) -> ListSort {
    match key {
        Some(SortKey::PriceAsc) => ListSort {
            price: Some(SortOrder::Asc),
            created_at: None,
        },
        Some(SortKey::PriceDesc) => ListSort {
            price: Some(SortOrder::Desc),
            created_at: None,
        },
        Some(SortKey::Oldest) => ListSort {
            price: None,
            created_at: Some(SortOrder::Asc),
        },
        Some(SortKey::Newest) | None => ListSort::DEFAULT,
    }
}

/// Map a raw sort parameter. Unrecognized values map to the default.
#[must_use]
pub fn sort_for_param(value: &str) -> ListSort {
    sort_for(SortKey::from_param(value))
}

/// Price predicate for the selected bounds, if any bound is selected.
#[must_use]
pub const fn build_price_filter(price_min: Option<u64>, price_max: Option<u64>) -> Option<ListFilter> {
    if price_min.is_none() && price_max.is_none() {
        return None;
    }
    let start = match price_min {
        Some(min) => min,
        None => 0,
    };
    let end = match price_max {
        Some(max) => max,
        None => PRICE_FILTER_CEILING,
    };
    Some(ListFilter {
        price: NumberOperators {
            between: Between { start, end },
        },
    })
}

/// Build the filtered product query.
///
/// Brand, product type and generic facet selections are combined into one
/// `facetValueIds` list matched with `OR`.
#[must_use]
pub fn build(state: &FilterState, pagination: Pagination, scope: &QueryScope) -> ListQueryOptions {
    let facet_value_ids: Vec<FacetValueId> = state.selected_facet_values().cloned().collect();
    let facet_value_operator = (!facet_value_ids.is_empty()).then_some(LogicalOperator::Or);

    ListQueryOptions {
        take: pagination.take,
        skip: pagination.skip,
        sort: sort_for(state.sort),
        filter: build_price_filter(state.price_min, state.price_max),
        facet_value_ids,
        facet_value_operator,
        term: scope.term.clone(),
        collection_id: scope.collection_id.clone(),
        collection_slug: scope.collection_slug.clone(),
        group_by_product: true,
    }
}

/// Build the filter-options query: same scope, no selections, fixed window.
#[must_use]
pub fn build_filter_options(scope: &QueryScope) -> ListQueryOptions {
    ListQueryOptions {
        take: FILTER_OPTIONS_TAKE,
        skip: 0,
        sort: ListSort::DEFAULT,
        filter: None,
        facet_value_ids: Vec::new(),
        facet_value_operator: None,
        term: scope.term.clone(),
        collection_id: scope.collection_id.clone(),
        collection_slug: scope.collection_slug.clone(),
        group_by_product: true,
    }
}

/// Build both catalog queries for a page.
#[must_use]
pub fn build_catalog_queries(state: &FilterState, page_size: u32, scope: &QueryScope) -> CatalogQueries {
    CatalogQueries {
        products: build(state, Pagination::page(state.page, page_size), scope),
        filters: build_filter_options(scope),
    }
}

/// Lowest and highest price across `items`.
///
/// Returns [`EMPTY_PRICE_RANGE`] for an empty slice; callers must treat that
/// as a placeholder, not a real bound.
#[must_use]
pub fn price_range(items: &[SearchResultItem]) -> PriceRange {
    items
        .iter()
        .map(|item| (item.price_with_tax.min(), item.price_with_tax.max()))
        .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
        .map_or(EMPTY_PRICE_RANGE, |(min, max)| PriceRange { min, max })
}

/// Number of pages needed for `total_items` (at least 1).
#[must_use]
pub const fn total_pages(total_items: u32, page_size: u32) -> u32 {
    if page_size == 0 || total_items == 0 {
        return 1;
    }
    total_items.div_ceil(page_size)
}

impl FacetGroups {
    /// Group facet values by facet: brands, product types, and the rest.
    #[must_use]
    pub fn from_facet_values(values: &[FacetValueResult]) -> Self {
        let mut groups = Self::default();

        for value in values {
            match value.facet_value.facet.code.as_str() {
                BRAND_FACET_CODE => groups.brands.push(value.clone()),
                PRODUCT_TYPE_FACET_CODE => groups.product_types.push(value.clone()),
                _ => {
                    let facet = &value.facet_value.facet;
                    if let Some(group) = groups.other.iter_mut().find(|g| g.facet.id == facet.id) {
                        group.values.push(value.clone());
                    } else {
                        groups.other.push(FacetGroup {
                            facet: facet.clone(),
                            values: vec![value.clone()],
                        });
                    }
                }
            }
        }

        groups
    }
}

impl CollectionNode {
    /// Build the collection tree from a flat list.
    ///
    /// Collections whose parent is absent from the list are roots. Siblings
    /// are ordered by position.
    #[must_use]
    pub fn build_tree(items: Vec<CollectionListItem>) -> Vec<Self> {
        let ids: Vec<CollectionId> = items.iter().map(|item| item.id.clone()).collect();
        let mut roots = Vec::new();
        let mut by_parent: HashMap<CollectionId, Vec<CollectionListItem>> = HashMap::new();

        for item in items {
            match item.parent.as_ref().map(|p| p.id.clone()) {
                Some(parent) if ids.contains(&parent) => {
                    by_parent.entry(parent).or_default().push(item);
                }
                _ => roots.push(item),
            }
        }

        attach_children(roots, &mut by_parent)
    }
}

fn attach_children(
    mut items: Vec<CollectionListItem>,
    by_parent: &mut HashMap<CollectionId, Vec<CollectionListItem>>,
) -> Vec<CollectionNode> {
    items.sort_by_key(|item| item.position);
    items
        .into_iter()
        .map(|item| {
            let children = by_parent.remove(&item.id).unwrap_or_default();
            CollectionNode {
                children: attach_children(children, by_parent),
                id: item.id,
                name: item.name,
                slug: item.slug,
                featured_asset: item.featured_asset,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commerce::{CollectionParent, Facet, FacetValue, SearchPrice};
    use serde_json::json;
    use shopfront_core::{CurrencyCode, FacetId, ProductId};

    fn item(price: SearchPrice) -> SearchResultItem {
        SearchResultItem {
            product_id: ProductId::new("1"),
            product_name: "Chair".to_string(),
            slug: "chair".to_string(),
            description: String::new(),
            product_asset: None,
            price_with_tax: price,
            currency_code: CurrencyCode::USD,
            facet_value_ids: Vec::new(),
        }
    }

    fn facet_value(id: &str, facet_id: &str, facet_code: &str) -> FacetValueResult {
        FacetValueResult {
            count: 1,
            facet_value: FacetValue {
                id: FacetValueId::new(id),
                name: id.to_string(),
                code: id.to_string(),
                facet: Facet {
                    id: FacetId::new(facet_id),
                    name: facet_code.to_string(),
                    code: facet_code.to_string(),
                },
            },
        }
    }

    fn collection(id: &str, parent: Option<&str>, position: i32) -> CollectionListItem {
        CollectionListItem {
            id: CollectionId::new(id),
            name: id.to_string(),
            slug: id.to_string(),
            position,
            parent: parent.map(|p| CollectionParent {
                id: CollectionId::new(p),
            }),
            featured_asset: None,
        }
    }

    #[test]
    fn test_example_state_builds_expected_options() {
        let state = FilterState::parse(
            "?priceMin=5000&priceMax=20000&brands=acme,globex&sort=price-asc&page=2",
        );
        let options = build(&state, Pagination::page(state.page, 12), &QueryScope::default());

        assert_eq!(options.take, 12);
        assert_eq!(options.skip, 12);
        assert_eq!(
            options.filter,
            Some(ListFilter {
                price: NumberOperators {
                    between: Between { start: 5000, end: 20000 }
                }
            })
        );
        assert_eq!(options.sort, sort_for(Some(SortKey::PriceAsc)));
        assert_eq!(
            options.facet_value_ids,
            vec![FacetValueId::new("acme"), FacetValueId::new("globex")]
        );
        assert_eq!(options.facet_value_operator, Some(LogicalOperator::Or));
    }

    #[test]
    fn test_options_wire_shape() {
        let state = FilterState::parse("priceMin=100&brands=b1&productTypes=t1&fvd=f1&sort=oldest");
        let scope = QueryScope::default().with_collection_slug("office");
        let value = serde_json::to_value(build(&state, Pagination::page(1, 12), &scope)).unwrap();

        assert_eq!(
            value,
            json!({
                "take": 12,
                "skip": 0,
                "sort": {"createdAt": "ASC"},
                "filter": {"price": {"between": {"start": 100, "end": 999_999_999}}},
                "facetValueIds": ["b1", "t1", "f1"],
                "facetValueOperator": "OR",
                "collectionSlug": "office",
                "groupByProduct": true
            })
        );
    }

    #[test]
    fn test_sort_table() {
        let expectations = [
            ("price-asc", json!({"price": "ASC"})),
            ("price-desc", json!({"price": "DESC"})),
            ("newest", json!({"createdAt": "DESC"})),
            ("oldest", json!({"createdAt": "ASC"})),
        ];
        for (param, expected) in expectations {
            assert_eq!(serde_json::to_value(sort_for_param(param)).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_sort_maps_to_default() {
        assert_eq!(sort_for_param("cheapest"), sort_for(None));
        assert_eq!(sort_for_param(""), ListSort::DEFAULT);
    }

    #[test]
    fn test_price_filter_boundaries() {
        assert_eq!(build_price_filter(None, None), None);
        assert_eq!(
            build_price_filter(Some(500), None).unwrap().price.between,
            Between { start: 500, end: 999_999_999 }
        );
        assert_eq!(
            build_price_filter(None, Some(800)).unwrap().price.between,
            Between { start: 0, end: 800 }
        );
    }

    #[test]
    fn test_no_facets_omits_operator() {
        let options = build(&FilterState::default(), Pagination::page(1, 12), &QueryScope::default());
        assert!(options.facet_value_ids.is_empty());
        assert!(options.facet_value_operator.is_none());
        assert!(options.filter.is_none());
    }

    #[test]
    fn test_filter_options_query_shares_scope_only() {
        let state = FilterState::parse("brands=acme&priceMax=900&q=chair&collectionId=5&page=4");
        let queries = build_catalog_queries(&state, 12, &QueryScope::from_state(&state));

        assert_eq!(queries.products.skip, 36);
        assert_eq!(queries.filters.take, FILTER_OPTIONS_TAKE);
        assert_eq!(queries.filters.skip, 0);
        assert!(queries.filters.facet_value_ids.is_empty());
        assert!(queries.filters.filter.is_none());
        assert_eq!(queries.filters.term.as_deref(), Some("chair"));
        assert_eq!(queries.filters.collection_id, Some(CollectionId::new("5")));
        assert_eq!(queries.products.term, queries.filters.term);
    }

    #[test]
    fn test_price_range_mixes_single_and_range() {
        let items = [
            item(SearchPrice::Single { value: 2500 }),
            item(SearchPrice::Range { min: 1200, max: 9900 }),
            item(SearchPrice::Single { value: 4000 }),
        ];
        assert_eq!(price_range(&items), PriceRange { min: 1200, max: 9900 });
    }

    #[test]
    fn test_price_range_empty_is_placeholder() {
        assert_eq!(price_range(&[]), EMPTY_PRICE_RANGE);
        assert_eq!(price_range(&[]).bounds(), PriceBounds { min: 0, max: 1_000_000 });
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 12), 1);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(total_pages(5, 0), 1);
    }

    #[test]
    fn test_facet_groups() {
        let values = [
            facet_value("acme", "1", "brand"),
            facet_value("chairs", "2", "product-type"),
            facet_value("red", "3", "color"),
            facet_value("globex", "1", "brand"),
            facet_value("oak", "4", "material"),
            facet_value("blue", "3", "color"),
        ];
        let groups = FacetGroups::from_facet_values(&values);

        assert_eq!(groups.brands.len(), 2);
        assert_eq!(groups.product_types.len(), 1);
        assert_eq!(groups.other.len(), 2);
        assert_eq!(groups.other.first().unwrap().facet.code, "color");
        assert_eq!(groups.other.first().unwrap().values.len(), 2);
        assert_eq!(groups.other.get(1).unwrap().facet.code, "material");
    }

    #[test]
    fn test_collection_tree() {
        let tree = CollectionNode::build_tree(vec![
            collection("desks", Some("office"), 2),
            collection("office", Some("root"), 1),
            collection("chairs", Some("office"), 1),
            collection("garden", None, 0),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.first().unwrap().slug, "garden");
        assert_eq!(tree.get(1).unwrap().slug, "office");
        let children: Vec<&str> = tree.get(1).unwrap().children.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(children, vec!["chairs", "desks"]);
    }
}
