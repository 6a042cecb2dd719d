//! URL-driven catalog filter state.
//!
//! The query string is the source of truth: a [`FilterState`] is parsed from
//! it on every request and serialized back onto it after every change.
//! Serialization merges onto the previous query string so parameters this
//! module does not own survive, and drops any parameter that holds its
//! default so URLs stay canonical and shareable.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use shopfront_core::{CollectionId, FacetValueId};

const PRICE_MIN: &str = "priceMin";
const PRICE_MAX: &str = "priceMax";
const BRANDS: &str = "brands";
const PRODUCT_TYPES: &str = "productTypes";
const FACET_VALUES: &str = "fvd";
const SORT: &str = "sort";
const PAGE: &str = "page";
const SEARCH: &str = "q";
const SEARCH_ALIAS: &str = "search";
const COLLECTION_ID: &str = "collectionId";

/// Parameters owned by [`FilterState`], in the order they are appended.
const OWNED_KEYS: &[&str] = &[
    PRICE_MIN,
    PRICE_MAX,
    BRANDS,
    PRODUCT_TYPES,
    FACET_VALUES,
    SORT,
    SEARCH,
    COLLECTION_ID,
    PAGE,
];

/// Catalog sort options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    Newest,
    Oldest,
}

impl SortKey {
    /// All sort options, in display order.
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::PriceAsc, Self::PriceDesc];

    /// URL parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }

    /// Parse a URL parameter value. Unknown values yield `None`.
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value.trim())
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::Newest => "Newest",
            Self::Oldest => "Oldest",
        }
    }
}

/// Catalog-wide price bounds used to canonicalize price parameters.
///
/// A `priceMin` at or below `min`, or a `priceMax` at or above `max`, does
/// not narrow anything and is dropped from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBounds {
    pub min: u64,
    pub max: u64,
}

impl PriceBounds {
    /// Bounds that only drop a zero `priceMin`.
    pub const UNBOUNDED: Self = Self {
        min: 0,
        max: u64::MAX,
    };
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Filter, sort, scope and page selections for a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Lower price bound in minor currency units.
    pub price_min: Option<u64>,
    /// Upper price bound in minor currency units.
    pub price_max: Option<u64>,
    pub brand_ids: BTreeSet<FacetValueId>,
    pub product_type_ids: BTreeSet<FacetValueId>,
    pub facet_value_ids: BTreeSet<FacetValueId>,
    pub sort: Option<SortKey>,
    pub collection_id: Option<CollectionId>,
    pub search_term: Option<String>,
    /// 1-based page number.
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            price_min: None,
            price_max: None,
            brand_ids: BTreeSet::new(),
            product_type_ids: BTreeSet::new(),
            facet_value_ids: BTreeSet::new(),
            sort: None,
            collection_id: None,
            search_term: None,
            page: 1,
        }
    }
}

impl FilterState {
    /// Parse filter state from a query string (with or without leading `?`).
    ///
    /// Missing or malformed parameters take their defaults: non-numeric
    /// prices are absent, unknown sort keys are absent, and a page that is
    /// not a positive integer is 1.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = parse_pairs(query);
        let first = |key: &str| first_value(&pairs, key);

        Self {
            price_min: first(PRICE_MIN).and_then(|v| v.parse().ok()),
            price_max: first(PRICE_MAX).and_then(|v| v.parse().ok()),
            brand_ids: first(BRANDS).map(parse_id_list).unwrap_or_default(),
            product_type_ids: first(PRODUCT_TYPES).map(parse_id_list).unwrap_or_default(),
            facet_value_ids: first(FACET_VALUES).map(parse_id_list).unwrap_or_default(),
            sort: first(SORT).and_then(SortKey::from_param),
            collection_id: first(COLLECTION_ID).map(CollectionId::new),
            search_term: first(SEARCH)
                .or_else(|| first(SEARCH_ALIAS))
                .map(str::to_string),
            page: first(PAGE)
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|page| *page >= 1)
                .unwrap_or(1),
        }
    }

    /// Serialize onto `previous`, keeping parameters this state does not own.
    ///
    /// Owned parameters already present are rewritten in place; new ones are
    /// appended. Parameters at their default (see [`PriceBounds`]) are
    /// removed.
    #[must_use]
    pub fn serialize(&self, previous: &str, bounds: &PriceBounds) -> String {
        let mut pairs = parse_pairs(previous);
        pairs.retain(|(k, _)| k != SEARCH_ALIAS);

        for key in OWNED_KEYS {
            let value = self.param(key, bounds);
            let mut written = false;
            pairs.retain_mut(|(k, v)| {
                if k.as_str() != *key {
                    return true;
                }
                match (&value, written) {
                    (Some(new), false) => {
                        v.clone_from(new);
                        written = true;
                        true
                    }
                    _ => false,
                }
            });
            if let (Some(value), false) = (value, written) {
                pairs.push(((*key).to_string(), value));
            }
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode_value(k, v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Canonical value of an owned parameter, `None` when it holds its default.
    fn param(&self, key: &str, bounds: &PriceBounds) -> Option<String> {
        match key {
            PRICE_MIN => self
                .price_min
                .filter(|v| *v > bounds.min)
                .map(|v| v.to_string()),
            PRICE_MAX => self
                .price_max
                .filter(|v| *v < bounds.max)
                .map(|v| v.to_string()),
            BRANDS => join_ids(&self.brand_ids),
            PRODUCT_TYPES => join_ids(&self.product_type_ids),
            FACET_VALUES => join_ids(&self.facet_value_ids),
            SORT => self.sort.map(|s| s.as_str().to_string()),
            SEARCH => self
                .search_term
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            COLLECTION_ID => self.collection_id.as_ref().map(ToString::to_string),
            PAGE => (self.page > 1).then(|| self.page.to_string()),
            _ => None,
        }
    }

    /// Add the brand if absent, remove it if present.
    #[must_use]
    pub fn toggle_brand(mut self, id: &FacetValueId) -> Self {
        toggle(&mut self.brand_ids, id);
        self
    }

    /// Add the product type if absent, remove it if present.
    #[must_use]
    pub fn toggle_product_type(mut self, id: &FacetValueId) -> Self {
        toggle(&mut self.product_type_ids, id);
        self
    }

    /// Add the facet value if absent, remove it if present.
    #[must_use]
    pub fn toggle_facet_value(mut self, id: &FacetValueId) -> Self {
        toggle(&mut self.facet_value_ids, id);
        self
    }

    /// Toggle a brand and serialize onto `previous`.
    #[must_use]
    pub fn toggle_brand_query(&self, id: &FacetValueId, previous: &str, bounds: &PriceBounds) -> String {
        self.clone().toggle_brand(id).serialize(previous, bounds)
    }

    /// Toggle a product type and serialize onto `previous`.
    #[must_use]
    pub fn toggle_product_type_query(
        &self,
        id: &FacetValueId,
        previous: &str,
        bounds: &PriceBounds,
    ) -> String {
        self.clone()
            .toggle_product_type(id)
            .serialize(previous, bounds)
    }

    /// Toggle a facet value and serialize onto `previous`.
    #[must_use]
    pub fn toggle_facet_value_query(
        &self,
        id: &FacetValueId,
        previous: &str,
        bounds: &PriceBounds,
    ) -> String {
        self.clone()
            .toggle_facet_value(id)
            .serialize(previous, bounds)
    }

    /// Set both price bounds.
    #[must_use]
    pub const fn with_price_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    /// Set or clear the sort key.
    #[must_use]
    pub const fn with_sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    /// Set the page, clamped to at least 1.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set or clear the search term. Blank terms clear it.
    #[must_use]
    pub fn with_search_term(mut self, term: Option<&str>) -> Self {
        self.search_term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    /// Every selected facet value: brands, product types, then generic.
    pub fn selected_facet_values(&self) -> impl Iterator<Item = &FacetValueId> {
        self.brand_ids
            .iter()
            .chain(&self.product_type_ids)
            .chain(&self.facet_value_ids)
    }

    /// Whether any narrowing filter (price or facet) is active.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.price_min.is_some()
            || self.price_max.is_some()
            || self.selected_facet_values().next().is_some()
    }
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// First non-blank value for `key`.
fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_id_list(value: &str) -> BTreeSet<FacetValueId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(FacetValueId::new)
        .collect()
}

fn join_ids(ids: &BTreeSet<FacetValueId>) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(
        ids.iter()
            .map(FacetValueId::as_str)
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn toggle(set: &mut BTreeSet<FacetValueId>, id: &FacetValueId) {
    if !set.remove(id) {
        set.insert(id.clone());
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Encode a value, keeping the commas of ID lists readable.
fn encode_value(key: &str, value: &str) -> String {
    if matches!(key, BRANDS | PRODUCT_TYPES | FACET_VALUES) {
        value.split(',').map(encode).collect::<Vec<_>>().join(",")
    } else {
        encode(value)
    }
}
