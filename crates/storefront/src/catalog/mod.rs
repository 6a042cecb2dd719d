//! Catalog browsing state and query construction.
//!
//! - [`FilterState`] is the URL query string as a typed value (parse,
//!   serialize, toggle)
//! - [`query_builder`] turns it into Shop API search input, pure and
//!   deterministic

pub mod filter_state;
pub mod query_builder;

pub use filter_state::{FilterState, PriceBounds, SortKey};
pub use query_builder::{
    CatalogQueries, ListFilter, ListQueryOptions, ListSort, LogicalOperator, Pagination,
    PriceRange, ProductListOptions, QueryScope, SortOrder, build, build_catalog_queries,
    build_filter_options, build_price_filter, price_range, sort_for, sort_for_param,
    total_pages,
};
