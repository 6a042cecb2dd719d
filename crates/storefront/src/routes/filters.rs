//! Filter change handler (HTMX).
//!
//! The sidebar posts the current query string along with the one change the
//! shopper made. The response carries the canonical URL in `HX-Replace-Url`
//! so the browser history matches what the next page load will parse.

use axum::{
    Form, Json,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopfront_core::FacetValueId;

use crate::catalog::{FilterState, PriceBounds, SortKey};
use crate::error::{AppError, Result};

/// Listing page used when the form names none.
const DEFAULT_PATH: &str = "/products";

/// A single filter change.
///
/// Absent fields leave the current selection alone; a blank price or sort
/// clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterForm {
    /// Current query string, with or without `?`.
    #[serde(default)]
    pub query: String,
    /// Listing path the query belongs to.
    pub path: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub sort: Option<String>,
    pub toggle_brand: Option<String>,
    pub toggle_product_type: Option<String>,
    pub toggle_facet_value: Option<String>,
    pub q: Option<String>,
    /// Catalog price range; prices at or beyond it are dropped from the URL.
    pub bounds_min: Option<String>,
    pub bounds_max: Option<String>,
}

/// The canonical URL after a filter change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUpdate {
    pub url: String,
    pub query: String,
    pub filters: FilterState,
}

/// Apply a filter change and return the canonical URL.
#[instrument(skip(form))]
pub async fn apply(Form(form): Form<FilterForm>) -> Result<Response> {
    let update = apply_form(form)?;
    Ok((
        AppendHeaders([("HX-Replace-Url", update.url.clone())]),
        Json(update),
    )
        .into_response())
}

/// Fold one form submission into the filter state.
///
/// Any change returns to page 1; parameters the catalog does not own are
/// preserved in place.
///
/// # Errors
///
/// Returns `BadRequest` when `path` is not a local path.
pub fn apply_form(form: FilterForm) -> Result<FilterUpdate> {
    let path = match form.path.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_PATH,
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        Some(_) => return Err(AppError::BadRequest("Invalid listing path".to_string())),
    };

    let mut filters = FilterState::parse(&form.query);

    if form.price_min.is_some() || form.price_max.is_some() {
        let min = form.price_min.as_deref().map_or(filters.price_min, parse_price);
        let max = form.price_max.as_deref().map_or(filters.price_max, parse_price);
        filters = filters.with_price_range(min, max);
    }
    if let Some(sort) = form.sort.as_deref() {
        filters = filters.with_sort(SortKey::from_param(sort));
    }
    if let Some(id) = non_blank(form.toggle_brand.as_deref()) {
        filters = filters.toggle_brand(&FacetValueId::new(id));
    }
    if let Some(id) = non_blank(form.toggle_product_type.as_deref()) {
        filters = filters.toggle_product_type(&FacetValueId::new(id));
    }
    if let Some(id) = non_blank(form.toggle_facet_value.as_deref()) {
        filters = filters.toggle_facet_value(&FacetValueId::new(id));
    }
    if let Some(term) = form.q.as_deref() {
        filters = filters.with_search_term(Some(term));
    }
    filters = filters.with_page(1);

    let bounds = PriceBounds {
        min: form
            .bounds_min
            .as_deref()
            .and_then(parse_price)
            .unwrap_or(PriceBounds::UNBOUNDED.min),
        max: form
            .bounds_max
            .as_deref()
            .and_then(parse_price)
            .unwrap_or(PriceBounds::UNBOUNDED.max),
    };

    let query = filters.serialize(&form.query, &bounds);
    let url = if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    };

    Ok(FilterUpdate {
        url,
        query,
        filters,
    })
}

/// Blank or non-numeric prices clear the bound.
fn parse_price(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_brand_resets_page() {
        let update = apply_form(FilterForm {
            query: "?brands=acme&page=3".to_string(),
            toggle_brand: Some("globex".to_string()),
            ..FilterForm::default()
        })
        .unwrap();

        assert_eq!(update.url, "/products?brands=acme,globex");
        assert_eq!(update.filters.page, 1);
    }

    #[test]
    fn test_toggle_removes_selected_value() {
        let update = apply_form(FilterForm {
            query: "brands=acme".to_string(),
            path: Some("/collections/chairs".to_string()),
            toggle_brand: Some("acme".to_string()),
            ..FilterForm::default()
        })
        .unwrap();

        assert_eq!(update.url, "/collections/chairs");
        assert!(update.query.is_empty());
    }

    #[test]
    fn test_price_at_bounds_is_dropped() {
        let update = apply_form(FilterForm {
            price_min: Some("500".to_string()),
            price_max: Some("4000".to_string()),
            bounds_min: Some("500".to_string()),
            bounds_max: Some("9900".to_string()),
            ..FilterForm::default()
        })
        .unwrap();

        assert_eq!(update.query, "priceMax=4000");
    }

    #[test]
    fn test_blank_price_clears_bound() {
        let update = apply_form(FilterForm {
            query: "priceMin=1000&priceMax=2000".to_string(),
            price_min: Some(String::new()),
            ..FilterForm::default()
        })
        .unwrap();

        assert_eq!(update.filters.price_min, None);
        assert_eq!(update.filters.price_max, Some(2000));
        assert_eq!(update.query, "priceMax=2000");
    }

    #[test]
    fn test_unknown_sort_clears_sort() {
        let update = apply_form(FilterForm {
            query: "sort=price-asc".to_string(),
            sort: Some("cheapest".to_string()),
            ..FilterForm::default()
        })
        .unwrap();

        assert_eq!(update.filters.sort, None);
        assert!(update.query.is_empty());
    }

    #[test]
    fn test_foreign_parameters_are_preserved() {
        let update = apply_form(FilterForm {
            query: "utm_source=mail&sort=newest".to_string(),
            sort: Some("price-desc".to_string()),
            ..FilterForm::default()
        })
        .unwrap();

        assert_eq!(update.query, "utm_source=mail&sort=price-desc");
    }

    #[test]
    fn test_rejects_external_path() {
        let result = apply_form(FilterForm {
            path: Some("//evil.example.com".to_string()),
            ..FilterForm::default()
        });
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = apply_form(FilterForm {
            path: Some("https://evil.example.com".to_string()),
            ..FilterForm::default()
        });
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
