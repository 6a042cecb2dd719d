//! Search route handlers.

use axum::{
    Json,
    extract::{RawQuery, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::{FilterState, QueryScope};
use crate::error::Result;
use crate::state::AppState;

use super::catalog::{CatalogPage, load_catalog_page};

/// Search results page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub term: String,
    #[serde(flatten)]
    pub catalog: CatalogPage,
}

/// Full search page (`q`, or the legacy `search` parameter).
///
/// A blank term returns an empty page without calling the Shop API.
#[instrument(skip(state))]
pub async fn search_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SearchPage>> {
    let filters = FilterState::parse(query.as_deref().unwrap_or_default());

    let Some(term) = filters.search_term.clone() else {
        return Ok(Json(SearchPage {
            term: String::new(),
            catalog: CatalogPage::empty(filters),
        }));
    };

    let scope = QueryScope::from_state(&filters);
    let catalog = load_catalog_page(&state, filters, &scope).await?;
    Ok(Json(SearchPage { term, catalog }))
}
