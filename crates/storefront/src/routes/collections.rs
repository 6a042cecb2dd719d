//! Collection route handlers.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::{FilterState, QueryScope, build_catalog_queries};
use crate::commerce::{Collection, CollectionNode, CollectionSummary};
use crate::error::Result;
use crate::state::AppState;

use super::catalog::CatalogPage;

/// Collection display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub breadcrumbs: Vec<CollectionSummary>,
    pub children: Vec<CollectionSummary>,
}

impl From<Collection> for CollectionView {
    fn from(collection: Collection) -> Self {
        Self {
            id: collection.id.to_string(),
            name: collection.name,
            slug: collection.slug,
            description: collection.description,
            image: collection.featured_asset.map(|a| a.preview),
            breadcrumbs: collection.breadcrumbs,
            children: collection.children,
        }
    }
}

/// A collection with its filtered products.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPage {
    pub collection: CollectionView,
    #[serde(flatten)]
    pub catalog: CatalogPage,
}

/// Collection tree.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CollectionNode>>> {
    let items = state.client().collections().await?;
    Ok(Json(CollectionNode::build_tree(items)))
}

/// Collection detail with filtered products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<CollectionPage>> {
    let filters = FilterState::parse(query.as_deref().unwrap_or_default());
    let scope = QueryScope::from_state(&filters).with_collection_slug(slug.as_str());
    let page_size = state.page_size();
    let queries = build_catalog_queries(&filters, page_size, &scope);

    let client = state.client();
    let (collection, options) = tokio::join!(
        client.collection_with_products(&slug, &queries.products),
        client.search_filters(&queries.filters)
    );
    let (collection, products) = collection?;

    Ok(Json(CollectionPage {
        collection: CollectionView::from(collection),
        catalog: CatalogPage::new(filters, page_size, &products, options?),
    }))
}
