//! Catalog endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use regimen_core::CatalogView;
use serde::Deserialize;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// Products of the requested category. The catalog is fetched on every call.
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogView>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let view = state.catalog.view(category).await?;
    Ok(Json(view))
}
