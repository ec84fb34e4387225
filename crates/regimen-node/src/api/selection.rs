//! Selection endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use regimen_core::{
    ClearOutcome, ClearResponse, Product, RegimenError, RemoveResponse, SelectionView,
    ToggleResponse,
};
use serde::Deserialize;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Current selection.
pub async fn get_selection(State(state): State<AppState>) -> Json<SelectionView> {
    Json(state.selection_view().await)
}

/// Select the product if it is not selected, deselect it otherwise.
pub async fn toggle_product(
    State(state): State<AppState>,
    Json(product): Json<Product>,
) -> Json<ToggleResponse> {
    let outcome = state.selection.toggle(product).await;

    Json(ToggleResponse {
        outcome,
        selection: state.selection_view().await,
    })
}

/// Remove a product from the selection by id.
pub async fn remove_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<RemoveResponse> {
    let removed = state.selection.remove_by_id(&id).await;

    Json(RemoveResponse {
        removed,
        selection: state.selection_view().await,
    })
}

/// Clear the selection. Requires `?confirm=true`.
pub async fn clear_selection(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearResponse>, ApiError> {
    let outcome = state.selection.clear_all(query.confirm).await;
    if outcome == ClearOutcome::NotConfirmed {
        return Err(RegimenError::NotConfirmed.into());
    }

    Ok(Json(ClearResponse {
        outcome,
        selection: state.selection_view().await,
    }))
}
