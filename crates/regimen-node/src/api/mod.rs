//! HTTP and WebSocket API.

pub mod catalog;
pub mod chat;
pub mod health;
pub mod selection;
pub mod ws;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regimen_core::{EntryPoint, ErrorPanel, RegimenError};
use tracing::warn;

/// An error rendered as an error panel.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    panel: ErrorPanel,
}

impl ApiError {
    /// Error raised by one of the orchestrator entry points.
    pub fn for_entry(entry: EntryPoint, err: RegimenError) -> Self {
        Self {
            status: status_for(&err),
            panel: ErrorPanel::for_entry(entry, &err),
        }
    }
}

impl From<RegimenError> for ApiError {
    fn from(err: RegimenError) -> Self {
        Self {
            status: status_for(&err),
            panel: ErrorPanel::from_error(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(
                status = %self.status,
                title = %self.panel.title,
                details = ?self.panel.details,
                "Request failed"
            );
        }
        (self.status, Json(self.panel)).into_response()
    }
}

fn status_for(err: &RegimenError) -> StatusCode {
    match err {
        RegimenError::Busy { .. } => StatusCode::CONFLICT,
        RegimenError::CatalogFetch(_) | RegimenError::CatalogParse(_) => StatusCode::BAD_GATEWAY,
        _ if err.is_rejection() => StatusCode::BAD_REQUEST,
        _ if err.is_completion_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
