//! View models exchanged between the node and its clients.

use serde::{Deserialize, Serialize};

use crate::conversation::ConversationTurn;
use crate::error::RegimenError;
use crate::product::Product;
use crate::types::{ClearOutcome, EntryPoint, SendStatus, ToggleOutcome};

/// Products of one category plus every known category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogView {
    pub category: Option<String>,
    pub products: Vec<Product>,
    pub categories: Vec<String>,
}

/// The current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionView {
    pub products: Vec<Product>,
    /// False when nothing is selected; the generate control is disabled.
    pub can_generate: bool,
}

impl SelectionView {
    pub fn new(products: Vec<Product>) -> Self {
        let can_generate = !products.is_empty();
        Self {
            products,
            can_generate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub selection: SelectionView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub removed: usize,
    pub selection: SelectionView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub outcome: ClearOutcome,
    pub selection: SelectionView,
}

/// Visible conversation and the state of both entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
    pub turns: Vec<ConversationTurn>,
    pub routine_status: SendStatus,
    pub question_status: SendStatus,
}

/// A successful reply from the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyView {
    pub entry: EntryPoint,
    pub content: String,
    /// Visible history after the reply was recorded.
    pub history: Vec<ConversationTurn>,
}

/// Body of a follow-up question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

/// A user-visible error block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPanel {
    pub title: String,
    pub message: String,
    /// Raw error text, when there is one worth showing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

const CONNECT_FAILED: &str = "There was an error connecting to the API. Please try again.";

impl ErrorPanel {
    /// Panel for a failure of `entry`. Completion failures are titled after
    /// the entry point.
    pub fn for_entry(entry: EntryPoint, err: &RegimenError) -> Self {
        if !err.is_completion_failure() {
            return Self::from_error(err);
        }

        let title = match entry {
            EntryPoint::GenerateRoutine => "Error Generating Routine",
            EntryPoint::AskQuestion => "Error",
        };
        Self {
            title: title.to_string(),
            ..Self::from_error(err)
        }
    }

    /// Panel for any error.
    pub fn from_error(err: &RegimenError) -> Self {
        if err.is_completion_failure() {
            return Self {
                title: "Error".to_string(),
                message: CONNECT_FAILED.to_string(),
                details: Some(err.to_string()),
            };
        }

        let title = match err {
            RegimenError::CatalogFetch(_) | RegimenError::CatalogParse(_) => {
                "Catalog Unavailable"
            }
            RegimenError::Busy { .. } => "Request In Progress",
            _ if err.is_rejection() => "Request Rejected",
            _ => "Error",
        };

        Self {
            title: title.to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}
