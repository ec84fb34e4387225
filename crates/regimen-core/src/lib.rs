//! # Regimen Core
//!
//! Core types for the Regimen session.
//!
//! This crate provides the fundamental building blocks:
//! - [`Product`] - Catalog entries and category filtering
//! - [`ConversationLog`] - Ordered chat turns with staged user turns
//! - [`CompletionRequest`] / [`CompletionResponse`] - Completion endpoint wire format
//! - [`SessionEvent`] - Change notifications for clients
//! - [`RegimenError`] - Error taxonomy

pub mod completion;
pub mod conversation;
pub mod error;
pub mod product;
pub mod prompt;
pub mod types;
pub mod view;

// Re-exports for convenience
pub use completion::{CompletionRequest, CompletionResponse};
pub use conversation::{ConversationLog, ConversationTurn, Role, StagedTurn};
pub use error::{RegimenError, Result};
pub use product::{categories, filter_by_category, Catalog, Product};
pub use types::*;
pub use view::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::conversation::{ConversationLog, ConversationTurn, Role};
    pub use crate::error::{RegimenError, Result};
    pub use crate::product::{Catalog, Product};
    pub use crate::types::{EntryPoint, SendStatus, SessionEvent, SessionEventKind};
}
