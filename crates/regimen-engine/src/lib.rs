//! # Regimen Engine
//!
//! Catalog loading, the completion endpoint client, and the orchestrator
//! that turns selections and questions into conversation turns.

pub mod catalog;
pub mod completion;
pub mod orchestrator;

pub use catalog::{source_for, CatalogLoader, CatalogSource, FileCatalogSource, HttpCatalogSource};
pub use completion::{CompletionBackend, HttpCompletionBackend};
pub use orchestrator::Orchestrator;
