//! # Regimen SDK
//!
//! Client SDK for interacting with Regimen nodes.

pub mod client;
pub mod stream;

pub use client::RegimenClient;
pub use stream::EventStream;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::RegimenClient;
    pub use crate::stream::EventStream;
    pub use regimen_core::prelude::*;
}
