//! # Regimen State
//!
//! Session stores: the persisted product selection, the conversation log,
//! and the event bus that tells clients to re-render.

pub mod conversation;
pub mod persistence;
pub mod selection;
pub mod subscription;

pub use conversation::ConversationStore;
pub use persistence::{
    is_valid_slot_name, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    SelectionPersistence, DEFAULT_SELECTION_SLOT,
};
pub use selection::SelectionStore;
pub use subscription::{EventBus, SessionSubscription, SubscriptionFilter};
