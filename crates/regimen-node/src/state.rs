//! Application state.

use std::sync::Arc;

use regimen_core::{ConversationView, EntryPoint, SelectionView};
use regimen_engine::{
    source_for, CatalogLoader, CatalogSource, CompletionBackend, HttpCompletionBackend,
    Orchestrator,
};
use regimen_state::{
    ConversationStore, EventBus, FileKeyValueStore, KeyValueStore, SelectionPersistence,
    SelectionStore,
};
use tracing::info;

use crate::config::NodeConfig;

/// The one session this node serves.
#[derive(Clone)]
pub struct AppState {
    /// Selected products.
    pub selection: Arc<SelectionStore>,

    /// Conversation with the assistant.
    pub conversation: Arc<ConversationStore>,

    /// Catalog access.
    pub catalog: CatalogLoader,

    /// Routine and chat requests.
    pub orchestrator: Arc<Orchestrator>,

    /// Change notifications.
    pub events: Arc<EventBus>,
}

/// Collaborators the session is built from.
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub catalog: Arc<dyn CatalogSource>,
    pub backend: Arc<dyn CompletionBackend>,
}

impl AppState {
    /// Build the session from configuration.
    pub async fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        let timeout = config.request_timeout();
        let collaborators = Collaborators {
            store: Arc::new(FileKeyValueStore::new(&config.data_dir)),
            catalog: source_for(&config.catalog, timeout)?,
            backend: Arc::new(HttpCompletionBackend::new(&config.completion_url, timeout)?),
        };

        info!(
            data_dir = %config.data_dir.display(),
            completion_url = %config.completion_url,
            "Session collaborators ready"
        );
        Ok(Self::assemble(config, collaborators).await)
    }

    /// Build the session around explicit collaborators.
    pub async fn assemble(config: &NodeConfig, collaborators: Collaborators) -> Self {
        let events = Arc::new(EventBus::new(config.event_buffer));

        let persistence =
            SelectionPersistence::new(collaborators.store, config.selection_slot.clone());
        let selection = Arc::new(SelectionStore::load(persistence, events.clone()).await);
        let conversation = Arc::new(ConversationStore::new(
            config.system_prompt.clone(),
            events.clone(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            selection.clone(),
            conversation.clone(),
            collaborators.backend,
            events.clone(),
        ));

        Self {
            selection,
            conversation,
            catalog: CatalogLoader::new(collaborators.catalog),
            orchestrator,
            events,
        }
    }

    pub async fn selection_view(&self) -> SelectionView {
        SelectionView::new(self.selection.products().await)
    }

    pub async fn conversation_view(&self) -> ConversationView {
        ConversationView {
            turns: self.conversation.history().await,
            routine_status: self.orchestrator.status(EntryPoint::GenerateRoutine),
            question_status: self.orchestrator.status(EntryPoint::AskQuestion),
        }
    }
}
