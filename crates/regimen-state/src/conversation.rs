//! The conversation store.

use std::sync::Arc;

use regimen_core::{ConversationLog, ConversationTurn, SessionEventKind, StagedTurn};
use tokio::sync::RwLock;
use tracing::debug;

use crate::subscription::EventBus;

/// Owns the session's conversation log and announces every change.
pub struct ConversationStore {
    log: RwLock<ConversationLog>,
    events: Arc<EventBus>,
}

impl ConversationStore {
    /// Start a conversation with the given system prompt.
    pub fn new(system_prompt: impl Into<String>, events: Arc<EventBus>) -> Self {
        Self {
            log: RwLock::new(ConversationLog::new(system_prompt)),
            events,
        }
    }

    pub async fn append_user(&self, text: impl Into<String>) {
        let mut log = self.log.write().await;
        log.append_user(text);
        self.announce(&log);
    }

    pub async fn append_assistant(&self, text: impl Into<String>) {
        let mut log = self.log.write().await;
        log.append_assistant(text);
        self.announce(&log);
    }

    /// Remove the last turn if it is a user turn.
    pub async fn rollback_last_user(&self) -> bool {
        let mut log = self.log.write().await;
        let removed = log.rollback_last_user();
        if removed {
            self.announce(&log);
        }
        removed
    }

    /// Append a user turn ahead of a remote call.
    pub async fn stage_user(&self, text: impl Into<String>) -> StagedTurn {
        let mut log = self.log.write().await;
        let staged = log.stage_user(text);
        debug!(seq = staged.seq(), "Staged user turn");
        self.announce(&log);
        staged
    }

    /// Keep a staged turn and record the reply.
    pub async fn commit(&self, staged: StagedTurn, reply: impl Into<String>) {
        let mut log = self.log.write().await;
        debug!(seq = staged.seq(), "Committed user turn");
        log.commit(staged, reply);
        self.announce(&log);
    }

    /// Drop a staged turn after a failed call.
    pub async fn revert(&self, staged: StagedTurn) -> bool {
        let mut log = self.log.write().await;
        let seq = staged.seq();
        let removed = log.revert(staged);
        debug!(seq, removed, "Reverted user turn");
        if removed {
            self.announce(&log);
        }
        removed
    }

    /// Visible history, system turn excluded.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.log.read().await.history()
    }

    /// Full log, system turn first.
    pub async fn messages(&self) -> Vec<ConversationTurn> {
        self.log.read().await.messages()
    }

    /// Total number of turns, system turn included.
    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn visible_len(&self) -> usize {
        self.log.read().await.visible_len()
    }

    fn announce(&self, log: &ConversationLog) {
        self.events.publish(SessionEventKind::ConversationChanged {
            visible_turns: log.visible_len(),
        });
    }
}
