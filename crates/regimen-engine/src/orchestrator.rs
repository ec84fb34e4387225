//! Routine and chat orchestration.
//!
//! Each entry point moves Idle -> Sending -> Idle. While Sending, a second
//! trigger of the same entry point is rejected. The user turn is staged
//! before the remote call and reverted if the call fails, so a failed
//! request leaves the conversation exactly as it was.
//!
//! The exchange itself runs on its own task. Dropping the caller's future
//! (a client disconnect, for instance) does not cancel it; the entry stays
//! Sending until the call resolves and the staged turn is settled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use regimen_core::prompt::routine_request;
use regimen_core::{EntryPoint, RegimenError, ReplyView, Result, SendStatus, SessionEventKind};
use regimen_state::{ConversationStore, EventBus, SelectionStore};
use tracing::{error, info, warn};

use crate::completion::CompletionBackend;

/// Drives both entry points against the completion backend.
pub struct Orchestrator {
    selection: Arc<SelectionStore>,
    conversation: Arc<ConversationStore>,
    backend: Arc<dyn CompletionBackend>,
    events: Arc<EventBus>,
    routine_busy: Arc<AtomicBool>,
    question_busy: Arc<AtomicBool>,
}

/// Holds an entry point in Sending; dropping it returns the entry to Idle.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One request/reply round trip, owned by its task.
struct Exchange {
    entry: EntryPoint,
    conversation: Arc<ConversationStore>,
    backend: Arc<dyn CompletionBackend>,
    events: Arc<EventBus>,
}

impl Exchange {
    async fn run(&self, user_turn: String) -> Result<ReplyView> {
        let entry = self.entry;
        self.events.publish(SessionEventKind::SendStarted { entry });

        let staged = self.conversation.stage_user(user_turn).await;
        let messages = self.conversation.messages().await;
        info!(%entry, turns = messages.len(), "Sending conversation to completion endpoint");

        match self.backend.complete(&messages).await {
            Ok(content) => {
                self.conversation.commit(staged, content.clone()).await;
                Ok(ReplyView {
                    entry,
                    content,
                    history: self.conversation.history().await,
                })
            }
            Err(e) => {
                error!(%entry, error = %e, "Completion request failed");
                self.conversation.revert(staged).await;
                Err(e)
            }
        }
    }

    fn announce(&self, result: &Result<ReplyView>) {
        let entry = self.entry;
        let kind = match result {
            Ok(_) => SessionEventKind::SendSucceeded { entry },
            Err(e) => SessionEventKind::SendFailed {
                entry,
                message: e.to_string(),
            },
        };
        self.events.publish(kind);
    }
}

impl Orchestrator {
    pub fn new(
        selection: Arc<SelectionStore>,
        conversation: Arc<ConversationStore>,
        backend: Arc<dyn CompletionBackend>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            selection,
            conversation,
            backend,
            events,
            routine_busy: Arc::new(AtomicBool::new(false)),
            question_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    fn flag(&self, entry: EntryPoint) -> &Arc<AtomicBool> {
        match entry {
            EntryPoint::GenerateRoutine => &self.routine_busy,
            EntryPoint::AskQuestion => &self.question_busy,
        }
    }

    fn acquire(&self, entry: EntryPoint) -> Result<BusyGuard> {
        let flag = self.flag(entry);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!(%entry, "Rejected trigger while a request is outstanding");
                RegimenError::Busy { entry }
            })?;
        Ok(BusyGuard { flag: flag.clone() })
    }

    /// Current status of an entry point.
    pub fn status(&self, entry: EntryPoint) -> SendStatus {
        if self.flag(entry).load(Ordering::Acquire) {
            SendStatus::Sending
        } else {
            SendStatus::Idle
        }
    }

    /// Ask for a routine built from the current selection.
    pub async fn generate_routine(&self) -> Result<ReplyView> {
        let products = self.selection.products().await;
        if products.is_empty() {
            return Err(RegimenError::EmptySelection);
        }

        let entry = EntryPoint::GenerateRoutine;
        let guard = self.acquire(entry)?;
        let prompt = routine_request(&products)?;
        self.dispatch(entry, guard, prompt).await
    }

    /// Ask a follow-up question.
    pub async fn ask_question(&self, text: &str) -> Result<ReplyView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RegimenError::EmptyMessage);
        }

        let entry = EntryPoint::AskQuestion;
        let guard = self.acquire(entry)?;
        self.dispatch(entry, guard, text.to_string()).await
    }

    /// Run the exchange on its own task and wait for it. The guard is released
    /// before the terminal event so listeners may re-trigger right away.
    async fn dispatch(
        &self,
        entry: EntryPoint,
        guard: BusyGuard,
        user_turn: String,
    ) -> Result<ReplyView> {
        let exchange = Exchange {
            entry,
            conversation: self.conversation.clone(),
            backend: self.backend.clone(),
            events: self.events.clone(),
        };

        tokio::spawn(async move {
            let result = exchange.run(user_turn).await;
            drop(guard);
            exchange.announce(&result);
            result
        })
        .await
        .map_err(|e| RegimenError::Internal(format!("exchange task failed: {}", e)))?
    }
}
