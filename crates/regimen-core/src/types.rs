//! Common types shared by the session stores, the orchestrator and clients.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two ways a request reaches the completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    /// Build a routine from the current selection.
    GenerateRoutine,
    /// Ask a follow-up question.
    AskQuestion,
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::GenerateRoutine => f.write_str("generate-routine"),
            EntryPoint::AskQuestion => f.write_str("ask-question"),
        }
    }
}

/// Status of an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    /// Ready to be triggered.
    #[default]
    Idle,
    /// A request is outstanding; the triggering control should be disabled.
    Sending,
}

impl SendStatus {
    /// Returns true while a request is outstanding.
    pub fn is_sending(&self) -> bool {
        matches!(self, SendStatus::Sending)
    }
}

/// Outcome of toggling a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The product was not selected and now is.
    Added,
    /// The product was selected and no longer is.
    Removed,
}

/// Outcome of a clear-all request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ClearOutcome {
    /// The selection was emptied.
    Cleared { removed: usize },
    /// Nothing was selected.
    AlreadyEmpty,
    /// The user did not confirm.
    NotConfirmed,
}

/// Topic an event belongs to, used for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    Selection,
    Conversation,
    Orchestrator,
}

/// Something observable happened in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// The selection was mutated.
    SelectionChanged {
        product_ids: Vec<String>,
        count: usize,
    },
    /// The conversation log was mutated.
    ConversationChanged { visible_turns: usize },
    /// A request left Idle.
    SendStarted { entry: EntryPoint },
    /// A request completed and its reply was recorded.
    SendSucceeded { entry: EntryPoint },
    /// A request failed and its staged turn was reverted.
    SendFailed { entry: EntryPoint, message: String },
}

impl SessionEventKind {
    /// The topic this event is published under.
    pub fn topic(&self) -> EventTopic {
        match self {
            SessionEventKind::SelectionChanged { .. } => EventTopic::Selection,
            SessionEventKind::ConversationChanged { .. } => EventTopic::Conversation,
            SessionEventKind::SendStarted { .. }
            | SessionEventKind::SendSucceeded { .. }
            | SessionEventKind::SendFailed { .. } => EventTopic::Orchestrator,
        }
    }
}

/// A timestamped session event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// When the event was published.
    pub at: DateTime<Utc>,

    /// What happened.
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

impl SessionEvent {
    /// Stamp an event with the current time.
    pub fn now(kind: SessionEventKind) -> Self {
        Self {
            at: Utc::now(),
            kind,
        }
    }

    /// The topic this event is published under.
    pub fn topic(&self) -> EventTopic {
        self.kind.topic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = SessionEvent::now(SessionEventKind::SendFailed {
            entry: EntryPoint::AskQuestion,
            message: "API request failed: 500".to_string(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "send_failed");
        assert_eq!(json["entry"], "ask_question");
        assert!(json["at"].is_string());

        let back: SessionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_topics() {
        let changed = SessionEventKind::SelectionChanged {
            product_ids: vec![],
            count: 0,
        };
        assert_eq!(changed.topic(), EventTopic::Selection);
        assert_eq!(
            SessionEventKind::SendStarted {
                entry: EntryPoint::GenerateRoutine
            }
            .topic(),
            EventTopic::Orchestrator
        );
    }

    #[test]
    fn test_entry_point_display() {
        assert_eq!(EntryPoint::GenerateRoutine.to_string(), "generate-routine");
        assert!(SendStatus::Sending.is_sending());
        assert!(!SendStatus::default().is_sending());
    }
}
