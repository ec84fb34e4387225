//! Conversation turns and the ordered conversation log.
//!
//! The log always starts with the system turn that sets the assistant's
//! persona. That turn is sent with every request but is never part of the
//! visible history and can never be removed.

use serde::{Deserialize, Serialize};

use crate::prompt::DEFAULT_SYSTEM_PROMPT;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A user turn that was appended ahead of a remote call and must be either
/// committed or reverted once the call resolves.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a staged turn must be committed or reverted"]
pub struct StagedTurn {
    seq: u64,
}

impl StagedTurn {
    /// Sequence number of the staged turn inside its log.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone)]
struct LoggedTurn {
    seq: u64,
    turn: ConversationTurn,
}

/// Ordered log of conversation turns.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    entries: Vec<LoggedTurn>,
    next_seq: u64,
}

impl ConversationLog {
    /// Create a log that starts with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            entries: vec![LoggedTurn {
                seq: 0,
                turn: ConversationTurn::system(system_prompt),
            }],
            next_seq: 1,
        }
    }

    fn push(&mut self, turn: ConversationTurn) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(LoggedTurn { seq, turn });
        seq
    }

    /// Append a user turn.
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.push(ConversationTurn::user(text));
    }

    /// Append an assistant turn.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.push(ConversationTurn::assistant(text));
    }

    /// Append a user turn that will be committed or reverted later.
    pub fn stage_user(&mut self, text: impl Into<String>) -> StagedTurn {
        StagedTurn {
            seq: self.push(ConversationTurn::user(text)),
        }
    }

    /// Keep the staged turn and record the assistant's reply directly after
    /// it. Falls back to the tail if the staged turn is gone.
    pub fn commit(&mut self, staged: StagedTurn, reply: impl Into<String>) {
        let position = self
            .entries
            .iter()
            .position(|e| e.seq == staged.seq)
            .map(|index| index + 1);

        match position {
            Some(index) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(
                    index,
                    LoggedTurn {
                        seq,
                        turn: ConversationTurn::assistant(reply),
                    },
                );
            }
            None => self.append_assistant(reply),
        }
    }

    /// Remove the staged turn. Returns false if it was already gone.
    pub fn revert(&mut self, staged: StagedTurn) -> bool {
        let position = self
            .entries
            .iter()
            .position(|e| e.seq == staged.seq && e.turn.role == Role::User);

        match position {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove the final turn if and only if it is a user turn.
    pub fn rollback_last_user(&mut self) -> bool {
        match self.entries.last() {
            Some(last) if last.turn.role == Role::User => {
                self.entries.pop();
                true
            }
            _ => false,
        }
    }

    /// The leading system turn.
    pub fn system_turn(&self) -> Option<&ConversationTurn> {
        self.entries
            .first()
            .map(|e| &e.turn)
            .filter(|t| t.role == Role::System)
    }

    /// Visible history: every turn after the leading system turn.
    pub fn history(&self) -> Vec<ConversationTurn> {
        let skip = usize::from(self.system_turn().is_some());
        self.entries
            .iter()
            .skip(skip)
            .map(|e| e.turn.clone())
            .collect()
    }

    /// Every turn including the system turn, as sent to the endpoint.
    pub fn messages(&self) -> Vec<ConversationTurn> {
        self.entries.iter().map(|e| e.turn.clone()).collect()
    }

    /// Total number of turns, system turn included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of turns in the visible history.
    pub fn visible_len(&self) -> usize {
        self.len() - usize::from(self.system_turn().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}
