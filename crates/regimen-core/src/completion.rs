//! Wire format of the chat completion endpoint.

use serde::{Deserialize, Serialize};

use crate::conversation::ConversationTurn;
use crate::error::{RegimenError, Result};

/// Request body: the whole conversation, system turn first.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [ConversationTurn],
}

/// Response body. Only `choices[0].message.content` is used.
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub content: String,
}

impl CompletionResponse {
    /// Parse a raw response body and extract the reply text.
    pub fn parse_content(raw: &str) -> Result<String> {
        let response: CompletionResponse = serde_json::from_str(raw)
            .map_err(|e| RegimenError::MalformedCompletion(e.to_string()))?;
        response.into_content()
    }

    /// The first choice's content.
    pub fn into_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RegimenError::MalformedCompletion("response has no choices".to_string()))
    }
}
