//! Routine and chat endpoints.

use axum::{extract::State, Json};
use regimen_core::{AskRequest, ConversationView, EntryPoint, ReplyView};

use super::ApiError;
use crate::state::AppState;

/// Generate a routine from the current selection.
pub async fn generate_routine(State(state): State<AppState>) -> Result<Json<ReplyView>, ApiError> {
    state
        .orchestrator
        .generate_routine()
        .await
        .map(Json)
        .map_err(|e| ApiError::for_entry(EntryPoint::GenerateRoutine, e))
}

/// Ask a follow-up question.
pub async fn ask_question(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<ReplyView>, ApiError> {
    state
        .orchestrator
        .ask_question(&req.message)
        .await
        .map(Json)
        .map_err(|e| ApiError::for_entry(EntryPoint::AskQuestion, e))
}

/// Visible conversation and entry point status.
pub async fn get_conversation(State(state): State<AppState>) -> Json<ConversationView> {
    Json(state.conversation_view().await)
}
