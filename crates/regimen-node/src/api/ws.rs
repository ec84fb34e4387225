//! WebSocket session event stream.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use regimen_core::{EventTopic, SessionEvent, SessionEventKind};
use regimen_state::SubscriptionFilter;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Comma-separated topics (`selection,conversation,orchestrator`).
    pub topics: Option<String>,
}

impl StreamQuery {
    fn filter(&self) -> SubscriptionFilter {
        let Some(raw) = self.topics.as_deref() else {
            return SubscriptionFilter::all();
        };

        let topics: Vec<EventTopic> = raw
            .split(',')
            .filter_map(|t| match t.trim() {
                "selection" => Some(EventTopic::Selection),
                "conversation" => Some(EventTopic::Conversation),
                "orchestrator" => Some(EventTopic::Orchestrator),
                _ => None,
            })
            .collect();

        if topics.is_empty() {
            SubscriptionFilter::all()
        } else {
            SubscriptionFilter::topics(topics)
        }
    }
}

/// Session event stream.
pub async fn session_stream(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> Response {
    let filter = query.filter();
    ws.on_upgrade(move |socket| handle_session_stream(socket, filter, state))
}

async fn send_event(socket: &mut WebSocket, event: &SessionEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode session event");
            true
        }
    }
}

async fn handle_session_stream(mut socket: WebSocket, filter: SubscriptionFilter, state: AppState) {
    let subscription = state.events.subscribe(filter.clone()).await;
    let subscription_id = subscription.id;
    debug!(subscription = %subscription_id, "Session stream opened");

    // Current state first, so the client can render before anything changes.
    let products = state.selection.products().await;
    let snapshot = [
        SessionEvent::now(SessionEventKind::SelectionChanged {
            product_ids: products.iter().map(|p| p.id.clone()).collect(),
            count: products.len(),
        }),
        SessionEvent::now(SessionEventKind::ConversationChanged {
            visible_turns: state.conversation.visible_len().await,
        }),
    ];
    let mut open = true;
    for event in snapshot.iter().filter(|e| filter.matches(e)) {
        if !send_event(&mut socket, event).await {
            open = false;
            break;
        }
    }

    let mut events = Box::pin(subscription.into_stream());

    while open {
        tokio::select! {
            event = events.next() => {
                match event {
                    Some(event) => open = send_event(&mut socket, &event).await,
                    None => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    state.events.unsubscribe(subscription_id).await;
    debug!(subscription = %subscription_id, "Session stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_query() {
        let query = StreamQuery {
            topics: Some("selection, orchestrator,bogus".to_string()),
        };
        assert_eq!(
            query.filter(),
            SubscriptionFilter::topics(vec![EventTopic::Selection, EventTopic::Orchestrator])
        );

        assert_eq!(StreamQuery { topics: None }.filter(), SubscriptionFilter::all());
        assert_eq!(
            StreamQuery {
                topics: Some("bogus".to_string())
            }
            .filter(),
            SubscriptionFilter::all()
        );
    }
}
