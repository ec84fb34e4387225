//! Session event subscriptions.

use std::collections::HashMap;
use std::sync::Arc;

use regimen_core::{EventTopic, SessionEvent, SessionEventKind};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;
use uuid::Uuid;

/// Filter for subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    /// Topics to watch. `None` watches everything.
    pub topics: Option<Vec<EventTopic>>,
}

impl SubscriptionFilter {
    /// Watch every topic.
    pub fn all() -> Self {
        Self::default()
    }

    /// Watch only the given topics.
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics: Some(topics),
        }
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &SessionEvent) -> bool {
        match self.topics {
            Some(ref topics) => topics.contains(&event.topic()),
            None => true,
        }
    }
}

/// A subscription to session events.
pub struct SessionSubscription {
    /// Unique ID for this subscription.
    pub id: Uuid,

    /// Filter for this subscription.
    pub filter: SubscriptionFilter,

    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "Subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Turn the subscription into a stream of matching events.
    pub fn into_stream(self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        let id = self.id;
        let filter = self.filter;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(event) if filter.matches(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(subscription = %id, skipped, "Subscriber lagged; events dropped");
                None
            }
        })
    }
}

/// Fan-out of session events to every subscriber.
pub struct EventBus {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<SessionEvent>,

    /// Active subscriptions.
    subscriptions: Arc<RwLock<HashMap<Uuid, SubscriptionFilter>>>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to session events with a filter.
    pub async fn subscribe(&self, filter: SubscriptionFilter) -> SessionSubscription {
        let id = Uuid::new_v4();
        let receiver = self.sender.subscribe();

        let mut subs = self.subscriptions.write().await;
        subs.insert(id, filter.clone());

        SessionSubscription {
            id,
            filter,
            receiver,
        }
    }

    /// Unsubscribe from session events.
    pub async fn unsubscribe(&self, id: Uuid) {
        let mut subs = self.subscriptions.write().await;
        subs.remove(&id);
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, kind: SessionEventKind) {
        let _ = self.sender.send(SessionEvent::now(kind));
    }

    /// Get the number of active subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
