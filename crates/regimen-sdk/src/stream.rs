//! Event stream for real-time session updates.

use futures::StreamExt;
use regimen_core::{RegimenError, Result, SessionEvent};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

/// Stream of session events from a node.
pub struct EventStream {
    url: String,
    receiver: tokio::sync::mpsc::Receiver<SessionEvent>,
    _handle: tokio::task::JoinHandle<()>,
}

impl EventStream {
    /// Connect to a session event stream, e.g. `ws://localhost:3000/ws/session`.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| RegimenError::ConnectionError(e.to_string()))?;

        let (tx, rx) = tokio::sync::mpsc::channel(100);

        let handle = tokio::spawn(async move {
            let (_, mut read) = ws_stream.split();

            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<SessionEvent>(&text) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!(error = %e, "Skipping unrecognized frame"),
                    },
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
        });

        Ok(Self {
            url: ws_url.to_string(),
            receiver: rx,
            _handle: handle,
        })
    }

    /// The URL this stream is connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the next event. `None` once the node closes the stream.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }
}
