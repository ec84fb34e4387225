//! Regimen client implementation.

use regimen_core::{
    AskRequest, CatalogView, ClearResponse, ConversationView, ErrorPanel, Product, RegimenError,
    RemoveResponse, ReplyView, Result, SelectionView, ToggleResponse,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::stream::EventStream;

/// Client for interacting with a Regimen node.
#[derive(Clone)]
pub struct RegimenClient {
    /// Base URL of the Regimen node.
    base_url: String,

    /// HTTP client.
    http_client: reqwest::Client,
}

impl RegimenClient {
    /// Connect to a Regimen node.
    pub async fn connect(url: &str) -> Result<Self> {
        let base_url = url.trim_end_matches('/').to_string();
        let http_client = reqwest::Client::new();

        // Verify connection with health check
        let health_url = format!("{}/health", base_url);
        http_client
            .get(&health_url)
            .send()
            .await
            .map_err(|e| RegimenError::ConnectionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegimenError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Products of `category`, or the whole catalog.
    pub async fn catalog(&self, category: Option<&str>) -> Result<CatalogView> {
        let mut request = self.http_client.get(self.url("/api/v1/catalog"));
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        decode(request.send().await).await
    }

    /// Current selection.
    pub async fn selection(&self) -> Result<SelectionView> {
        decode(self.http_client.get(self.url("/api/v1/selection")).send().await).await
    }

    /// Select or deselect a product.
    pub async fn toggle(&self, product: &Product) -> Result<ToggleResponse> {
        let response = self
            .http_client
            .post(self.url("/api/v1/selection"))
            .json(product)
            .send()
            .await;
        decode(response).await
    }

    /// Remove a product from the selection. The id is sent as one encoded
    /// path segment.
    pub async fn remove(&self, product_id: &str) -> Result<RemoveResponse> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| RegimenError::ConnectionError(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                RegimenError::ConnectionError(format!("not a base URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "v1", "selection", product_id]);

        decode(self.http_client.delete(url).send().await).await
    }

    /// Clear the selection. `confirmed` must reflect an explicit user choice.
    pub async fn clear(&self, confirmed: bool) -> Result<ClearResponse> {
        let response = self
            .http_client
            .delete(self.url("/api/v1/selection"))
            .query(&[("confirm", confirmed)])
            .send()
            .await;
        decode(response).await
    }

    /// Generate a routine from the current selection.
    pub async fn generate_routine(&self) -> Result<ReplyView> {
        decode(self.http_client.post(self.url("/api/v1/routine")).send().await).await
    }

    /// Ask a follow-up question.
    pub async fn ask(&self, message: &str) -> Result<ReplyView> {
        let response = self
            .http_client
            .post(self.url("/api/v1/chat"))
            .json(&AskRequest {
                message: message.to_string(),
            })
            .send()
            .await;
        decode(response).await
    }

    /// Visible conversation and entry point status.
    pub async fn conversation(&self) -> Result<ConversationView> {
        decode(self.http_client.get(self.url("/api/v1/conversation")).send().await).await
    }

    /// Subscribe to session events.
    pub async fn events(&self) -> Result<EventStream> {
        let ws_url = format!(
            "{}/ws/session",
            self.base_url
                .replace("http://", "ws://")
                .replace("https://", "wss://")
        );
        EventStream::connect(&ws_url).await
    }
}

/// Decode a node response, turning error panels into `RegimenError::Remote`.
async fn decode<T: DeserializeOwned>(
    response: std::result::Result<reqwest::Response, reqwest::Error>,
) -> Result<T> {
    let response = response.map_err(|e| RegimenError::ConnectionError(e.to_string()))?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "Node rejected request");

        let panel = serde_json::from_str::<ErrorPanel>(&body).unwrap_or_else(|_| ErrorPanel {
            title: status.to_string(),
            message: body,
            details: None,
        });
        return Err(RegimenError::Remote {
            status: status.as_u16(),
            title: panel.title,
            message: panel.details.unwrap_or(panel.message),
        });
    }

    response
        .json()
        .await
        .map_err(|e| RegimenError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        routing::{delete, get, post},
        Json, Router,
    };
    use regimen_core::ToggleOutcome;
    use serde_json::json;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_connect_and_toggle() {
        let app = Router::new()
            .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
            .route(
                "/api/v1/selection",
                post(|Json(product): Json<Product>| async move {
                    Json(json!({
                        "outcome": "added",
                        "selection": {"products": [product], "can_generate": true}
                    }))
                }),
            );
        let client = RegimenClient::connect(&spawn(app).await).await.unwrap();

        let product = Product::new("p1", "Cleanser", "X", "cleanser");
        let response = client.toggle(&product).await.unwrap();
        assert_eq!(response.outcome, ToggleOutcome::Added);
        assert_eq!(response.selection.products, vec![product]);
    }

    #[tokio::test]
    async fn test_error_panel_becomes_remote_error() {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/api/v1/chat",
                post(|| async {
                    (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({
                            "title": "Error",
                            "message": "There was an error connecting to the API.",
                            "details": "API request failed: 500"
                        })),
                    )
                }),
            );
        let client = RegimenClient::connect(&spawn(app).await).await.unwrap();

        let err = client.ask("hello").await.unwrap_err();
        assert_eq!(
            err,
            RegimenError::Remote {
                status: 502,
                title: "Error".to_string(),
                message: "API request failed: 500".to_string(),
            }
        );
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_connect_fails_without_node() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = RegimenClient::connect(&format!("http://{}", addr)).await.err().unwrap();
        assert!(matches!(err, RegimenError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn test_remove_encodes_product_id() {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/api/v1/selection/:id",
                delete(|Path(id): Path<String>| async move {
                    Json(json!({
                        "removed": 1,
                        "selection": {
                            "products": [Product::new(id, "echo", "X", "c")],
                            "can_generate": true
                        }
                    }))
                }),
            );
        let client = RegimenClient::connect(&spawn(app).await).await.unwrap();

        for id in ["a/b", "what?#1", "toggle"] {
            let response = client.remove(id).await.unwrap();
            assert_eq!(response.selection.products[0].id, id);
        }
    }
}
