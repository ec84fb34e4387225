//! Catalog loading.
//!
//! Every request re-reads the whole catalog and filters it locally; nothing
//! is cached between calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regimen_core::{
    categories, filter_by_category, Catalog, CatalogView, Product, RegimenError, Result,
};
use tracing::{debug, info};

/// Where the catalog document comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch and parse the catalog, returning its products.
    async fn fetch_catalog(&self) -> Result<Vec<Product>>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Catalog served over HTTP.
#[derive(Clone)]
pub struct HttpCatalogSource {
    url: String,
    http_client: reqwest::Client,
}

impl HttpCatalogSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegimenError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_catalog(&self) -> Result<Vec<Product>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RegimenError::CatalogFetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegimenError::CatalogFetch(e.to_string()))?;

        let raw = response
            .text()
            .await
            .map_err(|e| RegimenError::CatalogFetch(e.to_string()))?;

        parse(&raw)
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// Catalog read from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch_catalog(&self) -> Result<Vec<Product>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RegimenError::CatalogFetch(format!("{}: {}", self.path.display(), e)))?;

        parse(&raw)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse(raw: &str) -> Result<Vec<Product>> {
    let catalog = Catalog::from_json(raw).map_err(|e| RegimenError::CatalogParse(e.to_string()))?;
    Ok(catalog.products)
}

/// Pick a source for `location`: http(s) URLs are fetched, anything else is
/// a file path.
pub fn source_for(location: &str, timeout: Duration) -> Result<Arc<dyn CatalogSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpCatalogSource::new(location, timeout)?))
    } else {
        Ok(Arc::new(FileCatalogSource::new(location)))
    }
}

/// Fetches the catalog and applies the category filter.
#[derive(Clone)]
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        info!(location = %source.location(), "Catalog source configured");
        Self { source }
    }

    /// Fetch the full catalog.
    pub async fn fetch_catalog(&self) -> Result<Vec<Product>> {
        self.source.fetch_catalog().await
    }

    /// Fetch the catalog and keep only `category`.
    pub async fn load_category(&self, category: &str) -> Result<Vec<Product>> {
        let products = self.fetch_catalog().await?;
        let filtered = filter_by_category(&products, category);
        debug!(category, total = products.len(), matched = filtered.len(), "Filtered catalog");
        Ok(filtered)
    }

    /// Catalog view for a category, or the whole catalog when `None`.
    pub async fn view(&self, category: Option<&str>) -> Result<CatalogView> {
        let products = self.fetch_catalog().await?;
        let categories = categories(&products);
        let products = match category {
            Some(category) => filter_by_category(&products, category),
            None => products,
        };

        Ok(CatalogView {
            category: category.map(str::to_string),
            products,
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    const CATALOG: &str = r#"{"products": [
        {"id": 1, "name": "Foam", "brand": "A", "category": "cleanser", "image": "a.png"},
        {"id": 2, "name": "Cream", "brand": "B", "category": "moisturizer", "image": "b.png"}
    ]}"#;

    fn write_catalog(raw: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, raw).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_load_category_from_file() {
        let (_dir, path) = write_catalog(CATALOG);
        let loader = CatalogLoader::new(Arc::new(FileCatalogSource::new(path)));

        let products = loader.load_category("moisturizer").await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "2");
        assert_eq!(products[0].name, "Cream");
    }

    #[tokio::test]
    async fn test_view_lists_categories() {
        let (_dir, path) = write_catalog(CATALOG);
        let source = source_for(path.to_str().unwrap(), Duration::from_secs(1)).unwrap();
        let loader = CatalogLoader::new(source);

        let view = loader.view(None).await.unwrap();
        assert_eq!(view.products.len(), 2);
        assert_eq!(view.categories, vec!["cleanser", "moisturizer"]);

        let view = loader.view(Some("cleanser")).await.unwrap();
        assert_eq!(view.category.as_deref(), Some("cleanser"));
        assert_eq!(view.products.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_and_parse_errors() {
        let missing = FileCatalogSource::new("/nonexistent/products.json");
        assert!(matches!(
            missing.fetch_catalog().await.unwrap_err(),
            RegimenError::CatalogFetch(_)
        ));

        let (_dir, path) = write_catalog("[1, 2, 3]");
        assert!(matches!(
            FileCatalogSource::new(path).fetch_catalog().await.unwrap_err(),
            RegimenError::CatalogParse(_)
        ));
    }

    #[tokio::test]
    async fn test_http_source() {
        let app = Router::new()
            .route("/products.json", get(|| async { CATALOG }))
            .route("/broken.json", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let timeout = Duration::from_secs(5);
        let source = source_for(&format!("http://{}/products.json", addr), timeout).unwrap();
        assert_eq!(source.fetch_catalog().await.unwrap().len(), 2);

        let broken = source_for(&format!("http://{}/broken.json", addr), timeout).unwrap();
        assert!(matches!(
            broken.fetch_catalog().await.unwrap_err(),
            RegimenError::CatalogFetch(_)
        ));
    }
}
