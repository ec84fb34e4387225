//! The selection store.

use std::sync::Arc;

use regimen_core::{ClearOutcome, Product, SessionEventKind, ToggleOutcome};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::persistence::SelectionPersistence;
use crate::subscription::EventBus;

/// Ordered set of selected products, unique by id.
///
/// Every mutation is written through to persistence while the write lock is
/// held, then announced on the event bus.
pub struct SelectionStore {
    products: RwLock<Vec<Product>>,
    persistence: SelectionPersistence,
    events: Arc<EventBus>,
}

impl SelectionStore {
    /// Restore the selection from persistence.
    pub async fn load(persistence: SelectionPersistence, events: Arc<EventBus>) -> Self {
        let products = persistence.load().await;
        info!(slot = %persistence.slot(), count = products.len(), "Restored selection");

        Self {
            products: RwLock::new(products),
            persistence,
            events,
        }
    }

    /// Add the product if it is not selected, remove it if it is.
    pub async fn toggle(&self, product: Product) -> ToggleOutcome {
        let mut products = self.products.write().await;

        let outcome = match products.iter().position(|p| p.id == product.id) {
            Some(index) => {
                products.remove(index);
                ToggleOutcome::Removed
            }
            None => {
                products.push(product);
                ToggleOutcome::Added
            }
        };

        debug!(?outcome, count = products.len(), "Toggled product");
        self.sync(&products).await;
        outcome
    }

    /// Remove every entry with `id`. Returns how many were removed.
    pub async fn remove_by_id(&self, id: &str) -> usize {
        let mut products = self.products.write().await;

        let before = products.len();
        products.retain(|p| p.id != id);
        let removed = before - products.len();

        debug!(id, removed, "Removed product");
        self.sync(&products).await;
        removed
    }

    /// Empty the selection. Does nothing unless the user confirmed.
    pub async fn clear_all(&self, confirmed: bool) -> ClearOutcome {
        if !confirmed {
            return ClearOutcome::NotConfirmed;
        }

        let mut products = self.products.write().await;
        if products.is_empty() {
            return ClearOutcome::AlreadyEmpty;
        }

        let removed = products.len();
        products.clear();

        info!(removed, "Cleared selection");
        self.sync(&products).await;
        ClearOutcome::Cleared { removed }
    }

    /// True when nothing is selected; routine generation is disabled.
    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.products.read().await.iter().any(|p| p.id == id)
    }

    /// Snapshot of the selection in selection order.
    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    async fn sync(&self, products: &[Product]) {
        self.persistence.save(products).await;
        self.events.publish(SessionEventKind::SelectionChanged {
            product_ids: products.iter().map(|p| p.id.clone()).collect(),
            count: products.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{KeyValueStore, MemoryKeyValueStore, DEFAULT_SELECTION_SLOT};
    use crate::subscription::SubscriptionFilter;

    fn product(id: &str) -> Product {
        Product::new(id, format!("Product {id}"), "Brand", "cleanser")
    }

    async fn store_with(kv: Arc<MemoryKeyValueStore>) -> SelectionStore {
        let persistence = SelectionPersistence::with_default_slot(kv);
        SelectionStore::load(persistence, Arc::new(EventBus::default())).await
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_order() {
        let store = store_with(Arc::new(MemoryKeyValueStore::new())).await;
        for id in ["a", "b", "c"] {
            store.toggle(product(id)).await;
        }

        assert_eq!(store.toggle(product("b")).await, ToggleOutcome::Removed);
        assert_eq!(ids(&store.products().await), vec!["a", "c"]);

        assert_eq!(store.toggle(product("b")).await, ToggleOutcome::Added);
        assert_eq!(store.toggle(product("b")).await, ToggleOutcome::Removed);
        assert_eq!(ids(&store.products().await), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_uniqueness_under_toggles() {
        let store = store_with(Arc::new(MemoryKeyValueStore::new())).await;
        let sequence = ["a", "b", "a", "c", "a", "b", "b", "c", "a"];
        for id in sequence {
            store.toggle(product(id)).await;
        }

        let products = store.products().await;
        for id in ["a", "b", "c"] {
            assert!(products.iter().filter(|p| p.id == id).count() <= 1);
        }
        // a toggled 4 times, b 3 times, c 2 times
        assert_eq!(ids(&products), vec!["b"]);
    }

    #[tokio::test]
    async fn test_toggle_off_persists_empty_slot() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(
            DEFAULT_SELECTION_SLOT,
            r#"[{"id": "p1", "name": "Cleanser", "brand": "X", "category": "cleanser"}]"#,
        )
        .await
        .unwrap();

        let store = store_with(kv.clone()).await;
        assert_eq!(store.len().await, 1);

        let outcome = store
            .toggle(Product::new("p1", "Cleanser", "X", "cleanser"))
            .await;
        assert_eq!(outcome, ToggleOutcome::Removed);
        assert!(store.is_empty().await);
        assert_eq!(kv.get(DEFAULT_SELECTION_SLOT).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = store_with(kv.clone()).await;
        store.toggle(product("a")).await;
        store.toggle(product("b")).await;

        assert_eq!(store.remove_by_id("a").await, 1);
        assert_eq!(store.remove_by_id("missing").await, 0);
        assert!(!store.contains("a").await);

        let reloaded = store_with(kv).await;
        assert_eq!(ids(&reloaded.products().await), vec!["b"]);
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let store = store_with(Arc::new(MemoryKeyValueStore::new())).await;
        assert_eq!(store.clear_all(true).await, ClearOutcome::AlreadyEmpty);

        store.toggle(product("a")).await;
        store.toggle(product("b")).await;

        assert_eq!(store.clear_all(false).await, ClearOutcome::NotConfirmed);
        assert_eq!(store.len().await, 2);

        assert_eq!(store.clear_all(true).await, ClearOutcome::Cleared { removed: 2 });
        assert!(store.is_empty().await);
    }

    /// Reads nothing, refuses every write.
    struct FullDisk;

    #[async_trait::async_trait]
    impl KeyValueStore for FullDisk {
        async fn get(&self, _key: &str) -> regimen_core::Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, key: &str, _value: &str) -> regimen_core::Result<()> {
            Err(regimen_core::RegimenError::Storage {
                slot: key.to_string(),
                message: "no space left on device".to_string(),
            })
        }

        async fn remove(&self, _key: &str) -> regimen_core::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let events = Arc::new(EventBus::default());
        let mut sub = events.subscribe(SubscriptionFilter::all()).await;
        let persistence = SelectionPersistence::with_default_slot(Arc::new(FullDisk));
        let store = SelectionStore::load(persistence, events.clone()).await;

        assert_eq!(store.toggle(product("a")).await, ToggleOutcome::Added);
        assert_eq!(store.toggle(product("b")).await, ToggleOutcome::Added);
        assert_eq!(store.remove_by_id("a").await, 1);
        assert_eq!(ids(&store.products().await), vec!["b"]);

        // Every mutation is still announced.
        for _ in 0..3 {
            assert!(matches!(
                sub.recv().await.unwrap().kind,
                SessionEventKind::SelectionChanged { .. }
            ));
        }

        assert_eq!(store.clear_all(true).await, ClearOutcome::Cleared { removed: 1 });
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_mutations_publish_events() {
        let events = Arc::new(EventBus::default());
        let mut sub = events.subscribe(SubscriptionFilter::all()).await;
        let persistence =
            SelectionPersistence::with_default_slot(Arc::new(MemoryKeyValueStore::new()));
        let store = SelectionStore::load(persistence, events.clone()).await;

        store.toggle(product("a")).await;

        let event = sub.recv().await.unwrap();
        assert_eq!(
            event.kind,
            SessionEventKind::SelectionChanged {
                product_ids: vec!["a".to_string()],
                count: 1
            }
        );
    }
}
