use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::entities::WarehouseType;

/// External collaborator resolving an item id to a human-readable name for
/// report display. The core never depends on it for correctness, only for
/// decorating report rows.
#[async_trait]
pub trait ItemNameLookup: Send + Sync {
    async fn display_name(&self, warehouse: WarehouseType, item_id: Uuid) -> Option<String>;
}

/// Bounded get-or-compute cache in front of an [`ItemNameLookup`].
///
/// Lives entirely outside the ledger's write path. Bounded by refusing new
/// inserts at capacity rather than evicting; display names are stable enough
/// that staleness is handled by explicit invalidation.
pub struct CachedItemLookup {
    inner: Arc<dyn ItemNameLookup>,
    cache: DashMap<(WarehouseType, Uuid), String>,
    capacity: usize,
}

impl CachedItemLookup {
    pub fn new(inner: Arc<dyn ItemNameLookup>, capacity: usize) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            capacity,
        }
    }

    pub async fn get_or_compute(
        &self,
        warehouse: WarehouseType,
        item_id: Uuid,
    ) -> Option<String> {
        let key = (warehouse, item_id);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit.clone());
        }
        let name = self.inner.display_name(warehouse, item_id).await?;
        if self.cache.len() < self.capacity {
            self.cache.insert(key, name.clone());
        }
        Some(name)
    }

    pub fn invalidate(&self, warehouse: WarehouseType, item_id: Uuid) {
        self.cache.remove(&(warehouse, item_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ItemNameLookup for CountingLookup {
        async fn display_name(&self, _warehouse: WarehouseType, _item_id: Uuid) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some("Samsung compressor".to_string())
        }
    }

    #[tokio::test]
    async fn second_hit_is_served_from_cache() {
        let inner = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedItemLookup::new(inner.clone(), 16);
        let id = Uuid::new_v4();

        let first = cached.get_or_compute(WarehouseType::NewParts, id).await;
        let second = cached.get_or_compute(WarehouseType::NewParts, id).await;
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capacity_zero_never_caches() {
        let inner = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedItemLookup::new(inner.clone(), 0);
        let id = Uuid::new_v4();

        cached.get_or_compute(WarehouseType::UsedParts, id).await;
        cached.get_or_compute(WarehouseType::UsedParts, id).await;
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let inner = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedItemLookup::new(inner.clone(), 16);
        let id = Uuid::new_v4();

        cached.get_or_compute(WarehouseType::NewParts, id).await;
        cached.invalidate(WarehouseType::NewParts, id);
        cached.get_or_compute(WarehouseType::NewParts, id).await;
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
