// src/services/cache.rs
// DOCUMENTATION: Bounded in-memory cache for rendered tile layouts
// PURPOSE: Avoid recomputing the grid when the map re-requests a tile

use crate::models::{BoundingBox, Lens};
use crate::services::geometry::TileCoord;
use crate::services::tile_renderer::TileLayout;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Identity of one cached tile
/// DOCUMENTATION: The viewport is part of the key because it defines the
/// normalization population; it is rounded to ~10 m
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    lenses: Vec<Lens>,
    viewport: [i64; 4],
    tile: TileCoord,
}

impl TileKey {
    pub fn new(lenses: &[Lens], viewport: &BoundingBox, tile: TileCoord) -> Self {
        let round = |v: f64| (v * 10000.0).round() as i64;
        Self {
            lenses: lenses.to_vec(),
            viewport: [
                round(viewport.north),
                round(viewport.south),
                round(viewport.east),
                round(viewport.west),
            ],
            tile,
        }
    }
}

/// Bounded cache with TTL
/// DOCUMENTATION: Thread-safe; when full, the oldest entry is evicted
pub struct TileCache {
    store: Arc<RwLock<HashMap<TileKey, CacheEntry<Arc<TileLayout>>>>>,
    capacity: usize,
    default_ttl: Duration,
}

impl TileCache {
    /// Create new cache with capacity and default TTL
    pub fn new(capacity: usize, ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Get cached layout
    pub async fn get(&self, key: &TileKey) -> Option<Arc<TileLayout>> {
        let store = self.store.read().await;

        match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                log::debug!("Tile cache HIT for {:?}", key.tile);
                Some(entry.data.clone())
            }
            Some(_) => {
                log::debug!("Tile cache EXPIRED for {:?}", key.tile);
                None
            }
            None => {
                log::debug!("Tile cache MISS for {:?}", key.tile);
                None
            }
        }
    }

    /// Set cached layout with default TTL
    pub async fn set(&self, key: TileKey, value: Arc<TileLayout>) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Set cached layout with custom TTL, evicting if full
    pub async fn set_with_ttl(&self, key: TileKey, value: Arc<TileLayout>, ttl: Duration) {
        let mut store = self.store.write().await;

        if !store.contains_key(&key) && store.len() >= self.capacity {
            store.retain(|_, entry| !entry.is_expired());
        }

        while !store.contains_key(&key) && store.len() >= self.capacity {
            let oldest = store
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(oldest) => {
                    store.remove(&oldest);
                }
                None => break,
            }
        }

        log::debug!("Tile cache SET for {:?} (TTL: {}s)", key.tile, ttl.as_secs());
        store.insert(key, CacheEntry::new(value, ttl));
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Tile cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
            capacity: self.capacity,
        }
    }

    /// Clear all cache entries
    pub async fn clear(&self) -> usize {
        let mut store = self.store.write().await;
        let count = store.len();
        store.clear();
        log::info!("Tile cache cleared: {} entries removed", count);
        count
    }
}

/// Cache statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
    pub capacity: usize,
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<TileCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: u32) -> TileKey {
        TileKey::new(&[Lens::Water], &BoundingBox::default(), TileCoord { z: 10, x, y: 358 })
    }

    fn layout(x: u32) -> Arc<TileLayout> {
        Arc::new(TileLayout::empty(TileCoord { z: 10, x, y: 358 }, "cividis_r"))
    }

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = TileCache::new(8, 60);

        cache.set(key(1), layout(1)).await;

        assert_eq!(cache.get(&key(1)).await.map(|l| l.x), Some(1));
        assert!(cache.get(&key(2)).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = TileCache::new(8, 60);
        cache
            .set_with_ttl(key(1), layout(1), Duration::from_millis(50))
            .await;

        assert!(cache.get(&key(1)).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get(&key(1)).await.is_none());
        cache.cleanup().await;
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let cache = TileCache::new(2, 60);

        cache.set(key(1), layout(1)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.set(key(2), layout(2)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.set(key(3), layout(3)).await;

        assert!(cache.get(&key(1)).await.is_none());
        assert!(cache.get(&key(2)).await.is_some());
        assert!(cache.get(&key(3)).await.is_some());
        assert_eq!(cache.stats().await.total_entries, 2);
    }

    #[test]
    fn test_key_depends_on_lenses_and_viewport() {
        let tile = TileCoord { z: 9, x: 268, y: 179 };
        let viewport = BoundingBox::default();
        let shifted = BoundingBox { north: viewport.north + 0.01, ..viewport };

        assert_eq!(
            TileKey::new(&[Lens::Water], &viewport, tile),
            TileKey::new(&[Lens::Water], &viewport, tile)
        );
        assert_ne!(
            TileKey::new(&[Lens::Water], &viewport, tile),
            TileKey::new(&[Lens::Vegetation], &viewport, tile)
        );
        assert_ne!(
            TileKey::new(&[Lens::Water], &viewport, tile),
            TileKey::new(&[Lens::Water], &shifted, tile)
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = TileCache::new(4, 60);
        cache.set(key(1), layout(1)).await;
        cache.set(key(2), layout(2)).await;

        assert_eq!(cache.clear().await, 2);
        assert_eq!(cache.stats().await.active_entries, 0);
    }
}
