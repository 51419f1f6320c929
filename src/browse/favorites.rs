//! Favorite resolution.
//!
//! Favorites are a list of ids kept by an external store. Records for those
//! ids may already be on screen in the "all" or "owned" view; the rest are
//! looked up in batches and kept in a session-long cache. Until a lookup
//! lands, an id renders as a zero-valued placeholder so the slot is stable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::catalog::{CatalogClient, CatalogItem, MAX_LOOKUP_IDS};
use crate::error::Result;

use super::state::ViewKind;

/// Session-long id -> record map for favorites missing from both views.
///
/// Entries are only ever added or replaced, never removed.
#[derive(Debug, Default)]
pub struct FavoriteResolutionCache {
    entries: DashMap<String, CatalogItem>,
    version: AtomicU64,
}

impl FavoriteResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<CatalogItem> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Merge records, returning how many were new or changed.
    pub fn insert_all(&self, items: impl IntoIterator<Item = CatalogItem>) -> usize {
        let mut changed = 0;
        for item in items {
            let previous = self.entries.insert(item.id.clone(), item.clone());
            if previous.as_ref() != Some(&item) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        changed
    }

    /// Bumped whenever an insert changes the contents
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of one resolution pass
#[derive(Debug, Clone)]
pub struct Resolution {
    /// One record per favorite id, in favorite order
    pub items: Arc<[CatalogItem]>,
    /// Ids currently rendered as placeholders
    pub pending: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether `id` is shown as a placeholder. Real records may be
    /// zero-valued too, so only `pending` tells them apart.
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.iter().any(|p| p == id)
    }
}

#[derive(Debug)]
struct Memo {
    favorites: Vec<String>,
    all: Arc<[CatalogItem]>,
    owned: Arc<[CatalogItem]>,
    prefer: ViewKind,
    cache_version: u64,
    resolution: Resolution,
}

impl Memo {
    fn matches(
        &self,
        favorites: &[String],
        all: &Arc<[CatalogItem]>,
        owned: &Arc<[CatalogItem]>,
        prefer: ViewKind,
        cache_version: u64,
    ) -> bool {
        self.prefer == prefer
            && self.cache_version == cache_version
            && Arc::ptr_eq(&self.all, all)
            && Arc::ptr_eq(&self.owned, owned)
            && self.favorites == favorites
    }
}

/// Removes ids from the in-flight set when a lookup ends
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    ids: Vec<String>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock();
        for id in &self.ids {
            set.remove(id);
        }
    }
}

#[derive(Debug)]
pub struct FavoritesResolver {
    cache: Arc<FavoriteResolutionCache>,
    memo: Mutex<Option<Memo>>,
    in_flight: Mutex<HashSet<String>>,
    last_requested: Mutex<Vec<String>>,
    batch_limit: usize,
}

impl Default for FavoritesResolver {
    fn default() -> Self {
        Self::new(Arc::new(FavoriteResolutionCache::new()))
    }
}

impl FavoritesResolver {
    pub fn new(cache: Arc<FavoriteResolutionCache>) -> Self {
        Self {
            cache,
            memo: Mutex::new(None),
            in_flight: Mutex::new(HashSet::new()),
            last_requested: Mutex::new(Vec::new()),
            batch_limit: MAX_LOOKUP_IDS,
        }
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.clamp(1, MAX_LOOKUP_IDS);
        self
    }

    pub fn cache(&self) -> &Arc<FavoriteResolutionCache> {
        &self.cache
    }

    /// Resolve favorites against the loaded views and the cache.
    ///
    /// When an id appears in both views, the record from `prefer` wins. The
    /// returned list is the same allocation as the previous pass whenever the
    /// resolved records did not change.
    pub fn resolve(
        &self,
        favorites: &[String],
        all: &Arc<[CatalogItem]>,
        owned: &Arc<[CatalogItem]>,
        prefer: ViewKind,
    ) -> Resolution {
        let cache_version = self.cache.version();
        let mut memo = self.memo.lock();

        if let Some(previous) = memo.as_ref()
            && previous.matches(favorites, all, owned, prefer, cache_version)
        {
            return previous.resolution.clone();
        }

        let (first, second) = match prefer {
            ViewKind::All => (all, owned),
            ViewKind::Owned => (owned, all),
        };
        let mut on_screen: HashMap<&str, &CatalogItem> = HashMap::new();
        for item in first.iter().chain(second.iter()) {
            on_screen.entry(item.id.as_str()).or_insert(item);
        }

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(favorites.len());
        let mut pending = Vec::new();
        for id in favorites {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(item) = on_screen.get(id.as_str()) {
                items.push((*item).clone());
            } else if let Some(item) = self.cache.get(id) {
                items.push(item);
            } else {
                items.push(CatalogItem::placeholder(id.clone()));
                pending.push(id.clone());
            }
        }

        let items: Arc<[CatalogItem]> = match memo.as_ref() {
            Some(previous) if *previous.resolution.items == *items => {
                previous.resolution.items.clone()
            }
            _ => items.into(),
        };
        let resolution = Resolution { items, pending };

        *memo = Some(Memo {
            favorites: favorites.to_vec(),
            all: all.clone(),
            owned: owned.clone(),
            prefer,
            cache_version,
            resolution: resolution.clone(),
        });

        resolution
    }

    /// Ids that still need a batch lookup: not cached, not already being
    /// looked up, and not the exact set the previous lookup asked for.
    fn lookup_candidates(&self, missing: &[String]) -> Vec<String> {
        let in_flight = self.in_flight.lock();
        let candidates: Vec<String> = missing
            .iter()
            .filter(|id| !self.cache.contains(id) && !in_flight.contains(*id))
            .cloned()
            .collect();

        if candidates.is_empty() || *self.last_requested.lock() == candidates {
            return Vec::new();
        }
        candidates
    }

    /// Look up `missing` ids in batches and merge the results into the cache.
    ///
    /// Returns how many cache entries changed. A failed batch leaves its ids
    /// as placeholders and makes the next pass retry them.
    pub async fn fetch_missing<C: CatalogClient>(
        &self,
        client: &C,
        missing: &[String],
    ) -> Result<usize> {
        let candidates = self.lookup_candidates(missing);
        if candidates.is_empty() {
            return Ok(0);
        }

        *self.last_requested.lock() = candidates.clone();
        self.in_flight.lock().extend(candidates.iter().cloned());
        let _in_flight = InFlight {
            set: &self.in_flight,
            ids: candidates.clone(),
        };

        let mut changed = 0;
        for batch in candidates.chunks(self.batch_limit) {
            debug!(count = batch.len(), "looking up favorites");
            match client.fetch_by_ids(batch).await {
                Ok(found) => changed += self.cache.insert_all(found),
                Err(e) => {
                    warn!("favorite lookup failed, will retry: {e}");
                    self.last_requested.lock().clear();
                    return Err(e);
                }
            }
        }

        Ok(changed)
    }

    /// One full pass: resolve, look up whatever is missing, resolve again.
    pub async fn refresh<C: CatalogClient>(
        &self,
        client: &C,
        favorites: &[String],
        all: &Arc<[CatalogItem]>,
        owned: &Arc<[CatalogItem]>,
        prefer: ViewKind,
    ) -> Resolution {
        let first = self.resolve(favorites, all, owned, prefer);
        if first.is_complete() {
            return first;
        }
        // Failures are logged inside and retried on the next pass
        let _ = self.fetch_missing(client, &first.pending).await;
        self.resolve(favorites, all, owned, prefer)
    }
}
