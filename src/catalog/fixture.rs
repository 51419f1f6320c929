//! In-memory catalog backed by a JSON document.
//!
//! The document shape is:
//!
//! ```json
//! {
//!   "items": [{"id": "c1", "usageCount": 12, "firstSeenBy": "steve"}],
//!   "owned": {"steve": ["c1"]}
//! }
//! ```
//!
//! Items are listed oldest first. Call counters and one-shot failure
//! injection make the fixture double as a test backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Deserialize;

use super::error::ApiError;
use super::{BrowseRequest, CatalogClient, CatalogItem, MAX_LOOKUP_IDS, Page, PageDescriptor, SortKey};
use crate::error::Result;

const BACKEND: &str = "fixture";

#[derive(Debug, Default, Deserialize)]
struct FixtureDocument {
    #[serde(default)]
    items: Vec<CatalogItem>,
    #[serde(default)]
    owned: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct FixtureCatalog {
    items: Vec<CatalogItem>,
    owned: HashMap<String, Vec<String>>,
    fail_next: Mutex<Option<ApiError>>,
    browse_calls: AtomicUsize,
    owned_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl FixtureCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let doc: FixtureDocument = serde_json::from_str(content)?;
        Ok(Self {
            items: doc.items,
            owned: doc.owned,
            ..Default::default()
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Record `identity` as owning `ids`
    pub fn with_owned(mut self, identity: impl Into<String>, ids: &[&str]) -> Self {
        self.owned
            .insert(identity.into(), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Make the next backend call fail with `error`
    pub fn fail_next(&self, error: ApiError) {
        *self.fail_next.lock() = Some(error);
    }

    pub fn browse_calls(&self) -> usize {
        self.browse_calls.load(Ordering::SeqCst)
    }

    pub fn owned_calls(&self) -> usize {
        self.owned_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn take_failure(&self) -> Result<()> {
        match self.fail_next.lock().take() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn sorted(&self, sort: Option<SortKey>) -> Vec<&CatalogItem> {
        let mut items: Vec<&CatalogItem> = self.items.iter().collect();
        match sort {
            None | Some(SortKey::Newest) => items.reverse(),
            Some(SortKey::Oldest) => {}
            // Stable sort keeps document order among equal counts
            Some(SortKey::MostUsed) => items.sort_by(|a, b| b.usage_count.cmp(&a.usage_count)),
        }
        items
    }

    fn find(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl CatalogClient for FixtureCatalog {
    async fn browse(&self, request: &BrowseRequest) -> Result<Page> {
        self.browse_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        if request.page_size == 0 {
            return Err(ApiError::with_status("pageSize must be positive", BACKEND, 400).into());
        }

        let sorted = self.sorted(request.sort_by);
        let total_items = sorted.len();
        let page_size = request.page_size as usize;
        let total_pages = total_items.div_ceil(page_size);

        let items = sorted
            .into_iter()
            .skip(request.page as usize * page_size)
            .take(page_size)
            .cloned()
            .collect();

        Ok(Page {
            items,
            pagination: PageDescriptor {
                current_page_index: request.page,
                page_size: request.page_size,
                total_items: total_items as u64,
                total_pages: total_pages as u32,
            },
        })
    }

    async fn list_owned(&self, identity: &str) -> Result<Vec<CatalogItem>> {
        self.owned_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let ids = self.owned.get(identity).ok_or_else(|| {
            ApiError::with_status(format!("no player named '{identity}'"), BACKEND, 404)
        })?;

        Ok(ids.iter().filter_map(|id| self.find(id)).cloned().collect())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogItem>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        if ids.len() > MAX_LOOKUP_IDS {
            return Err(ApiError::with_status(
                format!("at most {MAX_LOOKUP_IDS} ids per lookup, got {}", ids.len()),
                BACKEND,
                400,
            )
            .into());
        }

        Ok(ids.iter().filter_map(|id| self.find(id)).cloned().collect())
    }
}
