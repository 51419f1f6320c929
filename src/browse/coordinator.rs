//! Fetch coordination for the browsing views.
//!
//! [`FetchCoordinator`] is the only place that talks to the catalog backend
//! on behalf of the "all" and "owned" views. It enforces the screen-wide
//! single-flight rule, picks the backend operation for a query, and merges
//! results into the [`ViewStateStore`] without disturbing list identity when
//! nothing changed.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::catalog::{BrowseRequest, CatalogClient, CatalogItem, DEFAULT_PAGE_SIZE, Page};
use crate::error::CatalogError;

use super::filter::Query;
use super::flight::FlightGuard;
use super::state::{FetchMode, ViewKind, ViewStateStore};
use super::toast::{Toast, ToastQueue};

/// What happened to a fetch request
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was received and written to the view
    Applied(Page),
    /// Another fetch was in flight; nothing was sent
    Dropped,
    /// The owned view was requested before any identity is known
    Skipped,
    /// The view was reset while the request was in flight; the response was discarded
    Stale,
    /// The backend call failed; the error was reported to the user
    Failed(CatalogError),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied(_))
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, FetchOutcome::Dropped)
    }
}

/// Backend operation chosen for a query
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Browse(BrowseRequest),
    Owned(String),
}

/// Clears a view's busy flag when the fetch ends, however it ends.
struct BusyFlag<'a> {
    store: &'a ViewStateStore,
    view: ViewKind,
    mode: FetchMode,
}

impl<'a> BusyFlag<'a> {
    fn raise(store: &'a ViewStateStore, view: ViewKind, mode: FetchMode) -> Self {
        match mode {
            FetchMode::Replace => store.set_loading(view, true),
            FetchMode::Append => store.set_fetching_more(view, true),
        }
        Self { store, view, mode }
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        match self.mode {
            FetchMode::Replace => self.store.set_loading(self.view, false),
            FetchMode::Append => self.store.set_fetching_more(self.view, false),
        }
    }
}

pub struct FetchCoordinator<C> {
    client: Arc<C>,
    store: Arc<ViewStateStore>,
    guard: FlightGuard,
    toasts: ToastQueue,
    identity: RwLock<Option<String>>,
    page_size: u32,
}

impl<C: CatalogClient> FetchCoordinator<C> {
    pub fn new(client: Arc<C>, store: Arc<ViewStateStore>, toasts: ToastQueue) -> Self {
        Self {
            client,
            store,
            guard: FlightGuard::new(),
            toasts,
            identity: RwLock::new(None),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_guard(mut self, guard: FlightGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn store(&self) -> &Arc<ViewStateStore> {
        &self.store
    }

    pub fn guard(&self) -> &FlightGuard {
        &self.guard
    }

    pub fn is_in_flight(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn identity(&self) -> Option<String> {
        self.identity.read().clone()
    }

    pub fn set_identity(&self, identity: Option<String>) {
        *self.identity.write() = identity.filter(|id| !id.is_empty());
    }

    fn source_for(&self, view: ViewKind, query: &Query) -> Option<Source> {
        let search = query.search_term.trim();
        if !search.is_empty() {
            return Some(Source::Owned(search.to_string()));
        }

        match view {
            ViewKind::Owned => self.identity().map(Source::Owned),
            ViewKind::All => Some(Source::Browse(BrowseRequest {
                page: query.page_to_fetch,
                page_size: self.page_size,
                sort_by: query.sort_key,
                time_frame: query.time_window,
            })),
        }
    }

    /// Run one fetch for `view`.
    ///
    /// Returns [`FetchOutcome::Dropped`] without touching the backend when any
    /// fetch is already in flight.
    pub async fn fetch(&self, view: ViewKind, query: &Query, mode: FetchMode) -> FetchOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!(%view, %mode, "fetch dropped: another fetch is in flight");
            return FetchOutcome::Dropped;
        };

        let Some(source) = self.source_for(view, query) else {
            debug!(%view, "owned fetch skipped: no identity");
            return FetchOutcome::Skipped;
        };

        let generation = self.store.generation(view);
        let _busy = BusyFlag::raise(&self.store, view, mode);
        debug!(%view, %mode, generation, ?source, "fetch started");

        let result = match &source {
            Source::Browse(request) => self.client.browse(request).await,
            Source::Owned(identity) => self.client.list_owned(identity).await.map(Page::single),
        };

        let result = match result {
            Err(e) if e.is_not_found() => {
                debug!(%view, "lookup found nothing: {e}");
                Ok(Page::empty())
            }
            other => other,
        };

        match result {
            Ok(page) => self.apply(view, mode, generation, page),
            Err(e) => self.fail(view, mode, generation, e),
        }
    }

    fn apply(&self, view: ViewKind, mode: FetchMode, generation: u64, page: Page) -> FetchOutcome {
        let current = self.store.items(view);

        let merged = match mode {
            FetchMode::Replace => dedup_by_id(page.items.iter().cloned()),
            FetchMode::Append => dedup_by_id(current.iter().chain(page.items.iter()).cloned()),
        };

        let items: Arc<[CatalogItem]> = if same_ids(&current, &merged) {
            current
        } else {
            merged.into()
        };

        if !self
            .store
            .commit(view, generation, items, Some(page.pagination))
        {
            warn!(%view, %mode, generation, "discarding response for an outdated request");
            return FetchOutcome::Stale;
        }

        debug!(
            %view,
            %mode,
            page = page.pagination.current_page_index,
            total_pages = page.pagination.total_pages,
            received = page.items.len(),
            "fetch applied"
        );
        FetchOutcome::Applied(page)
    }

    fn fail(
        &self,
        view: ViewKind,
        mode: FetchMode,
        generation: u64,
        error: CatalogError,
    ) -> FetchOutcome {
        if !self.store.is_current(view, generation) {
            warn!(%view, %mode, "ignoring failure of an outdated request: {error}");
            return FetchOutcome::Stale;
        }

        warn!(%view, %mode, "fetch failed: {error}");
        if mode == FetchMode::Replace {
            self.store.commit(view, generation, Arc::from(Vec::new()), None);
        }
        self.toasts.push(Toast::fetch_failed(view, &error));

        FetchOutcome::Failed(error)
    }
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedup_by_id(items: impl IntoIterator<Item = CatalogItem>) -> Vec<CatalogItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Same length and the same ids in the same order
pub fn same_ids(a: &[CatalogItem], b: &[CatalogItem]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::error::ApiError;
    use crate::catalog::{FixtureCatalog, SortKey};
    use crate::browse::state::BrowseView;

    fn fixture(count: usize) -> FixtureCatalog {
        FixtureCatalog::new(
            (0..count)
                .map(|i| CatalogItem::new(format!("cape{i}")).with_usage(i as u64))
                .collect(),
        )
        .with_owned("steve", &["cape1", "cape2"])
    }

    fn coordinator(count: usize) -> FetchCoordinator<FixtureCatalog> {
        FetchCoordinator::new(
            Arc::new(fixture(count)),
            Arc::new(ViewStateStore::new()),
            ToastQueue::new(),
        )
        .with_page_size(2)
    }

    fn query(page: u32) -> Query {
        Query {
            page_to_fetch: page,
            ..Query::default()
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let items = vec![
            CatalogItem::new("a").with_usage(1),
            CatalogItem::new("b"),
            CatalogItem::new("a").with_usage(9),
        ];
        let deduped = dedup_by_id(items);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].usage_count, 1);
        assert_eq!(deduped[1].id, "b");
    }

    #[test]
    fn test_same_ids() {
        let a = vec![CatalogItem::new("a"), CatalogItem::new("b")];
        let b = vec![CatalogItem::new("a").with_usage(3), CatalogItem::new("b")];
        let c = vec![CatalogItem::new("b"), CatalogItem::new("a")];
        assert!(same_ids(&a, &b));
        assert!(!same_ids(&a, &c));
        assert!(!same_ids(&a, &a[..1]));
    }

    #[tokio::test]
    async fn test_replace_then_append() {
        let coordinator = coordinator(5);

        let outcome = coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;
        assert!(outcome.is_applied());
        assert_eq!(coordinator.store().items(ViewKind::All).len(), 2);
        assert!(coordinator.store().has_more(ViewKind::All));

        coordinator
            .fetch(ViewKind::All, &query(1), FetchMode::Append)
            .await;
        let state = coordinator.store().snapshot(ViewKind::All);
        let ids: Vec<&str> = state.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["cape4", "cape3", "cape2", "cape1"]);
        assert!(!state.is_loading);
        assert!(!state.is_fetching_more);
    }

    #[tokio::test]
    async fn test_replace_with_identical_ids_keeps_reference() {
        let coordinator = coordinator(5);
        coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;
        let before = coordinator.store().items(ViewKind::All);

        coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;
        let after = coordinator.store().items(ViewKind::All);

        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_browse_request_carries_filters() {
        let coordinator = coordinator(5);
        let query = Query {
            sort_key: Some(SortKey::Oldest),
            ..Query::default()
        };
        coordinator
            .fetch(ViewKind::All, &query, FetchMode::Replace)
            .await;

        let first = coordinator.store().items(ViewKind::All)[0].clone();
        assert_eq!(first.id, "cape0");
        assert_eq!(coordinator.client().browse_calls(), 1);
    }

    #[tokio::test]
    async fn test_owned_without_identity_is_skipped() {
        let coordinator = coordinator(5);
        let outcome = coordinator
            .fetch(ViewKind::Owned, &Query::default(), FetchMode::Replace)
            .await;

        assert!(matches!(outcome, FetchOutcome::Skipped));
        assert_eq!(coordinator.client().owned_calls(), 0);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_owned_synthesizes_single_page() {
        let coordinator = coordinator(5);
        coordinator.set_identity(Some("steve".to_string()));

        coordinator
            .fetch(ViewKind::Owned, &Query::default(), FetchMode::Replace)
            .await;

        let state = coordinator.store().snapshot(ViewKind::Owned);
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.pagination, Some(crate::catalog::PageDescriptor::single_page(2)));
        assert!(!state.has_more());
    }

    #[tokio::test]
    async fn test_search_uses_identity_lookup() {
        let coordinator = coordinator(5);
        let query = Query {
            view: BrowseView::All,
            search_term: " steve ".to_string(),
            ..Query::default()
        };
        coordinator
            .fetch(ViewKind::All, &query, FetchMode::Replace)
            .await;

        assert_eq!(coordinator.client().browse_calls(), 0);
        assert_eq!(coordinator.client().owned_calls(), 1);
        assert_eq!(coordinator.store().items(ViewKind::All).len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_empty_success() {
        let coordinator = coordinator(5);
        let query = Query {
            search_term: "nobody".to_string(),
            ..Query::default()
        };
        let outcome = coordinator
            .fetch(ViewKind::All, &query, FetchMode::Replace)
            .await;

        assert!(outcome.is_applied());
        assert!(coordinator.store().items(ViewKind::All).is_empty());
        assert!(coordinator.store().snapshot(ViewKind::All).is_loaded());
    }

    #[tokio::test]
    async fn test_replace_failure_clears_view_and_reports() {
        let toasts = ToastQueue::new();
        let coordinator = FetchCoordinator::new(
            Arc::new(fixture(5)),
            Arc::new(ViewStateStore::new()),
            toasts.clone(),
        );
        coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;
        assert!(!coordinator.store().items(ViewKind::All).is_empty());

        coordinator
            .client()
            .fail_next(ApiError::with_status("boom", "test", 500));
        let outcome = coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;

        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        let state = coordinator.store().snapshot(ViewKind::All);
        assert!(state.items.is_empty());
        assert!(state.pagination.is_none());
        assert!(!state.is_loading);
        assert_eq!(toasts.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_append_failure_preserves_items() {
        let toasts = ToastQueue::new();
        let coordinator = FetchCoordinator::new(
            Arc::new(fixture(5)),
            Arc::new(ViewStateStore::new()),
            toasts.clone(),
        )
        .with_page_size(2);
        coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;
        let before = coordinator.store().items(ViewKind::All);

        coordinator.client().fail_next(ApiError::new("reset", "test"));
        coordinator
            .fetch(ViewKind::All, &query(1), FetchMode::Append)
            .await;

        let state = coordinator.store().snapshot(ViewKind::All);
        assert!(Arc::ptr_eq(&before, &state.items));
        assert!(state.has_more());
        assert!(!state.is_fetching_more);
        assert_eq!(toasts.len(), 1);
    }

    #[tokio::test]
    async fn test_held_guard_drops_fetch() {
        let coordinator = coordinator(5);
        let _permit = coordinator.guard().try_acquire().unwrap();

        let outcome = coordinator
            .fetch(ViewKind::All, &query(0), FetchMode::Replace)
            .await;

        assert!(outcome.is_dropped());
        assert_eq!(coordinator.client().browse_calls(), 0);
        assert!(!coordinator.store().is_loading(ViewKind::All));
    }
}
