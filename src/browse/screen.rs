//! Composition root for the cape browsing screen.
//!
//! [`CatalogScreen`] wires the filter controller, fetch coordinator, view
//! store, pagination trigger and favorites resolver together. The
//! presentation layer calls into it on user input and on every frame, and
//! reads back [`ViewState`] snapshots, resolved favorites and toasts.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::catalog::{CatalogClient, SortKey, TimeWindow};
use crate::config::Config;

use super::coordinator::{FetchCoordinator, FetchOutcome};
use super::favorites::{FavoritesResolver, Resolution};
use super::filter::{FilterController, FilterEffect, Query};
use super::pagination::PaginationTrigger;
use super::state::{BrowseView, FetchMode, ViewKind, ViewState, ViewStateStore};
use super::toast::ToastQueue;

pub struct CatalogScreen<C> {
    coordinator: FetchCoordinator<C>,
    store: Arc<ViewStateStore>,
    filter: Mutex<FilterController>,
    favorites: FavoritesResolver,
    trigger: PaginationTrigger,
    toasts: ToastQueue,
    /// Replace fetch that was dropped by the single-flight guard
    pending_reload: Mutex<Option<ViewKind>>,
}

impl<C: CatalogClient> CatalogScreen<C> {
    pub fn new(client: Arc<C>, config: &Config) -> Self {
        let store = Arc::new(ViewStateStore::new());
        let toasts = ToastQueue::new();
        let coordinator = FetchCoordinator::new(client, store.clone(), toasts.clone())
            .with_page_size(config.page_size);
        coordinator.set_identity(config.identity().map(str::to_string));

        Self {
            coordinator,
            filter: Mutex::new(FilterController::new(store.clone())),
            store,
            favorites: FavoritesResolver::default().with_batch_limit(config.lookup_batch_limit),
            trigger: PaginationTrigger::default(),
            toasts,
            pending_reload: Mutex::new(None),
        }
    }

    pub fn with_trigger(mut self, trigger: PaginationTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn coordinator(&self) -> &FetchCoordinator<C> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<ViewStateStore> {
        &self.store
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn favorites_resolver(&self) -> &FavoritesResolver {
        &self.favorites
    }

    pub fn query(&self) -> Query {
        self.filter.lock().query().clone()
    }

    pub fn view(&self) -> BrowseView {
        self.filter.lock().view()
    }

    pub fn view_state(&self, view: ViewKind) -> ViewState {
        self.store.snapshot(view)
    }

    /// Snapshot of the active view, `None` while favorites are shown
    pub fn active_state(&self) -> Option<ViewState> {
        self.view().kind().map(|kind| self.store.snapshot(kind))
    }

    pub fn pending_reload(&self) -> Option<ViewKind> {
        *self.pending_reload.lock()
    }

    /// Load the initial view.
    pub async fn mount(&self) -> Option<FetchOutcome> {
        let kind = self.view().kind()?;
        self.run_effect(FilterEffect::LoadIfEmpty(kind)).await
    }

    pub async fn set_view(&self, view: BrowseView) -> Option<FetchOutcome> {
        let effect = self.filter.lock().set_view(view);
        self.run_effect(effect).await
    }

    pub async fn set_sort_key(&self, sort_key: Option<SortKey>) -> Option<FetchOutcome> {
        let effect = self.filter.lock().set_sort_key(sort_key);
        self.run_effect(effect).await
    }

    pub async fn set_time_window(&self, time_window: Option<TimeWindow>) -> Option<FetchOutcome> {
        let effect = self.filter.lock().set_time_window(time_window);
        self.run_effect(effect).await
    }

    pub async fn set_search_term(&self, term: impl Into<String>) -> Option<FetchOutcome> {
        let effect = self.filter.lock().set_search_term(term);
        self.run_effect(effect).await
    }

    /// Apply sort key, time window and search term together, with one reload.
    pub async fn set_filters(
        &self,
        sort_key: Option<SortKey>,
        time_window: Option<TimeWindow>,
        search_term: impl Into<String>,
    ) -> Option<FetchOutcome> {
        let effect = self
            .filter
            .lock()
            .set_filters(sort_key, time_window, search_term);
        self.run_effect(effect).await
    }

    /// Record the signed-in identity. A new identity invalidates the owned
    /// view and loads it if it is on screen.
    pub async fn set_identity(&self, identity: Option<String>) -> Option<FetchOutcome> {
        let identity = identity.filter(|id| !id.is_empty());
        if identity == self.coordinator.identity() {
            return None;
        }
        debug!(has_identity = identity.is_some(), "identity changed");
        self.coordinator.set_identity(identity);
        self.store.reset(ViewKind::Owned);

        if self.view() == BrowseView::Owned {
            self.run_effect(FilterEffect::LoadIfEmpty(ViewKind::Owned))
                .await
        } else {
            None
        }
    }

    /// Reload the active view from its first page without clearing it first.
    pub async fn refresh(&self) -> Option<FetchOutcome> {
        let kind = self.view().kind()?;
        let query = Query {
            page_to_fetch: 0,
            ..self.query()
        };
        let outcome = self.fetch_replace(kind, &query).await;
        if outcome.is_applied() {
            self.filter.lock().advance_page(0);
        }
        Some(outcome)
    }

    /// Scroll signal from the presentation layer.
    pub async fn on_scroll(&self, last_visible_index: usize) -> Option<FetchOutcome> {
        let kind = self.view().kind()?;
        let len = self.store.items(kind).len();
        let near_end = self.trigger.is_near_end(last_visible_index, len);

        let query = self.query();
        let (view, next) = self.trigger.evaluate(near_end, &query, &self.store)?;

        let outcome = self
            .coordinator
            .fetch(view, &next, FetchMode::Append)
            .await;
        if let FetchOutcome::Applied(page) = &outcome {
            let mut filter = self.filter.lock();
            if filter.view().kind() == Some(view) {
                filter.advance_page(page.pagination.current_page_index);
            }
        }
        Some(outcome)
    }

    /// Resolve favorites from what is loaded right now, without fetching.
    pub fn favorites(&self, favorite_ids: &[String]) -> Resolution {
        self.favorites.resolve(
            favorite_ids,
            &self.store.items(ViewKind::All),
            &self.store.items(ViewKind::Owned),
            self.preferred_source(),
        )
    }

    /// Per-frame work: replay a dropped reload, then run one favorites
    /// resolution pass.
    pub async fn tick(&self, favorite_ids: &[String]) -> Resolution {
        self.replay_pending().await;

        self.favorites
            .refresh(
                self.coordinator.client().as_ref(),
                favorite_ids,
                &self.store.items(ViewKind::All),
                &self.store.items(ViewKind::Owned),
                self.preferred_source(),
            )
            .await
    }

    /// Re-issue a replace fetch that the single-flight guard dropped, if it
    /// still applies to the active view.
    pub async fn replay_pending(&self) -> Option<FetchOutcome> {
        let kind = (*self.pending_reload.lock())?;
        if self.view().kind() != Some(kind) {
            self.pending_reload.lock().take();
            return None;
        }
        if self.coordinator.is_in_flight() {
            return None;
        }
        debug!(view = %kind, "replaying dropped reload");
        let query = self.query();
        Some(self.fetch_replace(kind, &query).await)
    }

    fn preferred_source(&self) -> ViewKind {
        self.view().kind().unwrap_or(ViewKind::All)
    }

    async fn run_effect(&self, effect: FilterEffect) -> Option<FetchOutcome> {
        let kind = match effect {
            FilterEffect::None | FilterEffect::ShowFavorites => return None,
            FilterEffect::Reload(kind) => kind,
            FilterEffect::LoadIfEmpty(kind) => {
                if self.store.snapshot(kind).is_loaded() {
                    return None;
                }
                kind
            }
        };

        let query = self.query();
        Some(self.fetch_replace(kind, &query).await)
    }

    async fn fetch_replace(&self, kind: ViewKind, query: &Query) -> FetchOutcome {
        // Any newer intent supersedes the remembered one
        self.pending_reload.lock().take();

        let outcome = self
            .coordinator
            .fetch(kind, query, FetchMode::Replace)
            .await;
        if outcome.is_dropped() {
            *self.pending_reload.lock() = Some(kind);
        }
        outcome
    }
}
