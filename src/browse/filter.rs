//! Filter state machine for the browsing screen.
//!
//! [`FilterController`] owns the active view, sort key, time window, search
//! term and page cursor. Each transition updates the query, clears whatever
//! state the change invalidates, and returns a [`FilterEffect`] telling the
//! caller what to fetch next.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{SortKey, TimeWindow};

use super::state::{BrowseView, ViewKind, ViewStateStore};

/// Everything that determines what the active view shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub view: BrowseView,
    pub sort_key: Option<SortKey>,
    pub time_window: Option<TimeWindow>,
    /// Player identifier to look up instead of browsing; empty for none
    pub search_term: String,
    pub page_to_fetch: u32,
}

impl Query {
    pub fn is_search(&self) -> bool {
        !self.search_term.trim().is_empty()
    }

    /// This query advanced by one page
    pub fn next_page(&self) -> Query {
        Query {
            page_to_fetch: self.page_to_fetch + 1,
            ..self.clone()
        }
    }
}

/// Follow-up work requested by a filter transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEffect {
    /// Nothing changed
    None,
    /// Switched to a fetched view; load it only if it holds no data yet
    LoadIfEmpty(ViewKind),
    /// The view was cleared and needs a replace fetch
    Reload(ViewKind),
    /// Switched to favorites; resolve from loaded data, no fetch
    ShowFavorites,
}

#[derive(Debug)]
pub struct FilterController {
    query: Query,
    store: Arc<ViewStateStore>,
}

impl FilterController {
    pub fn new(store: Arc<ViewStateStore>) -> Self {
        Self {
            query: Query::default(),
            store,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn view(&self) -> BrowseView {
        self.query.view
    }

    pub fn set_view(&mut self, view: BrowseView) -> FilterEffect {
        if view == self.query.view {
            return FilterEffect::None;
        }

        // Search results live in the view they were fetched into; once the
        // term is cleared they no longer describe that view.
        if self.query.is_search()
            && let Some(previous) = self.query.view.kind()
        {
            self.store.reset(previous);
        }

        debug!(from = %self.query.view, to = %view, "view changed");
        self.query.view = view;
        self.query.search_term.clear();
        self.query.page_to_fetch = 0;

        match view.kind() {
            Some(kind) => {
                // Reused items keep their page cursor
                if let Some(pagination) = self.store.pagination(kind) {
                    self.query.page_to_fetch = pagination.current_page_index;
                }
                FilterEffect::LoadIfEmpty(kind)
            }
            None => FilterEffect::ShowFavorites,
        }
    }

    pub fn set_sort_key(&mut self, sort_key: Option<SortKey>) -> FilterEffect {
        if sort_key == self.query.sort_key {
            return FilterEffect::None;
        }
        debug!(?sort_key, "sort changed");
        self.query.sort_key = sort_key;
        self.query.search_term.clear();
        self.reset_browse()
    }

    pub fn set_time_window(&mut self, time_window: Option<TimeWindow>) -> FilterEffect {
        if time_window == self.query.time_window {
            return FilterEffect::None;
        }
        debug!(?time_window, "time window changed");
        self.query.time_window = time_window;
        self.query.search_term.clear();
        self.reset_browse()
    }

    /// Set sort key, time window and search term in one transition, so at
    /// most one reload follows.
    pub fn set_filters(
        &mut self,
        sort_key: Option<SortKey>,
        time_window: Option<TimeWindow>,
        search_term: impl Into<String>,
    ) -> FilterEffect {
        let search_term = search_term.into();
        let browse_changed =
            sort_key != self.query.sort_key || time_window != self.query.time_window;
        if !browse_changed && search_term == self.query.search_term {
            return FilterEffect::None;
        }

        debug!(?sort_key, ?time_window, term = %search_term, "filters changed");
        self.query.sort_key = sort_key;
        self.query.time_window = time_window;
        self.query.search_term = search_term;
        if browse_changed {
            self.reset_browse()
        } else {
            self.reset_current()
        }
    }

    /// Switch between identity lookup (non-empty term) and filtered browse
    /// (empty term).
    pub fn set_search_term(&mut self, term: impl Into<String>) -> FilterEffect {
        let term = term.into();
        if term == self.query.search_term {
            return FilterEffect::None;
        }
        debug!(term = %term, "search changed");
        self.query.search_term = term;
        self.reset_current()
    }

    /// Record the page the server reported after a successful append
    pub fn advance_page(&mut self, page: u32) {
        self.query.page_to_fetch = page;
    }

    /// Sort and time window shape "all" whichever view is active, so "all"
    /// never keeps pages fetched under other filters.
    fn reset_browse(&mut self) -> FilterEffect {
        if self.query.view == BrowseView::Owned {
            self.store.reset(ViewKind::All);
        }
        self.reset_current()
    }

    fn reset_current(&mut self) -> FilterEffect {
        self.query.page_to_fetch = 0;
        match self.query.view.kind() {
            Some(kind) => {
                self.store.reset(kind);
                FilterEffect::Reload(kind)
            }
            None => {
                // Browse filters only shape the "all" view; drop it so it
                // reloads with the new filters when shown again.
                self.store.reset(ViewKind::All);
                FilterEffect::None
            }
        }
    }
}
