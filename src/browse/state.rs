//! State types for the catalog browsing screen

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::{CatalogItem, PageDescriptor};
use crate::error::{CatalogError, Result};

/// A logical view that owns fetched state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Server-paginated catalog
    All,
    /// Items owned by the current identity, fetched in one piece
    Owned,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::All => write!(f, "all"),
            ViewKind::Owned => write!(f, "owned"),
        }
    }
}

/// Active browsing mode selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BrowseView {
    #[default]
    All,
    Owned,
    /// Derived from the other two views plus batch lookups; never fetched directly
    Favorites,
}

impl BrowseView {
    /// The stored view backing this mode, if any
    pub fn kind(self) -> Option<ViewKind> {
        match self {
            BrowseView::All => Some(ViewKind::All),
            BrowseView::Owned => Some(ViewKind::Owned),
            BrowseView::Favorites => None,
        }
    }
}

impl From<ViewKind> for BrowseView {
    fn from(kind: ViewKind) -> Self {
        match kind {
            ViewKind::All => BrowseView::All,
            ViewKind::Owned => BrowseView::Owned,
        }
    }
}

impl fmt::Display for BrowseView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseView::All => write!(f, "all"),
            BrowseView::Owned => write!(f, "owned"),
            BrowseView::Favorites => write!(f, "favorites"),
        }
    }
}

impl FromStr for BrowseView {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(BrowseView::All),
            "owned" => Ok(BrowseView::Owned),
            "favorites" => Ok(BrowseView::Favorites),
            _ => Err(CatalogError::Config(format!(
                "unknown view '{s}', expected 'all', 'owned' or 'favorites'"
            ))),
        }
    }
}

/// How a fetch result lands in its view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Supersede the current list (filter change, first page)
    Replace,
    /// Concatenate onto the current list (infinite scroll)
    Append,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Replace => write!(f, "replace"),
            FetchMode::Append => write!(f, "append"),
        }
    }
}

/// Read-only snapshot of one view.
///
/// `items` is shared: two snapshots taken across an unchanged reload point at
/// the same allocation, which consumers can check with [`Arc::ptr_eq`].
#[derive(Debug, Clone)]
pub struct ViewState {
    pub items: Arc<[CatalogItem]>,
    pub pagination: Option<PageDescriptor>,
    pub is_loading: bool,
    pub is_fetching_more: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            pagination: None,
            is_loading: false,
            is_fetching_more: false,
        }
    }
}

impl ViewState {
    pub fn has_more(&self) -> bool {
        self.pagination.is_some_and(|p| p.has_more())
    }

    /// A view counts as loaded once a fetch has produced a pagination descriptor
    pub fn is_loaded(&self) -> bool {
        self.pagination.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_fetching_more
    }
}

#[derive(Debug, Default)]
struct ViewSlot {
    state: ViewState,
    generation: u64,
}

/// Per-view state holder for the "all" and "owned" views.
///
/// Plain setters only; the fetch coordinator and filter controller decide
/// what to write. Every reset bumps the view's request generation so that a
/// response stamped with an older generation can be told apart.
#[derive(Debug, Default)]
pub struct ViewStateStore {
    all: RwLock<ViewSlot>,
    owned: RwLock<ViewSlot>,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, view: ViewKind) -> &RwLock<ViewSlot> {
        match view {
            ViewKind::All => &self.all,
            ViewKind::Owned => &self.owned,
        }
    }

    pub fn snapshot(&self, view: ViewKind) -> ViewState {
        self.slot(view).read().state.clone()
    }

    pub fn items(&self, view: ViewKind) -> Arc<[CatalogItem]> {
        self.slot(view).read().state.items.clone()
    }

    pub fn pagination(&self, view: ViewKind) -> Option<PageDescriptor> {
        self.slot(view).read().state.pagination
    }

    pub fn has_more(&self, view: ViewKind) -> bool {
        self.slot(view).read().state.has_more()
    }

    pub fn is_loading(&self, view: ViewKind) -> bool {
        self.slot(view).read().state.is_loading
    }

    pub fn is_fetching_more(&self, view: ViewKind) -> bool {
        self.slot(view).read().state.is_fetching_more
    }

    pub fn generation(&self, view: ViewKind) -> u64 {
        self.slot(view).read().generation
    }

    pub fn is_current(&self, view: ViewKind, generation: u64) -> bool {
        self.generation(view) == generation
    }

    pub fn set_items(&self, view: ViewKind, items: Arc<[CatalogItem]>) {
        self.slot(view).write().state.items = items;
    }

    pub fn set_pagination(&self, view: ViewKind, pagination: Option<PageDescriptor>) {
        self.slot(view).write().state.pagination = pagination;
    }

    /// Setting either busy flag clears the other; a view is never loading
    /// and fetching more at once.
    pub fn set_loading(&self, view: ViewKind, loading: bool) {
        let mut slot = self.slot(view).write();
        slot.state.is_loading = loading;
        if loading {
            slot.state.is_fetching_more = false;
        }
    }

    pub fn set_fetching_more(&self, view: ViewKind, fetching: bool) {
        let mut slot = self.slot(view).write();
        slot.state.is_fetching_more = fetching;
        if fetching {
            slot.state.is_loading = false;
        }
    }

    /// Write items and pagination together if `generation` is still current.
    ///
    /// Returns false, leaving the view untouched, when a reset happened after
    /// the generation was read.
    pub fn commit(
        &self,
        view: ViewKind,
        generation: u64,
        items: Arc<[CatalogItem]>,
        pagination: Option<PageDescriptor>,
    ) -> bool {
        let mut slot = self.slot(view).write();
        if slot.generation != generation {
            return false;
        }
        slot.state.items = items;
        slot.state.pagination = pagination;
        true
    }

    /// Clear items and pagination and start a new request generation.
    pub fn reset(&self, view: ViewKind) -> u64 {
        let mut slot = self.slot(view).write();
        slot.state.items = Arc::from(Vec::new());
        slot.state.pagination = None;
        slot.generation += 1;
        slot.generation
    }
}
