//! Infinite-scroll trigger

use super::filter::Query;
use super::state::{ViewKind, ViewStateStore};

/// Rows from the end of the list at which the next page is requested
const DEFAULT_THRESHOLD_ROWS: usize = 4;

/// Decides when scrolling should request the next page of the active view.
///
/// Re-evaluated on every render; a request it produces that the coordinator
/// drops is simply produced again on a later frame.
#[derive(Debug, Clone, Copy)]
pub struct PaginationTrigger {
    threshold_rows: usize,
}

impl Default for PaginationTrigger {
    fn default() -> Self {
        Self {
            threshold_rows: DEFAULT_THRESHOLD_ROWS,
        }
    }
}

impl PaginationTrigger {
    pub fn new(threshold_rows: usize) -> Self {
        Self { threshold_rows }
    }

    /// Viewport proximity: is the last visible row close to the end?
    pub fn is_near_end(&self, last_visible_index: usize, len: usize) -> bool {
        len > 0 && last_visible_index.saturating_add(self.threshold_rows) >= len.saturating_sub(1)
    }

    /// The append request to issue, if any.
    ///
    /// Inert for favorites, for views without further pages, and while the
    /// view is already loading or fetching more.
    pub fn evaluate(
        &self,
        near_end: bool,
        query: &Query,
        store: &ViewStateStore,
    ) -> Option<(ViewKind, Query)> {
        if !near_end {
            return None;
        }
        let view = query.view.kind()?;
        let state = store.snapshot(view);
        if !state.has_more() || state.is_busy() {
            return None;
        }
        Some((view, query.next_page()))
    }
}
