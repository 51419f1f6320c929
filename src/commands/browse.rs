use std::path::Path;

use crate::browse::{BrowseView, ViewKind};
use crate::catalog::{SortKey, TimeWindow};
use crate::config::Config;
use crate::error::{CatalogError, Result};

use super::{check, flush_toasts, open_screen, print_items};

/// Options for `capedeck browse`
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    pub sort: Option<SortKey>,
    pub window: Option<TimeWindow>,
    pub search: Option<String>,
    /// Total pages to load, counting the first
    pub pages: u32,
    pub output_json: bool,
}

/// Browse the whole catalog, loading `pages` pages like a scrolling list would
pub async fn cmd_browse(catalog: &Path, options: BrowseOptions) -> Result<()> {
    let config = Config::load()?;
    let screen = open_screen(catalog, &config)?;

    // mount only loads if the filters did not already
    check(
        screen
            .set_filters(options.sort, options.window, options.search.unwrap_or_default())
            .await,
    )?;
    check(screen.mount().await)?;

    for _ in 1..options.pages.max(1) {
        let last = screen.store().items(ViewKind::All).len().saturating_sub(1);
        match screen.on_scroll(last).await {
            Some(outcome) => check(Some(outcome))?,
            None => break,
        }
    }

    flush_toasts(&screen);
    let state = screen.view_state(ViewKind::All);
    print_items(&state.items, options.output_json)?;

    if !options.output_json
        && let Some(pagination) = state.pagination
    {
        eprintln!(
            "page {}/{} ({} capes total)",
            pagination.current_page_index + 1,
            pagination.total_pages.max(1),
            pagination.total_items
        );
    }
    Ok(())
}

/// List the capes owned by an identity
pub async fn cmd_owned(catalog: &Path, identity: Option<String>, output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let identity = identity
        .or_else(|| config.identity().map(str::to_string))
        .ok_or_else(|| {
            CatalogError::Config(
                "no identity given. Pass --identity or set CAPEDECK_IDENTITY".to_string(),
            )
        })?;

    let screen = open_screen(catalog, &config)?;
    screen.set_identity(Some(identity)).await;
    check(screen.set_view(BrowseView::Owned).await)?;

    flush_toasts(&screen);
    print_items(&screen.view_state(ViewKind::Owned).items, output_json)
}
