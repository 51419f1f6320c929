use std::path::Path;

use crate::config::Config;
use crate::error::Result;

use super::{check, flush_toasts, open_screen, print_items};

/// Resolve favorite ids against the first catalog page and batch lookups
pub async fn cmd_favorites(catalog: &Path, ids: &[String], output_json: bool) -> Result<()> {
    let config = Config::load()?;
    let screen = open_screen(catalog, &config)?;

    check(screen.mount().await)?;
    let resolution = screen.tick(ids).await;

    flush_toasts(&screen);
    if !resolution.pending.is_empty() {
        eprintln!("unresolved: {}", resolution.pending.join(", "));
    }
    print_items(&resolution.items, output_json)
}
