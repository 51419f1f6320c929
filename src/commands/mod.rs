mod browse;
mod favorites;

pub use browse::{BrowseOptions, cmd_browse, cmd_owned};
pub use favorites::cmd_favorites;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use owo_colors::OwoColorize;

use crate::browse::{CatalogScreen, FetchOutcome, ToastLevel};
use crate::catalog::{CatalogItem, FixtureCatalog};
use crate::config::{CONFIG_DIR, Config};
use crate::error::{CatalogError, Result};

/// Catalog document used when `--catalog` is not given
pub fn default_catalog_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("catalog.json")
}

fn open_screen(catalog: &Path, config: &Config) -> Result<CatalogScreen<FixtureCatalog>> {
    let client = FixtureCatalog::from_path(catalog).map_err(|e| {
        CatalogError::Config(format!("failed to open catalog {}: {e}", catalog.display()))
    })?;
    Ok(CatalogScreen::new(Arc::new(client), config))
}

/// Surface a failed fetch as the command's error
fn check(outcome: Option<FetchOutcome>) -> Result<()> {
    match outcome {
        Some(FetchOutcome::Failed(e)) => Err(e),
        _ => Ok(()),
    }
}

/// Print queued notifications to stderr
fn flush_toasts(screen: &CatalogScreen<FixtureCatalog>) {
    for toast in screen.toasts().drain() {
        match toast.level {
            ToastLevel::Error => eprintln!("{}", toast.message.red()),
            ToastLevel::Notice => eprintln!("{}", toast.message.yellow()),
        }
    }
}

/// Format an item for single-line display
pub fn format_item_line(item: &CatalogItem) -> String {
    let id = format!("{:24}", item.id);
    let uses = format!("{:>8} uses", item.usage_count);
    let seen = if item.first_seen_by.is_empty() {
        String::new()
    } else {
        format!("  first seen by {}", item.first_seen_by)
    };
    let badge = if item.is_elytra_variant {
        format!("  {}", "[elytra]".magenta())
    } else {
        String::new()
    };

    format!("{}{}{}{}", id.cyan(), uses.dimmed(), seen, badge)
}

fn print_items(items: &[CatalogItem], output_json: bool) -> Result<()> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("{}", "No capes found".dimmed());
    }
    for item in items {
        println!("{}", format_item_line(item));
    }
    Ok(())
}
