//! Catalog data model and the backend boundary.
//!
//! The backend exposes three operations: a paginated browse over the whole
//! catalog, a full listing of the items owned by one identity, and a batch
//! lookup by id. Everything else in the crate is built on top of
//! [`CatalogClient`].

pub mod error;
pub mod fixture;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

pub use fixture::FixtureCatalog;

/// Items requested per browse page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Backend limit on ids per `fetch_by_ids` call
pub const MAX_LOOKUP_IDS: usize = 100;

/// A single catalog entry. Identity is `id`; records are replaced wholesale,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub usage_count: u64,
    /// Opaque identity of whoever first wore the item; may be empty
    #[serde(default)]
    pub first_seen_by: String,
    #[serde(default)]
    pub is_elytra_variant: bool,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            usage_count: 0,
            first_seen_by: String::new(),
            is_elytra_variant: false,
        }
    }

    /// Zero-valued record reserving a slot for an id that is not resolved yet
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id)
    }

    pub fn with_usage(mut self, usage_count: u64) -> Self {
        self.usage_count = usage_count;
        self
    }

    pub fn with_first_seen_by(mut self, identity: impl Into<String>) -> Self {
        self.first_seen_by = identity.into();
        self
    }

    pub fn elytra(mut self) -> Self {
        self.is_elytra_variant = true;
        self
    }
}

/// Server pagination state for one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub current_page_index: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageDescriptor {
    /// Descriptor for an unpaginated list: everything sits on page zero.
    pub fn single_page(len: usize) -> Self {
        Self {
            current_page_index: 0,
            page_size: len as u32,
            total_items: len as u64,
            total_pages: 1,
        }
    }

    pub fn has_more(&self) -> bool {
        self.current_page_index < self.total_pages.saturating_sub(1)
    }
}

/// One page of browse results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<CatalogItem>,
    pub pagination: PageDescriptor,
}

impl Page {
    /// Wrap a full, unpaginated listing
    pub fn single(items: Vec<CatalogItem>) -> Self {
        let pagination = PageDescriptor::single_page(items.len());
        Self { items, pagination }
    }

    pub fn empty() -> Self {
        Self::single(Vec::new())
    }
}

/// Browse ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Newest,
    Oldest,
    MostUsed,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Newest => write!(f, "newest"),
            SortKey::Oldest => write!(f, "oldest"),
            SortKey::MostUsed => write!(f, "mostUsed"),
        }
    }
}

impl FromStr for SortKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "mostused" => Ok(SortKey::MostUsed),
            _ => Err(CatalogError::Config(format!(
                "unknown sort key '{s}', expected 'newest', 'oldest' or 'mostUsed'"
            ))),
        }
    }
}

/// Usage time window applied to browse results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeWindow {
    Weekly,
    Monthly,
    AllTime,
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Weekly => write!(f, "weekly"),
            TimeWindow::Monthly => write!(f, "monthly"),
            TimeWindow::AllTime => write!(f, "allTime"),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "weekly" => Ok(TimeWindow::Weekly),
            "monthly" => Ok(TimeWindow::Monthly),
            "alltime" => Ok(TimeWindow::AllTime),
            _ => Err(CatalogError::Config(format!(
                "unknown time window '{s}', expected 'weekly', 'monthly' or 'allTime'"
            ))),
        }
    }
}

/// Request shape of the paginated browse operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseRequest {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<TimeWindow>,
}

/// Common interface for catalog backends
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of the whole catalog
    fn browse(
        &self,
        request: &BrowseRequest,
    ) -> impl std::future::Future<Output = Result<Page>> + Send;

    /// Fetch every item owned by `identity` (no pagination)
    fn list_owned(
        &self,
        identity: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CatalogItem>>> + Send;

    /// Batch lookup of at most [`MAX_LOOKUP_IDS`] ids. Unknown ids are omitted.
    fn fetch_by_ids(
        &self,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<CatalogItem>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more() {
        let page = PageDescriptor {
            current_page_index: 0,
            page_size: 20,
            total_items: 45,
            total_pages: 3,
        };
        assert!(page.has_more());

        let last = PageDescriptor {
            current_page_index: 2,
            ..page
        };
        assert!(!last.has_more());
    }

    #[test]
    fn test_has_more_with_no_pages() {
        assert!(!PageDescriptor::default().has_more());
    }

    #[test]
    fn test_single_page_descriptor() {
        let page = PageDescriptor::single_page(7);
        assert_eq!(
            page,
            PageDescriptor {
                current_page_index: 0,
                page_size: 7,
                total_items: 7,
                total_pages: 1,
            }
        );
        assert!(!page.has_more());
    }

    #[test]
    fn test_placeholder_shape() {
        let item = CatalogItem::placeholder("abc123");
        assert_eq!(item.id, "abc123");
        assert_eq!(item.usage_count, 0);
        assert_eq!(item.first_seen_by, "");
        assert!(!item.is_elytra_variant);
    }

    #[test]
    fn test_sort_key_parse_and_display() {
        assert_eq!("mostUsed".parse::<SortKey>().unwrap(), SortKey::MostUsed);
        assert_eq!("most-used".parse::<SortKey>().unwrap(), SortKey::MostUsed);
        assert_eq!("Newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert!("popular".parse::<SortKey>().is_err());
        assert_eq!(SortKey::MostUsed.to_string(), "mostUsed");
    }

    #[test]
    fn test_time_window_parse() {
        assert_eq!("weekly".parse::<TimeWindow>().unwrap(), TimeWindow::Weekly);
        assert_eq!("all_time".parse::<TimeWindow>().unwrap(), TimeWindow::AllTime);
        assert!("daily".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_browse_request_wire_shape() {
        let request = BrowseRequest {
            page: 0,
            page_size: 20,
            sort_by: Some(SortKey::MostUsed),
            time_frame: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 0, "pageSize": 20, "sortBy": "mostUsed"})
        );
    }

    #[test]
    fn test_item_deserializes_with_defaults() {
        let item: CatalogItem = serde_json::from_str(r#"{"id":"c1","usageCount":4}"#).unwrap();
        assert_eq!(item, CatalogItem::new("c1").with_usage(4));
    }
}
