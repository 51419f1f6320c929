pub mod browse;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;

pub use browse::{
    BrowseView, CatalogScreen, FavoritesResolver, FetchCoordinator, FetchMode, FetchOutcome,
    FilterController, PaginationTrigger, Query, ViewKind, ViewState, ViewStateStore,
};
pub use catalog::{
    BrowseRequest, CatalogClient, CatalogItem, FixtureCatalog, Page, PageDescriptor, SortKey,
    TimeWindow,
};
pub use config::Config;
pub use error::{CatalogError, Result};
