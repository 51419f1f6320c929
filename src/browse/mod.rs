//! Catalog browsing engine
//!
//! Backs the cape browsing screen: a paginated "all" view, an unpaginated
//! "owned" view and a favorites view derived from both.

pub mod coordinator;
pub mod favorites;
pub mod filter;
pub mod flight;
pub mod pagination;
pub mod screen;
pub mod state;
pub mod toast;

pub use coordinator::{FetchCoordinator, FetchOutcome};
pub use favorites::{FavoriteResolutionCache, FavoritesResolver, Resolution};
pub use filter::{FilterController, FilterEffect, Query};
pub use flight::{FlightGuard, FlightPermit};
pub use pagination::PaginationTrigger;
pub use screen::CatalogScreen;
pub use state::{BrowseView, FetchMode, ViewKind, ViewState, ViewStateStore};
pub use toast::{Toast, ToastLevel, ToastQueue};
