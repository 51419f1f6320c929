//! User-visible notifications raised by the browsing engine

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::CatalogError;

use super::state::ViewKind;

/// Oldest notifications are dropped past this many
const MAX_PENDING: usize = 32;

/// How loudly the presentation layer should surface a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Notice,
    Error,
}

/// One notification, tagged with the view it concerns when there is one
#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub view: Option<ViewKind>,
    pub message: String,
    pub raised_at: Instant,
}

impl Toast {
    /// A fetch for `view` failed; raised once per failed fetch.
    pub fn fetch_failed(view: ViewKind, error: &CatalogError) -> Self {
        Self {
            level: ToastLevel::Error,
            view: Some(view),
            message: format!("Failed to load capes: {error}"),
            raised_at: Instant::now(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Notice,
            view: None,
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    /// Time since the toast was raised, for display timeouts
    pub fn age(&self) -> Duration {
        self.raised_at.elapsed()
    }
}

/// Shared queue the presentation layer drains on each frame
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    pending: Arc<Mutex<VecDeque<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, toast: Toast) {
        let mut pending = self.pending.lock();
        if pending.len() == MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(toast);
    }

    pub fn drain(&self) -> Vec<Toast> {
        self.pending.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
