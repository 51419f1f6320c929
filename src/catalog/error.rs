//! Classification of raw backend failures.
//!
//! Catalog clients see failures as a status code (when a response came back
//! at all) plus a message. [`ApiError`] carries that and converts it into the
//! crate's [`CatalogError`] taxonomy.

use std::fmt;

use crate::error::CatalogError;

/// Raw failure reported by a catalog backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP-style status code, absent when the transport itself failed
    pub status: Option<u16>,
    /// Human-readable error message
    pub message: String,
    /// Backend name for context
    pub backend: &'static str,
}

impl ApiError {
    /// A transport failure with no response.
    pub fn new(message: impl Into<String>, backend: &'static str) -> Self {
        Self {
            status: None,
            message: message.into(),
            backend,
        }
    }

    pub fn with_status(message: impl Into<String>, backend: &'static str, status: u16) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            backend,
        }
    }

    /// Server errors and transport failures are worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self.status {
            Some(status) => (500..600).contains(&status),
            None => true,
        }
    }

    pub fn to_catalog_error(&self) -> CatalogError {
        match self.status {
            None => CatalogError::Network(format!("{}: {}", self.backend, self.message)),
            Some(404) => CatalogError::NotFound(self.message.clone()),
            Some(status) => CatalogError::Backend {
                status,
                message: format!("{}: {}", self.backend, self.message),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.backend, status, self.message),
            None => write!(f, "{}: {}", self.backend, self.message),
        }
    }
}

impl From<ApiError> for CatalogError {
    fn from(error: ApiError) -> Self {
        error.to_catalog_error()
    }
}
