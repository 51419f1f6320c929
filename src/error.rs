use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Transport failure: the backend could not be reached or the call dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The identity or search term yielded nothing.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CatalogError {
    /// `NotFound` is an empty result, not a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
