/// Convenience result type used across the engine.
pub type MockupResult<T> = Result<T, MockupError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MockupError {
    /// Invalid caller-provided data (bad corners, empty template set, unknown preset).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("not found: {entity} {id}")]
    NotFound {
        /// Entity kind, e.g. `template`.
        entity: &'static str,
        /// Identifier as displayed to the caller.
        id: String,
    },

    /// The request conflicts with current state (illegal status transition).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network or timeout failure talking to an external service.
    #[error("external error: {0}")]
    External(String),

    /// Raster decode/encode failure.
    #[error("raster error: {0}")]
    Raster(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MockupError {
    /// Build a [`MockupError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MockupError::NotFound`] value.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Build a [`MockupError::Conflict`] value.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Build a [`MockupError::External`] value.
    pub fn external(msg: impl Into<String>) -> Self {
        Self::External(msg.into())
    }

    /// Build a [`MockupError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Whether the failure is a per-item external hiccup that siblings should survive.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl From<image::ImageError> for MockupError {
    fn from(err: image::ImageError) -> Self {
        Self::Raster(err.to_string())
    }
}

impl From<reqwest::Error> for MockupError {
    fn from(err: reqwest::Error) -> Self {
        Self::External(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for MockupError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::External("operation timed out".to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
