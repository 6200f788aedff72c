use std::io;

/// Error kinds surfaced across the `exclusionms_core` boundary.
///
/// These map 1:1 onto the HTTP status classes of the (external) adapter:
/// `InvalidInterval`/`InvalidTolerance` are 400-class, `NotFound` is
/// 404-class, `PersistenceError` is 500-class.
#[derive(Debug)]
pub enum ExclusionError {
    /// A `min > max` bound somewhere, or `add` called with a null id.
    InvalidInterval(String),
    /// A persisted store name does not exist for `load`/`delete`.
    NotFound(String),
    /// I/O or decode failure during `save`/`load`.
    PersistenceError(String),
    /// A negative tolerance was passed to the tolerance builder.
    InvalidTolerance(String),
}

impl std::fmt::Display for ExclusionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionError::InvalidInterval(msg) => write!(f, "invalid interval: {msg}"),
            ExclusionError::NotFound(name) => write!(f, "not found: {name}"),
            ExclusionError::PersistenceError(msg) => write!(f, "persistence error: {msg}"),
            ExclusionError::InvalidTolerance(msg) => write!(f, "invalid tolerance: {msg}"),
        }
    }
}

impl std::error::Error for ExclusionError {}

impl From<io::Error> for ExclusionError {
    fn from(e: io::Error) -> Self {
        ExclusionError::PersistenceError(e.to_string())
    }
}
