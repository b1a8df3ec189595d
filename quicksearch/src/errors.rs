/// Error types for quicksearch.
///
/// Most of what happens during a live search is not an error: an empty
/// result set is reported as [`SearchStatus::NoMatches`](crate::SearchStatus),
/// and a superseded generation simply stops. The variants below cover the
/// genuine faults: a collaborator that fails during a scan (an invalid regex),
/// bad configuration, and I/O while loading a database.
///
/// A fault raised inside a scan terminates that generation without touching
/// the cache or the renderer:
/// ```rust,ignore
/// match executor.run() {
///     Ok(Execution::Completed(done)) => // deliver rows,
///     Ok(Execution::Canceled) => // superseded, drop silently,
///     Err(SearchError::InvalidPattern(p)) => // keep last stable status,
///     Err(e) => // same, log it
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for quicksearch operations
pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// Errors that can occur while configuring or running a search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Database not found: {0}")]
    DatabaseNotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SearchError {
    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn database_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DatabaseNotFound(path.into())
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SearchError::invalid_pattern("(unclosed");
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = SearchError::config_error("bad column");
        assert!(matches!(err, SearchError::ConfigError(_)));

        let err = SearchError::database_not_found("missing.json");
        assert!(matches!(err, SearchError::DatabaseNotFound(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_pattern("regex parse error: unclosed group");
        assert_eq!(
            err.to_string(),
            "Invalid pattern: regex parse error: unclosed group"
        );

        let err = SearchError::config_error("Missing required field".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field"
        );

        let err = SearchError::database_not_found("db.json");
        assert_eq!(err.to_string(), "Database not found: db.json");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: SearchError = parse.unwrap_err().into();
        assert!(matches!(err, SearchError::JsonError(_)));
    }
}
