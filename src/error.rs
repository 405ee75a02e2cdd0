//! Crate error handling
//!
//! The spatial index itself never fails: out-of-bounds inserts, missing removes
//! and empty searches are all silent no-ops. The only fallible surface is
//! building an index from configuration and starting the query worker pool.

use std::path::PathBuf;

/// Errors raised while loading or validating index configuration
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    #[error("Invalid configuration value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Failed to read configuration file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to create query thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Type alias for results from this crate
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Create an invalid configuration error
pub fn invalid_config(field: &'static str, reason: impl std::fmt::Display) -> SpatialError {
    SpatialError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = invalid_config("cell_size", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for `cell_size`: must be positive, got 0"
        );
    }
}
