//! Error types for the AirTwin environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Reading a dataset failed
    #[error("I/O error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Nothing exists at the requested location
    #[error("Dataset not found: {0}")]
    NotFound(String),
}

impl EnvError {
    /// Creates an I/O error, mapping `NotFound` to its own variant.
    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        let location = location.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(location)
        } else {
            Self::Io { location, source }
        }
    }

    /// Creates a not-found error.
    pub fn not_found(location: impl std::fmt::Display) -> Self {
        Self::NotFound(location.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_variant() {
        let err = EnvError::io(
            "data/missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, EnvError::NotFound(ref loc) if loc == "data/missing.csv"));
    }

    #[test]
    fn test_io_other_kind_keeps_source() {
        let err = EnvError::io(
            "data/locked.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, EnvError::Io { .. }));
        assert!(err.to_string().contains("data/locked.csv"));
    }
}
