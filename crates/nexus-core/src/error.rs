// crates/nexus-core/src/error.rs

use thiserror::Error;

/// Workspace-wide error types for the NexusLink simulator.
#[derive(Debug, Error)]
pub enum NexusError {
    /// Storage layer error (RocksDB, lock poisoning, id exhaustion).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied a record that violates an entity invariant.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid state transition (e.g. voting on a finalized round).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Consensus engine error.
    #[error("Consensus error: {0}")]
    Consensus(String),
}

impl From<serde_json::Error> for NexusError {
    fn from(e: serde_json::Error) -> Self {
        NexusError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = NexusError::NotFound("validator v9".to_string());
        assert_eq!(err.to_string(), "Not found: validator v9");
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<u64>("not a number").unwrap_err();
        let err: NexusError = parse_err.into();
        assert!(matches!(err, NexusError::Serialization(_)));
    }
}
