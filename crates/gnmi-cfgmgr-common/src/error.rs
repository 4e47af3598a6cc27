//! Error types for gNMI cfgmgr operations.
//!
//! This module defines the error types used throughout the cfgmgr crates.
//! All errors implement `std::error::Error` via `thiserror`. Every variant
//! that originates from a device exchange names the operation and the path
//! involved, so the caller can tell exactly which write or read failed.

use std::io;
use thiserror::Error;

/// Result type alias for cfgmgr operations.
pub type CfgMgrResult<T> = Result<T, CfgMgrError>;

/// Errors that can occur during cfgmgr operations.
#[derive(Debug, Error)]
pub enum CfgMgrError {
    /// Declared configuration failed validation (malformed CIDR, mode conflict).
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// An attribute that cannot change after creation was modified.
    #[error("Attribute '{field}' cannot be changed after creation")]
    ImmutableField {
        /// The attribute name.
        field: String,
    },

    /// A subtree could not be serialized into a document.
    #[error("Failed to serialize payload for {path}: {source}")]
    Serialization {
        /// Target path of the operation.
        path: String,
        /// The underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// A path string could not be parsed.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Error message.
        message: String,
    },

    /// An attribute group key is not one of the recognized groups.
    #[error("Unknown attribute group '{0}'")]
    UnknownGroup(String),

    /// A get or set exchange failed.
    #[error("Transport {operation} failed for {path}: {message}")]
    Transport {
        /// The operation that failed (get, update, replace, delete).
        operation: String,
        /// The target path.
        path: String,
        /// Error message.
        message: String,
    },

    /// The call was aborted through the cancellation context.
    #[error("{operation} on {path} was cancelled")]
    Cancelled {
        /// The operation that was in flight.
        operation: String,
        /// The target path.
        path: String,
    },

    /// A device response could not be decoded.
    #[error("Failed to decode response for {path}: {message}")]
    Decode {
        /// Path of the offending update.
        path: String,
        /// Error message.
        message: String,
    },

    /// One of the per-group deletions failed; earlier groups may be gone.
    #[error("Failed to delete {group} path {path}: {source}")]
    PartialDelete {
        /// The attribute group whose deletion failed.
        group: String,
        /// The path that failed.
        path: String,
        /// The underlying failure.
        #[source]
        source: Box<CfgMgrError>,
    },

    /// The resource has no identifier (never created or already deleted).
    #[error("Resource has no identifier")]
    MissingId,

    /// Configuration file could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CfgMgrError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(operation: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
            path: path.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration loading error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed if the caller re-runs the lifecycle call.
    pub fn is_retryable(&self) -> bool {
        match self {
            CfgMgrError::Transport { .. } | CfgMgrError::Cancelled { .. } => true,
            CfgMgrError::PartialDelete { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CfgMgrError::invalid_config("ipv4_address", "not a CIDR");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for ipv4_address: not a CIDR"
        );
    }

    #[test]
    fn test_transport_error() {
        let err = CfgMgrError::transport(
            "replace",
            "/interfaces/interface[name=Ethernet1]/config/description",
            "connection reset",
        );
        assert_eq!(
            err.to_string(),
            "Transport replace failed for /interfaces/interface[name=Ethernet1]/config/description: connection reset"
        );
    }

    #[test]
    fn test_partial_delete_names_path() {
        let err = CfgMgrError::PartialDelete {
            group: "vlan".to_string(),
            path: "/interfaces/interface[name=Ethernet1]/ethernet/switched-vlan/config".to_string(),
            source: Box::new(CfgMgrError::transport("delete", "x", "refused")),
        };
        assert!(err.to_string().contains("vlan"));
        assert!(err.to_string().contains("switched-vlan/config"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(CfgMgrError::transport("get", "/", "timeout").is_retryable());
        assert!(CfgMgrError::cancelled("set", "/").is_retryable());
        assert!(!CfgMgrError::invalid_config("x", "bad").is_retryable());
        assert!(!CfgMgrError::MissingId.is_retryable());

        let partial = CfgMgrError::PartialDelete {
            group: "ipv4".to_string(),
            path: "/".to_string(),
            source: Box::new(CfgMgrError::transport("delete", "/", "timeout")),
        };
        assert!(partial.is_retryable());
    }
}
