//! Verification helpers for testing configuration managers
//!
//! Provides assertion helpers over the set operations a manager emitted

use gnmi_cfgmgr_common::{OpKind, SetOperation};
use std::collections::BTreeSet;
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected {kind} on '{path}' but it was not emitted")]
    OpNotFound { kind: OpKind, path: String },

    #[error("Unexpected {kind} on '{path}'")]
    UnexpectedOp { kind: OpKind, path: String },

    #[error("Expected {expected} operations, found {actual}")]
    OpCountMismatch { expected: usize, actual: usize },

    #[error("Operation {index} mismatch: expected {expected}, got {actual}")]
    SequenceMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Expected {kind} paths {expected:?}, got {actual:?}")]
    PathSetMismatch {
        kind: OpKind,
        expected: BTreeSet<String>,
        actual: BTreeSet<String>,
    },

    #[error("Payload of {kind} on '{path}' is not valid JSON: {message}")]
    BadPayload {
        kind: OpKind,
        path: String,
        message: String,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Set-operation verifier
pub struct OpVerifier {
    ops: Vec<SetOperation>,
}

impl OpVerifier {
    /// Create a verifier over captured operations
    pub fn new(ops: Vec<SetOperation>) -> Self {
        Self { ops }
    }

    fn describe(kind: OpKind, path: &str) -> String {
        format!("{} {}", kind, path)
    }

    /// Verify that an operation of `kind` targeted `path`
    pub fn assert_op(&self, kind: OpKind, path: &str) -> VerifyResult<&SetOperation> {
        self.ops
            .iter()
            .find(|op| op.kind == kind && op.path.to_string() == path)
            .ok_or_else(|| VerificationError::OpNotFound {
                kind,
                path: path.to_string(),
            })
    }

    /// Verify that no operation of `kind` targeted `path`
    pub fn assert_no_op(&self, kind: OpKind, path: &str) -> VerifyResult<()> {
        if self
            .ops
            .iter()
            .any(|op| op.kind == kind && op.path.to_string() == path)
        {
            Err(VerificationError::UnexpectedOp {
                kind,
                path: path.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Verify the number of operations emitted
    pub fn assert_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.ops.len();
        if actual != expected {
            Err(VerificationError::OpCountMismatch { expected, actual })
        } else {
            Ok(())
        }
    }

    /// Verify the exact ordered sequence of (kind, path)
    pub fn assert_sequence(&self, expected: &[(OpKind, &str)]) -> VerifyResult<()> {
        self.assert_count(expected.len())?;
        for (index, (op, (kind, path))) in self.ops.iter().zip(expected).enumerate() {
            let actual = Self::describe(op.kind, &op.path.to_string());
            let wanted = Self::describe(*kind, path);
            if actual != wanted {
                return Err(VerificationError::SequenceMismatch {
                    index,
                    expected: wanted,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Verify the set of paths targeted by operations of `kind`, ignoring order
    pub fn assert_path_set(&self, kind: OpKind, expected: &[&str]) -> VerifyResult<()> {
        let actual: BTreeSet<String> = self
            .ops
            .iter()
            .filter(|op| op.kind == kind)
            .map(|op| op.path.to_string())
            .collect();
        let expected: BTreeSet<String> = expected.iter().map(|p| p.to_string()).collect();
        if actual != expected {
            Err(VerificationError::PathSetMismatch {
                kind,
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }

    /// Parse the payload of the operation of `kind` on `path`
    pub fn payload_json(&self, kind: OpKind, path: &str) -> VerifyResult<serde_json::Value> {
        let op = self.assert_op(kind, path)?;
        let val = op.val.as_deref().unwrap_or("null");
        serde_json::from_str(val).map_err(|e| VerificationError::BadPayload {
            kind,
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Get all captured operations
    pub fn ops(&self) -> &[SetOperation] {
        &self.ops
    }
}
