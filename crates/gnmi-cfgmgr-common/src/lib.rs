//! Common infrastructure for gNMI configuration managers.
//!
//! This crate provides shared functionality for managers that reconcile
//! declared configuration against a device over a path-addressed get/set
//! protocol:
//!
//! - [`path`]: gNMI path parsing and formatting
//! - [`transport`]: the get/set transport trait, set operations, dry-run transport
//! - [`ResourceMgr`]: lifecycle trait (create/read/update/delete)
//! - [`error`]: error types for cfgmgr operations
//!
//! # Architecture
//!
//! Managers follow this pattern:
//!
//! 1. Receive the declared attributes and the host-persisted record
//! 2. Diff declared against recorded attributes, per attribute group
//! 3. Emit path-scoped update/replace/delete operations through the transport
//! 4. Re-read the device to refresh the observed attributes

pub mod error;
pub mod manager;
pub mod path;
pub mod transport;

// Re-export commonly used items at crate root
pub use error::{CfgMgrError, CfgMgrResult};
pub use manager::{LifecycleState, Refresh, ResourceMgr};
pub use path::{GnmiPath, PathElem};
pub use transport::{
    cancellable, DryRunTransport, GetResponse, GnmiTransport, Notification, OpKind, SetOperation,
    Update,
};

// Re-export the cancellation context so managers and hosts agree on the type
pub use tokio_util::sync::CancellationToken;
