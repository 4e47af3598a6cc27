//! Interface Manager - OpenConfig interface reconciler over gNMI
//!
//! intfmgrd reconciles declared interface attributes against a device:
//! - Description
//! - Switchport mode with access and trunk VLANs
//! - Routed-port IPv4 addressing on subinterface 0
//!
//! Each attribute group is addressed by its own path, so updates only touch
//! the groups that changed.

pub mod assemble;
pub mod config;
pub mod intf_mgr;
pub mod operations;
pub mod state;
pub mod tables;
pub mod types;
pub mod yang;

pub use config::IntfMgrConfig;
pub use intf_mgr::{GroupPlan, IntfMgr};
pub use tables::{AttrGroup, PathTable};
pub use types::{InterfaceResource, InterfaceSpec};
