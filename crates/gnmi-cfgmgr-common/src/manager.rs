//! Resource manager trait and lifecycle abstractions.
//!
//! A resource manager reconciles one declared entity against one device
//! session. The host framework owns the persisted record and hands it to the
//! manager for the duration of a single lifecycle call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{CfgMgrError, CfgMgrResult};

/// Lifecycle states of a managed entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Nothing is known to exist on the device.
    #[default]
    Absent,
    /// Create in flight.
    Creating,
    /// Entity exists and the record reflects the last applied state.
    Present,
    /// Update in flight.
    Updating,
    /// Delete in flight, or a previous delete stopped part-way.
    Deleting,
}

impl LifecycleState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Absent => "absent",
            LifecycleState::Creating => "creating",
            LifecycleState::Present => "present",
            LifecycleState::Updating => "updating",
            LifecycleState::Deleting => "deleting",
        }
    }
}

/// Outcome of the read that follows a successful write.
///
/// The write itself has already been applied when this is returned; a stale
/// refresh only means the recorded observed state may lag the device.
#[derive(Debug)]
pub enum Refresh {
    /// Observed state was re-read successfully.
    Fresh,
    /// The re-read failed; observed state may be stale.
    Stale(CfgMgrError),
}

impl Refresh {
    /// Returns true if the observed state could not be refreshed.
    pub fn is_stale(&self) -> bool {
        matches!(self, Refresh::Stale(_))
    }

    /// Returns the error that prevented the refresh.
    pub fn stale_reason(&self) -> Option<&CfgMgrError> {
        match self {
            Refresh::Stale(e) => Some(e),
            Refresh::Fresh => None,
        }
    }
}

impl From<CfgMgrResult<()>> for Refresh {
    fn from(res: CfgMgrResult<()>) -> Self {
        match res {
            Ok(()) => Refresh::Fresh,
            Err(e) => Refresh::Stale(e),
        }
    }
}

/// Base trait for lifecycle managers.
///
/// # Example
///
/// ```ignore
/// use gnmi_cfgmgr_common::{CfgMgrResult, Refresh, ResourceMgr};
///
/// async fn apply<M: ResourceMgr>(
///     mgr: &M,
///     ctx: &CancellationToken,
///     record: &mut M::Resource,
///     desired: M::Spec,
/// ) -> CfgMgrResult<Refresh> {
///     mgr.create(ctx, record, desired).await
/// }
/// ```
#[async_trait]
pub trait ResourceMgr: Send + Sync {
    /// Declared attributes supplied by the host on create and update.
    type Spec: Send + Sync;

    /// Host-persisted record: identifier plus last-known attributes.
    type Resource: Send;

    /// Returns the resource type name (used for logging).
    fn resource_type(&self) -> &str;

    /// Creates the entity on the device and records its identifier.
    async fn create(
        &self,
        ctx: &CancellationToken,
        resource: &mut Self::Resource,
        desired: Self::Spec,
    ) -> CfgMgrResult<Refresh>;

    /// Refreshes the observed attributes from the device.
    async fn read(&self, ctx: &CancellationToken, resource: &mut Self::Resource)
        -> CfgMgrResult<()>;

    /// Moves the device toward `desired`, touching only changed groups.
    async fn update(
        &self,
        ctx: &CancellationToken,
        resource: &mut Self::Resource,
        desired: Self::Spec,
    ) -> CfgMgrResult<Refresh>;

    /// Removes the entity from the device and clears its identifier.
    async fn delete(
        &self,
        ctx: &CancellationToken,
        resource: &mut Self::Resource,
    ) -> CfgMgrResult<()>;
}
