//! Transport abstraction for path-addressed get/set exchanges.
//!
//! The session itself (dialing, TLS, authentication) lives outside this
//! crate. Managers only see the [`GnmiTransport`] trait: one `get` and one
//! `set` call, each taking the shared cancellation context.
//!
//! # Example
//!
//! ```ignore
//! use gnmi_cfgmgr_common::{DryRunTransport, GnmiPath, GnmiTransport, OpKind, SetOperation};
//! use tokio_util::sync::CancellationToken;
//!
//! let transport = DryRunTransport::new();
//! let ctx = CancellationToken::new();
//! let path = GnmiPath::parse("/interfaces/interface[name=Ethernet1]/config/description")?;
//! transport.set(&ctx, &[SetOperation::new(OpKind::Delete, path)]).await?;
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{CfgMgrError, CfgMgrResult};
use crate::path::GnmiPath;

/// Kind of a set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Incremental merge into the existing subtree.
    Update,
    /// Full overwrite of the subtree.
    Replace,
    /// Removal of the subtree.
    Delete,
}

impl OpKind {
    /// Returns the operation name as used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Update => "update",
            OpKind::Replace => "replace",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-scoped write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetOperation {
    /// Operation kind.
    pub kind: OpKind,
    /// Target path.
    pub path: GnmiPath,
    /// Serialized document, absent for deletes and value-less writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<String>,
}

impl SetOperation {
    /// Creates an operation without a value.
    pub fn new(kind: OpKind, path: GnmiPath) -> Self {
        Self {
            kind,
            path,
            val: None,
        }
    }

    /// Attaches a serialized value.
    pub fn with_val(mut self, val: impl Into<String>) -> Self {
        self.val = Some(val.into());
        self
    }
}

/// One update within a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Path relative to the notification prefix.
    pub path: GnmiPath,
    /// JSON-encoded value.
    pub val: String,
}

impl Update {
    /// Creates an update.
    pub fn new(path: GnmiPath, val: impl Into<String>) -> Self {
        Self {
            path,
            val: val.into(),
        }
    }
}

/// A notification carrying updates under a common prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    /// Prefix shared by all updates.
    pub prefix: Option<GnmiPath>,
    /// Updates in arrival order.
    pub updates: Vec<Update>,
}

impl Notification {
    /// Returns the absolute path of an update (prefix joined with its path).
    pub fn full_path(&self, update: &Update) -> GnmiPath {
        match &self.prefix {
            Some(prefix) => prefix.join(&update.path),
            None => update.path.clone(),
        }
    }
}

/// Response to a get request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetResponse {
    /// Notifications in arrival order.
    pub notifications: Vec<Notification>,
}

impl GetResponse {
    /// Wraps a single notification.
    pub fn single(notification: Notification) -> Self {
        Self {
            notifications: vec![notification],
        }
    }
}

/// Path-addressed configuration session.
///
/// Implementations are constructed once per device and reused for every
/// lifecycle call. No retries are expected at this layer.
#[async_trait]
pub trait GnmiTransport: Send + Sync {
    /// Reads the subtrees rooted at `paths`.
    async fn get(&self, ctx: &CancellationToken, paths: &[GnmiPath])
        -> CfgMgrResult<GetResponse>;

    /// Applies `ops` in a single set request.
    async fn set(&self, ctx: &CancellationToken, ops: &[SetOperation]) -> CfgMgrResult<()>;
}

/// Runs `fut` unless `ctx` is cancelled first.
///
/// A cancelled call is reported as failed; whatever the future did is
/// discarded with it.
pub async fn cancellable<F, T>(
    ctx: &CancellationToken,
    operation: &str,
    path: &str,
    fut: F,
) -> CfgMgrResult<T>
where
    F: Future<Output = CfgMgrResult<T>>,
{
    if ctx.is_cancelled() {
        return Err(CfgMgrError::cancelled(operation, path));
    }

    tokio::select! {
        biased;
        _ = ctx.cancelled() => {
            debug!(operation, path, "Call cancelled");
            Err(CfgMgrError::cancelled(operation, path))
        }
        res = fut => res,
    }
}

/// Transport that logs and records writes without touching a device.
///
/// Gets return an empty response.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    applied: Mutex<Vec<SetOperation>>,
}

impl DryRunTransport {
    /// Creates an empty dry-run transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every operation received so far.
    pub async fn applied(&self) -> Vec<SetOperation> {
        self.applied.lock().await.clone()
    }

    /// Drains the recorded operations.
    pub async fn take_applied(&self) -> Vec<SetOperation> {
        std::mem::take(&mut *self.applied.lock().await)
    }
}

#[async_trait]
impl GnmiTransport for DryRunTransport {
    async fn get(
        &self,
        _ctx: &CancellationToken,
        paths: &[GnmiPath],
    ) -> CfgMgrResult<GetResponse> {
        for path in paths {
            debug!(path = %path, "Dry-run get");
        }
        Ok(GetResponse::default())
    }

    async fn set(&self, _ctx: &CancellationToken, ops: &[SetOperation]) -> CfgMgrResult<()> {
        let mut applied = self.applied.lock().await;
        for op in ops {
            info!(kind = %op.kind, path = %op.path, "Dry-run set");
            applied.push(op.clone());
        }
        Ok(())
    }
}
