//! Recording mock transport
//!
//! Captures every set request in arrival order and answers gets from a
//! scripted queue. Failures and latency can be injected per call.

use async_trait::async_trait;
use gnmi_cfgmgr_common::{
    CancellationToken, CfgMgrError, CfgMgrResult, GetResponse, GnmiPath, GnmiTransport, OpKind,
    SetOperation,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Set failure rule: fail any operation of `kind` whose path contains `path`
#[derive(Debug, Clone)]
struct SetFailure {
    kind: Option<OpKind>,
    path: String,
    message: String,
}

#[derive(Debug, Default)]
struct MockState {
    set_calls: Vec<Vec<SetOperation>>,
    get_requests: Vec<Vec<GnmiPath>>,
    responses: VecDeque<GetResponse>,
    get_failure: Option<String>,
    set_failures: Vec<SetFailure>,
}

/// Mock transport for manager tests
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    set_delay: Option<Duration>,
}

impl MockTransport {
    /// Create a mock that accepts every set and answers gets with empty responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every set by `delay` (used to exercise cancellation)
    pub fn with_set_delay(mut self, delay: Duration) -> Self {
        self.set_delay = Some(delay);
        self
    }

    /// Queue a get response; queued responses are served in order
    pub fn push_response(&self, response: GetResponse) {
        self.lock().responses.push_back(response);
    }

    /// Make every following get fail
    pub fn fail_get(&self, message: impl Into<String>) {
        self.lock().get_failure = Some(message.into());
    }

    /// Stop failing gets
    pub fn clear_get_failure(&self) {
        self.lock().get_failure = None;
    }

    /// Fail sets of `kind` (any kind if `None`) whose path contains `path`
    pub fn fail_set_on(&self, kind: Option<OpKind>, path: impl Into<String>, message: impl Into<String>) {
        self.lock().set_failures.push(SetFailure {
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    /// Remove all set failure rules
    pub fn clear_set_failures(&self) {
        self.lock().set_failures.clear();
    }

    /// All operations accepted so far, flattened in order
    pub fn applied(&self) -> Vec<SetOperation> {
        self.lock().set_calls.iter().flatten().cloned().collect()
    }

    /// Accepted set requests, one entry per call
    pub fn set_calls(&self) -> Vec<Vec<SetOperation>> {
        self.lock().set_calls.clone()
    }

    /// Paths requested by each get call
    pub fn get_requests(&self) -> Vec<Vec<GnmiPath>> {
        self.lock().get_requests.clone()
    }

    /// Forget recorded calls (injected failures and queued responses stay)
    pub fn reset_recorded(&self) {
        let mut state = self.lock();
        state.set_calls.clear();
        state.get_requests.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_set_failure(&self, ops: &[SetOperation]) -> CfgMgrResult<()> {
        let state = self.lock();
        for op in ops {
            let path = op.path.to_string();
            let hit = state.set_failures.iter().find(|f| {
                f.kind.map_or(true, |k| k == op.kind) && path.contains(&f.path)
            });
            if let Some(f) = hit {
                return Err(CfgMgrError::transport(op.kind.as_str(), path, f.message.clone()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GnmiTransport for MockTransport {
    async fn get(
        &self,
        _ctx: &CancellationToken,
        paths: &[GnmiPath],
    ) -> CfgMgrResult<GetResponse> {
        let mut state = self.lock();
        state.get_requests.push(paths.to_vec());

        if let Some(message) = &state.get_failure {
            let path = paths.first().map(|p| p.to_string()).unwrap_or_default();
            return Err(CfgMgrError::transport("get", path, message.clone()));
        }

        Ok(state.responses.pop_front().unwrap_or_default())
    }

    async fn set(&self, _ctx: &CancellationToken, ops: &[SetOperation]) -> CfgMgrResult<()> {
        if let Some(delay) = self.set_delay {
            tokio::time::sleep(delay).await;
        }

        self.check_set_failure(ops)?;

        for op in ops {
            debug!("Mock set: {} {}", op.kind, op.path);
        }
        self.lock().set_calls.push(ops.to_vec());
        Ok(())
    }
}
