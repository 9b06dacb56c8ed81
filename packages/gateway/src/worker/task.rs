//! The unit of work dispatched through a `WorkerPool`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::quota::QuotaLease;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    Queued = 0,
    Running = 1,
    Completed = 2,
    Failed = 3,
}

/// Progress/completion hooks invoked from whichever worker ends up running
/// the task. Implementations must be cheap and non-blocking.
pub trait TaskCallback: Send + Sync {
    fn on_progress(&self, _message: &str) {}
    fn on_done(&self, _result: &str) {}
    fn on_error(&self, _error: &GatewayError) {}
}

/// A no-op callback for tasks that don't need progress reporting.
pub struct NoopCallback;
impl TaskCallback for NoopCallback {}

pub struct Task {
    pub id: String,
    pub task_type: String,
    pub tenant_id: String,
    pub payload: Vec<u8>,
    pub cancellation: CancellationToken,
    pub callback: Arc<dyn TaskCallback>,
    /// Upper bound on how long this task's execution may run, derived at
    /// submission from the submitter's requested deadline clamped to the
    /// pool's own ceiling — whichever is shorter.
    pub timeout: Duration,
    /// `Queued` until the dispatcher hands the task to an executor, then
    /// `Running` until it resolves. A timeout or panic never updates this
    /// — the task value itself is gone by the time `run_task` learns of
    /// either, so those two outcomes are reported purely via `callback`.
    status: AtomicU8,
    /// Released on drop, from whichever path (completion, failure, dispatch
    /// timeout) ends up dropping the task last — `QuotaLease::finalize` is
    /// idempotent, so this is the single decrement point regardless of how
    /// the task ends.
    quota_lease: Option<QuotaLease>,
}

impl Task {
    pub fn new(
        id: String,
        task_type: String,
        tenant_id: String,
        payload: Vec<u8>,
        cancellation: CancellationToken,
        callback: Arc<dyn TaskCallback>,
        timeout: Duration,
        quota_lease: Option<QuotaLease>,
    ) -> Self {
        Self {
            id,
            task_type,
            tenant_id,
            payload,
            cancellation,
            callback,
            timeout,
            status: AtomicU8::new(TaskStatus::Queued as u8),
            quota_lease,
        }
    }

    pub fn set_status(&self, status: TaskStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}
