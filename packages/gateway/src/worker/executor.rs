//! Per-task-type execution logic, registered into a `WorkerPool`.

use async_trait::async_trait;

use crate::error::Result;

use super::task::Task;

/// Implemented once per task type (e.g. "transcribe", "respond",
/// "synthesize") and registered with `WorkerPool::register_executor`. The
/// executor owns resource acquisition (pulling from a `PoolManager`) for
/// the duration of `execute`.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &mut Task) -> Result<()>;
}
