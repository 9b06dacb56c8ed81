//! Error taxonomy for the resource and task orchestration layer.

use crate::provider::ProviderKind;

/// Errors surfaced by `ResourcePool`, `PoolManager`, `HealthChecker`, and `WorkerPool`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Pool has reached `max_size` and has no idle instance to serve.
    #[error("pool exhausted for {0:?}")]
    PoolExhausted(ProviderKind),

    /// Pool has been closed and no longer serves instances.
    #[error("pool closed for {0:?}")]
    PoolClosed(ProviderKind),

    /// `ProviderFactory::create` failed.
    #[error("failed to create provider instance: {0}")]
    CreateFailed(String),

    /// Worker pool's bounded task queue was full at submission time.
    #[error("task queue full")]
    QueueFull,

    /// No executor registered for the task's type.
    #[error("no executor registered for task type {0:?}")]
    NoExecutor(String),

    /// Dispatcher waited 10s without an idle worker becoming available.
    #[error("no idle worker available within dispatch window")]
    NoWorkers,

    /// Tenant's in-flight quota for this task type is exhausted. Never
    /// constructed by `WorkerPool` itself — admission control is the
    /// caller's concern; this variant exists for callers that implement it
    /// against `ClientManager::acquire` and want a uniform error type.
    #[error("quota exceeded for tenant {tenant} task type {task_type}")]
    QuotaExceeded { tenant: String, task_type: String },

    /// Task's derived deadline elapsed before the executor returned.
    #[error("task timed out: {0}")]
    TaskTimeout(String),

    /// Task executor panicked.
    #[error("task panicked: {0}")]
    TaskPanic(String),

    /// Pre-flight health check failed for a required provider kind.
    #[error("health check failed for {kind:?}: {detail}")]
    HealthFailed {
        kind: ProviderKind,
        detail: String,
    },

    /// Configuration could not be loaded or was structurally invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error surfaced while writing a provider artifact (e.g. synthesized audio).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
