//! Resource and task orchestration for a multi-tenant voice-assistant
//! gateway: bounded provider pools, pre-flight health checking, and a
//! quota-gated worker pool for dispatching per-tenant tasks.

pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod pool;
pub mod provider;
pub mod quota;
pub mod worker;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use health::{CheckMode, HealthCheckConfig, HealthChecker, HealthResult};
pub use pool::{PoolManager, PoolStats, ResourcePool, ResourcePoolConfig};
pub use provider::{
    AnyFactory, AsrProvider, FactoryRegistry, LlmProvider, McpProvider, Message, ProviderFactory, ProviderKind,
    ProviderSet, TextStream, TtsProvider, VlllmProvider,
};
pub use quota::{ClientManager, QuotaLease, TenantQuota};
pub use worker::{NoopCallback, Task, TaskCallback, TaskExecutor, TaskStatus, WorkerPool, WorkerPoolConfig};
