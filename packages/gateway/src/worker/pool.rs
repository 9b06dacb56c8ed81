//! Bounded worker pool: a dispatcher loop bridging a queue of `Task`s to a
//! capped number of concurrently running executors.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{GatewayError, Result};
use crate::quota::QuotaLease;

use super::executor::TaskExecutor;
use super::task::{Task, TaskCallback, TaskStatus};

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub max_workers: usize,
    pub idle_wait: Duration,
    pub task_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            idle_wait: Duration::from_secs(10),
            task_timeout: Duration::from_secs(5 * 60),
        }
    }
}

pub struct WorkerPool {
    config: WorkerPoolConfig,
    executors: DashMap<String, Arc<dyn TaskExecutor>>,
    permits: Arc<Semaphore>,
    task_tx: mpsc::Sender<Task>,
    shutdown: CancellationToken,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> Arc<Self> {
        let (task_tx, task_rx) = mpsc::channel(config.max_workers * 2);
        let pool = Arc::new(Self {
            permits: Arc::new(Semaphore::new(config.max_workers)),
            executors: DashMap::new(),
            task_tx,
            shutdown: CancellationToken::new(),
            dispatcher: Mutex::new(None),
            config,
        });

        let handle = Arc::clone(&pool).spawn_dispatcher(task_rx);
        *pool.dispatcher.lock() = Some(handle);
        pool
    }

    pub fn register_executor(&self, task_type: impl Into<String>, executor: Arc<dyn TaskExecutor>) {
        self.executors.insert(task_type.into(), executor);
    }

    /// Enqueue a task. Non-blocking: the only way `submit` itself fails is
    /// a full queue. An unregistered `task_type` is *not* rejected here —
    /// the dispatcher discovers that once the task reaches the front of
    /// the queue and reports it to `callback.on_error` there, so a success
    /// return from `submit` always implies exactly one terminal callback.
    ///
    /// `quota_lease` is whatever reservation the caller already holds for
    /// this `(tenant_id, task_type)` pair. Admission control — deciding
    /// whether a tenant over quota should be rejected — is the caller's
    /// concern; `WorkerPool` only consults the lease at completion,
    /// timeout, or panic, releasing it via `QuotaLease::finalize`/`Drop`.
    /// `deadline` caps how long the eventual run may take, clamped to the
    /// pool's own `task_timeout` ceiling — whichever is shorter wins.
    pub fn submit(
        &self,
        task_type: &str,
        tenant_id: &str,
        payload: Vec<u8>,
        callback: Arc<dyn TaskCallback>,
        deadline: Option<Duration>,
        quota_lease: Option<QuotaLease>,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let effective_timeout = match deadline {
            Some(requested) if requested < self.config.task_timeout => requested,
            _ => self.config.task_timeout,
        };
        let cancellation = self.shutdown.child_token();

        let task = Task::new(
            id.clone(),
            task_type.to_string(),
            tenant_id.to_string(),
            payload,
            cancellation,
            callback,
            effective_timeout,
            quota_lease,
        );

        self.task_tx
            .try_send(task)
            .map_err(|_| GatewayError::QueueFull)?;

        Ok(id)
    }

    pub async fn close(&self) {
        self.shutdown.cancel();
        if let Some(handle) = self.dispatcher.lock().take() {
            handle.abort();
        }
    }

    fn spawn_dispatcher(self: Arc<Self>, mut task_rx: mpsc::Receiver<Task>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(task) = task_rx.recv().await {
                if self.shutdown.is_cancelled() {
                    break;
                }

                if !self.executors.contains_key(&task.task_type) {
                    task.callback.on_error(&GatewayError::NoExecutor(task.task_type.clone()));
                    continue;
                }

                let permit = match tokio::time::timeout(self.config.idle_wait, Arc::clone(&self.permits).acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    _ => {
                        task.callback.on_error(&GatewayError::NoWorkers);
                        continue;
                    }
                };

                let executors = self.executors.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    run_task(task, executors).await;
                });
            }
        })
    }
}

async fn run_task(mut task: Task, executors: DashMap<String, Arc<dyn TaskExecutor>>) {
    task.set_status(TaskStatus::Running);
    let task_timeout = task.timeout;

    let executor = match executors.get(&task.task_type) {
        Some(entry) => entry.value().clone(),
        None => {
            task.set_status(TaskStatus::Failed);
            task.callback.on_error(&GatewayError::NoExecutor(task.task_type.clone()));
            return;
        }
    };

    let callback = Arc::clone(&task.callback);
    let task_id = task.id.clone();
    let cancellation = task.cancellation.clone();

    let exec_handle = tokio::spawn(async move {
        let outcome = executor.execute(&mut task).await;
        (task, outcome)
    });

    match tokio::time::timeout(task_timeout, exec_handle).await {
        Ok(Ok((task, Ok(())))) => {
            task.set_status(TaskStatus::Completed);
            callback.on_done(&task_id);
        }
        Ok(Ok((task, Err(err)))) => {
            task.set_status(TaskStatus::Failed);
            callback.on_error(&err);
        }
        Ok(Err(join_err)) => {
            let detail = if join_err.is_panic() {
                format!("task {} panicked during execution", task_id)
            } else {
                format!("task {} was cancelled before completion", task_id)
            };
            callback.on_error(&GatewayError::TaskPanic(detail));
        }
        Err(_elapsed) => {
            cancellation.cancel();
            callback.on_error(&GatewayError::TaskTimeout(task_id.clone()));
        }
    }
}
