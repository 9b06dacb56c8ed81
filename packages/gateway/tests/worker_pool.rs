use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use voxgate_core::{ClientManager, GatewayError, Task, TaskCallback, TaskExecutor, WorkerPool, WorkerPoolConfig};

struct RecordingCallback {
    done: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl TaskCallback for RecordingCallback {
    fn on_done(&self, _result: &str) {
        self.done.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_one();
    }

    fn on_error(&self, _error: &GatewayError) {
        self.errors.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_one();
    }
}

struct EchoExecutor;
#[async_trait]
impl TaskExecutor for EchoExecutor {
    async fn execute(&self, _task: &mut Task) -> voxgate_core::Result<()> {
        Ok(())
    }
}

struct PanickingExecutor;
#[async_trait]
impl TaskExecutor for PanickingExecutor {
    async fn execute(&self, _task: &mut Task) -> voxgate_core::Result<()> {
        panic!("executor blew up");
    }
}

struct SlowExecutor;
#[async_trait]
impl TaskExecutor for SlowExecutor {
    async fn execute(&self, _task: &mut Task) -> voxgate_core::Result<()> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    }
}

fn new_pool(max_workers: usize) -> Arc<WorkerPool> {
    let config = WorkerPoolConfig {
        max_workers,
        idle_wait: Duration::from_millis(200),
        task_timeout: Duration::from_secs(5 * 60),
    };
    WorkerPool::new(config)
}

#[tokio::test]
async fn submit_runs_task_and_invokes_on_done() {
    let pool = new_pool(2);
    pool.register_executor("echo", Arc::new(EchoExecutor));

    let notify = Arc::new(Notify::new());
    let done = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let callback = Arc::new(RecordingCallback {
        done: done.clone(),
        errors: errors.clone(),
        notify: notify.clone(),
    });

    pool.submit("echo", "tenant-a", vec![], callback, None, None).unwrap();
    notify.notified().await;

    assert_eq!(done.load(Ordering::Acquire), 1);
    assert_eq!(errors.load(Ordering::Acquire), 0);
}

#[tokio::test]
async fn submit_with_unknown_task_type_enqueues_then_reports_no_executor() {
    // submit() itself is not the gate for a missing executor — per spec
    // §4.5 step 1, the dispatcher discovers it post-enqueue and the task's
    // callback still fires exactly once, same as any other dispatch
    // failure.
    let pool = new_pool(2);
    let notify = Arc::new(Notify::new());
    let done = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let callback = Arc::new(RecordingCallback {
        done: done.clone(),
        errors: errors.clone(),
        notify: notify.clone(),
    });

    let id = pool.submit("unknown", "tenant-a", vec![], callback, None, None).unwrap();
    assert!(!id.is_empty());

    notify.notified().await;
    assert_eq!(errors.load(Ordering::Acquire), 1);
    assert_eq!(done.load(Ordering::Acquire), 0);
}

#[tokio::test]
async fn panicking_executor_reports_task_panic_not_a_crash() {
    let pool = new_pool(2);
    pool.register_executor("boom", Arc::new(PanickingExecutor));

    let notify = Arc::new(Notify::new());
    let done = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let callback = Arc::new(RecordingCallback {
        done: done.clone(),
        errors: errors.clone(),
        notify: notify.clone(),
    });

    pool.submit("boom", "tenant-a", vec![], callback, None, None).unwrap();
    notify.notified().await;

    assert_eq!(errors.load(Ordering::Acquire), 1);
    assert_eq!(done.load(Ordering::Acquire), 0);
}

#[tokio::test]
async fn submit_never_rejects_for_quota_admission_is_the_callers_job() {
    // WorkerPool no longer owns a ClientManager, so it cannot reject a
    // submission on quota grounds — both tasks enqueue and run regardless
    // of how tight a quota the caller's own ClientManager enforces.
    // Whether to call submit() at all is decided by the caller checking
    // ClientManager::acquire first, demonstrated below against the
    // ClientManager directly.
    let manager = ClientManager::new(1);
    let lease1 = manager.acquire("tenant-a", "slow").unwrap();
    let lease2 = manager.acquire("tenant-a", "slow");
    assert!(lease2.is_none(), "second acquire should be rejected by the caller's own quota check");
    lease1.finalize();

    let pool = new_pool(4);
    pool.register_executor("slow", Arc::new(SlowExecutor));

    let notify = Arc::new(Notify::new());
    let callback = Arc::new(RecordingCallback {
        done: Arc::new(AtomicUsize::new(0)),
        errors: Arc::new(AtomicUsize::new(0)),
        notify,
    });

    // Both submissions succeed at the WorkerPool layer even though the
    // second would have been rejected had the caller bothered to check.
    let lease_a = manager.track("tenant-a", "slow");
    let lease_b = manager.track("tenant-a", "slow");
    pool.submit("slow", "tenant-a", vec![], callback.clone(), None, Some(lease_a)).unwrap();
    pool.submit("slow", "tenant-a", vec![], callback, None, Some(lease_b)).unwrap();

    let (in_flight, _completed) = manager.stats("tenant-a", "slow");
    assert_eq!(in_flight, 2);
}

#[tokio::test]
async fn no_workers_available_within_dispatch_window() {
    // A single-worker pool with two slow tasks in flight: the third
    // submission's dispatch should time out waiting for an idle worker.
    let config = WorkerPoolConfig {
        max_workers: 1,
        idle_wait: Duration::from_millis(100),
        task_timeout: Duration::from_secs(5 * 60),
    };
    let pool = WorkerPool::new(config);
    pool.register_executor("slow", Arc::new(SlowExecutor));

    let notify = Arc::new(Notify::new());
    let errors = Arc::new(AtomicUsize::new(0));
    let callback = Arc::new(RecordingCallback {
        done: Arc::new(AtomicUsize::new(0)),
        errors: errors.clone(),
        notify: notify.clone(),
    });

    pool.submit("slow", "tenant-a", vec![], callback.clone(), None, None).unwrap();
    pool.submit("slow", "tenant-b", vec![], callback, None, None).unwrap();

    notify.notified().await;
    assert_eq!(errors.load(Ordering::Acquire), 1);
}
