//! Per-tenant, per-task-type concurrency accounting.
//!
//! Admission control (rejecting a tenant that is already at its limit) is
//! the caller's concern, not `WorkerPool`'s — a caller that wants it calls
//! `acquire` itself before submitting and maps `None` to its own rejection.
//! `WorkerPool` only ever calls `track`, which always succeeds, and releases
//! the resulting reservation exactly once per task via `QuotaLease::finalize`
//! — safe to call from more than one code path (normal completion, dispatch
//! timeout, panic) because the lease is idempotent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Per-(tenant, task type) counters. `max_in_flight` of `0` means
/// unlimited.
#[derive(Debug)]
pub struct TenantQuota {
    pub max_in_flight: u64,
    in_flight: AtomicU64,
    completed: AtomicU64,
}

impl TenantQuota {
    pub fn new(max_in_flight: u64) -> Self {
        Self {
            max_in_flight,
            in_flight: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> bool {
        if self.max_in_flight == 0 {
            self.in_flight.fetch_add(1, Ordering::AcqRel);
            return true;
        }
        loop {
            let current = self.in_flight.load(Ordering::Acquire);
            if current >= self.max_in_flight {
                return false;
            }
            if self
                .in_flight
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Unconditionally record one more in-flight task, bypassing
    /// `max_in_flight`. Used for bookkeeping once a caller has already
    /// decided to admit the task; limit enforcement belongs to `try_acquire`
    /// alone.
    fn track(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.completed.fetch_add(1, Ordering::AcqRel);
    }
}

/// Handle returned by `ClientManager::acquire`/`track`, carrying the
/// `finalized` guard that makes `QuotaLease::finalize` idempotent regardless
/// of which code path (completion, timeout, panic) calls it.
pub struct QuotaLease {
    quota: Arc<TenantQuota>,
    finalized: AtomicBool,
}

impl QuotaLease {
    /// Release the reservation. Safe to call more than once; only the
    /// first call has any effect.
    pub fn finalize(&self) {
        if !self.finalized.swap(true, Ordering::AcqRel) {
            self.quota.release();
        }
    }
}

impl Drop for QuotaLease {
    fn drop(&mut self) {
        self.finalize();
    }
}

#[derive(Default)]
pub struct ClientManager {
    quotas: DashMap<(String, String), Arc<TenantQuota>>,
    default_max_in_flight: u64,
}

impl ClientManager {
    pub fn new(default_max_in_flight: u64) -> Self {
        Self {
            quotas: DashMap::new(),
            default_max_in_flight,
        }
    }

    fn quota_for(&self, tenant_id: &str, task_type: &str) -> Arc<TenantQuota> {
        self.quotas
            .entry((tenant_id.to_string(), task_type.to_string()))
            .or_insert_with(|| Arc::new(TenantQuota::new(self.default_max_in_flight)))
            .clone()
    }

    /// Reserve one in-flight slot for `(tenant_id, task_type)` if the
    /// tenant is under its limit. This is the admission-control primitive:
    /// callers that want to reject tenants over quota call this themselves
    /// before submitting; `WorkerPool` does not call it.
    pub fn acquire(&self, tenant_id: &str, task_type: &str) -> Option<QuotaLease> {
        let quota = self.quota_for(tenant_id, task_type);
        if quota.try_acquire() {
            Some(QuotaLease {
                quota,
                finalized: AtomicBool::new(false),
            })
        } else {
            None
        }
    }

    /// Unconditionally record one in-flight task for `(tenant_id,
    /// task_type)`, ignoring `max_in_flight`. `WorkerPool::submit` uses this
    /// for dispatch/completion bookkeeping; it never gates admission.
    pub fn track(&self, tenant_id: &str, task_type: &str) -> QuotaLease {
        let quota = self.quota_for(tenant_id, task_type);
        quota.track();
        QuotaLease {
            quota,
            finalized: AtomicBool::new(false),
        }
    }

    pub fn stats(&self, tenant_id: &str, task_type: &str) -> (u64, u64) {
        let quota = self.quota_for(tenant_id, task_type);
        (quota.in_flight(), quota.completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_respects_max_in_flight() {
        let manager = ClientManager::new(0);
        let lease1 = manager.acquire("tenant-a", "asr");
        assert!(lease1.is_some());
    }

    #[test]
    fn bounded_quota_rejects_past_limit() {
        let manager = ClientManager::new(1);
        let lease1 = manager.acquire("tenant-a", "asr");
        assert!(lease1.is_some());
        let lease2 = manager.acquire("tenant-a", "asr");
        assert!(lease2.is_none());
        lease1.unwrap().finalize();
        let lease3 = manager.acquire("tenant-a", "asr");
        assert!(lease3.is_some());
    }

    #[test]
    fn track_bypasses_max_in_flight() {
        let manager = ClientManager::new(1);
        let _lease1 = manager.track("tenant-a", "asr");
        let _lease2 = manager.track("tenant-a", "asr");
        let (in_flight, _completed) = manager.stats("tenant-a", "asr");
        assert_eq!(in_flight, 2);
    }

    #[test]
    fn finalize_is_idempotent() {
        let manager = ClientManager::new(1);
        let lease = manager.acquire("tenant-a", "llm").unwrap();
        lease.finalize();
        lease.finalize();
        let (in_flight, completed) = manager.stats("tenant-a", "llm");
        assert_eq!(in_flight, 0);
        assert_eq!(completed, 1);
    }
}
