//! `ResourcePool<P>`: a self-replenishing bounded population of one provider
//! kind.
//!
//! `current_size` counts every instance currently alive and owned by the
//! pool — idle in `available` or checked out by a caller — never instances
//! that have been destroyed. This is the total-population reading of the
//! Data Model ("Counts instances the pool believes exist (idle + handed
//! out)"); see DESIGN.md for why this crate departs from the alternative
//! "idle-only" counter discipline the source's `get`/`put` pairing
//! suggests. Either discipline keeps the core invariant
//! `0 <= available.len() <= current_size <= max_size`; this one also keeps
//! `max_size` meaning what the pool exists to provide — a hard ceiling on
//! concurrently alive, expensive, network-bound provider instances.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::error::{GatewayError, Result};
use crate::provider::{ProviderFactory, ProviderKind};

/// Tunables for one `ResourcePool`.
#[derive(Debug, Clone)]
pub struct ResourcePoolConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub refill_threshold: usize,
    pub check_interval: Duration,
}

impl ResourcePoolConfig {
    /// Defaults used by `PoolManager` for provider pools (spec §4.4).
    pub fn provider_default() -> Self {
        Self {
            min_size: 5,
            max_size: 20,
            refill_threshold: 3,
            check_interval: Duration::from_secs(30),
        }
    }

    /// Defaults used by `PoolManager` for the tool-call (MCP) pool (spec §4.4).
    pub fn mcp_default() -> Self {
        Self {
            min_size: 2,
            max_size: 20,
            refill_threshold: 1,
            check_interval: Duration::from_secs(30),
        }
    }
}

/// Point-in-time view of a pool's population, for `PoolManager::stats`.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub available: usize,
    pub total: usize,
    pub max: usize,
    pub min: usize,
}

impl PoolStats {
    pub fn in_use(&self) -> usize {
        self.total.saturating_sub(self.available)
    }
}

pub struct ResourcePool<P: ?Sized> {
    kind: ProviderKind,
    factory: Arc<dyn ProviderFactory<P>>,
    available: Mutex<VecDeque<Arc<P>>>,
    current_size: AtomicUsize,
    closed: AtomicBool,
    config: ResourcePoolConfig,
    maintainer: Mutex<Option<JoinHandle<()>>>,
}

impl<P: ?Sized + Send + Sync + 'static> ResourcePool<P> {
    /// Build a pool: create `min_size` instances up front (destroying any
    /// partial population and failing if one creation errors), then start
    /// the background maintainer.
    pub async fn new(
        kind: ProviderKind,
        factory: Arc<dyn ProviderFactory<P>>,
        config: ResourcePoolConfig,
    ) -> Result<Arc<Self>> {
        let mut seed = Vec::with_capacity(config.min_size);
        for _ in 0..config.min_size {
            match factory.create().await {
                Ok(instance) => seed.push(instance),
                Err(err) => {
                    for instance in seed {
                        let _ = factory.destroy(instance).await;
                    }
                    return Err(err);
                }
            }
        }

        let current_size = seed.len();
        let pool = Arc::new(Self {
            kind,
            factory,
            available: Mutex::new(seed.into()),
            current_size: AtomicUsize::new(current_size),
            closed: AtomicBool::new(false),
            config,
            maintainer: Mutex::new(None),
        });

        let handle = Arc::clone(&pool).spawn_maintainer();
        *pool.maintainer.lock() = Some(handle);
        Ok(pool)
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn config(&self) -> &ResourcePoolConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.lock().len(),
            total: self.current_size.load(Ordering::Acquire),
            max: self.config.max_size,
            min: self.config.min_size,
        }
    }

    /// Non-blocking: serve an idle instance if one exists; otherwise mint
    /// one if under `max_size`; otherwise fail with `PoolExhausted`.
    pub async fn get(&self) -> Result<Arc<P>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::PoolClosed(self.kind));
        }

        if let Some(instance) = self.available.lock().pop_front() {
            return Ok(instance);
        }

        // Reserve a creation slot under the counter, never holding the
        // counter lock across the factory call itself.
        loop {
            let current = self.current_size.load(Ordering::Acquire);
            if current >= self.config.max_size {
                return Err(GatewayError::PoolExhausted(self.kind));
            }
            if self
                .current_size
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        match self.factory.create().await {
            Ok(instance) => {
                if self.closed.load(Ordering::Acquire) {
                    self.current_size.fetch_sub(1, Ordering::AcqRel);
                    let _ = self.factory.destroy(instance).await;
                    return Err(GatewayError::PoolClosed(self.kind));
                }
                Ok(instance)
            }
            Err(err) => {
                self.current_size.fetch_sub(1, Ordering::AcqRel);
                Err(err)
            }
        }
    }

    /// Return an instance. If the pool is closed, or the idle buffer is
    /// full after a bounded wait, the instance is destroyed instead of
    /// enqueued — a normal shrink path, not an error.
    pub async fn put(&self, instance: Arc<P>) {
        if self.closed.load(Ordering::Acquire) {
            self.destroy_and_shrink(instance).await;
            return;
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            {
                let mut available = self.available.lock();
                if available.len() < self.config.max_size {
                    available.push_back(instance);
                    return;
                }
            }
            if self.closed.load(Ordering::Acquire) || tokio::time::Instant::now() >= deadline {
                self.destroy_and_shrink(instance).await;
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Destroy `instance` and, if it was actually counted in `current_size`,
    /// shrink the counter. An instance `put()` back that never went through
    /// `get()` (e.g. minted outside this pool) is never counted, so this
    /// must not blindly decrement — doing so would let `current_size` drop
    /// below `available.len()`, breaking the pool's own invariant `0 <=
    /// available.len() <= current_size <= max_size`.
    async fn destroy_and_shrink(&self, instance: Arc<P>) {
        if let Err(err) = self.factory.destroy(instance).await {
            log::warn!("{} pool: destroy failed during put/close: {}", self.kind, err);
        }
        let idle = self.available.lock().len();
        let _ = self
            .current_size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(if current > idle { current - 1 } else { current })
            });
    }

    /// Invoke the factory's reset capability if offered; no-op otherwise.
    pub async fn reset(&self, instance: &Arc<P>) -> Result<()> {
        if self.factory.reset_supported() {
            self.factory.reset(instance).await
        } else {
            Ok(())
        }
    }

    /// Cancel the maintainer, stop serving new instances, and destroy every
    /// idle instance. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.maintainer.lock().take() {
            handle.abort();
        }
        let drained: Vec<_> = self.available.lock().drain(..).collect();
        for instance in drained {
            self.destroy_and_shrink(instance).await;
        }
    }

    fn spawn_maintainer(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.check_interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if self.closed.load(Ordering::Acquire) {
                    break;
                }
                self.maintain().await;
            }
        })
    }

    async fn maintain(&self) {
        let deficit = {
            let current = self.current_size.load(Ordering::Acquire);
            self.config.refill_threshold.saturating_sub(current)
        };
        for _ in 0..deficit {
            if self.closed.load(Ordering::Acquire) {
                break;
            }
            loop {
                let current = self.current_size.load(Ordering::Acquire);
                if current >= self.config.max_size {
                    return;
                }
                if self
                    .current_size
                    .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    break;
                }
            }
            match self.factory.create().await {
                Ok(instance) => {
                    if self.closed.load(Ordering::Acquire) {
                        self.current_size.fetch_sub(1, Ordering::AcqRel);
                        let _ = self.factory.destroy(instance).await;
                        break;
                    }
                    self.available.lock().push_back(instance);
                }
                Err(err) => {
                    self.current_size.fetch_sub(1, Ordering::AcqRel);
                    log::warn!("{} pool: maintainer failed to create instance: {}", self.kind, err);
                }
            }
        }
    }
}

impl<P: ?Sized> Drop for ResourcePool<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.maintainer.lock().take() {
            handle.abort();
        }
    }
}
