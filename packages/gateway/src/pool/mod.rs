//! Bounded, self-replenishing provider pools and the manager that owns one
//! per configured kind.

pub mod manager;
pub mod resource_pool;

pub use manager::PoolManager;
pub use resource_pool::{PoolStats, ResourcePool, ResourcePoolConfig};
