//! Owns at most one `ResourcePool` per configured provider kind and wires
//! the construction-time health gate in front of them (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{GatewayError, Result};
use crate::health::{CheckMode, HealthCheckConfig, HealthChecker};
use crate::provider::factory::{AnyFactory, FactoryRegistry};
use crate::provider::{AsrProvider, LlmProvider, McpProvider, ProviderKind, ProviderSet, TtsProvider, VlllmProvider};

use super::resource_pool::{PoolStats, ResourcePool, ResourcePoolConfig};

pub struct PoolManager {
    asr: Option<Arc<ResourcePool<dyn AsrProvider>>>,
    llm: Option<Arc<ResourcePool<dyn LlmProvider>>>,
    tts: Option<Arc<ResourcePool<dyn TtsProvider>>>,
    vlllm: Option<Arc<ResourcePool<dyn VlllmProvider>>>,
    mcp: Option<Arc<ResourcePool<dyn McpProvider>>>,
}

impl PoolManager {
    /// Run a functional health check over every registered factory (total
    /// deadline `3 * health_config.timeout`), then build one pool per
    /// configured kind. Fails if the health gate fails for any required
    /// kind (ASR, LLM, TTS) or times out overall; a missing or failing
    /// optional kind (VLLLM, MCP) is logged and skipped.
    pub async fn build(registry: &FactoryRegistry, health_config: HealthCheckConfig) -> Result<Self> {
        let factories: Vec<AnyFactory> = ProviderKind::ALL
            .iter()
            .filter_map(|kind| registry.get(*kind))
            .collect();

        let deadline = health_config.timeout * 3;
        let checker = HealthChecker::new(health_config);
        let token = CancellationToken::new();

        match tokio::time::timeout(deadline, checker.run_all(&factories, CheckMode::Functional, &token)).await {
            Ok(Ok(())) => {}
            Ok(Err((kind, detail))) => return Err(GatewayError::HealthFailed { kind, detail }),
            Err(_) => {
                token.cancel();
                return Err(GatewayError::Config(format!(
                    "health check deadline of {:?} exceeded",
                    deadline
                )));
            }
        }

        let mut manager = Self {
            asr: None,
            llm: None,
            tts: None,
            vlllm: None,
            mcp: None,
        };

        if let Some(AnyFactory::Asr(factory)) = registry.get(ProviderKind::Asr) {
            manager.asr = Some(ResourcePool::new(ProviderKind::Asr, factory, ResourcePoolConfig::provider_default()).await?);
        }
        if let Some(AnyFactory::Llm(factory)) = registry.get(ProviderKind::Llm) {
            manager.llm = Some(ResourcePool::new(ProviderKind::Llm, factory, ResourcePoolConfig::provider_default()).await?);
        }
        if let Some(AnyFactory::Tts(factory)) = registry.get(ProviderKind::Tts) {
            manager.tts = Some(ResourcePool::new(ProviderKind::Tts, factory, ResourcePoolConfig::provider_default()).await?);
        }
        if let Some(AnyFactory::Vlllm(factory)) = registry.get(ProviderKind::Vlllm) {
            match ResourcePool::new(ProviderKind::Vlllm, factory, ResourcePoolConfig::provider_default()).await {
                Ok(pool) => manager.vlllm = Some(pool),
                Err(err) => log::warn!("vlllm pool construction failed, proceeding without it: {}", err),
            }
        }
        if let Some(AnyFactory::Mcp(factory)) = registry.get(ProviderKind::Mcp) {
            match ResourcePool::new(ProviderKind::Mcp, factory, ResourcePoolConfig::mcp_default()).await {
                Ok(pool) => manager.mcp = Some(pool),
                Err(err) => log::warn!("mcp pool construction failed, proceeding without it: {}", err),
            }
        }

        Ok(manager)
    }

    /// Acquire one instance from each configured pool. A required kind's
    /// failure unwinds every already-acquired instance before returning the
    /// error; an optional kind's failure merely leaves that slot empty.
    pub async fn acquire(&self) -> Result<ProviderSet> {
        let mut set = ProviderSet::default();

        if let Some(pool) = &self.asr {
            match pool.get().await {
                Ok(instance) => set.asr = Some(instance),
                Err(err) => {
                    self.release(set).await;
                    return Err(err);
                }
            }
        }
        if let Some(pool) = &self.llm {
            match pool.get().await {
                Ok(instance) => set.llm = Some(instance),
                Err(err) => {
                    self.release(set).await;
                    return Err(err);
                }
            }
        }
        if let Some(pool) = &self.tts {
            match pool.get().await {
                Ok(instance) => set.tts = Some(instance),
                Err(err) => {
                    self.release(set).await;
                    return Err(err);
                }
            }
        }
        if let Some(pool) = &self.vlllm {
            match pool.get().await {
                Ok(instance) => set.vlllm = Some(instance),
                Err(err) => log::warn!("vlllm acquisition skipped: {}", err),
            }
        }
        if let Some(pool) = &self.mcp {
            match pool.get().await {
                Ok(instance) => set.mcp = Some(instance),
                Err(err) => log::warn!("mcp acquisition skipped: {}", err),
            }
        }

        Ok(set)
    }

    /// Reset and return every occupied slot to its pool, in fixed kind
    /// order. Reset failures are logged, not propagated: a provider that
    /// cannot clear its session state is still fit to sit idle and be
    /// reset again on its next `get`.
    pub async fn release(&self, mut set: ProviderSet) {
        if let (Some(pool), Some(instance)) = (&self.asr, set.asr.take()) {
            if let Err(err) = pool.reset(&instance).await {
                log::warn!("asr instance reset failed: {}", err);
            }
            pool.put(instance).await;
        }
        if let (Some(pool), Some(instance)) = (&self.llm, set.llm.take()) {
            if let Err(err) = pool.reset(&instance).await {
                log::warn!("llm instance reset failed: {}", err);
            }
            pool.put(instance).await;
        }
        if let (Some(pool), Some(instance)) = (&self.tts, set.tts.take()) {
            if let Err(err) = pool.reset(&instance).await {
                log::warn!("tts instance reset failed: {}", err);
            }
            pool.put(instance).await;
        }
        if let (Some(pool), Some(instance)) = (&self.vlllm, set.vlllm.take()) {
            if let Err(err) = pool.reset(&instance).await {
                log::warn!("vlllm instance reset failed: {}", err);
            }
            pool.put(instance).await;
        }
        if let (Some(pool), Some(instance)) = (&self.mcp, set.mcp.take()) {
            if let Err(err) = pool.reset(&instance).await {
                log::warn!("mcp instance reset failed: {}", err);
            }
            pool.put(instance).await;
        }
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.asr {
            pool.close().await;
        }
        if let Some(pool) = &self.llm {
            pool.close().await;
        }
        if let Some(pool) = &self.tts {
            pool.close().await;
        }
        if let Some(pool) = &self.vlllm {
            pool.close().await;
        }
        if let Some(pool) = &self.mcp {
            pool.close().await;
        }
    }

    pub fn stats(&self) -> HashMap<ProviderKind, PoolStats> {
        let mut out = HashMap::new();
        if let Some(pool) = &self.asr {
            out.insert(ProviderKind::Asr, pool.stats());
        }
        if let Some(pool) = &self.llm {
            out.insert(ProviderKind::Llm, pool.stats());
        }
        if let Some(pool) = &self.tts {
            out.insert(ProviderKind::Tts, pool.stats());
        }
        if let Some(pool) = &self.vlllm {
            out.insert(ProviderKind::Vlllm, pool.stats());
        }
        if let Some(pool) = &self.mcp {
            out.insert(ProviderKind::Mcp, pool.stats());
        }
        out
    }
}
