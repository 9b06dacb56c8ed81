//! `ProviderFactory`: the only place concrete provider types are known.
//!
//! Every other core component — `ResourcePool`, `HealthChecker`,
//! `PoolManager` — is polymorphic over the factory's capability trait and
//! never constructs a concrete provider itself.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{AsrProvider, LlmProvider, McpProvider, ProviderKind, TtsProvider, VlllmProvider};
use crate::error::Result;

/// Create/destroy surface for one concrete provider, uniquely determined by
/// `(kind, config, optional params)` in the caller's hands — the factory
/// itself is just the resulting value.
///
/// `create()` must be safe to call concurrently and must return a fully
/// usable instance (dialed, authenticated, initial state known); failures
/// are transient from the pool's perspective and never leak half-initialized
/// state (the pool simply drops the `Err` and never registers a handle).
///
/// `reset`/`cleanup` capability is carried here rather than probed
/// reflectively on the instance (spec §9): a factory that has nothing
/// meaningful to reset leaves `reset_supported` at its default `false` and
/// the pool treats `reset` as a no-op.
#[async_trait]
pub trait ProviderFactory<P: ?Sized + Send + Sync + 'static>: Send + Sync {
    /// Construct one fully usable instance.
    async fn create(&self) -> Result<Arc<P>>;

    /// Destroy one instance. Must be idempotent in effect: calling destroy
    /// twice on the same logical instance is at worst a wasted call.
    async fn destroy(&self, _instance: Arc<P>) -> Result<()> {
        Ok(())
    }

    /// Whether `reset` does anything beyond a no-op for this provider kind.
    fn reset_supported(&self) -> bool {
        false
    }

    /// Reset an instance's conversational/session state before it is
    /// returned to the idle pool. No-op unless `reset_supported()`.
    async fn reset(&self, _instance: &Arc<P>) -> Result<()> {
        Ok(())
    }
}

/// A factory for exactly one of the five provider kinds, carrying its
/// capability trait in the variant tag rather than behind a single erased
/// trait object — this is the "closed tagged variant" redesign from spec §9
/// applied to the factory registry itself.
#[derive(Clone)]
pub enum AnyFactory {
    Asr(Arc<dyn ProviderFactory<dyn AsrProvider>>),
    Llm(Arc<dyn ProviderFactory<dyn LlmProvider>>),
    Tts(Arc<dyn ProviderFactory<dyn TtsProvider>>),
    Vlllm(Arc<dyn ProviderFactory<dyn VlllmProvider>>),
    Mcp(Arc<dyn ProviderFactory<dyn McpProvider>>),
}

impl AnyFactory {
    pub fn kind(&self) -> ProviderKind {
        match self {
            AnyFactory::Asr(_) => ProviderKind::Asr,
            AnyFactory::Llm(_) => ProviderKind::Llm,
            AnyFactory::Tts(_) => ProviderKind::Tts,
            AnyFactory::Vlllm(_) => ProviderKind::Vlllm,
            AnyFactory::Mcp(_) => ProviderKind::Mcp,
        }
    }
}

/// Global registry of `(kind -> factory)`, populated by the surrounding
/// system before `PoolManager` construction (spec §6 "ProviderFactory
/// implementations ... registered into a global registry").
#[derive(Default)]
pub struct FactoryRegistry {
    factories: DashMap<ProviderKind, AnyFactory>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, factory: AnyFactory) {
        self.factories.insert(factory.kind(), factory);
    }

    pub fn register_asr(&self, factory: Arc<dyn ProviderFactory<dyn AsrProvider>>) {
        self.register(AnyFactory::Asr(factory));
    }

    pub fn register_llm(&self, factory: Arc<dyn ProviderFactory<dyn LlmProvider>>) {
        self.register(AnyFactory::Llm(factory));
    }

    pub fn register_tts(&self, factory: Arc<dyn ProviderFactory<dyn TtsProvider>>) {
        self.register(AnyFactory::Tts(factory));
    }

    pub fn register_vlllm(&self, factory: Arc<dyn ProviderFactory<dyn VlllmProvider>>) {
        self.register(AnyFactory::Vlllm(factory));
    }

    pub fn register_mcp(&self, factory: Arc<dyn ProviderFactory<dyn McpProvider>>) {
        self.register(AnyFactory::Mcp(factory));
    }

    pub fn get(&self, kind: ProviderKind) -> Option<AnyFactory> {
        self.factories.get(&kind).map(|entry| entry.value().clone())
    }

    pub fn configured_kinds(&self) -> Vec<ProviderKind> {
        self.factories.iter().map(|e| *e.key()).collect()
    }
}
