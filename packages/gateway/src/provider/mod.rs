//! Provider kinds, capability traits, and the coherent per-session `ProviderSet`.
//!
//! The source this gateway is modeled on widens an opaque handle to a
//! capability interface with runtime type assertions. Here the kinds are a
//! closed tagged variant instead: each arm carries a strongly-typed `Arc<dyn
//! ...Provider>` and the factory registry is keyed by the tag directly, so no
//! runtime type test is ever needed beyond matching on `ProviderKind`.

pub mod factory;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::Stream;
use std::pin::Pin;

use crate::error::Result;

pub use factory::{AnyFactory, FactoryRegistry, ProviderFactory};

/// Closed enumeration of provider kinds the gateway can front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    Asr,
    Llm,
    Tts,
    Vlllm,
    Mcp,
}

impl ProviderKind {
    /// All kinds, in a stable order used for fixed-order traversal in
    /// `PoolManager::release` (spec: "visit slots in a fixed kind order").
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Asr,
        ProviderKind::Llm,
        ProviderKind::Tts,
        ProviderKind::Vlllm,
        ProviderKind::Mcp,
    ];

    /// VLLLM and MCP are optional; ASR/LLM/TTS are required once configured.
    pub fn is_optional(self) -> bool {
        matches!(self, ProviderKind::Vlllm | ProviderKind::Mcp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Asr => "asr",
            ProviderKind::Llm => "llm",
            ProviderKind::Tts => "tts",
            ProviderKind::Vlllm => "vlllm",
            ProviderKind::Mcp => "mcp",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazy stream of text fragments produced by LLM/VLLLM providers.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A single role-tagged message in a conversation history.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Speech recognition capability.
#[async_trait]
pub trait AsrProvider: Send + Sync + std::fmt::Debug {
    async fn transcribe(&self, audio_bytes: &[u8]) -> Result<String>;
}

/// Language model capability.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    async fn respond(&self, session_id: &str, messages: &[Message]) -> Result<TextStream>;
}

/// Text-to-speech capability.
#[async_trait]
pub trait TtsProvider: Send + Sync + std::fmt::Debug {
    async fn synthesize(&self, text: &str) -> Result<String>;
}

/// Vision-language model capability.
#[async_trait]
pub trait VlllmProvider: Send + Sync + std::fmt::Debug {
    async fn respond_with_image(
        &self,
        session_id: &str,
        history: &[Message],
        image: &[u8],
        prompt: &str,
    ) -> Result<TextStream>;
}

/// Opaque tool-call runtime handle. The core never inspects its contents;
/// it only creates, resets, and destroys instances through a factory.
#[async_trait]
pub trait McpProvider: Send + Sync + std::fmt::Debug {
    /// Lightweight connectivity probe used by `HealthChecker::BasicCheck`.
    async fn ping(&self) -> Result<()>;
}

/// One borrowed instance per configured kind, handed to a session for its
/// duration and released as a whole on disconnect.
#[derive(Default, Clone)]
pub struct ProviderSet {
    pub asr: Option<Arc<dyn AsrProvider>>,
    pub llm: Option<Arc<dyn LlmProvider>>,
    pub tts: Option<Arc<dyn TtsProvider>>,
    pub vlllm: Option<Arc<dyn VlllmProvider>>,
    pub mcp: Option<Arc<dyn McpProvider>>,
}

impl ProviderSet {
    pub fn is_empty(&self) -> bool {
        self.asr.is_none()
            && self.llm.is_none()
            && self.tts.is_none()
            && self.vlllm.is_none()
            && self.mcp.is_none()
    }
}
