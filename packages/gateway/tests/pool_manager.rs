use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use voxgate_core::{
    AsrProvider, FactoryRegistry, GatewayError, HealthCheckConfig, LlmProvider, Message, PoolManager, ProviderFactory,
    TextStream, TtsProvider,
};

#[derive(Debug)]
struct StubAsr;
#[async_trait]
impl AsrProvider for StubAsr {
    async fn transcribe(&self, _audio_bytes: &[u8]) -> voxgate_core::Result<String> {
        Ok("transcript".to_string())
    }
}
struct StubAsrFactory;
#[async_trait]
impl ProviderFactory<dyn AsrProvider> for StubAsrFactory {
    async fn create(&self) -> voxgate_core::Result<Arc<dyn AsrProvider>> {
        Ok(Arc::new(StubAsr))
    }
}

#[derive(Debug)]
struct StubLlm;
#[async_trait]
impl LlmProvider for StubLlm {
    async fn respond(&self, _session_id: &str, _messages: &[Message]) -> voxgate_core::Result<TextStream> {
        let stream: TextStream = Box::pin(tokio_stream::iter(vec![Ok("hi".to_string())]));
        Ok(stream)
    }
}
struct StubLlmFactory;
#[async_trait]
impl ProviderFactory<dyn LlmProvider> for StubLlmFactory {
    async fn create(&self) -> voxgate_core::Result<Arc<dyn LlmProvider>> {
        Ok(Arc::new(StubLlm))
    }
}

#[derive(Debug)]
struct StubTts;
#[async_trait]
impl TtsProvider for StubTts {
    async fn synthesize(&self, _text: &str) -> voxgate_core::Result<String> {
        Ok("/tmp/out.wav".to_string())
    }
}
struct StubTtsFactory;
#[async_trait]
impl ProviderFactory<dyn TtsProvider> for StubTtsFactory {
    async fn create(&self) -> voxgate_core::Result<Arc<dyn TtsProvider>> {
        Ok(Arc::new(StubTts))
    }
}

struct AlwaysFailAsrFactory;
#[async_trait]
impl ProviderFactory<dyn AsrProvider> for AlwaysFailAsrFactory {
    async fn create(&self) -> voxgate_core::Result<Arc<dyn AsrProvider>> {
        Err(GatewayError::CreateFailed("asr backend down".to_string()))
    }
}

fn registry_with_required_kinds() -> FactoryRegistry {
    let registry = FactoryRegistry::new();
    registry.register_asr(Arc::new(StubAsrFactory));
    registry.register_llm(Arc::new(StubLlmFactory));
    registry.register_tts(Arc::new(StubTtsFactory));
    registry
}

fn fast_health_config() -> HealthCheckConfig {
    HealthCheckConfig {
        enabled: true,
        timeout: Duration::from_secs(1),
        retry_attempts: 1,
        retry_delay: Duration::from_millis(10),
        ..HealthCheckConfig::default()
    }
}

#[tokio::test]
async fn build_succeeds_with_required_kinds_healthy() {
    let registry = registry_with_required_kinds();
    let manager = PoolManager::build(&registry, fast_health_config()).await.unwrap();

    let stats = manager.stats();
    assert!(stats.contains_key(&voxgate_core::ProviderKind::Asr));
    assert!(stats.contains_key(&voxgate_core::ProviderKind::Llm));
    assert!(stats.contains_key(&voxgate_core::ProviderKind::Tts));
    manager.close().await;
}

#[tokio::test]
async fn build_fails_when_required_kind_health_check_fails() {
    let registry = FactoryRegistry::new();
    registry.register_asr(Arc::new(AlwaysFailAsrFactory));
    registry.register_llm(Arc::new(StubLlmFactory));
    registry.register_tts(Arc::new(StubTtsFactory));

    let result = PoolManager::build(&registry, fast_health_config()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn acquire_and_release_round_trip() {
    let registry = registry_with_required_kinds();
    let manager = PoolManager::build(&registry, fast_health_config()).await.unwrap();

    let set = manager.acquire().await.unwrap();
    assert!(set.asr.is_some());
    assert!(set.llm.is_some());
    assert!(set.tts.is_some());
    assert!(set.vlllm.is_none());
    assert!(set.mcp.is_none());

    manager.release(set).await;
    let stats = manager.stats();
    let asr_stats = stats.get(&voxgate_core::ProviderKind::Asr).unwrap();
    assert_eq!(asr_stats.in_use(), 0);

    manager.close().await;
}
