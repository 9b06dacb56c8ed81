//! Pre-flight validation of every configured provider kind, with bounded
//! retry, before any pool opens for traffic.

use std::path::PathBuf;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::provider::factory::AnyFactory;
use crate::provider::{Message, ProviderKind};

use super::synthetic::{one_by_one_png, synthetic_pcm_100ms_440hz};

/// `BasicCheck` succeeds iff `factory.create()` succeeds (with retry), then
/// immediately destroys the instance. `FunctionalCheck` additionally runs
/// one representative live call through a kind-specific sanity predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Basic,
    Functional,
}

#[derive(Debug, Clone)]
pub struct TestModes {
    pub asr_test_audio: Option<PathBuf>,
    pub llm_test_prompt: String,
    pub tts_test_text: String,
}

impl Default for TestModes {
    fn default() -> Self {
        Self {
            asr_test_audio: None,
            llm_test_prompt: "ping".to_string(),
            tts_test_text: "hello".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    pub enabled: bool,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub test_modes: TestModes,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
            test_modes: TestModes::default(),
        }
    }
}

/// Per-kind outcome, retained for diagnostics.
#[derive(Debug, Clone)]
pub struct HealthResult {
    pub ok: bool,
    pub duration: Duration,
    pub mode: CheckMode,
    pub details: String,
    pub error: Option<String>,
}

pub struct HealthChecker {
    config: HealthCheckConfig,
    results: DashMap<ProviderKind, HealthResult>,
}

impl HealthChecker {
    pub fn new(config: HealthCheckConfig) -> Self {
        Self {
            config,
            results: DashMap::new(),
        }
    }

    pub fn report(&self) -> std::collections::HashMap<ProviderKind, HealthResult> {
        self.results.iter().map(|e| (*e.key(), e.value().clone())).collect()
    }

    /// Run the configured mode against every factory in `factories`.
    /// Returns `Err` (the detail of the first failing *required* kind) as
    /// soon as a required kind exhausts its retries; optional kinds are
    /// downgraded to a warning and do not fail the overall check.
    pub async fn run_all(
        &self,
        factories: &[AnyFactory],
        mode: CheckMode,
        cancellation: &CancellationToken,
    ) -> Result<(), (ProviderKind, String)> {
        for factory in factories {
            let kind = factory.kind();
            let result = self.run_one(factory, mode, cancellation).await;
            let failed_detail = if result.ok { None } else { result.error.clone() };
            self.results.insert(kind, result);

            if let Some(detail) = failed_detail {
                if kind.is_optional() {
                    log::warn!("health check for optional provider {} failed: {}", kind, detail);
                } else {
                    log::error!("health check for required provider {} failed: {}", kind, detail);
                    return Err((kind, detail));
                }
            }
        }
        Ok(())
    }

    async fn run_one(
        &self,
        factory: &AnyFactory,
        mode: CheckMode,
        cancellation: &CancellationToken,
    ) -> HealthResult {
        let start = tokio::time::Instant::now();
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=self.config.retry_attempts {
            if cancellation.is_cancelled() {
                last_error = "cancelled".to_string();
                break;
            }

            let attempt_result =
                tokio::time::timeout(self.config.timeout, self.attempt(factory, mode)).await;

            match attempt_result {
                Ok(Ok(details)) => {
                    return HealthResult {
                        ok: true,
                        duration: start.elapsed(),
                        mode,
                        details,
                        error: None,
                    };
                }
                Ok(Err(err)) => last_error = err,
                Err(_) => last_error = format!("attempt timed out after {:?}", self.config.timeout),
            }

            if attempt < self.config.retry_attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.retry_delay) => {}
                    _ = cancellation.cancelled() => {
                        last_error = "cancelled during retry backoff".to_string();
                        break;
                    }
                }
            }
        }

        HealthResult {
            ok: false,
            duration: start.elapsed(),
            mode,
            details: String::new(),
            error: Some(last_error),
        }
    }

    async fn attempt(&self, factory: &AnyFactory, mode: CheckMode) -> Result<String, String> {
        match factory {
            AnyFactory::Asr(f) => {
                let instance = f.create().await.map_err(|e| e.to_string())?;
                let outcome = if mode == CheckMode::Functional {
                    let pcm = synthetic_pcm_100ms_440hz();
                    instance
                        .transcribe(&pcm)
                        .await
                        .map(|text| format!("asr probe returned {} chars", text.len()))
                        .map_err(|e| e.to_string())
                } else {
                    Ok("created".to_string())
                };
                let _ = f.destroy(instance).await;
                outcome
            }
            AnyFactory::Llm(f) => {
                let instance = f.create().await.map_err(|e| e.to_string())?;
                let outcome = if mode == CheckMode::Functional {
                    let messages = [Message {
                        role: "user".to_string(),
                        content: self.config.test_modes.llm_test_prompt.clone(),
                    }];
                    match instance.respond("health-check", &messages).await {
                        Ok(stream) => drain_and_check_len(stream).await,
                        Err(e) => Err(e.to_string()),
                    }
                } else {
                    Ok("created".to_string())
                };
                let _ = f.destroy(instance).await;
                outcome
            }
            AnyFactory::Tts(f) => {
                let instance = f.create().await.map_err(|e| e.to_string())?;
                let outcome = if mode == CheckMode::Functional {
                    instance
                        .synthesize(&self.config.test_modes.tts_test_text)
                        .await
                        .and_then(|path| {
                            if path.is_empty() {
                                Err(crate::error::GatewayError::HealthFailed {
                                    kind: ProviderKind::Tts,
                                    detail: "synthesize returned empty path".to_string(),
                                })
                            } else {
                                Ok(path)
                            }
                        })
                        .map(|path| format!("tts probe returned path {}", path))
                        .map_err(|e| e.to_string())
                } else {
                    Ok("created".to_string())
                };
                let _ = f.destroy(instance).await;
                outcome
            }
            AnyFactory::Vlllm(f) => {
                let instance = f.create().await.map_err(|e| e.to_string())?;
                let outcome = if mode == CheckMode::Functional {
                    let image = one_by_one_png();
                    match instance
                        .respond_with_image("health-check", &[], &image, "describe this image")
                        .await
                    {
                        Ok(stream) => drain_and_check_len(stream).await,
                        Err(e) => Err(e.to_string()),
                    }
                } else {
                    Ok("created".to_string())
                };
                let _ = f.destroy(instance).await;
                outcome
            }
            AnyFactory::Mcp(f) => {
                let instance = f.create().await.map_err(|e| e.to_string())?;
                let outcome = if mode == CheckMode::Functional {
                    instance.ping().await.map(|_| "mcp ping ok".to_string()).map_err(|e| e.to_string())
                } else {
                    Ok("created".to_string())
                };
                let _ = f.destroy(instance).await;
                outcome
            }
        }
    }
}

async fn drain_and_check_len(mut stream: crate::provider::TextStream) -> Result<String, String> {
    use tokio_stream::StreamExt;
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment.map_err(|e| e.to_string())?);
    }
    if text.is_empty() || text.len() > 10_000 {
        return Err(format!("response length {} out of bounds [1, 10000]", text.len()));
    }
    Ok(format!("probe returned {} chars", text.len()))
}
