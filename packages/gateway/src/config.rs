//! TOML configuration, loaded the way the teacher's
//! `sweetmcp/packages/autoconfig/src/config.rs` loads its own: `serde`
//! deserialization plus `anyhow::Context`-wrapped I/O and parse errors.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::health::{HealthCheckConfig, TestModes};

#[derive(Debug, Deserialize)]
pub struct ProvidersConfig {
    pub asr: Option<String>,
    pub llm: Option<String>,
    pub tts: Option<String>,
    pub vlllm: Option<String>,
    pub mcp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthCheckSection {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(with = "humantime_serde", default = "default_health_timeout")]
    timeout: Duration,
    #[serde(default = "default_retry_attempts")]
    retry_attempts: u32,
    #[serde(with = "humantime_serde", default = "default_retry_delay")]
    retry_delay: Duration,
    #[serde(default)]
    test_modes: TestModesSection,
}

#[derive(Debug, Default, Deserialize)]
struct TestModesSection {
    asr_test_audio: Option<std::path::PathBuf>,
    llm_test_prompt: Option<String>,
    tts_test_text: Option<String>,
}

fn default_true() -> bool {
    true
}
fn default_health_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

impl From<HealthCheckSection> for HealthCheckConfig {
    fn from(section: HealthCheckSection) -> Self {
        let defaults = TestModes::default();
        Self {
            enabled: section.enabled,
            timeout: section.timeout,
            retry_attempts: section.retry_attempts,
            retry_delay: section.retry_delay,
            test_modes: TestModes {
                asr_test_audio: section.test_modes.asr_test_audio,
                llm_test_prompt: section.test_modes.llm_test_prompt.unwrap_or(defaults.llm_test_prompt),
                tts_test_text: section.test_modes.tts_test_text.unwrap_or(defaults.tts_test_text),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub providers: ProvidersConfig,
    #[serde(default = "default_health_check_section")]
    health_check: HealthCheckSection,
    #[serde(default)]
    pub pools: HashMap<String, toml::Value>,
}

fn default_health_check_section() -> HealthCheckSection {
    HealthCheckSection {
        enabled: true,
        timeout: default_health_timeout(),
        retry_attempts: default_retry_attempts(),
        retry_delay: default_retry_delay(),
        test_modes: TestModesSection::default(),
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn health_check_config(&self) -> HealthCheckConfig {
        HealthCheckConfig::from(HealthCheckSection {
            enabled: self.health_check.enabled,
            timeout: self.health_check.timeout,
            retry_attempts: self.health_check.retry_attempts,
            retry_delay: self.health_check.retry_delay,
            test_modes: TestModesSection {
                asr_test_audio: self.health_check.test_modes.asr_test_audio.clone(),
                llm_test_prompt: self.health_check.test_modes.llm_test_prompt.clone(),
                tts_test_text: self.health_check.test_modes.tts_test_text.clone(),
            },
        })
    }
}
