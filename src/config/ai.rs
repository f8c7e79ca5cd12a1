// src/config/ai.rs
use serde::Deserialize;
use std::{env, time::Duration};

fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[oracle]` section: which model scores items and how hard we may hit it.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Only "openai" is wired; anything else builds a disabled oracle.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY at build time.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Enables the token-bucket limiter when set.
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
    #[serde(default)]
    pub burst: Option<u32>,
}

fn default_true() -> bool {
    true
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            requests_per_minute: None,
            burst: None,
        }
    }
}

impl OracleConfig {
    pub(crate) fn sanitized(mut self) -> Self {
        self.provider = self.provider.trim().to_lowercase();
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.requests_per_minute = self.requests_per_minute.filter(|r| *r > 0);
        self
    }

    /// Resolve the key: literal value, or the provider's env var when set to "ENV".
    /// An empty string means no key is available.
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.trim().eq_ignore_ascii_case("env") {
            return self.api_key.trim().to_string();
        }
        match self.provider.as_str() {
            "openai" => env::var("OPENAI_API_KEY").unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// (refill per second, capacity) for the token bucket, if enabled.
    pub fn rate_limit(&self) -> Option<(f64, u32)> {
        let rpm = self.requests_per_minute?;
        let burst = self.burst.unwrap_or(rpm.min(5)).max(1);
        Some((rpm as f64 / 60.0, burst))
    }
}
