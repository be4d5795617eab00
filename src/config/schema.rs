//! Configuration schema definitions.
//!
//! This module defines the raw configuration structure for the AI subsystem.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the AI provider layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    /// Master switch for the OpenAI provider.
    pub enable_openai: bool,

    /// Master switch for the Claude provider.
    pub enable_claude: bool,

    /// Provider tried first when a request carries no override.
    pub default_provider: String,

    /// When false, only the first candidate is tried.
    pub enable_failover: bool,

    /// Record an `AttemptRecord` for every candidate tried.
    pub enable_usage_tracking: bool,

    /// Attach estimated cost to usage records.
    pub enable_cost_optimization: bool,

    /// Most recent attempt records kept in memory; older ones are evicted.
    pub usage_retention: usize,

    /// Period of the background health sampler, in minutes.
    pub health_check_interval_minutes: u64,

    /// Per-provider call timeout unless a provider overrides it.
    pub default_timeout_seconds: u64,

    /// Per-provider in-flight limit unless a provider overrides it.
    pub max_concurrent_requests: usize,

    /// Circuit breaker settings shared by all providers.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Provider definitions.
    pub providers: Vec<ProviderSettings>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enable_openai: true,
            enable_claude: true,
            default_provider: "openai".to_string(),
            enable_failover: true,
            enable_usage_tracking: true,
            enable_cost_optimization: true,
            usage_retention: 10_000,
            health_check_interval_minutes: 5,
            default_timeout_seconds: 30,
            max_concurrent_requests: 10,
            circuit_breaker: CircuitBreakerConfig::default(),
            providers: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Circuit breaker configuration.
///
/// Signed so that out-of-range values survive deserialization and can be
/// clamped with a warning instead of failing the load.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive breaker-relevant failures before opening (1..=100).
    pub failure_threshold: i64,

    /// Seconds an open breaker waits before admitting a trial (5..=300).
    pub timeout_seconds: i64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 30,
        }
    }
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// Provider identifier (e.g. "openai", "claude").
    pub id: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Failover order (lower = tried earlier).
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Credential handed to the adapter; never logged.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides `default_timeout_seconds`.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Overrides `max_concurrent_requests`.
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,

    /// Price used for usage cost estimates.
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
}

impl ProviderSettings {
    /// Minimal enabled entry with the given id and priority.
    pub fn new(id: impl Into<String>, priority: u32) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            priority,
            api_key: None,
            timeout_seconds: None,
            max_concurrent_requests: None,
            cost_per_1k_tokens: 0.0,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> u32 {
    100
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
