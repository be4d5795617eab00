//! Configuration validation.
//!
//! # Responsibilities
//! - Resolve provider identifiers into the closed `ProviderId` set
//! - Clamp breaker settings into their supported ranges
//! - Disable providers without usable credentials
//! - Report every problem found, not just the first
//!
//! # Design Decisions
//! - Validation is a pure function: AiConfig → ValidatedConfig (+ warnings)
//! - Nothing here rejects a config; the AI subsystem is auxiliary and must
//!   never block startup

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::AiConfig;
use crate::provider::ProviderId;

pub const MIN_FAILURE_THRESHOLD: u32 = 1;
pub const MAX_FAILURE_THRESHOLD: u32 = 100;
pub const MIN_OPEN_TIMEOUT_SECS: u64 = 5;
pub const MAX_OPEN_TIMEOUT_SECS: u64 = 300;
pub const MIN_HEALTH_INTERVAL_MINUTES: u64 = 1;
pub const MAX_HEALTH_INTERVAL_MINUTES: u64 = 24 * 60;

/// A non-fatal configuration problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigWarning {
    #[error("no provider has valid credentials; AI features are disabled")]
    NoUsableProviders,

    #[error("unknown provider '{0}' ignored")]
    UnknownProvider(String),

    #[error("provider '{0}' configured more than once; keeping the first entry")]
    DuplicateProvider(ProviderId),

    #[error("provider '{0}' has no API key and was disabled")]
    MissingCredentials(ProviderId),

    #[error("circuit breaker failure threshold {value} out of range, using {clamped}")]
    FailureThresholdOutOfRange { value: i64, clamped: u32 },

    #[error("circuit breaker timeout {value}s out of range, using {clamped}s")]
    OpenTimeoutOutOfRange { value: i64, clamped: u64 },

    #[error("default provider '{0}' is not a known provider")]
    UnknownDefaultProvider(String),

    #[error("default provider '{0}' is not enabled")]
    DefaultProviderDisabled(ProviderId),

    #[error("provider '{0}' allows zero concurrent requests, using 1")]
    ZeroConcurrency(ProviderId),

    #[error("provider '{provider}' timeout of 0s replaced with {fallback_secs}s")]
    ZeroTimeout { provider: ProviderId, fallback_secs: u64 },

    #[error("provider '{0}' has a negative token price, using 0")]
    NegativeCost(ProviderId),

    #[error("health check interval of {value} minutes out of range, using {clamped}")]
    HealthIntervalOutOfRange { value: u64, clamped: u64 },
}

/// Resolved, immutable settings for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub enabled: bool,
    pub priority: u32,
    pub timeout: Duration,
    pub max_concurrent_requests: usize,
    pub cost_per_1k_tokens: f64,
}

impl ProviderConfig {
    /// Enabled provider with library defaults, mostly for tests and embedders
    /// that build configuration in code.
    pub fn new(id: ProviderId, priority: u32) -> Self {
        Self {
            id,
            enabled: true,
            priority,
            timeout: Duration::from_secs(30),
            max_concurrent_requests: 10,
            cost_per_1k_tokens: 0.0,
        }
    }
}

/// Configuration after validation; what the service is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    /// Known providers, deduplicated, in config order.
    pub providers: Vec<ProviderConfig>,
    pub default_provider: Option<ProviderId>,
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub enable_failover: bool,
    pub enable_usage_tracking: bool,
    pub enable_cost_optimization: bool,
    /// Attempt records the built-in usage log keeps.
    pub usage_retention: usize,
    pub health_check_interval: Duration,
    pub warnings: Vec<ConfigWarning>,
}

impl ValidatedConfig {
    /// Emit every collected warning through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!(warning = %warning, "AI configuration warning");
        }
    }

    /// Number of providers that will accept traffic.
    pub fn enabled_count(&self) -> usize {
        self.providers.iter().filter(|p| p.enabled).count()
    }
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        validate_config(&AiConfig::default())
    }
}

/// Validate and resolve the raw configuration. Never fails.
pub fn validate_config(config: &AiConfig) -> ValidatedConfig {
    let mut warnings = Vec::new();

    let failure_threshold = clamp_threshold(config.circuit_breaker.failure_threshold, &mut warnings);
    let open_timeout = clamp_open_timeout(config.circuit_breaker.timeout_seconds, &mut warnings);

    let default_timeout_secs = config.default_timeout_seconds.max(1);
    let mut seen = HashSet::new();
    let mut providers = Vec::new();

    for settings in &config.providers {
        let id: ProviderId = match settings.id.parse() {
            Ok(id) => id,
            Err(_) => {
                warnings.push(ConfigWarning::UnknownProvider(settings.id.clone()));
                continue;
            }
        };
        if !seen.insert(id) {
            warnings.push(ConfigWarning::DuplicateProvider(id));
            continue;
        }

        let switched_on = match id {
            ProviderId::OpenAi => config.enable_openai,
            ProviderId::Claude => config.enable_claude,
            _ => true,
        };
        let mut enabled = settings.enabled && switched_on;

        let has_key = settings
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false);
        if enabled && id.requires_credentials() && !has_key {
            warnings.push(ConfigWarning::MissingCredentials(id));
            enabled = false;
        }

        let timeout_secs = match settings.timeout_seconds {
            Some(0) => {
                warnings.push(ConfigWarning::ZeroTimeout {
                    provider: id,
                    fallback_secs: default_timeout_secs,
                });
                default_timeout_secs
            }
            Some(secs) => secs,
            None => default_timeout_secs,
        };

        let max_concurrent = settings
            .max_concurrent_requests
            .unwrap_or(config.max_concurrent_requests);
        let max_concurrent_requests = if max_concurrent == 0 {
            warnings.push(ConfigWarning::ZeroConcurrency(id));
            1
        } else {
            max_concurrent
        };

        let cost_per_1k_tokens = if settings.cost_per_1k_tokens < 0.0 {
            warnings.push(ConfigWarning::NegativeCost(id));
            0.0
        } else {
            settings.cost_per_1k_tokens
        };

        providers.push(ProviderConfig {
            id,
            enabled,
            priority: settings.priority,
            timeout: Duration::from_secs(timeout_secs),
            max_concurrent_requests,
            cost_per_1k_tokens,
        });
    }

    if !providers.iter().any(|p| p.enabled) {
        warnings.push(ConfigWarning::NoUsableProviders);
    }

    let default_provider = match config.default_provider.parse::<ProviderId>() {
        Ok(id) => match providers.iter().find(|p| p.id == id) {
            Some(p) if p.enabled => Some(id),
            _ => {
                warnings.push(ConfigWarning::DefaultProviderDisabled(id));
                None
            }
        },
        Err(_) if config.default_provider.trim().is_empty() => None,
        Err(_) => {
            warnings.push(ConfigWarning::UnknownDefaultProvider(
                config.default_provider.clone(),
            ));
            None
        }
    };

    let health_minutes = config
        .health_check_interval_minutes
        .clamp(MIN_HEALTH_INTERVAL_MINUTES, MAX_HEALTH_INTERVAL_MINUTES);
    if health_minutes != config.health_check_interval_minutes {
        warnings.push(ConfigWarning::HealthIntervalOutOfRange {
            value: config.health_check_interval_minutes,
            clamped: health_minutes,
        });
    }

    ValidatedConfig {
        providers,
        default_provider,
        failure_threshold,
        open_timeout,
        enable_failover: config.enable_failover,
        enable_usage_tracking: config.enable_usage_tracking,
        enable_cost_optimization: config.enable_cost_optimization,
        usage_retention: config.usage_retention,
        health_check_interval: Duration::from_secs(health_minutes * 60),
        warnings,
    }
}

fn clamp_threshold(value: i64, warnings: &mut Vec<ConfigWarning>) -> u32 {
    let clamped = value.clamp(MIN_FAILURE_THRESHOLD as i64, MAX_FAILURE_THRESHOLD as i64) as u32;
    if clamped as i64 != value {
        warnings.push(ConfigWarning::FailureThresholdOutOfRange { value, clamped });
    }
    clamped
}

fn clamp_open_timeout(value: i64, warnings: &mut Vec<ConfigWarning>) -> Duration {
    let clamped = value.clamp(MIN_OPEN_TIMEOUT_SECS as i64, MAX_OPEN_TIMEOUT_SECS as i64) as u64;
    if clamped as i64 != value {
        warnings.push(ConfigWarning::OpenTimeoutOutOfRange { value, clamped });
    }
    Duration::from_secs(clamped)
}
