//! The AI service facade.
//!
//! # Responsibilities
//! - Compose registry, dispatcher, health aggregation and usage tracking
//! - Offer the two public operations: `generate` and `system_health`
//! - Start the periodic health monitor on request
//!
//! # Design Decisions
//! - Built once at startup from a `ValidatedConfig` plus adapters
//! - Missing providers or credentials degrade to `AiError::Disabled`, never a
//!   startup failure

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::{validate_config, AiConfig, ValidatedConfig};
use crate::dispatch::{AiError, GenerationResult, ProviderFactory};
use crate::health::{HealthAggregator, HealthMonitor, HealthReport};
use crate::lifecycle::Shutdown;
use crate::provider::{GenerationRequest, ProviderAdapter, ProviderId, ProviderRegistry};
use crate::resilience::{BreakerState, BreakerStore, InMemoryBreakerStore};
use crate::usage::{NoopUsageSink, UsageSink, UsageSummary, UsageTracker};

/// Admin view of one registered provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub enabled: bool,
    pub priority: u32,
    pub breaker: BreakerState,
    pub failure_count: u32,
    pub in_flight: usize,
    pub max_concurrent: usize,
}

/// Single entry point for AI generation.
pub struct AiService {
    factory: ProviderFactory,
    health: HealthAggregator,
    usage: Option<Arc<UsageTracker>>,
    health_check_interval: Duration,
}

impl AiService {
    pub fn builder(config: ValidatedConfig) -> AiServiceBuilder {
        AiServiceBuilder::new(config)
    }

    /// Validate raw configuration and start a builder from it.
    pub fn from_config(config: &AiConfig) -> AiServiceBuilder {
        AiServiceBuilder::new(validate_config(config))
    }

    /// Generate a completion, failing over between providers as needed.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, AiError> {
        self.factory.dispatch(&request).await
    }

    /// Current health of every enabled provider.
    pub fn system_health(&self) -> HealthReport {
        self.health.system_health()
    }

    /// True if at least one provider can receive traffic.
    pub fn is_enabled(&self) -> bool {
        self.factory.registry().enabled().next().is_some()
    }

    pub fn provider_snapshots(&self) -> Vec<ProviderSnapshot> {
        self.factory
            .registry()
            .all()
            .iter()
            .map(|entry| {
                let breaker = entry.breaker.snapshot();
                ProviderSnapshot {
                    id: entry.id(),
                    enabled: entry.is_enabled(),
                    priority: entry.config.priority,
                    breaker: breaker.state,
                    failure_count: breaker.failure_count,
                    in_flight: entry.limiter.in_flight(),
                    max_concurrent: entry.limiter.max_concurrent(),
                }
            })
            .collect()
    }

    /// The built-in usage log, if usage tracking uses it.
    pub fn usage(&self) -> Option<&Arc<UsageTracker>> {
        self.usage.as_ref()
    }

    pub fn usage_summary(&self) -> UsageSummary {
        self.usage
            .as_ref()
            .map(|tracker| tracker.summary())
            .unwrap_or_default()
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        self.factory.registry()
    }

    /// Run the periodic health monitor until `shutdown` fires.
    pub fn spawn_health_monitor(&self, shutdown: &Shutdown) -> JoinHandle<()> {
        let monitor = HealthMonitor::new(self.health.clone(), self.health_check_interval);
        tokio::spawn(monitor.run(shutdown.subscribe()))
    }
}

impl std::fmt::Debug for AiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiService")
            .field("registry", self.factory.registry())
            .field("usage_tracking", &self.usage.is_some())
            .finish()
    }
}

/// Assembles an `AiService`.
pub struct AiServiceBuilder {
    config: ValidatedConfig,
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
    store: Option<Arc<dyn BreakerStore>>,
    usage_sink: Option<Arc<dyn UsageSink>>,
}

impl AiServiceBuilder {
    pub fn new(config: ValidatedConfig) -> Self {
        Self {
            config,
            adapters: HashMap::new(),
            store: None,
            usage_sink: None,
        }
    }

    /// Register the adapter serving `id`. A later call replaces an earlier one.
    pub fn adapter(mut self, id: ProviderId, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(id, adapter);
        self
    }

    /// Keep breaker state somewhere other than process memory.
    pub fn breaker_store(mut self, store: Arc<dyn BreakerStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Send attempt records to a custom sink instead of the built-in tracker.
    pub fn usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage_sink = Some(sink);
        self
    }

    pub fn build(self) -> AiService {
        self.config.log_warnings();

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryBreakerStore::new()));
        let registry = Arc::new(ProviderRegistry::new(&self.config, self.adapters, store));

        let (usage, sink): (Option<Arc<UsageTracker>>, Arc<dyn UsageSink>) =
            match (self.config.enable_usage_tracking, self.usage_sink) {
                (false, _) => (None, Arc::new(NoopUsageSink)),
                (true, Some(sink)) => (None, sink),
                (true, None) => {
                    let tracker = Arc::new(UsageTracker::with_retention(self.config.usage_retention));
                    (Some(tracker.clone()), tracker)
                }
            };

        let factory = ProviderFactory::new(
            registry.clone(),
            sink,
            self.config.enable_failover,
            self.config.enable_cost_optimization,
        );

        let enabled = registry.enabled().count();
        if enabled == 0 {
            tracing::warn!("No AI provider is enabled; AI features are disabled");
        } else {
            tracing::info!(
                providers = enabled,
                default_provider = ?registry.default_provider(),
                failover = self.config.enable_failover,
                "AI service ready"
            );
        }

        AiService {
            factory,
            health: HealthAggregator::new(registry),
            usage,
            health_check_interval: self.config.health_check_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderSettings;
    use crate::health::HealthStatus;
    use crate::provider::{AdapterError, GenerationParams, ProviderResponse};
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl ProviderAdapter for Fixed {
        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
            _timeout: Duration,
        ) -> Result<ProviderResponse, AdapterError> {
            Ok(ProviderResponse::text(self.0))
        }
    }

    fn raw_config() -> AiConfig {
        AiConfig {
            providers: vec![
                ProviderSettings::new("openai", 1).with_api_key("sk"),
                ProviderSettings::new("claude", 2).with_api_key("ak"),
            ],
            ..AiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_uses_default_provider() {
        let service = AiService::from_config(&raw_config())
            .adapter(ProviderId::OpenAi, Arc::new(Fixed("from openai")))
            .adapter(ProviderId::Claude, Arc::new(Fixed("from claude")))
            .build();

        let result = service.generate(GenerationRequest::new("hi")).await.unwrap();
        assert_eq!(result.provider_used, ProviderId::OpenAi);
        assert_eq!(result.text(), "from openai");
        assert_eq!(result.attempts, 1);

        let result = service
            .generate(GenerationRequest::new("hi").with_provider(ProviderId::Claude))
            .await
            .unwrap();
        assert_eq!(result.provider_used, ProviderId::Claude);
    }

    #[tokio::test]
    async fn test_no_adapters_means_disabled() {
        let service = AiService::from_config(&raw_config()).build();
        assert!(!service.is_enabled());
        assert_eq!(
            service.generate(GenerationRequest::new("hi")).await,
            Err(AiError::Disabled)
        );
        assert_eq!(service.system_health().overall, HealthStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_usage_tracking_toggle() {
        let mut config = raw_config();
        config.enable_usage_tracking = false;
        let service = AiService::from_config(&config)
            .adapter(ProviderId::OpenAi, Arc::new(Fixed("ok")))
            .build();
        service.generate(GenerationRequest::new("hi")).await.unwrap();
        assert!(service.usage().is_none());
        assert_eq!(service.usage_summary(), UsageSummary::default());

        let service = AiService::from_config(&raw_config())
            .adapter(ProviderId::OpenAi, Arc::new(Fixed("ok")))
            .build();
        service.generate(GenerationRequest::new("hi")).await.unwrap();
        assert_eq!(service.usage().unwrap().len(), 1);
        assert_eq!(service.usage_summary().providers[&ProviderId::OpenAi].successes, 1);
    }

    #[tokio::test]
    async fn test_usage_retention_caps_log_not_totals() {
        let mut config = raw_config();
        config.usage_retention = 3;
        let service = AiService::from_config(&config)
            .adapter(ProviderId::OpenAi, Arc::new(Fixed("ok")))
            .build();
        for _ in 0..5 {
            service.generate(GenerationRequest::new("hi")).await.unwrap();
        }

        let tracker = service.usage().unwrap();
        assert_eq!(tracker.retention(), 3);
        assert_eq!(tracker.len(), 3);
        let summary = service.usage_summary();
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.retained_records, 3);
        assert_eq!(summary.providers[&ProviderId::OpenAi].successes, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_monitor_stops_with_service_shutdown() {
        let service = AiService::from_config(&raw_config())
            .adapter(ProviderId::OpenAi, Arc::new(Fixed("ok")))
            .build();
        let shutdown = Shutdown::new();
        let handle = service.spawn_health_monitor(&shutdown);

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(shutdown.trigger(), 1);
        handle.await.unwrap();
    }

    #[test]
    fn test_provider_snapshots() {
        let service = AiService::from_config(&raw_config())
            .adapter(ProviderId::OpenAi, Arc::new(Fixed("ok")))
            .adapter(ProviderId::Claude, Arc::new(Fixed("ok")))
            .build();
        let snapshots = service.provider_snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, ProviderId::OpenAi);
        assert_eq!(snapshots[0].breaker, BreakerState::Closed);
        assert_eq!(snapshots[1].max_concurrent, 10);
    }
}
