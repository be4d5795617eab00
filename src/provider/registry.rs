//! Provider registry.
//!
//! # Responsibilities
//! - Pair each configured provider with its adapter
//! - Create the provider's circuit breaker and concurrency limiter at registration
//! - Keep enabled providers in a fixed priority order
//!
//! # Design Decisions
//! - Built once at startup; the set and order never change afterwards
//! - Ties in priority fall back to `ProviderId` order so failover is deterministic

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ProviderConfig, ValidatedConfig};
use crate::provider::{ProviderAdapter, ProviderId};
use crate::resilience::{BreakerStore, CircuitBreaker, ConcurrencyLimiter};

/// One registered provider and its resilience state.
pub struct ProviderEntry {
    pub config: ProviderConfig,
    pub adapter: Arc<dyn ProviderAdapter>,
    pub breaker: CircuitBreaker,
    pub limiter: Arc<ConcurrencyLimiter>,
}

impl ProviderEntry {
    pub fn id(&self) -> ProviderId {
        self.config.id
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("id", &self.config.id)
            .field("enabled", &self.config.enabled)
            .field("priority", &self.config.priority)
            .field("breaker", &self.breaker.state())
            .field("in_flight", &self.limiter.in_flight())
            .finish()
    }
}

/// All providers known to the service.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    /// Every registered provider (enabled or not), sorted by priority.
    entries: Vec<Arc<ProviderEntry>>,
    default_provider: Option<ProviderId>,
}

impl ProviderRegistry {
    /// Build the registry from validated configuration and the adapters the
    /// embedding application supplied.
    pub fn new(
        config: &ValidatedConfig,
        mut adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
        store: Arc<dyn BreakerStore>,
    ) -> Self {
        let mut entries = Vec::new();

        for provider in &config.providers {
            let Some(adapter) = adapters.remove(&provider.id) else {
                if provider.enabled {
                    tracing::warn!(provider = %provider.id, "Provider configured but no adapter registered, skipping");
                }
                continue;
            };

            let breaker = CircuitBreaker::new(
                provider.id,
                config.failure_threshold,
                config.open_timeout,
                store.clone(),
            );
            let limiter = Arc::new(ConcurrencyLimiter::new(
                provider.id,
                provider.max_concurrent_requests,
            ));

            tracing::info!(
                provider = %provider.id,
                enabled = provider.enabled,
                priority = provider.priority,
                timeout_secs = provider.timeout.as_secs(),
                max_concurrent = provider.max_concurrent_requests,
                "Provider registered"
            );

            entries.push(Arc::new(ProviderEntry {
                config: provider.clone(),
                adapter,
                breaker,
                limiter,
            }));
        }

        for id in adapters.keys() {
            tracing::warn!(provider = %id, "Adapter registered for a provider missing from configuration, ignoring");
        }

        entries.sort_by_key(|e| (e.config.priority, e.config.id));

        let default_provider = config.default_provider.filter(|id| {
            let usable = entries.iter().any(|e| e.id() == *id && e.is_enabled());
            if !usable {
                tracing::warn!(provider = %id, "Default provider has no adapter, using priority order");
            }
            usable
        });

        Self {
            entries,
            default_provider,
        }
    }

    pub fn get(&self, id: ProviderId) -> Option<&Arc<ProviderEntry>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Every registered provider, in priority order.
    pub fn all(&self) -> &[Arc<ProviderEntry>] {
        &self.entries
    }

    /// Enabled providers, in priority order.
    pub fn enabled(&self) -> impl Iterator<Item = &Arc<ProviderEntry>> {
        self.entries.iter().filter(|e| e.is_enabled())
    }

    pub fn is_enabled(&self, id: ProviderId) -> bool {
        self.get(id).map(|e| e.is_enabled()).unwrap_or(false)
    }

    pub fn default_provider(&self) -> Option<ProviderId> {
        self.default_provider
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
