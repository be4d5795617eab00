//! Cross-provider health aggregation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::provider::{ProviderEntry, ProviderId, ProviderRegistry};
use crate::resilience::BreakerState;

/// Health of one provider, or of the whole subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unavailable,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unavailable => "unavailable",
        }
    }
}

/// Point-in-time health of every enabled provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub per_provider: BTreeMap<ProviderId, HealthStatus>,
    pub overall: HealthStatus,
}

/// Samples breaker and limiter state into a `HealthReport`.
#[derive(Debug, Clone)]
pub struct HealthAggregator {
    registry: Arc<ProviderRegistry>,
}

impl HealthAggregator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Status of a single provider.
    ///
    /// Closed with no failure streak and spare capacity is Healthy; a
    /// failure streak, a saturated limiter or a pending trial is Degraded;
    /// Open is Unavailable.
    pub fn provider_status(entry: &ProviderEntry) -> HealthStatus {
        let snapshot = entry.breaker.snapshot();
        match snapshot.state {
            BreakerState::Open => HealthStatus::Unavailable,
            BreakerState::HalfOpen => HealthStatus::Degraded,
            BreakerState::Closed if entry.limiter.is_saturated() => HealthStatus::Degraded,
            BreakerState::Closed if snapshot.failure_count > 0 => HealthStatus::Degraded,
            BreakerState::Closed => HealthStatus::Healthy,
        }
    }

    /// Health of every enabled provider and the derived overall status.
    pub fn system_health(&self) -> HealthReport {
        let per_provider: BTreeMap<_, _> = self
            .registry
            .enabled()
            .map(|entry| (entry.id(), Self::provider_status(entry)))
            .collect();
        let overall = overall_status(per_provider.values().copied());
        HealthReport {
            per_provider,
            overall,
        }
    }
}

/// Healthy if all are Healthy, Unavailable if all are Unavailable (or there
/// are none), Degraded otherwise.
pub fn overall_status(statuses: impl IntoIterator<Item = HealthStatus>) -> HealthStatus {
    let mut any = false;
    let mut all_healthy = true;
    let mut all_unavailable = true;
    for status in statuses {
        any = true;
        all_healthy &= status == HealthStatus::Healthy;
        all_unavailable &= status == HealthStatus::Unavailable;
    }
    if !any || all_unavailable {
        HealthStatus::Unavailable
    } else if all_healthy {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}
