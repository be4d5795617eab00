//! Metrics recording.
//!
//! # Metrics
//! - `ai_attempts_total` (counter): attempts by provider, outcome
//! - `ai_attempt_duration_seconds` (histogram): adapter call latency
//! - `ai_dispatch_total` (counter): completed dispatches by provider used
//! - `ai_failovers_total` (counter): candidates skipped or failed before success
//! - `ai_breaker_transitions_total` (counter) and `ai_breaker_state` (gauge)
//! - `ai_provider_health` (gauge): 1=healthy, 0.5=degraded, 0=unavailable
//! - `ai_provider_in_flight` (gauge): held concurrency tickets
//! - `ai_estimated_cost_total` (counter): cost estimate in micro-units

use metrics::{counter, gauge, histogram};
use std::time::Duration;

use crate::health::HealthStatus;
use crate::provider::ProviderId;
use crate::resilience::BreakerState;
use crate::usage::AttemptOutcome;

pub fn record_attempt(provider: ProviderId, outcome: AttemptOutcome, latency: Duration) {
    counter!("ai_attempts_total", "provider" => provider.as_str(), "outcome" => outcome.as_str())
        .increment(1);
    if outcome.invoked_adapter() {
        histogram!("ai_attempt_duration_seconds", "provider" => provider.as_str())
            .record(latency.as_secs_f64());
    }
}

pub fn record_dispatch(provider_used: Option<ProviderId>, failovers: usize) {
    let provider = provider_used.map(|p| p.as_str()).unwrap_or("none");
    counter!("ai_dispatch_total", "provider" => provider).increment(1);
    counter!("ai_failovers_total").increment(failovers as u64);
}

pub fn record_breaker_transition(provider: ProviderId, state: BreakerState) {
    counter!("ai_breaker_transitions_total", "provider" => provider.as_str(), "state" => state.as_str())
        .increment(1);
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::HalfOpen => 0.5,
        BreakerState::Open => 1.0,
    };
    gauge!("ai_breaker_state", "provider" => provider.as_str()).set(value);
}

pub fn record_provider_health(provider: ProviderId, status: HealthStatus) {
    let value = match status {
        HealthStatus::Healthy => 1.0,
        HealthStatus::Degraded => 0.5,
        HealthStatus::Unavailable => 0.0,
    };
    gauge!("ai_provider_health", "provider" => provider.as_str()).set(value);
}

pub fn record_in_flight(provider: ProviderId, count: usize) {
    gauge!("ai_provider_in_flight", "provider" => provider.as_str()).set(count as f64);
}

pub fn record_cost(provider: ProviderId, cost: f64) {
    counter!("ai_estimated_cost_total", "provider" => provider.as_str())
        .increment((cost * 1_000_000.0).round() as u64);
}
