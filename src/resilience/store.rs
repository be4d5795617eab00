//! Breaker state storage.
//!
//! # Responsibilities
//! - Hold one `BreakerSnapshot` per registered provider
//! - Apply read-modify-write updates atomically per provider
//!
//! # Design Decisions
//! - Updates are closures so a shared backend can implement them with
//!   compare-and-swap; the in-memory store uses a DashMap shard lock
//! - Timestamps use `tokio::time::Instant` so paused-clock tests drive them

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

use crate::provider::ProviderId;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Normal operation, calls pass through.
    Closed,
    /// Provider judged unhealthy, calls rejected without invoking it.
    Open,
    /// Cooldown elapsed, a single trial decides the next state.
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Persisted breaker fields for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    /// Consecutive breaker-relevant failures.
    pub failure_count: u32,
    /// When the breaker last opened.
    pub opened_at: Option<Instant>,
    /// Set while the single HalfOpen trial is in flight.
    pub trial_in_flight: bool,
}

impl Default for BreakerSnapshot {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }
}

/// Storage for per-provider breaker state.
pub trait BreakerStore: Send + Sync + fmt::Debug {
    /// Create the provider's entry (Closed) if it does not exist yet.
    fn register(&self, provider: ProviderId);

    /// Current state, or `None` for an unregistered provider.
    fn load(&self, provider: ProviderId) -> Option<BreakerSnapshot>;

    /// Atomically apply `update` to the provider's state and return the
    /// resulting snapshot. `None` for an unregistered provider.
    fn update(
        &self,
        provider: ProviderId,
        update: &mut dyn FnMut(&mut BreakerSnapshot),
    ) -> Option<BreakerSnapshot>;
}

/// Process-local breaker store.
#[derive(Debug, Default)]
pub struct InMemoryBreakerStore {
    states: DashMap<ProviderId, BreakerSnapshot>,
}

impl InMemoryBreakerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BreakerStore for InMemoryBreakerStore {
    fn register(&self, provider: ProviderId) {
        self.states.entry(provider).or_default();
    }

    fn load(&self, provider: ProviderId) -> Option<BreakerSnapshot> {
        self.states.get(&provider).map(|s| *s.value())
    }

    fn update(
        &self,
        provider: ProviderId,
        update: &mut dyn FnMut(&mut BreakerSnapshot),
    ) -> Option<BreakerSnapshot> {
        let mut entry = self.states.get_mut(&provider)?;
        update(entry.value_mut());
        Some(*entry.value())
    }
}
