//! Circuit breaker for provider protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: provider assumed down, requests fail fast
//! - Half-Open: testing if provider recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: open_timeout elapsed, on the next allow()
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - Per-provider circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial in Half-Open, granted by a flag flipped inside the store's
//!   atomic update, so concurrent callers can never both win it
//! - Only the trial holder ends Half-Open; late outcomes from calls admitted
//!   before the trip are ignored

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::provider::ProviderId;
use crate::resilience::store::{BreakerSnapshot, BreakerState, BreakerStore};

/// Outcome of `CircuitBreaker::allow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Breaker closed; call the provider.
    Admit,
    /// The single Half-Open trial call. The caller must report its outcome
    /// or call `release_trial`.
    Trial,
    /// Breaker open (or a trial is already in flight); do not call.
    RejectFast,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::RejectFast)
    }
}

/// Failure-tracking state machine for one provider.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    provider: ProviderId,
    failure_threshold: u32,
    open_timeout: Duration,
    store: Arc<dyn BreakerStore>,
}

impl CircuitBreaker {
    /// Create the breaker and register its state (Closed) in `store`.
    pub fn new(
        provider: ProviderId,
        failure_threshold: u32,
        open_timeout: Duration,
        store: Arc<dyn BreakerStore>,
    ) -> Self {
        store.register(provider);
        Self {
            provider,
            failure_threshold: failure_threshold.max(1),
            open_timeout,
            store,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    /// Decide whether a call may proceed.
    pub fn allow(&self) -> Admission {
        let now = Instant::now();
        let open_timeout = self.open_timeout;
        let mut admission = Admission::RejectFast;
        let mut entered_half_open = false;

        let updated = self.store.update(self.provider, &mut |s| {
            admission = match s.state {
                BreakerState::Closed => Admission::Admit,
                BreakerState::Open => {
                    let cooled_down = s
                        .opened_at
                        .map(|at| now.saturating_duration_since(at) >= open_timeout)
                        .unwrap_or(true);
                    if cooled_down {
                        s.state = BreakerState::HalfOpen;
                        s.trial_in_flight = true;
                        entered_half_open = true;
                        Admission::Trial
                    } else {
                        Admission::RejectFast
                    }
                }
                BreakerState::HalfOpen if !s.trial_in_flight => {
                    s.trial_in_flight = true;
                    Admission::Trial
                }
                BreakerState::HalfOpen => Admission::RejectFast,
            };
        });

        if updated.is_none() {
            tracing::warn!(provider = %self.provider, "Breaker state missing from store, admitting");
            return Admission::Admit;
        }

        if entered_half_open {
            tracing::info!(provider = %self.provider, "Circuit breaker half-open, admitting trial");
            metrics::record_breaker_transition(self.provider, BreakerState::HalfOpen);
        } else if admission == Admission::RejectFast {
            tracing::debug!(provider = %self.provider, "Circuit breaker rejecting request");
        }
        admission
    }

    /// Report a successful call admitted with `admission`.
    ///
    /// In Half-Open only the trial's own outcome counts; results from calls
    /// admitted before the breaker tripped are ignored.
    pub fn record_success(&self, admission: Admission) {
        let is_trial = admission == Admission::Trial;
        let mut previous = None;
        self.store.update(self.provider, &mut |s| {
            previous = Some(s.state);
            match s.state {
                BreakerState::Closed => s.failure_count = 0,
                BreakerState::HalfOpen if is_trial => {
                    s.state = BreakerState::Closed;
                    s.failure_count = 0;
                    s.opened_at = None;
                    s.trial_in_flight = false;
                }
                BreakerState::HalfOpen | BreakerState::Open => {}
            }
        });

        match previous {
            Some(BreakerState::HalfOpen) if is_trial => {
                tracing::info!(provider = %self.provider, "Circuit breaker recovered, closing");
                metrics::record_breaker_transition(self.provider, BreakerState::Closed);
            }
            Some(BreakerState::HalfOpen) | Some(BreakerState::Open) => {
                tracing::debug!(provider = %self.provider, "Late success ignored while breaker not closed");
            }
            _ => {}
        }
    }

    /// Report a breaker-relevant failure (timeout or transient error) for a
    /// call admitted with `admission`.
    pub fn record_failure(&self, admission: Admission) {
        let is_trial = admission == Admission::Trial;
        let now = Instant::now();
        let threshold = self.failure_threshold;
        let mut previous = None;

        let updated = self.store.update(self.provider, &mut |s| {
            previous = Some(s.state);
            match s.state {
                BreakerState::Closed => {
                    s.failure_count = s.failure_count.saturating_add(1);
                    if s.failure_count >= threshold {
                        s.state = BreakerState::Open;
                        s.opened_at = Some(now);
                    }
                }
                BreakerState::HalfOpen if is_trial => {
                    s.state = BreakerState::Open;
                    s.opened_at = Some(now);
                    s.trial_in_flight = false;
                }
                BreakerState::HalfOpen | BreakerState::Open => {}
            }
        });

        let Some(current) = updated else { return };
        match (previous, current.state) {
            (Some(BreakerState::Closed), BreakerState::Open) => {
                tracing::warn!(
                    provider = %self.provider,
                    failures = current.failure_count,
                    "Circuit breaker opening"
                );
                metrics::record_breaker_transition(self.provider, BreakerState::Open);
            }
            (Some(BreakerState::HalfOpen), BreakerState::Open) => {
                tracing::warn!(provider = %self.provider, "Trial failed, circuit breaker re-opening");
                metrics::record_breaker_transition(self.provider, BreakerState::Open);
            }
            (Some(BreakerState::HalfOpen), BreakerState::HalfOpen) => {
                tracing::debug!(provider = %self.provider, "Late failure ignored while trial in flight");
            }
            (Some(BreakerState::Closed), _) => {
                tracing::debug!(
                    provider = %self.provider,
                    failures = current.failure_count,
                    threshold,
                    "Circuit breaker failure recorded"
                );
            }
            _ => {}
        }
    }

    /// Give back a trial token without an outcome (the trial never reached
    /// the provider, or its caller went away). The next `allow` may try again.
    pub fn release_trial(&self) {
        self.store.update(self.provider, &mut |s| {
            if s.state == BreakerState::HalfOpen {
                s.trial_in_flight = false;
            }
        });
        tracing::debug!(provider = %self.provider, "Trial token released");
    }

    /// Read the current state without mutating it.
    pub fn snapshot(&self) -> BreakerSnapshot {
        self.store.load(self.provider).unwrap_or_default()
    }

    pub fn state(&self) -> BreakerState {
        self.snapshot().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::store::InMemoryBreakerStore;

    fn breaker(threshold: u32, timeout_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            ProviderId::OpenAi,
            threshold,
            Duration::from_secs(timeout_secs),
            Arc::new(InMemoryBreakerStore::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_opens_breaker() {
        let cb = breaker(5, 30);
        assert_eq!(cb.allow(), Admission::Admit);

        for _ in 0..4 {
            cb.record_failure(Admission::Admit);
        }
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.snapshot().failure_count, 4);

        cb.record_failure(Admission::Admit);
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.allow(), Admission::RejectFast);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let cb = breaker(3, 30);
        cb.record_failure(Admission::Admit);
        cb.record_failure(Admission::Admit);
        cb.record_success(Admission::Admit);
        assert_eq!(cb.snapshot().failure_count, 0);

        cb.record_failure(Admission::Admit);
        cb.record_failure(Admission::Admit);
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_rejects_until_timeout() {
        let cb = breaker(1, 30);
        cb.record_failure(Admission::Admit);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cb.allow(), Admission::RejectFast);
        assert_eq!(cb.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cb.allow(), Admission::Trial);
        assert_eq!(cb.state(), BreakerState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_trial_in_half_open() {
        let cb = breaker(1, 5);
        cb.record_failure(Admission::Admit);
        tokio::time::advance(Duration::from_secs(6)).await;

        let admissions: Vec<_> = (0..100).map(|_| cb.allow()).collect();
        assert_eq!(admissions.iter().filter(|a| **a == Admission::Trial).count(), 1);
        assert_eq!(admissions[0], Admission::Trial);
        assert!(admissions[1..].iter().all(|a| *a == Admission::RejectFast));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_success_closes() {
        let cb = breaker(2, 5);
        cb.record_failure(Admission::Admit);
        cb.record_failure(Admission::Admit);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cb.allow(), Admission::Trial);

        cb.record_success(Admission::Trial);
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, BreakerState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert!(!snapshot.trial_in_flight);
        assert_eq!(cb.allow(), Admission::Admit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_failure_restarts_window() {
        let cb = breaker(1, 10);
        cb.record_failure(Admission::Admit);
        let first_open = cb.snapshot().opened_at.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cb.allow(), Admission::Trial);
        cb.record_failure(Admission::Trial);

        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, BreakerState::Open);
        assert!(!snapshot.trial_in_flight);
        assert!(snapshot.opened_at.unwrap() > first_open);

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cb.allow(), Admission::RejectFast);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cb.allow(), Admission::Trial);
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_trial_can_be_reacquired() {
        let cb = breaker(1, 5);
        cb.record_failure(Admission::Admit);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cb.allow(), Admission::Trial);
        assert_eq!(cb.allow(), Admission::RejectFast);

        cb.release_trial();
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert_eq!(cb.allow(), Admission::Trial);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_while_open_are_ignored() {
        let cb = breaker(1, 30);
        cb.record_failure(Admission::Admit);
        let opened_at = cb.snapshot().opened_at;

        tokio::time::advance(Duration::from_secs(10)).await;
        cb.record_failure(Admission::Admit);
        cb.record_success(Admission::Admit);
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.snapshot().opened_at, opened_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_outcomes_do_not_end_half_open() {
        let cb = breaker(1, 5);
        // Admitted while closed, finishes after the trial started.
        assert_eq!(cb.allow(), Admission::Admit);
        cb.record_failure(Admission::Admit);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cb.allow(), Admission::Trial);

        cb.record_failure(Admission::Admit);
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, BreakerState::HalfOpen);
        assert!(snapshot.trial_in_flight);

        cb.record_success(Admission::Admit);
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cb.allow(), Admission::RejectFast);

        cb.record_success(Admission::Trial);
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn test_threshold_never_zero() {
        let cb = breaker(0, 30);
        assert_eq!(cb.failure_threshold(), 1);
    }
}
