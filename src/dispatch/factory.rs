//! Candidate ordering and the failover loop.
//!
//! # Responsibilities
//! - Order candidates: explicit override (if enabled) or the default
//!   provider first, then remaining enabled providers by priority
//! - Gate each candidate through its breaker and limiter
//! - Classify every outcome and decide between failover and surfacing it
//! - Append one AttemptRecord per candidate tried
//!
//! # Design Decisions
//! - Timeouts and transient failures trip breakers and fail over
//! - Request errors neither trip breakers nor fail over
//! - Dropping the dispatch future cancels the adapter call; the in-flight
//!   guard still releases the trial token and reports `Cancelled`

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::dispatch::types::{AiError, CandidateFailure, GenerationResult};
use crate::observability::metrics;
use crate::provider::{
    AdapterError, GenerationRequest, ProviderEntry, ProviderId, ProviderRegistry, ProviderResponse,
};
use crate::resilience::{call_with_timeout, Admission};
use crate::usage::{AttemptOutcome, AttemptRecord, UsageSink};

/// What one candidate attempt means for the failover loop.
enum Step {
    Served(ProviderResponse, Duration),
    /// Skipped or failed; try the next candidate.
    Next(AiError),
    /// Surface to the caller without trying anyone else.
    Stop(AiError),
}

/// Routes generation requests across registered providers.
pub struct ProviderFactory {
    registry: Arc<ProviderRegistry>,
    usage: Arc<dyn UsageSink>,
    enable_failover: bool,
    enable_cost_tracking: bool,
}

impl ProviderFactory {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        usage: Arc<dyn UsageSink>,
        enable_failover: bool,
        enable_cost_tracking: bool,
    ) -> Self {
        Self {
            registry,
            usage,
            enable_failover,
            enable_cost_tracking,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Candidate order for a request carrying `preferred` as its override.
    ///
    /// Deterministic for a given registry.
    pub fn candidates(&self, preferred: Option<ProviderId>) -> Vec<Arc<ProviderEntry>> {
        let head = match preferred {
            Some(id) if self.registry.is_enabled(id) => Some(id),
            Some(id) => {
                tracing::debug!(provider = %id, "Requested provider not enabled, ignoring override");
                self.registry.default_provider()
            }
            None => self.registry.default_provider(),
        };

        let mut ordered: Vec<Arc<ProviderEntry>> = Vec::with_capacity(self.registry.len());
        if let Some(entry) = head.and_then(|id| self.registry.get(id)) {
            ordered.push(entry.clone());
        }
        for entry in self.registry.enabled() {
            if Some(entry.id()) != head {
                ordered.push(entry.clone());
            }
        }

        if !self.enable_failover {
            ordered.truncate(1);
        }
        ordered
    }

    /// Serve `request` from the first candidate that succeeds.
    pub async fn dispatch(&self, request: &GenerationRequest) -> Result<GenerationResult, AiError> {
        let request_id = Uuid::new_v4();
        let candidates = self.candidates(request.provider);
        if candidates.is_empty() {
            tracing::warn!(request_id = %request_id, "No AI provider available for request");
            return Err(AiError::Disabled);
        }

        let mut failures = Vec::new();
        for (index, entry) in candidates.iter().enumerate() {
            match self.attempt(request_id, index, entry, request).await {
                Step::Served(response, latency) => {
                    tracing::info!(
                        request_id = %request_id,
                        provider_used = %entry.id(),
                        attempts = index + 1,
                        failovers = index,
                        latency_ms = latency.as_millis() as u64,
                        "AI request served"
                    );
                    metrics::record_dispatch(Some(entry.id()), index);
                    return Ok(GenerationResult {
                        request_id,
                        provider_used: entry.id(),
                        attempts: index + 1,
                        response,
                        latency,
                    });
                }
                Step::Next(error) => {
                    tracing::debug!(
                        request_id = %request_id,
                        provider = %entry.id(),
                        attempt = index,
                        error = %error,
                        "Candidate did not serve request"
                    );
                    failures.push(CandidateFailure {
                        provider: entry.id(),
                        error,
                    });
                }
                Step::Stop(error) => {
                    tracing::info!(
                        request_id = %request_id,
                        provider = %entry.id(),
                        error = %error,
                        "Request rejected by provider, not failing over"
                    );
                    metrics::record_dispatch(None, index);
                    return Err(error);
                }
            }
        }

        tracing::warn!(
            request_id = %request_id,
            candidates = failures.len(),
            "All AI providers exhausted"
        );
        metrics::record_dispatch(None, failures.len());
        Err(AiError::AllProvidersExhausted { failures })
    }

    async fn attempt(
        &self,
        request_id: Uuid,
        index: usize,
        entry: &ProviderEntry,
        request: &GenerationRequest,
    ) -> Step {
        let provider = entry.id();

        let admission = entry.breaker.allow();
        if !admission.is_admitted() {
            self.record(AttemptRecord::new(
                request_id,
                provider,
                index,
                AttemptOutcome::Unavailable,
                Duration::ZERO,
            ));
            return Step::Next(AiError::ProviderUnavailable { provider });
        }
        let is_trial = admission == Admission::Trial;

        let Some(ticket) = entry.limiter.try_acquire() else {
            if is_trial {
                entry.breaker.release_trial();
            }
            tracing::debug!(request_id = %request_id, provider = %provider, "Concurrency limit reached");
            self.record(AttemptRecord::new(
                request_id,
                provider,
                index,
                AttemptOutcome::Throttled,
                Duration::ZERO,
            ));
            return Step::Next(AiError::Throttled { provider });
        };
        metrics::record_in_flight(provider, ticket.in_flight());

        let timeout = entry.config.timeout;
        let mut in_flight = InFlightAttempt {
            factory: self,
            entry,
            request_id,
            index,
            is_trial,
            started: Instant::now(),
            armed: true,
        };

        let result = call_with_timeout(
            timeout,
            entry.adapter.generate(&request.prompt, &request.params, timeout),
        )
        .await;
        let latency = in_flight.started.elapsed();
        in_flight.disarm();
        drop(ticket);
        metrics::record_in_flight(provider, entry.limiter.in_flight());

        match result {
            Ok(response) => {
                entry.breaker.record_success(admission);
                let mut record =
                    AttemptRecord::new(request_id, provider, index, AttemptOutcome::Success, latency);
                record.tokens = response.usage;
                record.estimated_cost = self.estimate_cost(entry, &response);
                if let Some(cost) = record.estimated_cost {
                    metrics::record_cost(provider, cost);
                }
                self.record(record);
                Step::Served(response, latency)
            }
            Err(error) => {
                if error.is_breaker_relevant() {
                    entry.breaker.record_failure(admission);
                } else if is_trial {
                    entry.breaker.release_trial();
                }

                let (outcome, step) = match error {
                    AdapterError::Timeout => {
                        tracing::warn!(request_id = %request_id, provider = %provider, timeout_secs = timeout.as_secs(), "Provider call timed out");
                        (
                            AttemptOutcome::Timeout,
                            Step::Next(AiError::ProviderTimeout { provider, timeout }),
                        )
                    }
                    AdapterError::Transient(message) => {
                        tracing::warn!(request_id = %request_id, provider = %provider, error = %message, "Provider call failed");
                        (
                            AttemptOutcome::TransientFailure,
                            Step::Next(AiError::ProviderTransientError { provider, message }),
                        )
                    }
                    AdapterError::Request(message) => (
                        AttemptOutcome::ClientError,
                        Step::Stop(AiError::ProviderRequestError { provider, message }),
                    ),
                };
                self.record(AttemptRecord::new(request_id, provider, index, outcome, latency));
                step
            }
        }
    }

    fn estimate_cost(&self, entry: &ProviderEntry, response: &ProviderResponse) -> Option<f64> {
        if !self.enable_cost_tracking {
            return None;
        }
        let tokens = response.usage?.total();
        Some(f64::from(tokens) / 1000.0 * entry.config.cost_per_1k_tokens)
    }

    fn record(&self, record: AttemptRecord) {
        metrics::record_attempt(record.provider, record.outcome, record.latency);
        if let Err(e) = self.usage.record(record) {
            tracing::warn!(error = %e, "Failed to record AI usage");
        }
    }
}

/// Reports a cancelled attempt if the dispatch future is dropped while the
/// adapter call is in flight.
struct InFlightAttempt<'a> {
    factory: &'a ProviderFactory,
    entry: &'a ProviderEntry,
    request_id: Uuid,
    index: usize,
    is_trial: bool,
    started: Instant,
    armed: bool,
}

impl InFlightAttempt<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightAttempt<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let provider = self.entry.id();
        if self.is_trial {
            self.entry.breaker.release_trial();
        }
        tracing::info!(request_id = %self.request_id, provider = %provider, "AI request cancelled in flight");
        self.factory.record(AttemptRecord::new(
            self.request_id,
            provider,
            self.index,
            AttemptOutcome::Cancelled,
            self.started.elapsed(),
        ));
    }
}
