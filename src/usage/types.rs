//! Attempt records.

use serde::Serialize;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::provider::{ProviderId, TokenUsage};

/// What happened to one candidate of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// Backend-side failure (5xx-equivalent).
    TransientFailure,
    /// Request rejected by the backend (4xx-equivalent).
    ClientError,
    /// Concurrency limit saturated; adapter not invoked.
    Throttled,
    /// Breaker open; adapter not invoked.
    Unavailable,
    Timeout,
    /// The caller went away while the adapter call was in flight.
    Cancelled,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::TransientFailure => "transient_failure",
            AttemptOutcome::ClientError => "client_error",
            AttemptOutcome::Throttled => "throttled",
            AttemptOutcome::Unavailable => "unavailable",
            AttemptOutcome::Timeout => "timeout",
            AttemptOutcome::Cancelled => "cancelled",
        }
    }

    /// Whether the adapter was actually called for this attempt.
    pub fn invoked_adapter(&self) -> bool {
        !matches!(self, AttemptOutcome::Throttled | AttemptOutcome::Unavailable)
    }
}

/// One candidate attempt, appended to the usage sink and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub request_id: Uuid,
    pub provider: ProviderId,
    /// Zero-based position in the request's candidate list.
    pub attempt_index: usize,
    pub outcome: AttemptOutcome,
    pub latency: Duration,
    pub timestamp: SystemTime,
    pub tokens: Option<TokenUsage>,
    pub estimated_cost: Option<f64>,
}

impl AttemptRecord {
    pub fn new(
        request_id: Uuid,
        provider: ProviderId,
        attempt_index: usize,
        outcome: AttemptOutcome,
        latency: Duration,
    ) -> Self {
        Self {
            request_id,
            provider,
            attempt_index,
            outcome,
            latency,
            timestamp: SystemTime::now(),
            tokens: None,
            estimated_cost: None,
        }
    }
}
