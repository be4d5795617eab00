//! Dispatch results and the error taxonomy callers see.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::provider::{ProviderId, ProviderResponse};

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub request_id: Uuid,
    /// Provider that served the request.
    pub provider_used: ProviderId,
    /// Candidates tried, including skipped ones and the one that succeeded.
    pub attempts: usize,
    pub response: ProviderResponse,
    /// Latency of the successful adapter call.
    pub latency: Duration,
}

impl GenerationResult {
    pub fn text(&self) -> &str {
        &self.response.text
    }

    /// Candidates that were skipped or failed before the one that served.
    pub fn failover_count(&self) -> usize {
        self.attempts.saturating_sub(1)
    }
}

/// Errors returned by the AI service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// Breaker open; the provider was not called.
    #[error("provider '{provider}' unavailable: circuit breaker open")]
    ProviderUnavailable { provider: ProviderId },

    /// Concurrency limit saturated; the provider was not called.
    #[error("provider '{provider}' throttled: concurrency limit reached")]
    Throttled { provider: ProviderId },

    #[error("provider '{provider}' timed out after {}s", .timeout.as_secs_f64())]
    ProviderTimeout { provider: ProviderId, timeout: Duration },

    #[error("provider '{provider}' failed: {message}")]
    ProviderTransientError { provider: ProviderId, message: String },

    /// The request itself was rejected; not retried elsewhere.
    #[error("provider '{provider}' rejected the request: {message}")]
    ProviderRequestError { provider: ProviderId, message: String },

    #[error("all providers exhausted: {}", FailureList(.failures))]
    AllProvidersExhausted { failures: Vec<CandidateFailure> },

    /// No provider is enabled and registered.
    #[error("AI features are disabled: no provider is available")]
    Disabled,
}

impl AiError {
    /// The provider this error is about, if it concerns a single one.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            AiError::ProviderUnavailable { provider }
            | AiError::Throttled { provider }
            | AiError::ProviderTimeout { provider, .. }
            | AiError::ProviderTransientError { provider, .. }
            | AiError::ProviderRequestError { provider, .. } => Some(*provider),
            AiError::AllProvidersExhausted { .. } | AiError::Disabled => None,
        }
    }

    /// Per-candidate reasons for `AllProvidersExhausted`, empty otherwise.
    pub fn failures(&self) -> &[CandidateFailure] {
        match self {
            AiError::AllProvidersExhausted { failures } => failures,
            _ => &[],
        }
    }
}

/// Why one candidate did not serve a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub provider: ProviderId,
    pub error: AiError,
}

struct FailureList<'a>(&'a [CandidateFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no candidates");
        }
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure.error)?;
        }
        Ok(())
    }
}
