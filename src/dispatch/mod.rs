//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! GenerationRequest
//!     → factory.rs: ordered candidates (override | default, then priority)
//!     → for each candidate:
//!         breaker.allow()      → RejectFast: record Unavailable, next
//!         limiter.try_acquire  → saturated:  record Throttled, next
//!         adapter call under timeout, ticket released on every path
//!         success              → record_success, return
//!         timeout / transient  → record_failure, next
//!         request error        → return immediately, breaker untouched
//!     → AllProvidersExhausted with every candidate's reason
//! ```
//!
//! # Design Decisions
//! - Candidate order is a pure function of the registry and the request
//! - No retries against the same provider; failover is the retry
//! - One AttemptRecord per candidate, appended in attempt order

pub mod factory;
pub mod types;

pub use factory::ProviderFactory;
pub use types::{AiError, CandidateFailure, GenerationResult};
