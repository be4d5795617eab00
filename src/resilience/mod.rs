//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Candidate provider selected by dispatch:
//!     → circuit_breaker.rs (Allow: admit, admit as trial, or reject fast)
//!     → concurrency.rs (acquire a ticket or throttle, never queue)
//!     → timeouts.rs (bound the adapter call)
//!     → circuit_breaker.rs (record success / breaker-relevant failure)
//! ```
//!
//! # Design Decisions
//! - One breaker and one limiter per provider, created at registration
//! - Breaker state lives behind `BreakerStore` (store.rs) so it can move to a
//!   shared store; the in-memory store is the default
//! - Critical sections are short and never span I/O
//! - Tickets are RAII guards, released on every exit path

pub mod circuit_breaker;
pub mod concurrency;
pub mod store;
pub mod timeouts;

pub use circuit_breaker::{Admission, CircuitBreaker};
pub use concurrency::{ConcurrencyLimiter, ConcurrencyTicket};
pub use store::{BreakerSnapshot, BreakerState, BreakerStore, InMemoryBreakerStore};
pub use timeouts::call_with_timeout;
