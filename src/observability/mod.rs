//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured key/value fields)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → whatever `metrics` recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Metrics go through the `metrics` facade; without a recorder they are no-ops
//! - Provider ids and outcomes are static strings, so labels never allocate

pub mod logging;
pub mod metrics;
