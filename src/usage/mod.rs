//! Usage tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch attempt finished (or skipped)
//!     → types.rs (AttemptRecord, one per candidate tried)
//!     → tracker.rs (UsageSink: bounded in-memory log + per-provider totals)
//!     → admin endpoint / later cost analysis
//! ```
//!
//! # Design Decisions
//! - Write-only from the dispatcher's point of view; sink errors are logged
//!   and never change a dispatch outcome
//! - Records are immutable once appended

pub mod tracker;
pub mod types;

pub use tracker::{DEFAULT_RETENTION, NoopUsageSink, ProviderUsage, UsageError, UsageSink, UsageSummary, UsageTracker};
pub use types::{AttemptOutcome, AttemptRecord};
