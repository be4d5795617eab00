//! Health aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! On demand (health endpoint, AiService::system_health):
//!     registry → breaker state + limiter saturation per enabled provider
//!     → aggregator.rs (per-provider status → overall status)
//!     → HealthReport
//!
//! Periodically (monitor.rs):
//!     interval timer → aggregator.rs → gauges + transition logs
//! ```
//!
//! # Design Decisions
//! - Read-only: sampling never moves a breaker between states
//! - Runs independently of the request path and is safe to call concurrently

pub mod aggregator;
pub mod monitor;

pub use aggregator::{HealthAggregator, HealthReport, HealthStatus};
pub use monitor::HealthMonitor;
