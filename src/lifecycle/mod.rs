//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (AiService::builder):
//!     Validate config → Register providers (breakers, limiters) → Ready
//!
//! Background tasks (AiService::spawn_health_monitor):
//!     Subscribe to Shutdown → loop until signalled
//!
//! Shutdown (shutdown.rs):
//!     Embedder triggers → every subscribed task exits its loop
//! ```
//!
//! # Design Decisions
//! - Startup never fails on configuration problems; capability degrades instead
//! - Breaker and limiter state live exactly as long as the service

pub mod shutdown;

pub use shutdown::Shutdown;
