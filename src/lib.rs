//! Multi-provider AI generation with failover, circuit breaking and
//! per-provider concurrency limits.

pub mod config;
pub mod dispatch;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod resilience;
pub mod service;
pub mod usage;

pub use config::{AiConfig, ValidatedConfig};
pub use dispatch::{AiError, GenerationResult};
pub use health::{HealthReport, HealthStatus};
pub use lifecycle::Shutdown;
pub use provider::{GenerationRequest, ProviderAdapter, ProviderId};
pub use service::{AiService, AiServiceBuilder};
