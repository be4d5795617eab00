//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → AiConfig (raw, every field defaulted)
//!     → validation.rs (resolve ids, clamp ranges, collect warnings)
//!     → ValidatedConfig (immutable, shared with the service)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated; the provider set is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Only unreadable or unparsable files are errors; semantic problems
//!   degrade capability and are reported as warnings

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AiConfig, CircuitBreakerConfig, ObservabilityConfig, ProviderSettings};
pub use validation::{validate_config, ConfigWarning, ProviderConfig, ValidatedConfig};
