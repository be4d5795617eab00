//! Provider subsystem.
//!
//! # Data Flow
//! ```text
//! ValidatedConfig (ProviderConfig per id)
//!     + adapters registered by the embedder
//!     → registry.rs (enabled flags, priority order, limits, breakers)
//!     → dispatch (ordered candidates)
//!     → adapter.rs (uniform Generate call per backend)
//! ```
//!
//! # Design Decisions
//! - Providers are a closed set of identifiers (id.rs), resolved once at startup
//! - The core only sees the `ProviderAdapter` trait, never an HTTP client
//! - Adapter errors are classified by the adapter, not by string matching

pub mod adapter;
pub mod id;
pub mod registry;

pub use adapter::{
    AdapterError, GenerationParams, GenerationRequest, ProviderAdapter, ProviderResponse,
    TokenUsage,
};
pub use id::{ParseProviderIdError, ProviderId};
pub use registry::{ProviderEntry, ProviderRegistry};
