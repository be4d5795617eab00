//! Uniform call contract implemented once per AI backend.
//!
//! # Responsibilities
//! - Describe a generation request independently of any backend
//! - Let each backend report failures already classified as caller-side or
//!   provider-side
//!
//! # Design Decisions
//! - 5xx-equivalent and network failures are `Transient` (count toward the breaker)
//! - 4xx-equivalent failures are `Request` (never count, never fail over)
//! - The adapter receives its timeout so it can set client deadlines, but the
//!   dispatcher enforces it independently

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::provider::ProviderId;

/// Model parameters passed through to the backend untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Backend-specific model name; `None` lets the adapter pick its default.
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

/// A caller's generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: GenerationParams,
    /// Explicit provider override, tried first when enabled.
    pub provider: Option<ProviderId>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            params: GenerationParams::default(),
            provider: None,
        }
    }

    /// Prefer `provider` over the configured default.
    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

/// Token accounting reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A successful backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            usage: None,
        }
    }
}

/// Failure reported by a backend adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Backend-side failure (5xx, connection reset, overloaded).
    #[error("transient provider failure: {0}")]
    Transient(String),

    /// The backend's own client deadline expired.
    #[error("provider call timed out")]
    Timeout,

    /// The request itself was rejected (4xx, malformed prompt).
    #[error("request rejected by provider: {0}")]
    Request(String),
}

impl AdapterError {
    /// True if this failure says something about the provider's health.
    pub fn is_breaker_relevant(&self) -> bool {
        !matches!(self, AdapterError::Request(_))
    }
}

/// A backend that can serve generation requests.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Run one generation call. Must be cancel-safe: the dispatcher drops the
    /// future on timeout or when the caller goes away.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        timeout: Duration,
    ) -> Result<ProviderResponse, AdapterError>;
}
