//! Closed set of provider identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A supported AI backend.
///
/// Declaration order doubles as the tie-breaker when two providers share a
/// configured priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Claude,
    Gemini,
    Local,
}

impl ProviderId {
    /// Every known provider, in declaration order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAi,
        ProviderId::Claude,
        ProviderId::Gemini,
        ProviderId::Local,
    ];

    /// Stable lowercase identifier used in config, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
            ProviderId::Local => "local",
        }
    }

    /// Whether the provider needs an API key to be usable.
    pub fn requires_credentials(&self) -> bool {
        !matches!(self, ProviderId::Local)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a configured identifier is not a known provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider identifier '{0}'")]
pub struct ParseProviderIdError(pub String);

impl FromStr for ProviderId {
    type Err = ParseProviderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "anthropic" {
            return Ok(ProviderId::Claude);
        }
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| ParseProviderIdError(s.to_string()))
    }
}
