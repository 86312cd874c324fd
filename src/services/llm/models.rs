//! LLM Data Models
//!
//! Backend identities and the error taxonomy shared by every model backend.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Backend Kinds
// ============================================================================

/// Model backend variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Google Gemini (cloud-hosted)
    Gemini,
    /// Ollama (locally-run model runtime)
    Ollama,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [Self::Gemini, Self::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    /// Case-insensitive lookup; `None` for names no backend answers to.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Resolve a request-scoped provider name, falling back to the configured default
    pub fn resolve(requested: Option<&str>, default: &str) -> Result<Self, LLMError> {
        let name = requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default);
        Self::parse(name).ok_or_else(|| LLMError::UnknownBackend(name.to_string()))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LLM Error Types
// ============================================================================

/// LLM backend errors
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("{backend} backend unavailable (model={model}): {message}. {hint}")]
    BackendUnavailable { backend: BackendKind, model: String, hint: String, message: String },

    #[error("{backend} call failed (model={model}): {message}. {hint}")]
    ModelInvocation { backend: BackendKind, model: String, hint: String, message: String },

    #[error("Unknown LLM provider '{0}'")]
    UnknownBackend(String),

    #[error("Failed to initialise HTTP client: {0}")]
    ClientInit(#[from] reqwest::Error),
}

impl LLMError {
    /// Remediation hint suitable for showing next to the error message
    pub fn hint(&self) -> String {
        match self {
            Self::BackendUnavailable { hint, .. } | Self::ModelInvocation { hint, .. } => {
                hint.clone()
            },
            Self::UnknownBackend(_) => format!(
                "Use one of: {}.",
                BackendKind::ALL
                    .iter()
                    .map(BackendKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::ClientInit(_) => "Check the TLS/proxy configuration of this host.".to_string(),
        }
    }

    /// Backend the error originated from, if any
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            Self::BackendUnavailable { backend, .. } | Self::ModelInvocation { backend, .. } => {
                Some(*backend)
            },
            _ => None,
        }
    }
}
