//! LLM Clients - HTTP clients for the supported model backends
//!
//! Uses reqwest to call:
//! - Google Gemini (`models/{model}:generateContent`)
//! - Ollama (`/api/generate`, non-streaming)
//!
//! Both clients share one pooled `reqwest::Client` and never retry; retry and
//! fallback policy belongs to the caller.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::models::*;
use crate::config::{GeminiConfig, LlmConfig, OllamaConfig};

// ============================================================================
// Backend Trait
// ============================================================================

/// Uniform call interface over one model backend
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Which backend variant this is
    fn kind(&self) -> BackendKind;

    /// Model used when the caller does not override it
    fn default_model(&self) -> &str;

    /// Send `prompt` to `model` and return the raw completion text
    async fn call(&self, prompt: &str, model: &str) -> Result<String, LLMError>;

    /// Pick the caller's override when it is non-blank, else the default model
    fn resolve_model(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_model())
            .to_string()
    }
}

// ============================================================================
// Backend Registry
// ============================================================================

/// One handle per backend variant; a new backend is a new field and match arm
#[derive(Clone)]
pub struct LLMClient {
    gemini: Arc<dyn ModelBackend>,
    ollama: Arc<dyn ModelBackend>,
}

impl LLMClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LLMError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            gemini: Arc::new(GeminiClient::with_http_client(
                http_client.clone(),
                &config.gemini,
                config.timeout_secs,
            )),
            ollama: Arc::new(OllamaClient::with_http_client(
                http_client,
                &config.ollama,
                config.timeout_secs,
            )),
        })
    }

    /// Create with custom backends (for testing)
    pub fn with_backends(gemini: Arc<dyn ModelBackend>, ollama: Arc<dyn ModelBackend>) -> Self {
        Self { gemini, ollama }
    }

    pub fn backend(&self, kind: BackendKind) -> Arc<dyn ModelBackend> {
        match kind {
            BackendKind::Gemini => Arc::clone(&self.gemini),
            BackendKind::Ollama => Arc::clone(&self.ollama),
        }
    }
}

// ============================================================================
// Gemini
// ============================================================================

/// Cloud-hosted Gemini client
pub struct GeminiClient {
    http_client: Client,
    api_base: String,
    api_key: Option<String>,
    default_model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn with_http_client(http_client: Client, config: &GeminiConfig, timeout_secs: u64) -> Self {
        Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            default_model: config.model.clone(),
            timeout_secs,
        }
    }

    fn hint(model: &str) -> String {
        format!(
            "Set GEMINI_API_KEY and optionally GEMINI_MODEL, or pass a model like \
             'gemini-1.5-pro' or 'gemini-1.5-flash' (tried '{}').",
            model
        )
    }

    fn unavailable(model: &str, message: impl Into<String>) -> LLMError {
        LLMError::BackendUnavailable {
            backend: BackendKind::Gemini,
            model: model.to_string(),
            hint: Self::hint(model),
            message: message.into(),
        }
    }

    fn invocation(model: &str, message: impl Into<String>) -> LLMError {
        LLMError::ModelInvocation {
            backend: BackendKind::Gemini,
            model: model.to_string(),
            hint: Self::hint(model),
            message: message.into(),
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn call(&self, prompt: &str, model: &str) -> Result<String, LLMError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Self::unavailable(model, "GEMINI_API_KEY not set"))?;

        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt.to_string() }],
            }],
        };

        tracing::debug!("Calling Gemini API: {} ({} prompt bytes)", url, prompt.len());

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::unavailable(model, transport_message(&e, self.timeout_secs)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("API error {}: {}", status, truncate(&error_text, 500));
            return Err(if is_availability_status(status) {
                Self::unavailable(model, message)
            } else {
                Self::invocation(model, message)
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Self::unavailable(model, transport_message(&e, self.timeout_secs))
                } else {
                    Self::invocation(model, format!("Failed to decode response: {}", e))
                }
            })?;

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts.unwrap_or_default())
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(Self::invocation(model, "Gemini returned no text content"));
        }

        Ok(text)
    }
}

// ============================================================================
// Ollama
// ============================================================================

/// Local Ollama runtime client
pub struct OllamaClient {
    http_client: Client,
    host: String,
    default_model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn with_http_client(http_client: Client, config: &OllamaConfig, timeout_secs: u64) -> Self {
        Self {
            http_client,
            host: config.host.trim_end_matches('/').to_string(),
            default_model: config.model.clone(),
            timeout_secs,
        }
    }

    fn hint(&self, model: &str) -> String {
        format!(
            "Ensure Ollama is running at {} and the model is pulled (e.g., 'ollama pull {}').",
            self.host, model
        )
    }

    fn unavailable(&self, model: &str, message: impl Into<String>) -> LLMError {
        LLMError::BackendUnavailable {
            backend: BackendKind::Ollama,
            model: model.to_string(),
            hint: self.hint(model),
            message: message.into(),
        }
    }

    fn invocation(&self, model: &str, message: impl Into<String>) -> LLMError {
        LLMError::ModelInvocation {
            backend: BackendKind::Ollama,
            model: model.to_string(),
            hint: self.hint(model),
            message: message.into(),
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn call(&self, prompt: &str, model: &str) -> Result<String, LLMError> {
        let url = format!("{}/api/generate", self.host);
        let request = GenerateRequest { model, prompt, stream: false };

        tracing::debug!("Calling Ollama API: {} with model {}", url, model);

        let response = self
            .http_client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.unavailable(model, transport_message(&e, self.timeout_secs)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("API error {}: {}", status, truncate(&error_text, 500));
            return Err(if status.is_server_error() {
                self.unavailable(model, message)
            } else {
                self.invocation(model, message)
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.unavailable(model, transport_message(&e, self.timeout_secs))
                } else {
                    self.invocation(model, format!("Failed to decode response: {}", e))
                }
            })?;

        Ok(parsed.response.unwrap_or_default())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn transport_message(e: &reqwest::Error, timeout_secs: u64) -> String {
    if e.is_timeout() {
        format!("timed out after {}s: {}", timeout_secs, e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Credential problems and server-side outages, as opposed to a rejected request
fn is_availability_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ============================================================================
// Ollama API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}
