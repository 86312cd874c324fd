//! LLM Backend Module
//!
//! Uniform `call(prompt, model) -> text` access to the supported model backends.
//!
//! # Architecture
//! ```text
//! ┌─────────────────┐
//! │  ModelBackend   │  ← Trait (one operation: call)
//! └────────┬────────┘
//!          │
//!    ┌─────┴─────┐
//!    ▼           ▼
//! ┌──────┐  ┌──────┐
//! │Gemini│  │Ollama│
//! │Client│  │Client│
//! └──────┘  └──────┘
//! ```
//!
//! `LLMClient` holds one handle per `BackendKind` and shares a single pooled
//! HTTP client between them.

mod client;
mod models;

pub use client::{GeminiClient, LLMClient, ModelBackend, OllamaClient};
pub use models::*;
