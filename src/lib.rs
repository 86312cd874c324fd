//! JVM Lens Library
//!
//! LLM-backed analysis of JVM diagnostic artifacts (thread dumps, heap
//! histograms, flame graphs): a strict-shape numeric summary plus a free-text
//! expert analysis for each.

pub mod config;
pub mod logging;
pub mod services;

// Re-export commonly used types
pub use config::Config;
pub use services::diagnostics::{
    AnalysisBundle, AnalysisRequest, AnalysisResult, ArtifactOutcome, ArtifactType, BundleReport,
    DiagnosticError, DiagnosticsService, ErrorReport, Summary,
};
pub use services::llm::{BackendKind, LLMClient, LLMError, ModelBackend};
