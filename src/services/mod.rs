pub mod diagnostics;
pub mod llm;

pub use diagnostics::{
    AnalysisBundle, AnalysisRequest, AnalysisResult, ArtifactOutcome, ArtifactType, BundleReport,
    DiagnosticError, DiagnosticsService, ErrorReport, Summary,
};
pub use llm::{BackendKind, LLMClient, LLMError, ModelBackend};
