//! Diagnostics Service
//!
//! Entry point for callers: resolves the backend and model for a request and
//! drives the analysis pipeline. Nothing is cached between requests.

use tracing::Instrument;
use uuid::Uuid;

use super::models::*;
use super::pipeline::{AnalysisPipeline, prepare};
use crate::config::LlmConfig;
use crate::services::llm::{BackendKind, LLMClient, LLMError};

/// Analyzes JVM diagnostic artifacts through the configured model backends
#[derive(Clone)]
pub struct DiagnosticsService {
    client: LLMClient,
    default_provider: String,
}

impl DiagnosticsService {
    /// Create a service backed by the real Gemini/Ollama clients
    pub fn new(config: &LlmConfig) -> Result<Self, LLMError> {
        Ok(Self { client: LLMClient::new(config)?, default_provider: config.provider.clone() })
    }

    /// Create with a custom client (for testing)
    pub fn with_client(client: LLMClient, default_provider: impl Into<String>) -> Self {
        Self { client, default_provider: default_provider.into() }
    }

    /// Analyze one artifact: `{summary, analysis_text}` or a structured error
    pub async fn analyze_file(
        &self,
        artifact_type: &str,
        raw_text: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<AnalysisResult, DiagnosticError> {
        let prepared = prepare(artifact_type, raw_text)?;
        let kind = BackendKind::resolve(provider, &self.default_provider)?;
        let backend = self.client.backend(kind);
        let model = backend.resolve_model(model);

        let span = tracing::info_span!(
            "analyze_file",
            request_id = %Uuid::new_v4(),
            artifact = %prepared.artifact,
            backend = %kind,
            model = %model,
        );

        async {
            let start = std::time::Instant::now();
            let result = AnalysisPipeline::new(backend.as_ref(), model.as_str())
                .execute(prepared)
                .await;
            match &result {
                Ok(r) => tracing::info!(
                    "Analysis completed in {}ms (summary: {})",
                    start.elapsed().as_millis(),
                    if r.summary.is_some() { "yes" } else { "none" }
                ),
                Err(e) => tracing::error!("Analysis failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// `analyze_file` over an `AnalysisRequest`
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, DiagnosticError> {
        self.analyze_file(
            &request.artifact_type,
            &request.raw_text,
            request.provider.as_deref(),
            request.model.as_deref(),
        )
        .await
    }

    /// Analyze every artifact present in `bundle`
    ///
    /// Artifact types run concurrently and independently; each keeps its own
    /// summary-then-analysis order. A failure is reported for that artifact
    /// only and does not discard the others.
    pub async fn analyze_bundle(&self, bundle: &AnalysisBundle) -> BundleReport {
        let (jstack, jmap, flame) = tokio::join!(
            self.analyze_optional(bundle, ArtifactType::ThreadDump),
            self.analyze_optional(bundle, ArtifactType::HeapHistogram),
            self.analyze_optional(bundle, ArtifactType::FlameGraph),
        );

        let mut report = BundleReport::default();
        for (artifact, outcome) in [
            (ArtifactType::ThreadDump, jstack),
            (ArtifactType::HeapHistogram, jmap),
            (ArtifactType::FlameGraph, flame),
        ] {
            if let Some(outcome) = outcome {
                report.results.insert(artifact, outcome);
            }
        }
        report
    }

    async fn analyze_optional(
        &self,
        bundle: &AnalysisBundle,
        artifact: ArtifactType,
    ) -> Option<ArtifactOutcome> {
        let request = bundle.request_for(artifact)?;
        let outcome = match self.analyze(&request).await {
            Ok(result) => ArtifactOutcome::Completed(result),
            Err(e) => ArtifactOutcome::Failed(e.report()),
        };
        Some(outcome)
    }
}
