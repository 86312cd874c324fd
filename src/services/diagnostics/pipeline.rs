//! Analysis Pipeline
//!
//! Fixed three-stage flow per artifact: `prepare → summarize → analyze`.
//! Each stage consumes the typed output of the previous one.

use super::extractor::parse_summary;
use super::fallback::HistogramRefiner;
use super::models::*;
use super::prompts::{PromptPair, build_prompts};
use crate::services::llm::ModelBackend;

// ============================================================================
// Stage outputs
// ============================================================================

/// Output of `prepare`
#[derive(Debug, Clone)]
pub struct Prepared {
    pub artifact: ArtifactType,
    pub raw_text: String,
    pub prompts: PromptPair,
}

/// Output of `summarize`
#[derive(Debug, Clone)]
pub struct Summarized {
    pub prepared: Prepared,
    pub summary: Option<Summary>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// One run of the pipeline against a resolved backend and model
pub struct AnalysisPipeline<'a> {
    backend: &'a dyn ModelBackend,
    model: String,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(backend: &'a dyn ModelBackend, model: impl Into<String>) -> Self {
        Self { backend, model: model.into() }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run `summarize` then `analyze` on a prepared artifact
    pub async fn execute(&self, prepared: Prepared) -> Result<AnalysisResult, DiagnosticError> {
        let summarized = self.summarize(prepared).await?;
        self.analyze(summarized).await
    }

    /// Summary call, normalization, and (histograms only) the fallback chain
    ///
    /// Backend errors propagate for thread dumps and flame graphs. For heap
    /// histograms they are absorbed and the fallback chain takes over.
    pub async fn summarize(&self, prepared: Prepared) -> Result<Summarized, DiagnosticError> {
        let artifact = prepared.artifact;
        tracing::info!("Summarizing {} with {}:{}", artifact, self.backend.kind(), self.model);

        let summary = match artifact {
            ArtifactType::HeapHistogram => {
                let first = match self.backend.call(&prepared.prompts.summary, &self.model).await {
                    Ok(raw) => parse_summary(artifact, &raw),
                    Err(e) => {
                        tracing::warn!("Histogram summary call failed, starting fallback: {}", e);
                        None
                    },
                };

                match first.filter(Summary::has_ranked_entries) {
                    Some(summary) => Some(summary),
                    None => {
                        let refiner = HistogramRefiner::new(self.backend, &self.model);
                        let (summary, step) = refiner.recover(&prepared.raw_text).await;
                        tracing::info!("Histogram summary recovered via {:?}", step);
                        Some(summary)
                    },
                }
            },
            ArtifactType::ThreadDump | ArtifactType::FlameGraph => {
                let raw = self.backend.call(&prepared.prompts.summary, &self.model).await?;
                let summary = parse_summary(artifact, &raw);
                if summary.is_none() {
                    tracing::warn!("No JSON summary could be extracted for {}", artifact);
                }
                summary
            },
        };

        Ok(Summarized { prepared, summary })
    }

    /// Free-text analysis call; the text is returned verbatim
    pub async fn analyze(&self, summarized: Summarized) -> Result<AnalysisResult, DiagnosticError> {
        tracing::info!(
            "Analyzing {} with {}:{}",
            summarized.prepared.artifact,
            self.backend.kind(),
            self.model
        );

        let analysis_text = self
            .backend
            .call(&summarized.prepared.prompts.analysis, &self.model)
            .await?;

        Ok(AnalysisResult { summary: summarized.summary, analysis_text })
    }
}

/// Validate the artifact type and build both prompts
pub fn prepare(artifact_type: &str, raw_text: &str) -> Result<Prepared, DiagnosticError> {
    let artifact = ArtifactType::parse(artifact_type)?;
    tracing::debug!("Preparing prompts for {} ({} bytes)", artifact, raw_text.len());

    Ok(Prepared {
        artifact,
        raw_text: raw_text.to_string(),
        prompts: build_prompts(artifact, raw_text),
    })
}
