//! Diagnostics Data Models
//!
//! Artifact identities, typed summaries, per-request inputs/outputs and the
//! error types surfaced to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::services::llm::LLMError;

/// Ranked lists in every summary are capped at this many entries
pub const TOP_N: usize = 10;

/// Thread states every thread-dump summary reports, even when zero
pub const CANONICAL_THREAD_STATES: [&str; 4] = ["RUNNABLE", "BLOCKED", "WAITING", "TIMED_WAITING"];

// ============================================================================
// Artifact Types
// ============================================================================

/// Category of JVM diagnostic data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactType {
    /// Thread dump (jstack)
    #[serde(rename = "jstack")]
    ThreadDump,
    /// Class histogram (jmap -histo)
    #[serde(rename = "jmap")]
    HeapHistogram,
    /// Folded-stack CPU flame graph data
    #[serde(rename = "flame")]
    FlameGraph,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 3] = [Self::ThreadDump, Self::HeapHistogram, Self::FlameGraph];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreadDump => "jstack",
            Self::HeapHistogram => "jmap",
            Self::FlameGraph => "flame",
        }
    }

    pub fn parse(name: &str) -> Result<Self, DiagnosticError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jstack" | "thread-dump" | "thread_dump" => Ok(Self::ThreadDump),
            "jmap" | "heap-histogram" | "heap_histogram" | "histo" => Ok(Self::HeapHistogram),
            "flame" | "flame-graph" | "flame_graph" | "folded" => Ok(Self::FlameGraph),
            _ => Err(DiagnosticError::UnsupportedArtifactType(name.to_string())),
        }
    }

    /// Upper-case label used in the combined text view
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request
// ============================================================================

/// One artifact to analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Artifact identifier as supplied by the caller (validated in `prepare`)
    pub artifact_type: String,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AnalysisRequest {
    pub fn new(artifact_type: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            raw_text: raw_text.into(),
            provider: None,
            model: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Structured numeric digest of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Summary {
    #[serde(rename = "jstack")]
    ThreadDump(ThreadDumpSummary),
    #[serde(rename = "jmap")]
    HeapHistogram(HeapHistogramSummary),
    #[serde(rename = "flame")]
    FlameGraph(FlameGraphSummary),
}

impl Summary {
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::ThreadDump(_) => ArtifactType::ThreadDump,
            Self::HeapHistogram(_) => ArtifactType::HeapHistogram,
            Self::FlameGraph(_) => ArtifactType::FlameGraph,
        }
    }

    /// Whether the ranked list (if the variant has one) carries any entries
    pub fn has_ranked_entries(&self) -> bool {
        match self {
            Self::ThreadDump(_) => true,
            Self::HeapHistogram(s) => !s.top_by_bytes.is_empty(),
            Self::FlameGraph(s) => !s.top_functions.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDumpSummary {
    pub total_threads: u64,
    pub by_state: BTreeMap<String, u64>,
    pub blocked_by_monitor: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapHistogramSummary {
    pub total_bytes: u64,
    pub top_by_bytes: Vec<ClassFootprint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFootprint {
    pub class_name: String,
    pub bytes: u64,
    pub instances: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlameGraphSummary {
    pub total_samples: u64,
    pub top_functions: Vec<HotFunction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotFunction {
    pub name: String,
    pub samples: u64,
}

// ============================================================================
// Result
// ============================================================================

/// Summary plus free-text analysis for one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: Option<Summary>,
    pub analysis_text: String,
}

// ============================================================================
// Multi-artifact requests
// ============================================================================

/// At most one raw-text blob per artifact type, plus request-scoped backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jstack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jmap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flame: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AnalysisBundle {
    pub fn text_for(&self, artifact: ArtifactType) -> Option<&str> {
        match artifact {
            ArtifactType::ThreadDump => self.jstack.as_deref(),
            ArtifactType::HeapHistogram => self.jmap.as_deref(),
            ArtifactType::FlameGraph => self.flame.as_deref(),
        }
    }

    /// Per-artifact request for `artifact`, if the bundle carries its text
    pub fn request_for(&self, artifact: ArtifactType) -> Option<AnalysisRequest> {
        self.text_for(artifact).map(|text| AnalysisRequest {
            artifact_type: artifact.as_str().to_string(),
            raw_text: text.to_string(),
            provider: self.provider.clone(),
            model: self.model.clone(),
        })
    }
}

/// Outcome of one artifact within a bundle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ArtifactOutcome {
    Completed(AnalysisResult),
    Failed(ErrorReport),
}

/// Results for every artifact type present in an `AnalysisBundle`
#[derive(Debug, Clone, Default, Serialize)]
pub struct BundleReport {
    pub results: BTreeMap<ArtifactType, ArtifactOutcome>,
}

impl BundleReport {
    /// Analyses of completed artifacts, labelled by type, for display
    pub fn combined_analysis(&self) -> String {
        self.results
            .iter()
            .filter_map(|(artifact, outcome)| match outcome {
                ArtifactOutcome::Completed(result) => {
                    Some(format!("--- {} ---\n{}", artifact.label(), result.analysis_text))
                },
                ArtifactOutcome::Failed(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn failures(&self) -> impl Iterator<Item = (ArtifactType, &ErrorReport)> {
        self.results.iter().filter_map(|(artifact, outcome)| match outcome {
            ArtifactOutcome::Failed(report) => Some((*artifact, report)),
            ArtifactOutcome::Completed(_) => None,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Diagnostics errors
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticError {
    #[error("Unsupported artifact type: {0}")]
    UnsupportedArtifactType(String),

    #[error(transparent)]
    Backend(#[from] LLMError),
}

impl DiagnosticError {
    pub fn hint(&self) -> String {
        match self {
            Self::UnsupportedArtifactType(_) => format!(
                "Use one of: {}.",
                ArtifactType::ALL
                    .iter()
                    .map(ArtifactType::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Backend(e) => e.hint(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport { error: self.to_string(), hint: self.hint() }
    }
}

/// Structured error handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
    pub hint: String,
}
