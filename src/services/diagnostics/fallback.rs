//! Heap Histogram Fallback Chain
//!
//! Models sometimes ignore the requested shape for large or noisy
//! histograms. When the first extraction is empty, recovery escalates:
//!
//! 1. re-prompt with stricter row-pattern guidance against the full text
//! 2. extract rows locally and re-prompt with only the cleaned rows
//! 3. aggregate the local rows directly (no model call, cannot fail)

use once_cell::sync::Lazy;
use regex::Regex;

use super::extractor::{parse_lenient_u64, parse_summary, rank_class_footprints, sum_bytes};
use super::models::*;
use super::prompts::{histogram_refine_prompt, histogram_rows_prompt};
use crate::services::llm::ModelBackend;

// `<rank>: <instances> <bytes> <class name> [(module)]`
static HISTOGRAM_ROW_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+:\s+([\d,]+)\s+([\d,]+)\s+(.+?)\s*(?:\([^)]*\)\s*)?$")
        .expect("histogram row pattern is valid")
});

static HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*num\b").expect("header pattern is valid"));

static FOOTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^total\b").expect("footer pattern is valid"));

// ============================================================================
// Local row extraction
// ============================================================================

/// One histogram line as captured from the raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramRow {
    raw_instances: String,
    raw_bytes: String,
    pub class_name: String,
}

impl HistogramRow {
    pub fn new(
        instances: impl Into<String>,
        bytes: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            raw_instances: instances.into(),
            raw_bytes: bytes.into(),
            class_name: class_name.into(),
        }
    }

    pub fn instances(&self) -> u64 {
        parse_lenient_u64(&self.raw_instances).unwrap_or(0)
    }

    pub fn bytes(&self) -> u64 {
        parse_lenient_u64(&self.raw_bytes).unwrap_or(0)
    }
}

/// Pull histogram rows out of raw `jmap -histo` text, skipping header and footer
pub fn extract_histogram_rows(text: &str) -> Vec<HistogramRow> {
    text.lines()
        .filter(|line| !HEADER_REGEX.is_match(line))
        .filter_map(|line| {
            let cap = HISTOGRAM_ROW_REGEX.captures(line)?;
            let class_name = cap.get(3)?.as_str().trim();
            if class_name.is_empty() || FOOTER_REGEX.is_match(class_name) {
                return None;
            }
            Some(HistogramRow::new(cap.get(1)?.as_str(), cap.get(2)?.as_str(), class_name))
        })
        .collect()
}

/// Build a summary from local rows alone
pub fn aggregate_rows(rows: &[HistogramRow]) -> HeapHistogramSummary {
    let entries = rows
        .iter()
        .map(|row| ClassFootprint {
            class_name: row.class_name.clone(),
            bytes: row.bytes(),
            instances: row.instances(),
        })
        .collect();
    let top_by_bytes = rank_class_footprints(entries);
    let total_bytes = sum_bytes(&top_by_bytes);

    HeapHistogramSummary { total_bytes, top_by_bytes }
}

// ============================================================================
// Refinement chain
// ============================================================================

/// Which step of the chain produced the final histogram summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    Reprompt,
    Rows,
    LocalAggregate,
}

/// Runs the escalating recovery attempts for one histogram
pub struct HistogramRefiner<'a> {
    backend: &'a dyn ModelBackend,
    model: &'a str,
}

impl<'a> HistogramRefiner<'a> {
    pub fn new(backend: &'a dyn ModelBackend, model: &'a str) -> Self {
        Self { backend, model }
    }

    /// Always returns a summary; backend failures are logged and absorbed
    pub async fn recover(&self, raw_text: &str) -> (Summary, RecoveryStep) {
        if let Some(summary) = self.attempt(&histogram_refine_prompt(raw_text), "reprompt").await {
            return (summary, RecoveryStep::Reprompt);
        }

        let rows = extract_histogram_rows(raw_text);
        tracing::debug!("Extracted {} histogram rows locally", rows.len());

        if !rows.is_empty()
            && let Some(summary) = self.attempt(&histogram_rows_prompt(&rows), "rows").await
        {
            return (summary, RecoveryStep::Rows);
        }

        tracing::info!("Falling back to local aggregation of {} histogram rows", rows.len());
        (Summary::HeapHistogram(aggregate_rows(&rows)), RecoveryStep::LocalAggregate)
    }

    async fn attempt(&self, prompt: &str, step: &str) -> Option<Summary> {
        match self.backend.call(prompt, self.model).await {
            Ok(raw) => {
                let summary = parse_summary(ArtifactType::HeapHistogram, &raw)
                    .filter(Summary::has_ranked_entries);
                if summary.is_none() {
                    tracing::warn!("Histogram {} attempt returned no usable rows", step);
                }
                summary
            },
            Err(e) => {
                tracing::warn!("Histogram {} attempt failed: {}", step, e);
                None
            },
        }
    }
}
