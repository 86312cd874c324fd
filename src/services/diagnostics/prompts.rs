//! Prompt Builder
//!
//! Each artifact type gets two prompts: a free-text expert analysis prompt and
//! a strict-JSON extraction prompt. Both embed the raw artifact verbatim.

use super::fallback::HistogramRow;
use super::models::{ArtifactType, TOP_N};

// ============================================================================
// Prompt Templates
// ============================================================================

const EXTRACTOR_ROLE: &str = "You are a precise data extractor.";

const JSON_ONLY_RULES: &str = "Rules:\n\
- Output ONLY the JSON object. No explanation, no prose before or after it.\n\
- Do not wrap the JSON in markdown code fences.\n\
- Numbers must be plain JSON numbers (no quotes, no thousands separators).\n\
- Do not add keys that are not in the shape above.";

const THREAD_DUMP_SHAPE: &str = r#"{
  "type": "jstack",
  "totalThreads": number,
  "byState": {"RUNNABLE": number, "BLOCKED": number, "WAITING": number, "TIMED_WAITING": number},
  "blockedByMonitor": number
}"#;

const HEAP_HISTOGRAM_SHAPE: &str = r#"{
  "type": "jmap",
  "totalBytes": number,
  "topByBytes": [{"className": string, "bytes": number, "instances": number}]
}"#;

const FLAME_GRAPH_SHAPE: &str = r#"{
  "type": "flame",
  "totalSamples": number,
  "topFunctions": [{"name": string, "samples": number}]
}"#;

// ============================================================================
// Prompt Builder
// ============================================================================

/// The two prompts issued for one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub analysis: String,
    pub summary: String,
}

/// Build the analysis and summary prompts for `artifact`
pub fn build_prompts(artifact: ArtifactType, raw_text: &str) -> PromptPair {
    PromptPair {
        analysis: analysis_prompt(artifact, raw_text),
        summary: summary_prompt(artifact, raw_text),
    }
}

fn analysis_prompt(artifact: ArtifactType, raw_text: &str) -> String {
    let task = match artifact {
        ArtifactType::ThreadDump => {
            "Analyze this Java thread dump (jstack). Identify hotspots, blocked threads, \
             lock contention and deadlocks, and give concrete remediation steps."
        },
        ArtifactType::HeapHistogram => {
            "Analyze this Java heap histogram (jmap -histo). Identify likely memory leaks, \
             dominant classes and large object populations, and suggest GC and heap tuning."
        },
        ArtifactType::FlameGraph => {
            "Analyze this CPU flame graph given as folded stacks. Summarize the hottest call \
             paths, likely bottlenecks, and the code areas most worth optimizing."
        },
    };

    format!("You are a senior JVM performance engineer. {}\n\n{}", task, raw_text)
}

fn summary_prompt(artifact: ArtifactType, raw_text: &str) -> String {
    match artifact {
        ArtifactType::ThreadDump => format!(
            "{}\nFrom this jstack thread dump, output a compact JSON object with exactly \
             this shape:\n{}\n{}\n\nDump:\n{}",
            EXTRACTOR_ROLE, THREAD_DUMP_SHAPE, JSON_ONLY_RULES, raw_text
        ),
        ArtifactType::HeapHistogram => format!(
            "{}\nFrom this jmap -histo output, output a JSON object with exactly this shape:\n\
             {}\n{}\n\
             - Parse only histogram rows; ignore the header (\"num #instances #bytes class name\") \
             and the \"Total\" footer.\n\
             - Strip thousands separators from every number.\n\
             - Sort topByBytes by bytes descending and include at most {} entries.\n\
             - Use full class names exactly as written.\n\nData:\n{}",
            EXTRACTOR_ROLE, HEAP_HISTOGRAM_SHAPE, JSON_ONLY_RULES, TOP_N, raw_text
        ),
        ArtifactType::FlameGraph => format!(
            "{}\nFrom these folded stacks, output a JSON object with exactly this shape:\n\
             {}\n{}\n\
             - topFunctions holds at most {} entries sorted by samples descending.\n\nData:\n{}",
            EXTRACTOR_ROLE, FLAME_GRAPH_SHAPE, JSON_ONLY_RULES, TOP_N, raw_text
        ),
    }
}

/// Stricter histogram re-prompt against the full raw text
pub fn histogram_refine_prompt(raw_text: &str) -> String {
    format!(
        "Output ONLY JSON with exactly these keys and types, no markdown:\n{}\n\
         Instructions:\n\
         - Histogram rows look like \"<rank>: <instances> <bytes> <class name>\", \
         e.g. \"1: 1,234 56,789 java.lang.String\".\n\
         - Remove commas from numbers. Ignore header and footer lines.\n\
         - Use full class names.\n\
         - Sort topByBytes by bytes descending; include at most {} entries.\n\nData:\n{}",
        HEAP_HISTOGRAM_SHAPE, TOP_N, raw_text
    )
}

/// Histogram re-prompt carrying only locally extracted, cleaned rows
pub fn histogram_rows_prompt(rows: &[HistogramRow]) -> String {
    let listing = rows
        .iter()
        .map(|row| format!("{} {} {}", row.instances(), row.bytes(), row.class_name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Output ONLY JSON with exactly these keys and types, no markdown:\n{}\n\
         Instructions:\n\
         - Use only the rows below (format: \"<instances> <bytes> <class>\").\n\
         - Sort by bytes descending; include at most {} entries.\n\
         - Numbers only, no commas. Use each class name as-is.\n\nRows:\n{}",
        HEAP_HISTOGRAM_SHAPE, TOP_N, listing
    )
}
