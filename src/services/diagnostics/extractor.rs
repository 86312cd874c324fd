//! JSON Extraction & Normalization
//!
//! Turns whatever text a model returned for a summary prompt into a typed
//! `Summary`. Extraction is a two-stage parser (whole text, then the widest
//! `{...}` span); normalization coerces every numeric field to `u64`, re-ranks
//! and truncates the ranked lists, and recomputes derived totals. Neither step
//! returns an error: non-conforming output becomes `None` or a zero default.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::models::*;

// ============================================================================
// Extraction
// ============================================================================

/// Recover a JSON value from raw model output
///
/// 1. strict parse of the whole (trimmed) text
/// 2. parse of the span from the first `{` to the last `}`
pub fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    brace_span(trimmed).and_then(|span| serde_json::from_str::<Value>(span).ok())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extract and normalize in one step
pub fn parse_summary(artifact: ArtifactType, raw: &str) -> Option<Summary> {
    extract_json(raw).and_then(|value| normalize(artifact, &value))
}

// ============================================================================
// Numeric coercion
// ============================================================================

/// Lenient non-negative integer: numbers, numeric strings, comma-grouped strings
///
/// Returns `None` for absent, null, or non-numeric values. Negative values
/// clamp to 0 and fractions truncate.
pub fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Some(v)
            } else if n.as_i64().is_some() {
                Some(0)
            } else {
                n.as_f64().and_then(float_to_u64)
            }
        },
        Value::String(s) => parse_lenient_u64(s),
        _ => None,
    }
}

/// String form of `coerce_u64`; also used for locally extracted histogram rows
pub fn parse_lenient_u64(input: &str) -> Option<u64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(v) = cleaned.parse::<u64>() {
        return Some(v);
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v.max(0) as u64);
    }
    cleaned.parse::<f64>().ok().and_then(float_to_u64)
}

fn float_to_u64(v: f64) -> Option<u64> {
    if !v.is_finite() {
        return None;
    }
    if v <= 0.0 { Some(0) } else { Some(v.trunc().min(u64::MAX as f64) as u64) }
}

fn field_u64(obj: &Map<String, Value>, key: &str) -> u64 {
    obj.get(key).and_then(coerce_u64).unwrap_or(0)
}

fn field_string(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn field_objects<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

// ============================================================================
// Normalization
// ============================================================================

/// Build the typed summary for `artifact` from a parsed JSON value
///
/// Only JSON objects produce a summary. The variant follows the requested
/// artifact type, not the `type` key the model echoed back.
pub fn normalize(artifact: ArtifactType, value: &Value) -> Option<Summary> {
    let obj = value.as_object()?;

    let summary = match artifact {
        ArtifactType::ThreadDump => Summary::ThreadDump(normalize_thread_dump(obj)),
        ArtifactType::HeapHistogram => Summary::HeapHistogram(normalize_heap_histogram(obj)),
        ArtifactType::FlameGraph => Summary::FlameGraph(normalize_flame_graph(obj)),
    };
    Some(summary)
}

fn normalize_thread_dump(obj: &Map<String, Value>) -> ThreadDumpSummary {
    let mut by_state: BTreeMap<String, u64> = CANONICAL_THREAD_STATES
        .iter()
        .map(|state| (state.to_string(), 0))
        .collect();

    if let Some(states) = obj.get("byState").and_then(Value::as_object) {
        for (state, count) in states {
            let state = state.trim();
            if state.is_empty() {
                continue;
            }
            by_state.insert(state.to_string(), coerce_u64(count).unwrap_or(0));
        }
    }

    ThreadDumpSummary {
        total_threads: field_u64(obj, "totalThreads"),
        by_state,
        blocked_by_monitor: field_u64(obj, "blockedByMonitor"),
    }
}

fn normalize_heap_histogram(obj: &Map<String, Value>) -> HeapHistogramSummary {
    let entries = field_objects(obj, "topByBytes")
        .map(|entry| ClassFootprint {
            class_name: field_string(entry, "className"),
            bytes: field_u64(entry, "bytes"),
            instances: field_u64(entry, "instances"),
        })
        .collect();
    let top_by_bytes = rank_class_footprints(entries);

    let total_bytes = obj
        .get("totalBytes")
        .and_then(coerce_u64)
        .unwrap_or_else(|| sum_bytes(&top_by_bytes));

    HeapHistogramSummary { total_bytes, top_by_bytes }
}

fn normalize_flame_graph(obj: &Map<String, Value>) -> FlameGraphSummary {
    let mut top_functions: Vec<HotFunction> = field_objects(obj, "topFunctions")
        .map(|entry| HotFunction {
            name: field_string(entry, "name"),
            samples: field_u64(entry, "samples"),
        })
        .collect();
    top_functions.sort_by(|a, b| b.samples.cmp(&a.samples));
    top_functions.truncate(TOP_N);

    FlameGraphSummary { total_samples: field_u64(obj, "totalSamples"), top_functions }
}

/// Total of `bytes` across entries, saturating at `u64::MAX`
pub fn sum_bytes(entries: &[ClassFootprint]) -> u64 {
    entries.iter().fold(0u64, |acc, e| acc.saturating_add(e.bytes))
}

/// Sort descending by bytes (stable) and keep the top entries
pub fn rank_class_footprints(mut entries: Vec<ClassFootprint>) -> Vec<ClassFootprint> {
    entries.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    entries.truncate(TOP_N);
    entries
}
