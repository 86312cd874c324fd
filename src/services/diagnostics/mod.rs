//! JVM Diagnostics Analyzer
//!
//! Produces a strict-shape summary and a free-text analysis for thread dumps,
//! heap histograms, and folded-stack flame graphs, delegating interpretation
//! to a model backend.
//!
//! # Architecture
//!
//! ```text
//! DiagnosticsService::analyze_file()
//!           │
//!           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                  AnalysisPipeline                   │
//! │                                                     │
//! │   prepare ──────▶ summarize ──────▶ analyze         │
//! │   (prompts)       │                 (prose, as-is)  │
//! │                   ▼                                 │
//! │             extractor::parse_summary                │
//! │                   │ jmap && empty                   │
//! │                   ▼                                 │
//! │             HistogramRefiner                        │
//! │     reprompt → rows reprompt → local aggregate      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use jvmlens::services::diagnostics::DiagnosticsService;
//!
//! let service = DiagnosticsService::new(&config.llm)?;
//! let result = service.analyze_file("jmap", &histogram, Some("ollama"), None).await?;
//! println!("{:?}", result.summary);
//! println!("{}", result.analysis_text);
//! ```

pub mod extractor;
pub mod fallback;
pub mod models;
pub mod pipeline;
pub mod prompts;
mod service;


pub use fallback::{HistogramRefiner, HistogramRow, RecoveryStep};
pub use models::*;
pub use pipeline::AnalysisPipeline;
pub use service::DiagnosticsService;
