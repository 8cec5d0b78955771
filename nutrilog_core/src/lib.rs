#![forbid(unsafe_code)]

//! Core domain model and business logic for the NutriLog journal.
//!
//! This crate provides:
//! - Domain types (profile, nutrition, meals, exercise, daily logs)
//! - Energy calculators (BMR, projected weight change)
//! - The date-deduplicated log store and its persistence sinks
//! - Windowed aggregation over recent days
//! - Extraction of structured data from free-text entries
//! - Ingestion, CSV export, configuration and logging

pub mod types;
pub mod error;
pub mod energy;
pub mod config;
pub mod logging;
pub mod snapshot;
pub mod profile;
pub mod store;
pub mod aggregate;
pub mod extract;
pub mod ingest;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use energy::{compute_bmr, projected_weight_change_kg, KCAL_PER_KG_BODY_MASS};
pub use store::{JsonFileSink, LoadOutcome, LogSink, LogStore, MemorySink};
pub use aggregate::{aggregate, daily_series, recent_window, DailyPoint, Stats, Trend};
pub use extract::{ExtractionError, Extractor, FailureKind, GeminiClient};
pub use ingest::{analyze_and_ingest, build_daily_log, ingest_analysis};
pub use export::export_csv;
