//! # TrackRecord Analytics
//!
//! Turns a user's workout logs into a progress report.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** No I/O. The caller fetches the logs for the resolved
//!   range; this crate only resolves the range and reduces the logs.
//! - **Stateless Calculation:** `ReportEngine` takes logs in and hands a
//!   `ProgressReport` back, which keeps it trivial to test.
//!
//! ## Public API
//!
//! - `DateRange`: Request bounds resolved against today, with defaults.
//! - `ReportEngine`: The reduction from logs to per-exercise statistics.
//! - `ProgressReport` / `ExerciseStats`: The serializable result.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::ReportEngine;
pub use report::{DateRange, ExerciseStats, ProgressReport, DATE_FORMAT, DEFAULT_WINDOW_DAYS};
