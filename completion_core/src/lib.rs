#![forbid(unsafe_code)]

//! Training program completion aggregation.
//!
//! This crate provides:
//! - Program definition loading (weeks, days, blocks, exercises)
//! - Adapters normalizing exercise logs, metcon and engine completions
//! - A request-scoped completion index
//! - Aggregation into block, day, week and program completion
//! - Read models for the dashboard, week and workout-day views

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod program;
pub mod adapters;
pub mod index;
pub mod aggregate;
pub mod report;
pub mod request;
pub mod rows;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, ScheduleConfig};
pub use adapters::{CompletionAdapter, EngineAdapter, ExerciseLogAdapter, MetconAdapter};
pub use index::CompletionIndex;
pub use aggregate::{aggregate, aggregate_with, day_progress, AggregationScope, ProgramCompletion, WeekScope};
pub use report::{report, ProgressReporter};
pub use request::{RequestGate, RequestToken};
pub use rows::CompletionRows;
