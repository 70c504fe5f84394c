//! Multi-objective search for video-encoder settings that balance downstream
//! ML accuracy against compression ratio.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{Result, SweetspotError};
pub use types::{DecisionVector, Evaluation, EvaluationRecord, Individual, ObjectiveVector, RawMetrics};
