use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One candidate point in the search space, one value per gene.
///
/// Continuous genes keep fractional values; integer and categorical genes are
/// rounded by `GeneSpace::canonicalize` before they are used or compared.
pub type DecisionVector = Vec<f64>;

/// Numeric fields reported by the scoring service, keyed by measure name.
pub type RawMetrics = BTreeMap<String, f64>;

/// The pair of measures being minimized: `(-score, -compression_ratio)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveVector {
    pub neg_score: f64,
    pub neg_compression_ratio: f64,
}

impl ObjectiveVector {
    pub const LEN: usize = 2;

    /// Build from the maximized measures, negating both.
    pub fn from_measures(score: f64, compression_ratio: f64) -> Self {
        Self {
            neg_score: -score,
            neg_compression_ratio: -compression_ratio,
        }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.neg_score, self.neg_compression_ratio]
    }

    pub fn score(&self) -> f64 {
        -self.neg_score
    }

    pub fn compression_ratio(&self) -> f64 {
        -self.neg_compression_ratio
    }
}

impl From<[f64; 2]> for ObjectiveVector {
    fn from(values: [f64; 2]) -> Self {
        Self {
            neg_score: values[0],
            neg_compression_ratio: values[1],
        }
    }
}

/// Result of one expensive pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objectives: ObjectiveVector,
    pub raw_metrics: RawMetrics,
    pub cost_seconds: f64,
}

/// One row of the durable result log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub epoch: usize,
    pub call_index: usize,
    pub encoder_id: String,
    pub algorithm_id: String,
    pub decision_vector_key: String,
    pub objectives: ObjectiveVector,
    /// Zero for cache hits.
    pub cost_seconds: f64,
    pub cached: bool,
    pub raw_metrics: RawMetrics,
}

/// An evaluated member of a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub x: DecisionVector,
    pub f: ObjectiveVector,
}
