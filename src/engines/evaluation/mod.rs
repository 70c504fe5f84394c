pub mod cache;
pub mod pipeline;
pub mod scoring;
pub mod transcoder;

pub use cache::EvaluationCache;
pub use pipeline::{Evaluator, PipelineAdapter};
pub use scoring::{HttpScoringService, ScoreReport, ScoringService};
pub use transcoder::{directory_size, FfmpegTranscoder, Transcoder};
