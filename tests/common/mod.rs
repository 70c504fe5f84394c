#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use sweetspot::config::{
    PipelineConfig, RateControlParameters, RunConfig, ScoringConfig, SearchConfig,
};
use sweetspot::engines::encoding::{EncoderArgs, EncoderFamily};
use sweetspot::engines::evaluation::{Evaluator, ScoreReport, ScoringService, Transcoder};
use sweetspot::engines::genes::GeneSpace;
use sweetspot::{Evaluation, ObjectiveVector, RawMetrics, Result, SweetspotError};

pub const PARAMS: &str = r#"{
    "ABR": {
        "bounds": {
            "b:v": [1, 20, "i"],
            "qcomp": [0.5, 1.0, "f"],
            "preset": [0, 2, "c"]
        },
        "categorical": {"preset": ["slow", "medium", "fast"]},
        "constants": {"pix_fmt": "yuv420p"}
    }
}"#;

pub fn search_config(population_size: usize, generations: usize, epochs: usize) -> SearchConfig {
    SearchConfig {
        population_size,
        generations,
        epochs,
        ..SearchConfig::default()
    }
}

pub fn run_config(search: SearchConfig, scratch: &Path) -> Arc<RunConfig> {
    let params = RateControlParameters::parse(PARAMS, "ABR").unwrap();
    Arc::new(RunConfig {
        encoder: "libx264".to_string(),
        rate_control: "ABR".to_string(),
        family: EncoderFamily::X264,
        gene_space: GeneSpace::build(&params).unwrap(),
        constants: params.constant_args(),
        search,
        pipeline: PipelineConfig {
            input_dir: scratch.join("input"),
            output_dir: scratch.join("output"),
            retry_cooldown_secs: 0,
            ..PipelineConfig::default()
        },
        scoring: ScoringConfig::default(),
    })
}

/// Deterministic stand-in for the transcode/score pipeline.
///
/// Genes are `[qcomp, b:v, preset]` (continuous first): more bitrate scores better
/// but compresses worse.
#[derive(Default)]
pub struct SyntheticEvaluator {
    pub calls: usize,
    pub seen: Vec<Vec<f64>>,
}

impl Evaluator for SyntheticEvaluator {
    fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation> {
        self.calls += 1;
        self.seen.push(x.to_vec());

        let (qcomp, bitrate, preset) = (x[0], x[1], x[2]);
        let score = 0.4 + 0.025 * bitrate + 0.05 * qcomp - 0.01 * preset;
        let ratio = 60.0 / bitrate + 2.0 * preset + qcomp;

        let mut raw_metrics = RawMetrics::new();
        raw_metrics.insert("mean_IoU".to_string(), score);
        raw_metrics.insert("pixel_acc".to_string(), score + 0.1);

        Ok(Evaluation {
            objectives: ObjectiveVector::from_measures(score, ratio),
            raw_metrics,
            cost_seconds: 1.5,
        })
    }
}

/// Transcoder failing a scripted number of times before succeeding.
pub struct FlakyTranscoder {
    pub failures_left: usize,
    pub calls: usize,
    pub failure_delay: Duration,
    pub compressed_size: u64,
    /// Frame a failing attempt leaves behind in the output directory.
    pub partial_frame: Option<String>,
}

impl FlakyTranscoder {
    pub fn new(failures: usize, compressed_size: u64) -> Self {
        Self {
            failures_left: failures,
            calls: 0,
            failure_delay: Duration::ZERO,
            compressed_size,
            partial_frame: None,
        }
    }
}

impl Transcoder for FlakyTranscoder {
    fn transcode(&mut self, _input_dir: &Path, output_dir: &Path, _args: &EncoderArgs) -> Result<u64> {
        self.calls += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            if let Some(frame) = &self.partial_frame {
                std::fs::create_dir_all(output_dir)?;
                std::fs::write(output_dir.join(frame), b"partial")?;
            }
            std::thread::sleep(self.failure_delay);
            return Err(SweetspotError::Transcode("ffmpeg exited with status 1".to_string()));
        }
        std::fs::create_dir_all(output_dir)?;
        Ok(self.compressed_size)
    }
}

pub struct FixedScorer {
    pub score: f64,
    pub calls: usize,
}

impl ScoringService for FixedScorer {
    fn score(&mut self) -> Result<ScoreReport> {
        self.calls += 1;
        let mut metrics = RawMetrics::new();
        metrics.insert("mean_IoU".to_string(), self.score);
        Ok(ScoreReport {
            score: self.score,
            metrics,
        })
    }
}

/// Scoring service that errors on its first `failures_left` calls.
pub struct FlakyScorer {
    pub failures_left: usize,
    pub calls: usize,
}

impl ScoringService for FlakyScorer {
    fn score(&mut self) -> Result<ScoreReport> {
        self.calls += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SweetspotError::ScoringService(
                "HTTP 503 from ML-algorithm".to_string(),
            ));
        }
        FixedScorer { score: 0.6, calls: 0 }.score()
    }
}

/// `input/clip_a/000001.png` of `bytes` bytes.
pub fn write_input_clip(scratch: &Path, bytes: usize) -> PathBuf {
    let clip = scratch.join("input").join("clip_a");
    std::fs::create_dir_all(&clip).unwrap();
    std::fs::write(clip.join("000001.png"), vec![0u8; bytes]).unwrap();
    clip
}
