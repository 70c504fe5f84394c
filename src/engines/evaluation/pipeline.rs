use super::scoring::ScoringService;
use super::transcoder::{directory_size, Transcoder};
use crate::config::RunConfig;
use crate::engines::encoding::{build_args, EncoderArgs};
use crate::error::{Result, SweetspotError};
use crate::types::{Evaluation, ObjectiveVector};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Computes the objective vector of a decision vector the expensive way.
pub trait Evaluator {
    fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation>;
}

/// encode -> decode -> score, against external collaborators.
pub struct PipelineAdapter<T: Transcoder, S: ScoringService> {
    run: Arc<RunConfig>,
    transcoder: T,
    scorer: S,
    original_size: u64,
    attempts: usize,
    cooldown: Duration,
}

impl<T: Transcoder, S: ScoringService> PipelineAdapter<T, S> {
    pub fn new(run: Arc<RunConfig>, transcoder: T, scorer: S) -> Result<Self> {
        let input_dir = &run.pipeline.input_dir;
        if !input_dir.is_dir() {
            return Err(SweetspotError::Configuration(format!(
                "Input directory not found: {}",
                input_dir.display()
            )));
        }

        let original_size = directory_size(input_dir)?;
        if original_size == 0 {
            return Err(SweetspotError::Configuration(format!(
                "Input directory is empty: {}",
                input_dir.display()
            )));
        }

        let attempts = run.pipeline.transcode_attempts;
        let cooldown = run.pipeline.retry_cooldown();

        Ok(Self {
            run,
            transcoder,
            scorer,
            original_size,
            attempts,
            cooldown,
        })
    }

    /// Override the bounded retry policy.
    pub fn with_retry_policy(mut self, attempts: usize, cooldown: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.cooldown = cooldown;
        self
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    fn clips(&self) -> Result<Vec<String>> {
        let mut clips = Vec::new();
        for entry in std::fs::read_dir(&self.run.pipeline.input_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                clips.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        clips.sort();
        Ok(clips)
    }

    /// Returns the artifact size and the duration of the successful attempt.
    fn transcode_with_retry(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
        args: &EncoderArgs,
    ) -> Result<(u64, Duration)> {
        let mut attempt = 1;
        loop {
            // Frames left by a failed attempt must not reach the scoring pass.
            clear_dir(output_dir)?;
            let start = Instant::now();
            match self.transcoder.transcode(input_dir, output_dir, args) {
                Ok(size) => return Ok((size, start.elapsed())),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    log::warn!(
                        "Transcode attempt {}/{} of {} failed: {}. Retrying in {:?}",
                        attempt,
                        self.attempts,
                        input_dir.display(),
                        e,
                        self.cooldown
                    );
                    // Let a runaway ffmpeg process terminate first.
                    std::thread::sleep(self.cooldown);
                    attempt += 1;
                }
                Err(SweetspotError::Transcode(msg)) => {
                    return Err(SweetspotError::Transcode(format!(
                        "{} failed after {} attempt(s): {}",
                        input_dir.display(),
                        attempt,
                        msg
                    )))
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn clear_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Directory {} not found, moving on", dir.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

impl<T: Transcoder, S: ScoringService> Evaluator for PipelineAdapter<T, S> {
    fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation> {
        let args = build_args(&self.run, x)?;
        let clips = self.clips()?;

        log::info!("Starting transcode process for {} clips", clips.len());
        let mut compressed_size = 0u64;
        let mut cost = Duration::ZERO;
        for clip in &clips {
            let input_clip_dir = self.run.pipeline.input_dir.join(clip);
            let output_clip_dir = self.run.pipeline.output_dir.join(clip);
            log::debug!("Applying degradation to clip: {}", input_clip_dir.display());

            let (size, elapsed) = self.transcode_with_retry(&input_clip_dir, &output_clip_dir, &args)?;
            compressed_size += size;
            cost += elapsed;
        }
        log::info!("Time for transcode: {} seconds", cost.as_secs());

        if compressed_size == 0 {
            return Err(SweetspotError::Transcode(
                "Transcode produced no compressed output".to_string(),
            ));
        }

        let start = Instant::now();
        let report = self.scorer.score()?;
        cost += start.elapsed();

        let compression_ratio = self.original_size as f64 / compressed_size as f64;
        log::info!(
            "ML-performance: {:.5} Comp-ratio: {:.3}",
            report.score,
            compression_ratio
        );
        if let Some(baseline) = self.run.scoring.baseline {
            log::debug!("ML-performance relative to baseline: {:.5}", report.score / baseline);
        }

        Ok(Evaluation {
            objectives: ObjectiveVector::from_measures(report.score, compression_ratio),
            raw_metrics: report.metrics,
            cost_seconds: cost.as_secs_f64(),
        })
    }
}
