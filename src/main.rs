use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sweetspot::config::{AppConfig, ConfigManager, ResumeConfig, RunConfig};
use sweetspot::engines::evaluation::{FfmpegTranscoder, HttpScoringService, PipelineAdapter};
use sweetspot::engines::generation::LogProgressCallback;
use sweetspot::engines::search::SearchController;
use sweetspot::logging::SessionLogger;

const DEFAULT_CONFIG: &str = "sweetspot.toml";

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    // Logging is configured from the file, so a load failure is reported on stderr.
    let config = match ConfigManager::load_from_file(&config_path) {
        Ok(manager) => manager.into_inner(),
        Err(e) => {
            eprintln!("Failed to load configuration {}: {}", config_path.display(), e);
            std::process::exit(2);
        }
    };

    let session = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_file = match SessionLogger::build(&config.logging, &config.output, &session) {
        Ok((logger, log_file)) => {
            if let Err(e) = logger.install() {
                eprintln!("{}", e);
                std::process::exit(2);
            }
            log_file
        }
        Err(e) => {
            eprintln!("Failed to open session log under {}: {}", config.output.logs_dir().display(), e);
            std::process::exit(2);
        }
    };
    if let Some(path) = log_file {
        log::info!("Session log: {}", path.display());
    }

    if let Err(e) = run(&config, &session) {
        log::error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: &AppConfig, session: &str) -> Result<()> {
    if let Some(resume) = &config.resume {
        return resume_run(config, resume);
    }

    let session_dir = config.output.results_dir().join(session);
    log::info!("Writing results to {}", session_dir.display());

    for target in &config.encoders.targets {
        for rate_control in &target.rate_controls {
            let run = Arc::new(
                RunConfig::build(config, &target.encoder, rate_control)
                    .with_context(|| format!("building run for {} / {}", target.encoder, rate_control))?,
            );

            for algorithm in &config.search.algorithms {
                let run_dir = session_dir.join(format!("{}_{}", run.label(), algorithm));
                let mut controller = controller_for(&run, algorithm, &run_dir)?;
                let last = controller
                    .run()
                    .with_context(|| format!("searching {} with {}", run.label(), algorithm))?;
                log::info!(
                    "Finished {} with {}: {} individuals in the final population, {} distinct vectors evaluated",
                    run.label(),
                    algorithm,
                    last.individuals.len(),
                    controller.cache().distinct_vectors()
                );
            }
        }
    }
    Ok(())
}

fn resume_run(config: &AppConfig, resume: &ResumeConfig) -> Result<()> {
    let run = Arc::new(
        RunConfig::build(config, &resume.encoder, &resume.rate_control)
            .with_context(|| format!("building run for {} / {}", resume.encoder, resume.rate_control))?,
    );
    let run_dir = resume
        .checkpoint
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut controller = controller_for(&run, &resume.algorithm, &run_dir)?;
    controller
        .resume(&resume.checkpoint, resume.epoch, resume.generations_done)
        .with_context(|| format!("resuming from {}", resume.checkpoint.display()))?;
    log::info!("Resumed run of {} finished", run.label());
    Ok(())
}

fn controller_for(
    run: &Arc<RunConfig>,
    algorithm: &str,
    run_dir: &Path,
) -> Result<
    SearchController<PipelineAdapter<FfmpegTranscoder, HttpScoringService>, LogProgressCallback>,
> {
    let transcoder = FfmpegTranscoder::new(run.pipeline.clone());
    let scorer = HttpScoringService::new(run.scoring.clone()).context("creating scoring client")?;
    let adapter = PipelineAdapter::new(run.clone(), transcoder, scorer)
        .context("preparing evaluation pipeline")?;

    SearchController::new(run.clone(), algorithm, adapter, run_dir, LogProgressCallback)
        .with_context(|| format!("starting search in {}", run_dir.display()))
}
