use crate::types::Individual;
use std::path::Path;

pub trait ProgressCallback {
    fn on_epoch_start(&mut self, epoch: usize, epochs: usize);
    fn on_generation_complete(&mut self, epoch: usize, generation: usize, population: &[Individual]);
    fn on_checkpoint(&mut self, path: &Path);
}

/// Best score and best compression ratio present in a population.
pub fn population_bests(population: &[Individual]) -> (f64, f64) {
    population.iter().fold((f64::NEG_INFINITY, f64::NEG_INFINITY), |(s, r), ind| {
        (s.max(ind.f.score()), r.max(ind.f.compression_ratio()))
    })
}

pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_epoch_start(&mut self, epoch: usize, epochs: usize) {
        log::info!("Epoch {}/{} starting...", epoch, epochs);
    }

    fn on_generation_complete(&mut self, epoch: usize, generation: usize, population: &[Individual]) {
        let (best_score, best_ratio) = population_bests(population);
        log::info!(
            "Epoch {} generation {} complete. Best score: {:.4}, best compression ratio: {:.3}",
            epoch, generation, best_score, best_ratio
        );
    }

    fn on_checkpoint(&mut self, path: &Path) {
        log::debug!("Checkpoint written to {}", path.display());
    }
}

// For observing a run from another thread
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    EpochStart(usize),
    GenerationComplete { epoch: usize, generation: usize, best_score: f64 },
    Checkpoint(std::path::PathBuf),
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_epoch_start(&mut self, epoch: usize, _epochs: usize) {
        let _ = self.sender.send(ProgressMessage::EpochStart(epoch));
    }

    fn on_generation_complete(&mut self, epoch: usize, generation: usize, population: &[Individual]) {
        let (best_score, _) = population_bests(population);
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            epoch,
            generation,
            best_score,
        });
    }

    fn on_checkpoint(&mut self, path: &Path) {
        let _ = self.sender.send(ProgressMessage::Checkpoint(path.to_path_buf()));
    }
}
