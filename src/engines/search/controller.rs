use crate::config::{ConfigSection, RunConfig, SearchConfig};
use crate::data::checkpoint::CheckpointManager;
use crate::engines::evaluation::{EvaluationCache, Evaluator};
use crate::engines::generation::engine::{
    create_engine, EngineParams, EngineState, FitnessProblem, PopulationSnapshot,
};
use crate::engines::generation::progress::ProgressCallback;
use crate::engines::genes::initialize;
use crate::error::{Result, SweetspotError};
use crate::types::Individual;
use std::path::Path;
use std::sync::Arc;

/// Where a search run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Initializing { epoch: usize },
    Evolving { epoch: usize, generation: usize },
    Checkpointed { epoch: usize, generation: usize },
    EpochComplete { epoch: usize },
    Done,
}

/// Drives the epoch/generation loop of one (encoder, rate-control, algorithm) run.
pub struct SearchController<E: Evaluator, P: ProgressCallback> {
    run: Arc<RunConfig>,
    algorithm_id: String,
    cache: EvaluationCache<E>,
    checkpoints: CheckpointManager,
    progress: P,
    state: SearchState,
}

impl<E: Evaluator, P: ProgressCallback> SearchController<E, P> {
    pub fn new<D: AsRef<Path>>(
        run: Arc<RunConfig>,
        algorithm_id: &str,
        evaluator: E,
        run_dir: D,
        progress: P,
    ) -> Result<Self> {
        run.search.validate()?;
        // Unknown algorithms must fail before any expensive evaluation.
        create_engine(
            algorithm_id,
            EngineParams::new(run.gene_space.integer_dimension_count(), 0),
            &run.search.nsga2,
        )?;

        let cache = EvaluationCache::new(run.clone(), algorithm_id, evaluator, run_dir.as_ref())?;
        Ok(Self {
            run,
            algorithm_id: algorithm_id.to_string(),
            cache,
            checkpoints: CheckpointManager::in_run_dir(run_dir),
            progress,
            state: SearchState::Initializing { epoch: 1 },
        })
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn cache(&self) -> &EvaluationCache<E> {
        &self.cache
    }

    pub fn checkpoint_path(&self) -> &Path {
        self.checkpoints.path()
    }

    /// Run every epoch from a freshly seeded population; returns the final population.
    pub fn run(&mut self) -> Result<PopulationSnapshot> {
        let mut last = None;
        for epoch in 1..=self.run.search.epochs {
            let seeded = self.seed_epoch(epoch)?;
            last = Some(self.evolve_epoch(seeded)?);
        }
        self.transition(SearchState::Done);
        last.ok_or_else(|| SweetspotError::Configuration("search.epochs must be at least 1".to_string()))
    }

    /// Continue from a checkpoint without re-seeding, then run any remaining epochs.
    pub fn resume<C: AsRef<Path>>(
        &mut self,
        checkpoint: C,
        epoch: usize,
        generations_done: usize,
    ) -> Result<PopulationSnapshot> {
        let source = CheckpointManager::new(checkpoint.as_ref());
        let snapshot = source.load()?;
        self.check_resumable(&snapshot, epoch)?;

        if snapshot.generation != generations_done {
            log::warn!(
                "Requested resume after generation {}, checkpoint holds generation {}; using the checkpoint",
                generations_done,
                snapshot.generation
            );
        }
        log::info!(
            "Resuming {} / {} at epoch {} after generation {}",
            self.run.label(),
            self.algorithm_id,
            snapshot.epoch,
            snapshot.generation
        );

        self.cache.warm_from_log()?;
        self.cache.resume_at(snapshot.epoch, snapshot.generation + 1);
        if source.path() != self.checkpoints.path() {
            self.save_checkpoint(&snapshot)?;
        }

        let mut last = self.evolve_epoch(snapshot)?;
        for next_epoch in epoch + 1..=self.run.search.epochs {
            let seeded = self.seed_epoch(next_epoch)?;
            last = self.evolve_epoch(seeded)?;
        }
        self.transition(SearchState::Done);
        Ok(last)
    }

    fn check_resumable(&self, snapshot: &PopulationSnapshot, epoch: usize) -> Result<()> {
        if snapshot.encoder_id != self.run.encoder || snapshot.algorithm_id != self.algorithm_id {
            return Err(SweetspotError::Configuration(format!(
                "Checkpoint belongs to {} / {}, not {} / {}",
                snapshot.encoder_id, snapshot.algorithm_id, self.run.encoder, self.algorithm_id
            )));
        }
        if snapshot.epoch != epoch {
            return Err(SweetspotError::Configuration(format!(
                "Checkpoint is from epoch {}, resume requested epoch {}",
                snapshot.epoch, epoch
            )));
        }
        if snapshot.individuals.len() != self.run.search.population_size {
            return Err(SweetspotError::Configuration(format!(
                "Checkpoint holds {} individuals, population size is {}",
                snapshot.individuals.len(),
                self.run.search.population_size
            )));
        }
        for ind in &snapshot.individuals {
            self.run.gene_space.check_len(&ind.x)?;
        }
        Ok(())
    }

    fn transition(&mut self, state: SearchState) {
        log::debug!("Search state: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Sample, evaluate and checkpoint the generation-0 population of an epoch.
    fn seed_epoch(&mut self, epoch: usize) -> Result<PopulationSnapshot> {
        self.transition(SearchState::Initializing { epoch });
        self.progress.on_epoch_start(epoch, self.run.search.epochs);
        self.cache.begin_epoch(epoch);

        let seed = SearchConfig::seed_for_epoch(epoch);
        log::info!("Epoch {} of {} with seed {}", epoch, self.run.label(), seed);
        let vectors = initialize(&self.run.gene_space, self.run.search.population_size, seed)?;

        let mut individuals = Vec::with_capacity(vectors.len());
        for x in vectors {
            let f = self.cache.fitness(&x).map_err(|e| self.fatal(epoch, 0, e))?;
            individuals.push(Individual { x, f });
        }

        let snapshot = PopulationSnapshot {
            encoder_id: self.run.encoder.clone(),
            algorithm_id: self.algorithm_id.clone(),
            epoch,
            generation: 0,
            individuals,
            engine_state: EngineState {
                seed,
                generations_evolved: 0,
            },
        };
        self.save_checkpoint(&snapshot)?;
        Ok(snapshot)
    }

    fn evolve_epoch(&mut self, mut snapshot: PopulationSnapshot) -> Result<PopulationSnapshot> {
        let epoch = snapshot.epoch;
        let params = EngineParams::new(
            self.cache.integer_dimension_count(),
            snapshot.engine_state.seed,
        );
        let mut engine = create_engine(&self.algorithm_id, params, &self.run.search.nsga2)?;

        while snapshot.generation < self.run.search.generations {
            let generation = snapshot.generation + 1;
            self.transition(SearchState::Evolving { epoch, generation });

            let mut next = match engine.evolve(snapshot, &mut self.cache) {
                Ok(next) => next,
                Err(e) => return Err(self.fatal(epoch, generation, e)),
            };
            next.generation = generation;

            self.save_checkpoint(&next)?;
            self.progress
                .on_generation_complete(epoch, generation, &next.individuals);
            snapshot = next;
        }

        self.transition(SearchState::EpochComplete { epoch });
        Ok(snapshot)
    }

    fn save_checkpoint(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        self.checkpoints.save(snapshot)?;
        self.transition(SearchState::Checkpointed {
            epoch: snapshot.epoch,
            generation: snapshot.generation,
        });
        self.progress.on_checkpoint(self.checkpoints.path());
        Ok(())
    }

    fn fatal(&self, epoch: usize, generation: usize, e: SweetspotError) -> SweetspotError {
        log::error!(
            "{} / {} aborted in epoch {} generation {}: {}",
            self.run.label(),
            self.algorithm_id,
            epoch,
            generation,
            e
        );
        e
    }
}
