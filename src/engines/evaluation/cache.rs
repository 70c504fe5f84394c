use super::pipeline::Evaluator;
use crate::config::RunConfig;
use crate::data::front_report::{front_report_path, write_front_report};
use crate::data::result_log::ResultLog;
use crate::engines::generation::engine::FitnessProblem;
use crate::engines::generation::pareto::FrontAnalyzer;
use crate::error::Result;
use crate::types::{EvaluationRecord, ObjectiveVector, RawMetrics};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedEvaluation {
    objectives: ObjectiveVector,
    raw_metrics: RawMetrics,
}

/// Memoizes decision vector -> objective vector for one (encoder, rate-control) run
/// and logs every fitness request, hit or miss.
pub struct EvaluationCache<E: Evaluator> {
    run: Arc<RunConfig>,
    algorithm_id: String,
    evaluator: E,
    memo: HashMap<String, CachedEvaluation>,
    log: ResultLog,
    run_dir: PathBuf,
    records: Vec<EvaluationRecord>,
    calls: usize,
    evaluations: usize,
    epoch: usize,
    generation: usize,
    generation_objectives: Vec<ObjectiveVector>,
}

impl<E: Evaluator> EvaluationCache<E> {
    pub fn new<P: AsRef<Path>>(
        run: Arc<RunConfig>,
        algorithm_id: &str,
        evaluator: E,
        run_dir: P,
    ) -> Result<Self> {
        let log = ResultLog::open(run_dir.as_ref())?;
        Ok(Self {
            run,
            algorithm_id: algorithm_id.to_string(),
            evaluator,
            memo: HashMap::new(),
            log,
            run_dir: run_dir.as_ref().to_path_buf(),
            records: Vec::new(),
            calls: 0,
            evaluations: 0,
            epoch: 1,
            generation: 0,
            generation_objectives: Vec::new(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// Fitness requests served so far, hits included.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Expensive evaluations performed by this instance.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn distinct_vectors(&self) -> usize {
        self.memo.len()
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Reset per-generation bookkeeping at the start of an epoch.
    pub fn begin_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.generation = 0;
        self.generation_objectives.clear();
    }

    /// Position the bookkeeping for a run resumed after `generation - 1` generations.
    pub fn resume_at(&mut self, epoch: usize, generation: usize) {
        self.epoch = epoch;
        self.generation = generation;
        self.generation_objectives.clear();
    }

    /// Rebuild the memo table and call counter from an existing result log.
    pub fn warm_from_log(&mut self) -> Result<usize> {
        let loaded = self.log.load()?;
        let mut restored = 0;

        for record in loaded {
            if record.encoder_id != self.run.encoder || record.algorithm_id != self.algorithm_id {
                continue;
            }
            self.calls = self.calls.max(record.call_index);
            if !self.memo.contains_key(&record.decision_vector_key) {
                self.memo.insert(
                    record.decision_vector_key.clone(),
                    CachedEvaluation {
                        objectives: record.objectives,
                        raw_metrics: record.raw_metrics.clone(),
                    },
                );
                restored += 1;
            }
            self.records.push(record);
        }

        log::info!(
            "Restored {} cached evaluations ({} logged calls) from {}",
            restored,
            self.calls,
            self.log.path().display()
        );
        Ok(restored)
    }

    /// The memoized objective vector of `x`, evaluating it on a miss.
    pub fn fitness(&mut self, x: &[f64]) -> Result<ObjectiveVector> {
        let x = self.run.gene_space.canonicalize(x)?;
        let key = self.run.gene_space.canonical_key(&x)?;
        self.calls += 1;
        log::info!("-------------- Fitness call {} ---------------", self.calls);
        log::debug!("Decision vector: {}", key);

        let record = match self.memo.get(&key) {
            Some(hit) => {
                log::info!("Using previous fitness of identical decision vector {}", key);
                self.record(&key, hit.objectives, hit.raw_metrics.clone(), 0.0, true)
            }
            None => {
                let evaluation = match self.evaluator.evaluate(&x) {
                    Ok(evaluation) => evaluation,
                    Err(e) => {
                        log::error!(
                            "Evaluation of {} failed (epoch {}, generation {}): {}",
                            key,
                            self.epoch,
                            self.generation,
                            e
                        );
                        return Err(e);
                    }
                };
                self.evaluations += 1;
                self.memo.insert(
                    key.clone(),
                    CachedEvaluation {
                        objectives: evaluation.objectives,
                        raw_metrics: evaluation.raw_metrics.clone(),
                    },
                );
                self.record(
                    &key,
                    evaluation.objectives,
                    evaluation.raw_metrics,
                    evaluation.cost_seconds,
                    false,
                )
            }
        };

        let objectives = record.objectives;
        self.log.append(&record)?;
        self.records.push(record);
        self.generation_objectives.push(objectives);

        if self.generation_objectives.len() >= self.run.search.population_size {
            self.end_generation()?;
        }
        Ok(objectives)
    }

    fn record(
        &self,
        key: &str,
        objectives: ObjectiveVector,
        raw_metrics: RawMetrics,
        cost_seconds: f64,
        cached: bool,
    ) -> EvaluationRecord {
        EvaluationRecord {
            epoch: self.epoch,
            call_index: self.calls,
            encoder_id: self.run.encoder.clone(),
            algorithm_id: self.algorithm_id.clone(),
            decision_vector_key: key.to_string(),
            objectives,
            cost_seconds,
            cached,
            raw_metrics,
        }
    }

    fn end_generation(&mut self) -> Result<()> {
        let ranking = FrontAnalyzer::rank(&self.generation_objectives);
        match ranking.mean_crowding_distance() {
            Some(mean) => log::info!(
                "Generation {} of epoch {}: {} non-dominated, mean crowding distance {:.4}",
                self.generation,
                self.epoch,
                ranking.non_dominated.len(),
                mean
            ),
            None => log::info!(
                "Generation {} of epoch {}: {} non-dominated",
                self.generation,
                self.epoch,
                ranking.non_dominated.len()
            ),
        }

        if self.generation == self.run.search.generations {
            self.epoch_report()?;
        }

        self.generation_objectives.clear();
        self.generation += 1;
        Ok(())
    }

    /// Rank every distinct vector evaluated this epoch and write its front report.
    fn epoch_report(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let distinct: Vec<&EvaluationRecord> = self
            .records
            .iter()
            .filter(|r| r.epoch == self.epoch)
            .filter(|r| seen.insert(r.decision_vector_key.as_str()))
            .collect();

        let objectives: Vec<ObjectiveVector> = distinct.iter().map(|r| r.objectives).collect();
        let ranking = FrontAnalyzer::rank(&objectives);
        log::info!("Domination counts of epoch {}: {:?}", self.epoch, ranking.domination_counts);
        log::info!("Non-domination ranks of epoch {}: {:?}", self.epoch, ranking.ranks);

        write_front_report(&front_report_path(&self.run_dir, self.epoch), &distinct, &ranking)
    }
}

impl<E: Evaluator> FitnessProblem for EvaluationCache<E> {
    fn fitness(&mut self, x: &[f64]) -> Result<ObjectiveVector> {
        EvaluationCache::fitness(self, x)
    }

    fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        self.run.gene_space.bounds()
    }

    fn integer_dimension_count(&self) -> usize {
        self.run.gene_space.integer_dimension_count()
    }
}
