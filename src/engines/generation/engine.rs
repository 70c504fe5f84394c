use super::nsga2::Nsga2Engine;
use crate::config::Nsga2Settings;
use crate::error::{Result, SweetspotError};
use crate::types::{DecisionVector, Individual, ObjectiveVector};
use serde::{Deserialize, Serialize};

/// The seam an evolutionary engine calls back into.
pub trait FitnessProblem {
    fn fitness(&mut self, x: &[f64]) -> Result<ObjectiveVector>;

    /// `(low_bounds, high_bounds)`, one entry per dimension.
    fn bounds(&self) -> (Vec<f64>, Vec<f64>);

    /// Number of trailing dimensions evolved as integers.
    fn integer_dimension_count(&self) -> usize;
}

/// Engine-internal state that must survive a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub seed: u64,
    pub generations_evolved: usize,
}

/// Everything needed to continue a run: the population plus its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub encoder_id: String,
    pub algorithm_id: String,
    pub epoch: usize,
    pub generation: usize,
    pub individuals: Vec<Individual>,
    pub engine_state: EngineState,
}

impl PopulationSnapshot {
    pub fn decision_vectors(&self) -> Vec<DecisionVector> {
        self.individuals.iter().map(|i| i.x.clone()).collect()
    }

    pub fn objective_vectors(&self) -> Vec<ObjectiveVector> {
        self.individuals.iter().map(|i| i.f).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    pub objective_count: usize,
    pub integer_dimension_count: usize,
    pub generations_per_call: usize,
    pub seed: u64,
}

impl EngineParams {
    pub fn new(integer_dimension_count: usize, seed: u64) -> Self {
        Self {
            objective_count: ObjectiveVector::LEN,
            integer_dimension_count,
            generations_per_call: 1,
            seed,
        }
    }
}

pub trait EvolutionaryEngine {
    fn name(&self) -> &str;

    /// Advance the population by `generations_per_call` generations.
    fn evolve(
        &mut self,
        snapshot: PopulationSnapshot,
        problem: &mut dyn FitnessProblem,
    ) -> Result<PopulationSnapshot>;
}

/// Engine for an algorithm identifier.
pub fn create_engine(
    algorithm: &str,
    params: EngineParams,
    settings: &Nsga2Settings,
) -> Result<Box<dyn EvolutionaryEngine>> {
    if params.objective_count != ObjectiveVector::LEN {
        return Err(SweetspotError::Engine(format!(
            "Engines support {} objectives, got {}",
            ObjectiveVector::LEN,
            params.objective_count
        )));
    }
    match algorithm {
        "nsga2" => Ok(Box::new(Nsga2Engine::new(params, settings.clone()))),
        other => Err(SweetspotError::Configuration(format!(
            "Unsupported optimization algorithm '{}'",
            other
        ))),
    }
}
