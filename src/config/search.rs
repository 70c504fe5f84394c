use super::traits::{invalid, ConfigSection};
use crate::error::SweetspotError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub population_size: usize,
    /// Generations per epoch (NO_GENERATIONS).
    pub generations: usize,
    pub epochs: usize,
    pub algorithms: Vec<String>,
    pub nsga2: Nsga2Settings,
}

/// Operator settings for the NSGA-II engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nsga2Settings {
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    /// Distribution index for SBX crossover.
    pub eta_c: f64,
    /// Distribution index for polynomial mutation.
    pub eta_m: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 16,
            generations: 1,
            epochs: 1,
            algorithms: vec!["nsga2".to_string()],
            nsga2: Nsga2Settings::default(),
        }
    }
}

impl Default for Nsga2Settings {
    fn default() -> Self {
        Self {
            crossover_probability: 0.7,
            mutation_probability: 0.15,
            eta_c: 10.0,
            eta_m: 50.0,
        }
    }
}

impl SearchConfig {
    /// Deterministic per-epoch seed, so an epoch always reproduces its sampling.
    pub fn seed_for_epoch(epoch: usize) -> u64 {
        epoch as u64 * 3 + 1
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<(), SweetspotError> {
        // The engine's tournament pairs individuals four at a time.
        if self.population_size % 4 != 0 || self.population_size < 6 {
            return Err(invalid::<Self>(format!(
                "population_size must be a multiple of 4 and at least 6, got {}",
                self.population_size
            )));
        }
        if self.generations == 0 {
            return Err(invalid::<Self>("generations must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(invalid::<Self>("epochs must be at least 1"));
        }
        if self.algorithms.is_empty() {
            return Err(invalid::<Self>("at least one algorithm must be configured"));
        }
        let s = &self.nsga2;
        if !(0.0..=1.0).contains(&s.crossover_probability) {
            return Err(invalid::<Self>("crossover_probability must be between 0 and 1"));
        }
        if !(0.0..=1.0).contains(&s.mutation_probability) {
            return Err(invalid::<Self>("mutation_probability must be between 0 and 1"));
        }
        if s.eta_c <= 0.0 || s.eta_m <= 0.0 {
            return Err(invalid::<Self>("distribution indices must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_size_rules() {
        let mut config = SearchConfig::default();
        assert!(config.validate().is_ok());

        config.population_size = 4;
        assert!(config.validate().is_err());

        config.population_size = 10;
        assert!(config.validate().is_err());

        config.population_size = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seed_is_function_of_epoch() {
        assert_eq!(SearchConfig::seed_for_epoch(1), 4);
        assert_eq!(SearchConfig::seed_for_epoch(3), 10);
    }
}
