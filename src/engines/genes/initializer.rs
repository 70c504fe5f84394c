use super::gene_space::{normalize_zero, GeneSpace};
use crate::error::{Result, SweetspotError};
use crate::types::DecisionVector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Widening applied to non-continuous bounds so that rounding hits every
/// integer equally often, boundary integers included.
pub const INTEGER_SPREAD: f64 = 0.4999;

/// Evenly spaced values for one gene before shuffling.
pub fn stratified_values(low: f64, high: f64, continuous: bool, count: usize) -> Vec<f64> {
    let (low, high) = if continuous {
        (low, high)
    } else {
        (low - INTEGER_SPREAD, high + INTEGER_SPREAD)
    };

    let values = linspace(low, high, count);
    if continuous {
        values
    } else {
        values.into_iter().map(|v| normalize_zero(v.round())).collect()
    }
}

/// Stratified-uniform population: every gene covers its range evenly, and the
/// per-gene columns are shuffled independently so dimensions are decorrelated.
pub fn initialize(gene_space: &GeneSpace, population_size: usize, seed: u64) -> Result<Vec<DecisionVector>> {
    if population_size == 0 {
        return Err(SweetspotError::Configuration(
            "Population size must be positive".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let columns: Vec<Vec<f64>> = gene_space
        .genes()
        .iter()
        .map(|gene| {
            let mut column =
                stratified_values(gene.low, gene.high, gene.kind.is_continuous(), population_size);
            column.shuffle(&mut rng);
            column
        })
        .collect();

    let population: Vec<DecisionVector> = (0..population_size)
        .map(|i| columns.iter().map(|column| column[i]).collect())
        .collect();

    for x in &population {
        log::debug!("Pushing chromosome: {:?}", x);
    }

    Ok(population)
}

fn linspace(low: f64, high: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { high } else { low + step * i as f64 })
                .collect()
        }
    }
}
