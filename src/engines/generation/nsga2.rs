use super::engine::{EngineParams, EvolutionaryEngine, FitnessProblem, PopulationSnapshot};
use super::operators::{
    integer_crossover, integer_mutation, polynomial_mutation, sbx_crossover, tournament_selection,
};
use super::pareto::{crowding_distance, fast_non_dominated_sort};
use crate::config::Nsga2Settings;
use crate::error::{Result, SweetspotError};
use crate::types::Individual;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Elitist (mu + lambda) NSGA-II over mixed continuous/integer genes.
pub struct Nsga2Engine {
    params: EngineParams,
    settings: Nsga2Settings,
}

impl Nsga2Engine {
    pub fn new(params: EngineParams, settings: Nsga2Settings) -> Self {
        Self { params, settings }
    }

    /// Per-generation RNG, so a run resumed from a snapshot replays the same draws.
    fn generation_rng(seed: u64, generations_evolved: usize) -> StdRng {
        StdRng::seed_from_u64(seed ^ (generations_evolved as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    fn check_population(&self, snapshot: &PopulationSnapshot, dimensions: usize) -> Result<()> {
        let n = snapshot.individuals.len();
        if n < 6 || n % 4 != 0 {
            return Err(SweetspotError::Engine(format!(
                "NSGA-II needs a population that is a multiple of 4 and at least 6, got {}",
                n
            )));
        }
        if self.params.integer_dimension_count > dimensions {
            return Err(SweetspotError::Engine(format!(
                "{} integer dimensions exceed the {} problem dimensions",
                self.params.integer_dimension_count, dimensions
            )));
        }
        if let Some(bad) = snapshot.individuals.iter().find(|i| i.x.len() != dimensions) {
            return Err(SweetspotError::Engine(format!(
                "Individual has {} genes, problem has {}",
                bad.x.len(),
                dimensions
            )));
        }
        Ok(())
    }

    fn step<R: Rng>(
        &self,
        population: Vec<Individual>,
        problem: &mut dyn FitnessProblem,
        low: &[f64],
        high: &[f64],
        rng: &mut R,
    ) -> Result<Vec<Individual>> {
        let n = population.len();
        let continuous = low.len() - self.params.integer_dimension_count;
        let (ranks, crowding) = rank_and_crowd(&population);

        let mut offspring = Vec::with_capacity(n);
        while offspring.len() < n {
            let p1 = tournament_selection(&ranks, &crowding, rng);
            let p2 = tournament_selection(&ranks, &crowding, rng);
            let mut c1 = population[p1].x.clone();
            let mut c2 = population[p2].x.clone();

            if rng.gen::<f64>() < self.settings.crossover_probability {
                sbx_crossover(&mut c1, &mut c2, low, high, continuous, self.settings.eta_c, rng);
                integer_crossover(&mut c1, &mut c2, continuous, rng);
            }

            for child in [&mut c1, &mut c2] {
                polynomial_mutation(
                    child,
                    low,
                    high,
                    continuous,
                    self.settings.eta_m,
                    self.settings.mutation_probability,
                    rng,
                );
                integer_mutation(child, low, high, continuous, self.settings.mutation_probability, rng);
            }

            offspring.push(c1);
            if offspring.len() < n {
                offspring.push(c2);
            }
        }

        let mut combined = population;
        for x in offspring {
            let f = problem.fitness(&x)?;
            combined.push(Individual { x, f });
        }

        Ok(select_survivors(combined, n))
    }
}

impl EvolutionaryEngine for Nsga2Engine {
    fn name(&self) -> &str {
        "nsga2"
    }

    fn evolve(
        &mut self,
        mut snapshot: PopulationSnapshot,
        problem: &mut dyn FitnessProblem,
    ) -> Result<PopulationSnapshot> {
        let (low, high) = problem.bounds();
        if problem.integer_dimension_count() != self.params.integer_dimension_count {
            return Err(SweetspotError::Engine(format!(
                "Engine built for {} integer dimensions, problem declares {}",
                self.params.integer_dimension_count,
                problem.integer_dimension_count()
            )));
        }
        self.check_population(&snapshot, low.len())?;

        for _ in 0..self.params.generations_per_call {
            let mut rng = Self::generation_rng(
                snapshot.engine_state.seed,
                snapshot.engine_state.generations_evolved,
            );
            let population = std::mem::take(&mut snapshot.individuals);
            snapshot.individuals = self.step(population, problem, &low, &high, &mut rng)?;
            snapshot.engine_state.generations_evolved += 1;
        }

        Ok(snapshot)
    }
}

fn rank_and_crowd(population: &[Individual]) -> (Vec<usize>, Vec<f64>) {
    let points: Vec<[f64; 2]> = population.iter().map(|i| i.f.as_array()).collect();
    let (fronts, ranks) = fast_non_dominated_sort(&points);

    let mut crowding = vec![0.0; points.len()];
    for front in &fronts {
        for (k, d) in crowding_distance(&points, front).into_iter().enumerate() {
            crowding[front[k]] = d;
        }
    }
    (ranks, crowding)
}

/// Fill `size` slots front by front, breaking the last front on crowding distance.
fn select_survivors(combined: Vec<Individual>, size: usize) -> Vec<Individual> {
    let points: Vec<[f64; 2]> = combined.iter().map(|i| i.f.as_array()).collect();
    let (fronts, _) = fast_non_dominated_sort(&points);

    let mut chosen: Vec<usize> = Vec::with_capacity(size);
    for front in fronts {
        if chosen.len() + front.len() <= size {
            chosen.extend(front);
            continue;
        }

        let distances = crowding_distance(&points, &front);
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&a, &b| {
            distances[b]
                .partial_cmp(&distances[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(front[a].cmp(&front[b]))
        });
        let remaining = size - chosen.len();
        chosen.extend(order.into_iter().take(remaining).map(|k| front[k]));
        break;
    }

    chosen.sort_unstable();
    let mut slots: Vec<Option<Individual>> = combined.into_iter().map(Some).collect();
    chosen.into_iter().filter_map(|i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::engine::EngineState;
    use crate::types::ObjectiveVector;

    /// Two conflicting objectives over one continuous and one integer gene.
    struct Toy {
        calls: usize,
    }

    impl FitnessProblem for Toy {
        fn fitness(&mut self, x: &[f64]) -> Result<ObjectiveVector> {
            self.calls += 1;
            Ok(ObjectiveVector {
                neg_score: -x[0],
                neg_compression_ratio: -(10.0 - x[0]) - x[1] * 0.1,
            })
        }

        fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
            (vec![0.0, 0.0], vec![10.0, 5.0])
        }

        fn integer_dimension_count(&self) -> usize {
            1
        }
    }

    fn snapshot(seed: u64) -> PopulationSnapshot {
        let individuals = (0..8)
            .map(|i| {
                let x = vec![i as f64, (i % 5) as f64];
                let f = ObjectiveVector {
                    neg_score: -x[0],
                    neg_compression_ratio: -(10.0 - x[0]) - x[1] * 0.1,
                };
                Individual { x, f }
            })
            .collect();
        PopulationSnapshot {
            encoder_id: "libx264".to_string(),
            algorithm_id: "nsga2".to_string(),
            epoch: 1,
            generation: 0,
            individuals,
            engine_state: EngineState {
                seed,
                generations_evolved: 0,
            },
        }
    }

    #[test]
    fn test_evolve_one_generation() {
        let mut engine = Nsga2Engine::new(EngineParams::new(1, 4), Nsga2Settings::default());
        let mut toy = Toy { calls: 0 };

        let next = engine.evolve(snapshot(4), &mut toy).unwrap();

        assert_eq!(toy.calls, 8);
        assert_eq!(next.individuals.len(), 8);
        assert_eq!(next.engine_state.generations_evolved, 1);
        for ind in &next.individuals {
            assert_eq!(ind.x[1], ind.x[1].round());
            assert!(ind.x[0] >= 0.0 && ind.x[0] <= 10.0);
        }
    }

    #[test]
    fn test_evolve_is_deterministic() {
        let run = || {
            let mut engine = Nsga2Engine::new(EngineParams::new(1, 7), Nsga2Settings::default());
            engine.evolve(snapshot(7), &mut Toy { calls: 0 }).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_rejects_bad_population_size() {
        let mut engine = Nsga2Engine::new(EngineParams::new(1, 1), Nsga2Settings::default());
        let mut snap = snapshot(1);
        snap.individuals.truncate(6);
        let err = engine.evolve(snap, &mut Toy { calls: 0 }).unwrap_err();
        assert!(matches!(err, SweetspotError::Engine(_)));
    }

    #[test]
    fn test_rejects_population_of_four() {
        let mut engine = Nsga2Engine::new(EngineParams::new(1, 1), Nsga2Settings::default());
        let mut snap = snapshot(1);
        snap.individuals.truncate(4);
        let mut toy = Toy { calls: 0 };
        let err = engine.evolve(snap, &mut toy).unwrap_err();
        assert!(err.to_string().contains("at least 6"));
        assert_eq!(toy.calls, 0);
    }

    #[test]
    fn test_select_survivors_keeps_first_front() {
        let make = |a: f64, b: f64| Individual {
            x: vec![a, b],
            f: ObjectiveVector {
                neg_score: a,
                neg_compression_ratio: b,
            },
        };
        let combined = vec![make(0.0, 3.0), make(5.0, 5.0), make(3.0, 0.0), make(1.0, 1.0)];
        let survivors = select_survivors(combined, 3);
        let kept: Vec<[f64; 2]> = survivors.iter().map(|i| i.f.as_array()).collect();
        assert_eq!(kept, vec![[0.0, 3.0], [3.0, 0.0], [1.0, 1.0]]);
    }
}
