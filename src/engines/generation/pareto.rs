/// Pareto utilities for the two-objective, minimize-both search.
/// Implements NSGA-II style fast non-dominated sorting and crowding distance

use crate::types::ObjectiveVector;
use rayon::prelude::*;

/// Check if objective vector A dominates B (minimization)
/// A dominates B if A is no worse than B in all objectives and strictly better in at least one
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut at_least_one_better = false;

    for (&a_val, &b_val) in a.iter().zip(b) {
        if b_val < a_val {
            // B is better in this objective, so A does not dominate B
            return false;
        }
        if a_val < b_val {
            at_least_one_better = true;
        }
    }

    at_least_one_better
}

/// Fast non-dominated sorting (NSGA-II algorithm)
/// Returns indices grouped by Pareto front (0 = best, 1 = second best, etc.)
/// and the rank of every point.
pub fn fast_non_dominated_sort(points: &[[f64; 2]]) -> (Vec<Vec<usize>>, Vec<usize>) {
    let n = points.len();

    // For each point, track:
    // - domination_count: how many points dominate it
    // - dominated_solutions: indices of points it dominates
    let mut domination_count = domination_counts(points);
    let dominated_solutions: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .filter(|&j| i != j && dominates(&points[i], &points[j]))
                .collect()
        })
        .collect();

    let mut ranks = vec![0; n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();

    let first_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    if first_front.is_empty() {
        return (fronts, ranks);
    }
    fronts.push(first_front);

    // Generate subsequent fronts
    let mut front_index = 0;
    while front_index < fronts.len() {
        let mut next_front = Vec::new();

        for &i in &fronts[front_index] {
            for &j in &dominated_solutions[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = front_index + 1;
                    next_front.push(j);
                }
            }
        }

        if !next_front.is_empty() {
            next_front.sort_unstable();
            fronts.push(next_front);
        }
        front_index += 1;
    }

    (fronts, ranks)
}

/// Number of points dominating each point.
pub fn domination_counts(points: &[[f64; 2]]) -> Vec<usize> {
    (0..points.len())
        .into_par_iter()
        .map(|i| {
            points
                .iter()
                .enumerate()
                .filter(|&(j, p)| i != j && dominates(p, &points[i]))
                .count()
        })
        .collect()
}

/// Crowding distance of each member of one front, in `front_indices` order.
/// Crowding distance measures how close a point is to its neighbors
/// Higher values indicate more diversity (isolated points)
pub fn crowding_distance(points: &[[f64; 2]], front_indices: &[usize]) -> Vec<f64> {
    let front_size = front_indices.len();

    if front_size <= 2 {
        // Boundary solutions have infinite crowding distance
        return vec![f64::INFINITY; front_size];
    }

    let mut distances = vec![0.0; front_size];

    for obj in 0..ObjectiveVector::LEN {
        // Sort front positions by this objective
        let mut order: Vec<usize> = (0..front_size).collect();
        order.sort_by(|&a, &b| {
            points[front_indices[a]][obj]
                .partial_cmp(&points[front_indices[b]][obj])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        // Boundary points have infinite distance
        distances[order[0]] = f64::INFINITY;
        distances[order[front_size - 1]] = f64::INFINITY;

        let min_val = points[front_indices[order[0]]][obj];
        let max_val = points[front_indices[order[front_size - 1]]][obj];
        let range = max_val - min_val;

        if range.abs() < 1e-10 {
            // All values are the same for this objective
            continue;
        }

        for k in 1..(front_size - 1) {
            let prev_val = points[front_indices[order[k - 1]]][obj];
            let next_val = points[front_indices[order[k + 1]]][obj];
            distances[order[k]] += (next_val - prev_val) / range;
        }
    }

    distances
}

/// Compare two ranked points for selection (crowded comparison operator)
/// Returns true if A should be preferred over B
pub fn crowded_comparison(a_rank: usize, a_distance: f64, b_rank: usize, b_distance: f64) -> bool {
    // Prefer lower rank (better Pareto front)
    if a_rank != b_rank {
        return a_rank < b_rank;
    }

    // Same rank: prefer higher crowding distance (more diverse)
    a_distance > b_distance
}

/// Dominance analysis of one set of objective vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontRanking {
    /// Indices of the non-dominated points, ascending.
    pub non_dominated: Vec<usize>,
    pub domination_counts: Vec<usize>,
    pub ranks: Vec<usize>,
    /// Crowding distance of each `non_dominated` member, same order.
    pub crowding_distances: Vec<f64>,
}

impl FrontRanking {
    /// Mean of the finite crowding distances, if there are any.
    pub fn mean_crowding_distance(&self) -> Option<f64> {
        let finite: Vec<f64> = self
            .crowding_distances
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }
}

/// Read-only reporting over accumulated evaluation results.
pub struct FrontAnalyzer;

impl FrontAnalyzer {
    pub fn rank(objectives: &[ObjectiveVector]) -> FrontRanking {
        let points: Vec<[f64; 2]> = objectives.iter().map(ObjectiveVector::as_array).collect();

        let (fronts, ranks) = fast_non_dominated_sort(&points);
        let domination_counts = domination_counts(&points);
        let non_dominated = fronts.into_iter().next().unwrap_or_default();
        let crowding_distances = crowding_distance(&points, &non_dominated);

        FrontRanking {
            non_dominated,
            domination_counts,
            ranks,
            crowding_distances,
        }
    }
}
