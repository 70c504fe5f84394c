use super::pareto::crowded_comparison;
use rand::Rng;

/// Binary tournament on (rank, crowding distance): pick the better of 2 random candidates
pub fn tournament_selection<R: Rng>(ranks: &[usize], crowding: &[f64], rng: &mut R) -> usize {
    let a = rng.gen_range(0..ranks.len());
    let b = rng.gen_range(0..ranks.len());

    if crowded_comparison(ranks[b], crowding[b], ranks[a], crowding[a]) {
        b
    } else {
        a
    }
}

/// Simulated binary crossover on the continuous prefix `0..continuous`.
pub fn sbx_crossover<R: Rng>(
    child1: &mut [f64],
    child2: &mut [f64],
    low: &[f64],
    high: &[f64],
    continuous: usize,
    eta_c: f64,
    rng: &mut R,
) {
    for i in 0..continuous {
        if rng.gen::<f64>() > 0.5 || (child1[i] - child2[i]).abs() < 1e-14 {
            continue;
        }

        let u = rng.gen::<f64>();
        let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (eta_c + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta_c + 1.0))
        };

        let (p1, p2) = (child1[i], child2[i]);
        child1[i] = (0.5 * ((1.0 + beta) * p1 + (1.0 - beta) * p2)).clamp(low[i], high[i]);
        child2[i] = (0.5 * ((1.0 - beta) * p1 + (1.0 + beta) * p2)).clamp(low[i], high[i]);
    }
}

/// Single-point crossover: swap the tail of the integer suffix `continuous..`
pub fn integer_crossover<R: Rng>(child1: &mut [f64], child2: &mut [f64], continuous: usize, rng: &mut R) {
    let len = child1.len().min(child2.len());
    if len - continuous <= 1 {
        return;
    }

    let point = rng.gen_range(continuous + 1..len);
    child1[point..len].swap_with_slice(&mut child2[point..len]);
}

/// Polynomial mutation on the continuous prefix.
pub fn polynomial_mutation<R: Rng>(
    x: &mut [f64],
    low: &[f64],
    high: &[f64],
    continuous: usize,
    eta_m: f64,
    mutation_rate: f64,
    rng: &mut R,
) {
    for i in 0..continuous {
        if rng.gen::<f64>() >= mutation_rate {
            continue;
        }
        let u = rng.gen::<f64>();
        let delta = if u < 0.5 {
            (2.0 * u).powf(1.0 / (eta_m + 1.0)) - 1.0
        } else {
            1.0 - (2.0 * (1.0 - u)).powf(1.0 / (eta_m + 1.0))
        };
        x[i] = (x[i] + delta * (high[i] - low[i])).clamp(low[i], high[i]);
    }
}

/// Mutation: randomly reset integer genes within their bounds
pub fn integer_mutation<R: Rng>(
    x: &mut [f64],
    low: &[f64],
    high: &[f64],
    continuous: usize,
    mutation_rate: f64,
    rng: &mut R,
) {
    for i in continuous..x.len() {
        if rng.gen::<f64>() < mutation_rate {
            let (lo, hi) = (low[i].ceil() as i64, high[i].floor() as i64);
            x[i] = rng.gen_range(lo..=hi.max(lo)) as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_operators_respect_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let low = vec![0.0, 0.0, 1.0, 0.0];
        let high = vec![1.0, 10.0, 50.0, 3.0];

        for _ in 0..200 {
            let mut a = vec![0.1, 9.5, 3.0, 0.0];
            let mut b = vec![0.9, 0.5, 48.0, 3.0];
            sbx_crossover(&mut a, &mut b, &low, &high, 2, 10.0, &mut rng);
            integer_crossover(&mut a, &mut b, 2, &mut rng);
            polynomial_mutation(&mut a, &low, &high, 2, 50.0, 1.0, &mut rng);
            integer_mutation(&mut b, &low, &high, 2, 1.0, &mut rng);

            for x in [&a, &b] {
                for i in 0..4 {
                    assert!(x[i] >= low[i] && x[i] <= high[i]);
                }
                assert_eq!(x[2], x[2].round());
                assert_eq!(x[3], x[3].round());
            }
        }
    }

    #[test]
    fn test_tournament_prefers_lower_rank() {
        let mut rng = StdRng::seed_from_u64(1);
        let ranks = vec![0, 3];
        let crowding = vec![0.0, f64::INFINITY];
        for _ in 0..50 {
            let winner = tournament_selection(&ranks, &crowding, &mut rng);
            // Index 1 only wins when both draws picked it.
            if winner == 1 {
                continue;
            }
            assert_eq!(winner, 0);
        }
    }
}
