//! Gaussian Mixture Model expectation-maximization clusterer: soft
//! clustering with a fixed component count, used to drive
//! [`crate::composite_fitter::CompositeFitter`] when a single parametric fit
//! is poor.

const EPS_VAR: f64 = 1e-10;
const EPS_LOG: f64 = 1e-300;

/// Result of an EM run: per-component parameters, the full responsibility
/// matrix, and convergence bookkeeping.
#[derive(Debug, Clone)]
pub struct EMResult {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
    /// `responsibilities[i][k]`, owned by the caller and expected to be
    /// released once the composite model is assembled.
    pub responsibilities: Vec<Vec<f64>>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl EMResult {
    /// Hard-assign each sample to its argmax-responsibility component and
    /// partition the original values accordingly.
    pub fn segment(&self, values: &[f64]) -> Vec<Vec<f64>> {
        let k = self.means.len();
        let mut groups: Vec<Vec<f64>> = vec![Vec::new(); k];
        for (i, &x) in values.iter().enumerate() {
            let (best, _) = self.responsibilities[i]
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .unwrap();
            groups[best].push(x);
        }
        groups
    }
}

fn normal_density(x: f64, mean: f64, scale: f64) -> f64 {
    let z = (x - mean) / scale;
    (-0.5 * z * z).exp() / (scale * (2.0 * std::f64::consts::PI).sqrt())
}

/// Run GMM-EM on `values` with `peaks.len()` components initialized at the
/// given peak locations.
pub fn fit_gmm(values: &[f64], peaks: &[f64], max_iterations: usize, convergence: f64) -> EMResult {
    let n = values.len();
    let k = peaks.len();
    assert!(k >= 2, "GMM-EM requires at least two components");
    assert!(n > 0, "GMM-EM requires at least one observation");

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut means = peaks.to_vec();
    let mut weights = vec![1.0 / k as f64; k];
    let mut scales = vec![((max - min) / (2.0 * k as f64)).max(EPS_VAR.sqrt()); k];

    let mut prev_log_likelihood = f64::NEG_INFINITY;
    let mut responsibilities = vec![vec![0.0; k]; n];
    let mut log_likelihood = f64::NEG_INFINITY;
    let mut converged = false;
    let mut iterations_run = 0;

    for iteration in 0..max_iterations {
        iterations_run = iteration + 1;

        // E-step.
        log_likelihood = 0.0;
        for (i, &x) in values.iter().enumerate() {
            let mut densities = vec![0.0; k];
            let mut total = 0.0;
            for c in 0..k {
                let d = weights[c] * normal_density(x, means[c], scales[c]);
                densities[c] = d;
                total += d;
            }
            let total_clamped = total.max(EPS_LOG);
            for c in 0..k {
                responsibilities[i][c] = densities[c] / total_clamped;
            }
            log_likelihood += total_clamped.max(EPS_LOG).ln();
        }

        // M-step.
        let mut n_k = vec![0.0; k];
        for resp in &responsibilities {
            for c in 0..k {
                n_k[c] += resp[c];
            }
        }

        let mut new_means = means.clone();
        let mut new_scales = scales.clone();
        for c in 0..k {
            if n_k[c] > 0.0 {
                let mean: f64 = responsibilities.iter().zip(values).map(|(r, &x)| r[c] * x).sum::<f64>() / n_k[c];
                let var: f64 = responsibilities
                    .iter()
                    .zip(values)
                    .map(|(r, &x)| r[c] * (x - mean).powi(2))
                    .sum::<f64>()
                    / n_k[c];
                new_means[c] = mean;
                new_scales[c] = var.max(EPS_VAR).sqrt();
            }
        }
        means = new_means;
        scales = new_scales;

        let weight_sum: f64 = n_k.iter().sum();
        weights = n_k.iter().map(|&nk| nk / weight_sum.max(EPS_LOG)).collect();
        let renorm: f64 = weights.iter().sum();
        if renorm > 0.0 {
            for w in &mut weights {
                *w /= renorm;
            }
        }

        if iteration > 0 && (log_likelihood - prev_log_likelihood).abs() < convergence {
            converged = true;
            break;
        }
        prev_log_likelihood = log_likelihood;
    }

    EMResult {
        means,
        scales,
        weights,
        responsibilities,
        log_likelihood,
        iterations: iterations_run,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn separates_two_well_separated_clusters() {
        let mut rng = StdRng::seed_from_u64(21);
        let a = Normal::new(-5.0, 0.5).unwrap();
        let b = Normal::new(5.0, 0.5).unwrap();
        let mut values: Vec<f64> = (0..5000).map(|_| a.sample(&mut rng)).collect();
        values.extend((0..5000).map(|_| b.sample(&mut rng)));

        let result = fit_gmm(&values, &[-4.0, 4.0], 50, 1e-6);

        let mut means = result.means.clone();
        means.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert!((means[0] - -5.0).abs() < 0.3);
        assert!((means[1] - 5.0).abs() < 0.3);
        assert!(result.weights.iter().all(|w| (*w - 0.5).abs() < 0.1));
    }

    #[test]
    fn segment_partitions_all_values() {
        let mut rng = StdRng::seed_from_u64(22);
        let a = Normal::new(-5.0, 0.5).unwrap();
        let b = Normal::new(5.0, 0.5).unwrap();
        let mut values: Vec<f64> = (0..500).map(|_| a.sample(&mut rng)).collect();
        values.extend((0..500).map(|_| b.sample(&mut rng)));

        let result = fit_gmm(&values, &[-4.0, 4.0], 50, 1e-6);
        let groups = result.segment(&values);
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, values.len());
    }

    #[test]
    fn weights_always_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(23);
        let dist = Normal::new(0.0, 1.0).unwrap();
        let values: Vec<f64> = (0..1000).map(|_| dist.sample(&mut rng)).collect();
        let result = fit_gmm(&values, &[-1.0, 1.0, 0.0], 50, 1e-6);
        let sum: f64 = result.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
