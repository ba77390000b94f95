//! [`CompositeFitter`]: builds a [`CompositeScalarModel`] for a dimension
//! whose single best parametric fit scores poorly, by clustering with
//! [`crate::em`] and fitting each cluster independently.

use crate::config::ProfilerConfig;
use crate::em::{self, EMResult};
use crate::fitters::{selector::SelectorPreset, BestFitSelector};
use crate::models::{CompositeScalarModel, DimensionModel};
use crate::moments::{DimensionStatistics, MomentAccumulator};
use crate::vector_space::FitResult;

/// Locate up to `k` histogram peaks to seed EM. Smooths the raw counts with
/// a 3-bin moving average, then takes the `k` tallest local maxima (falling
/// back to evenly spaced quantile seeds if fewer than `k` maxima exist).
fn peak_seeds(stats: &DimensionStatistics, values: &[f64], k: usize) -> Vec<f64> {
    let bins = crate::fitters::empirical::bin_count_for(values.len()).max(k * 4);
    let lo = stats.min;
    let hi = stats.max.max(lo + 1e-9);
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0u64; bins];
    for &x in values {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let smoothed: Vec<f64> = (0..bins)
        .map(|i| {
            let lo_i = i.saturating_sub(1);
            let hi_i = (i + 1).min(bins - 1);
            let window = &counts[lo_i..=hi_i];
            window.iter().sum::<u64>() as f64 / window.len() as f64
        })
        .collect();

    let mut maxima: Vec<(usize, f64)> = (0..bins)
        .filter(|&i| {
            let left = if i == 0 { smoothed[i] } else { smoothed[i - 1] };
            let right = if i + 1 == bins { smoothed[i] } else { smoothed[i + 1] };
            smoothed[i] >= left && smoothed[i] >= right && smoothed[i] > 0.0
        })
        .map(|i| (i, smoothed[i]))
        .collect();
    maxima.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let mut seeds: Vec<f64> = maxima.iter().take(k).map(|&(i, _)| lo + width * (i as f64 + 0.5)).collect();

    if seeds.len() < k {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for j in seeds.len()..k {
            let q = (j as f64 + 1.0) / (k as f64 + 1.0);
            let idx = ((q * sorted.len() as f64) as usize).min(sorted.len() - 1);
            seeds.push(sorted[idx]);
        }
    }
    seeds.truncate(k);
    seeds
}

/// Builds a `k`-component mixture for a single dimension: peak detection,
/// GMM-EM clustering, per-component refit, and mixture-CDF KS scoring.
pub struct CompositeFitter;

impl CompositeFitter {
    /// Fit a composite model with exactly `k` components.
    pub fn fit_k(stats: &DimensionStatistics, values: &[f64], k: usize, config: &ProfilerConfig) -> (FitResult, EMResult) {
        let seeds = peak_seeds(stats, values, k);
        let em_result = em::fit_gmm(values, &seeds, config.em_max_iterations, config.em_convergence);
        let groups = em_result.segment(values);

        let selector = BestFitSelector::new(SelectorPreset::BoundedData);
        let mut components = Vec::with_capacity(k);
        for group in &groups {
            let model = if group.len() >= 8 {
                let group_stats = MomentAccumulator::from_slice(0, group).unwrap();
                let fit = selector.best_fit(&group_stats, group);
                match fit.model {
                    DimensionModel::Simple(m) => m,
                    DimensionModel::Composite(m) => m.as_simple().cloned().unwrap_or_else(|| {
                        crate::models::ScalarModel::Normal { mu: group_stats.mean, sigma: group_stats.std_dev().max(1e-9), truncation: None }
                    }),
                }
            } else {
                crate::models::ScalarModel::Normal {
                    mu: em_result.means[components.len()],
                    sigma: em_result.scales[components.len()].max(1e-9),
                    truncation: None,
                }
            };
            components.push(model);
        }

        let composite = CompositeScalarModel::new(components, em_result.weights.clone());
        let gof = composite_ks(&composite, values);
        let fit = FitResult::new(DimensionModel::Composite(composite), gof);
        (fit, em_result)
    }

    /// Try every `k` from 2 up to `config.max_composite_k` and return the
    /// best-scoring composite. Cheap heuristic: stop early once a `k`
    /// satisfies `config.ks_composite`.
    pub fn fit_best(stats: &DimensionStatistics, values: &[f64], config: &ProfilerConfig) -> FitResult {
        let mut best: Option<FitResult> = None;
        for k in 2..=config.max_composite_k {
            if k * 8 > values.len() {
                break;
            }
            let (candidate, _) = Self::fit_k(stats, values, k, config);
            let accept_early = candidate.goodness_of_fit < config.ks_composite;
            let better = best.as_ref().map(|b| candidate.goodness_of_fit < b.goodness_of_fit).unwrap_or(true);
            if better {
                best = Some(candidate);
            }
            if accept_early {
                break;
            }
        }
        best.unwrap_or_else(|| {
            let empirical = crate::fitters::empirical::EmpiricalFitter;
            use crate::fitters::Fitter;
            empirical.fit(stats, values)
        })
    }
}

fn composite_ks(composite: &CompositeScalarModel, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len() as f64;
    let mut d_max: f64 = 0.0;
    for (i, &x) in sorted.iter().enumerate() {
        let f = composite.cdf(x);
        let upper = ((i + 1) as f64 / n - f).abs();
        let lower = (i as f64 / n - f).abs();
        d_max = d_max.max(upper).max(lower);
    }
    d_max
}
