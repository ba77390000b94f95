use super::Fitter;
use crate::models::{DimensionModel, Moments, ScalarModel};
use crate::moments::DimensionStatistics;
use crate::vector_space::FitResult;

/// Builds a histogram with `bin_count = clamp(ceil(log2(n)) + 1, 10, 100)`.
///
/// Its goodness-of-fit is **not** a KS D-statistic: it is a smoothness
/// surrogate (normalized total variation of bin counts, plus the fraction
/// of empty bins) documented as comparable-but-different in scale to the
/// other fitters' KS scores (see the open question in DESIGN.md). This is
/// also the only fitter never rejected by the selector for being
/// inapplicable — Empirical is the terminal fallback.
pub struct EmpiricalFitter;

pub fn bin_count_for(n: usize) -> usize {
    let log2 = (n.max(1) as f64).log2().ceil() as i64 + 1;
    log2.clamp(10, 100) as usize
}

fn build_histogram(stats: &DimensionStatistics, values: &[f64]) -> (Vec<f64>, Vec<u64>) {
    let bins = bin_count_for(values.len());
    let lo = stats.min;
    let hi = stats.max.max(lo + 1e-9);
    let width = (hi - lo) / bins as f64;

    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0u64; bins];
    for &x in values {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let mut cumulative = Vec::with_capacity(bins);
    let mut running = 0u64;
    for c in counts {
        running += c;
        cumulative.push(running);
    }
    (edges, cumulative)
}

fn smoothness_score(cumulative: &[u64], total: u64) -> f64 {
    if total == 0 || cumulative.is_empty() {
        return 1.0;
    }
    let bins = cumulative.len();
    let mut counts = Vec::with_capacity(bins);
    let mut prev = 0u64;
    for &c in cumulative {
        counts.push(c - prev);
        prev = c;
    }

    let total_variation: f64 = counts
        .windows(2)
        .map(|w| (w[1] as f64 - w[0] as f64).abs())
        .sum::<f64>()
        / (total as f64 * 2.0).max(1.0);

    let empty_fraction = counts.iter().filter(|&&c| c == 0).count() as f64 / bins as f64;

    (total_variation + empty_fraction).min(1.0)
}

impl Fitter for EmpiricalFitter {
    fn name(&self) -> &'static str {
        "empirical"
    }

    fn estimate(&self, stats: &DimensionStatistics, values: &[f64]) -> ScalarModel {
        let (edges, cumulative) = build_histogram(stats, values);
        let total = values.len() as u64;
        ScalarModel::Empirical {
            edges,
            cumulative,
            total,
            stats: Moments {
                mean: stats.mean,
                variance: stats.variance,
                skewness: stats.skewness,
                kurtosis: stats.kurtosis,
            },
        }
    }

    fn fit(&self, stats: &DimensionStatistics, values: &[f64]) -> FitResult {
        let (edges, cumulative) = build_histogram(stats, values);
        let total = values.len() as u64;
        let gof = smoothness_score(&cumulative, total);
        let model = ScalarModel::Empirical {
            edges,
            cumulative,
            total,
            stats: Moments {
                mean: stats.mean,
                variance: stats.variance,
                skewness: stats.skewness,
                kurtosis: stats.kurtosis,
            },
        };
        FitResult::new(DimensionModel::Simple(model), gof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::MomentAccumulator;

    #[test]
    fn bin_count_is_clamped() {
        assert_eq!(bin_count_for(1), 10);
        assert_eq!(bin_count_for(1_000_000), 21);
        assert!(bin_count_for(usize::MAX) <= 100);
    }

    #[test]
    fn histogram_cdf_spans_zero_to_one() {
        let values: Vec<f64> = (0..2000).map(|i| i as f64 * 0.01).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();
        let fitter = EmpiricalFitter;
        let result = fitter.fit(&stats, &values);
        assert!(result.goodness_of_fit >= 0.0 && result.goodness_of_fit <= 1.0);
        assert_eq!(result.model_type, "empirical");
        assert_eq!(result.model.cdf(stats.min), 0.0);
        assert!((result.model.cdf(stats.max) - 1.0).abs() < 1e-9);
    }
}
