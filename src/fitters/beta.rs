use super::Fitter;
use crate::models::ScalarModel;
use crate::moments::DimensionStatistics;

const EPS: f64 = 1e-6;

/// `lower := stats.min`, `upper := stats.max`; method-of-moments on the
/// rescaled `x' = (x - lower) / (upper - lower)`.
pub struct BetaFitter;

impl Fitter for BetaFitter {
    fn name(&self) -> &'static str {
        "beta"
    }

    fn estimate(&self, stats: &DimensionStatistics, _values: &[f64]) -> ScalarModel {
        let range = (stats.max - stats.min).max(EPS);
        let mean_prime = (stats.mean - stats.min) / range;
        let var_prime = (stats.variance / (range * range)).max(EPS);

        let factor = (mean_prime * (1.0 - mean_prime) / var_prime - 1.0).max(EPS);
        let alpha = (mean_prime * factor).max(EPS);
        let beta = ((1.0 - mean_prime) * factor).max(EPS);

        ScalarModel::Beta {
            alpha,
            beta,
            lower: stats.min,
            upper: stats.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitters::ks_statistic;
    use crate::moments::MomentAccumulator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Beta as BetaDist, Distribution};

    #[test]
    fn fits_beta_sample_with_reasonable_ks() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = BetaDist::new(2.0, 5.0).unwrap();
        let values: Vec<f64> = (0..10_000).map(|_| dist.sample(&mut rng)).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();

        let fitter = BetaFitter;
        let model = fitter.estimate(&stats, &values);
        let ks = ks_statistic(&model, &values);
        assert!(ks < 0.05);
    }
}
