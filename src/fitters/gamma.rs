use super::Fitter;
use crate::models::ScalarModel;
use crate::moments::DimensionStatistics;

const EPS: f64 = 1e-6;

/// Optional location detection (`location := 0.9*min` if `min > 0`,
/// `min - 0.1*|min|` if `min < 0`, else `0`), then `shape := (mean -
/// location)^2 / variance`, `scale := variance / (mean - location)`.
pub struct GammaFitter;

impl Fitter for GammaFitter {
    fn name(&self) -> &'static str {
        "gamma"
    }

    fn estimate(&self, stats: &DimensionStatistics, _values: &[f64]) -> ScalarModel {
        let location = if stats.min > 0.0 {
            0.9 * stats.min
        } else if stats.min < 0.0 {
            stats.min - 0.1 * stats.min.abs()
        } else {
            0.0
        };

        let adjusted_mean = (stats.mean - location).max(EPS);
        let variance = stats.variance.max(EPS);

        let shape = (adjusted_mean * adjusted_mean / variance).max(0.1);
        let scale = (variance / adjusted_mean).max(EPS);

        ScalarModel::Gamma { shape, scale, location }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitters::ks_statistic;
    use crate::moments::MomentAccumulator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Gamma as GammaDist};

    #[test]
    fn fits_gamma_sample_with_low_ks() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = GammaDist::new(2.0, 1.0).unwrap();
        let values: Vec<f64> = (0..5_000).map(|_| dist.sample(&mut rng)).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();

        let fitter = GammaFitter;
        let model = fitter.estimate(&stats, &values);
        let ks = ks_statistic(&model, &values);

        if let ScalarModel::Gamma { shape, scale, .. } = model {
            assert!((1.8..=2.2).contains(&shape));
            assert!((0.8..=1.2).contains(&scale));
        } else {
            panic!("expected Gamma model");
        }
        assert!(ks < 0.05);
    }
}
