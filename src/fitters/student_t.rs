use super::Fitter;
use crate::models::ScalarModel;
use crate::moments::DimensionStatistics;

/// `nu` estimated from excess kurtosis (`nu ~= 4 + 6/(kurtosis - 3)` when
/// `kurtosis > 3`; otherwise defaults to a large `nu` (>= 30), at which
/// point the Student-t is essentially Normal per the equivalence checker).
/// `location := mean`, `scale := std_dev * sqrt((nu-2)/nu)`.
pub struct StudentTFitter;

impl Fitter for StudentTFitter {
    fn name(&self) -> &'static str {
        "student_t"
    }

    fn estimate(&self, stats: &DimensionStatistics, _values: &[f64]) -> ScalarModel {
        let excess = stats.excess_kurtosis();
        let nu = if excess > 0.0 {
            (4.0 + 6.0 / excess).max(2.1)
        } else {
            30.0
        };
        let scale = (stats.std_dev() * ((nu - 2.0) / nu).sqrt()).max(1e-9);
        ScalarModel::StudentT { nu, location: stats.mean, scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitters::ks_statistic;
    use crate::moments::MomentAccumulator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StudentT as StudentTDist};

    #[test]
    fn fits_heavy_tailed_sample() {
        let mut rng = StdRng::seed_from_u64(5);
        let dist = StudentTDist::new(5.0).unwrap();
        let values: Vec<f64> = (0..10_000).map(|_| dist.sample(&mut rng)).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();

        let fitter = StudentTFitter;
        let model = fitter.estimate(&stats, &values);
        let ks = ks_statistic(&model, &values);
        assert!(ks < 0.1);
    }
}
