use super::Fitter;
use crate::models::ScalarModel;
use crate::moments::DimensionStatistics;

/// `lower := stats.min`, `upper := stats.max`, widened by a small epsilon
/// so a perfectly flat sample still has a strictly positive width.
pub struct UniformFitter;

impl Fitter for UniformFitter {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn estimate(&self, stats: &DimensionStatistics, _values: &[f64]) -> ScalarModel {
        let widen = (stats.max - stats.min).max(1e-9) * 1e-6;
        ScalarModel::Uniform {
            lower: stats.min - widen,
            upper: stats.max + widen,
        }
    }
}
