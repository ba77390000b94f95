use super::Fitter;
use crate::models::ScalarModel;
use crate::moments::DimensionStatistics;

const EPS: f64 = 1e-9;

/// `mu := stats.mean`, `sigma := max(stats.std_dev(), eps)`. Supports
/// truncation bounds supplied by the caller (e.g. when the selector already
/// knows the data is bounded).
pub struct NormalFitter {
    pub truncation: Option<(f64, f64)>,
}

impl NormalFitter {
    pub fn new() -> Self {
        NormalFitter { truncation: None }
    }

    pub fn truncated(lower: f64, upper: f64) -> Self {
        NormalFitter { truncation: Some((lower, upper)) }
    }
}

impl Default for NormalFitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fitter for NormalFitter {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn estimate(&self, stats: &DimensionStatistics, _values: &[f64]) -> ScalarModel {
        ScalarModel::Normal {
            mu: stats.mean,
            sigma: stats.std_dev().max(EPS),
            truncation: self.truncation,
        }
    }
}
