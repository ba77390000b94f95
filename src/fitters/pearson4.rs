use super::Fitter;
use crate::models::ScalarModel;
use crate::moments::DimensionStatistics;

/// The sentinel model returned when the Pearson-IV method-of-moments system
/// has no valid solution for the observed (skew, kurtosis) pair. Its KS
/// score against real data is expected (not guaranteed, see DESIGN.md open
/// question) to be poor, so the selector naturally passes over it.
pub const SENTINEL: ScalarModel = ScalarModel::PearsonIV { m: 2.0, nu: 0.0, scale: 1.0, location: 0.0 };

/// Method-of-moments fit on `(beta1 = skew^2, beta2 = kurtosis)`, following
/// the classical Pearson-system parameter relations. Falls back to
/// [`SENTINEL`] when the underlying Pearson kappa statistic falls outside
/// `(0, 1)` — the region where a Type IV solution exists.
pub struct Pearson4Fitter;

impl Fitter for Pearson4Fitter {
    fn name(&self) -> &'static str {
        "pearson_iv"
    }

    fn estimate(&self, stats: &DimensionStatistics, _values: &[f64]) -> ScalarModel {
        let beta1 = stats.skewness * stats.skewness;
        let beta2 = stats.kurtosis;

        let denom1 = 2.0 * beta2 - 3.0 * beta1 - 6.0;
        if denom1.abs() < 1e-9 {
            return SENTINEL;
        }

        let kappa = beta1 * (beta2 + 3.0).powi(2) / (4.0 * denom1 * (4.0 * beta2 - 3.0 * beta1));
        if !(kappa > 0.0 && kappa < 1.0) {
            return SENTINEL;
        }

        let r = 6.0 * (beta2 - beta1 - 1.0) / denom1;
        let m = (r / 2.0).max(0.6);
        let nu = -stats.skewness * m.sqrt();

        let two_m_minus_3 = 2.0 * m - 3.0;
        if two_m_minus_3 <= 1e-9 || stats.variance <= 0.0 {
            return SENTINEL;
        }
        let scale = (stats.variance * two_m_minus_3).sqrt().max(1e-9);
        let location = stats.mean + scale * nu / (2.0 * m);

        ScalarModel::PearsonIV { m, nu, scale, location }
    }
}
