//! [`EquivalenceChecker`]: decides whether two dimension models are
//! practically interchangeable, so downstream consumers can treat
//! near-identical fits as the same shape rather than spurious variants.
//!
//! Rules are applied in order and the first that fires wins; each carries a
//! fixed tolerance rather than one the caller tunes per rule (only the base
//! moment-distance tolerance and the adaptive kurtosis band are configurable,
//! via [`crate::config::ProfilerConfig::equivalence_threshold`]).

use crate::models::{DimensionModel, ScalarModel};

const CDF_SAMPLE_TOLERANCE: f64 = 0.08;
const CDF_SAMPLE_POINTS: usize = 20;
const STUDENT_T_NORMAL_NU_THRESHOLD: f64 = 30.0;
const STUDENT_T_NORMAL_MEAN_TOLERANCE: f64 = 0.1;
const STUDENT_T_NORMAL_SCALE_TOLERANCE: f64 = 0.1;
const BETA_UNIFORM_TOLERANCE: f64 = 0.15;
const BETA_UNIFORM_OVERLAP_MIN: f64 = 0.8;
const ADAPTIVE_KURTOSIS_MIN: f64 = 0.30;
const ADAPTIVE_KURTOSIS_MAX: f64 = 0.60;
const BASE_MOMENT_TOLERANCE: f64 = 0.20;

#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceVerdict {
    pub equivalent: bool,
    pub reason: String,
}

impl EquivalenceVerdict {
    fn yes(reason: impl Into<String>) -> Self {
        EquivalenceVerdict { equivalent: true, reason: reason.into() }
    }
    fn no(reason: impl Into<String>) -> Self {
        EquivalenceVerdict { equivalent: false, reason: reason.into() }
    }
}

pub struct EquivalenceChecker;

impl EquivalenceChecker {
    /// Evaluate whether `a` and `b` describe the same practical shape.
    pub fn check(a: &DimensionModel, b: &DimensionModel) -> EquivalenceVerdict {
        if a == b {
            return EquivalenceVerdict::yes("identical model");
        }

        match (a.as_simple(), b.as_simple()) {
            (Some(sa), Some(sb)) => Self::check_simple(sa, sb),
            _ => Self::check_by_cdf_sampling(a, b, CDF_SAMPLE_TOLERANCE),
        }
    }

    fn check_simple(a: &ScalarModel, b: &ScalarModel) -> EquivalenceVerdict {
        if let Some(verdict) = Self::student_t_normal_rule(a, b) {
            return verdict;
        }

        if let Some(verdict) = Self::beta_uniform_rule(a, b) {
            return verdict;
        }

        if let Some(verdict) = Self::normal_beta_rule(a, b) {
            return verdict;
        }

        Self::moment_equivalence_rule(a, b)
    }

    /// A Student-t with enough degrees of freedom, centered and scaled close
    /// to a Normal, collapses to that Normal.
    fn student_t_normal_rule(a: &ScalarModel, b: &ScalarModel) -> Option<EquivalenceVerdict> {
        let (nu, location, scale, mu, sigma) = match (a, b) {
            (ScalarModel::StudentT { nu, location, scale }, ScalarModel::Normal { mu, sigma, .. }) => {
                (*nu, *location, *scale, *mu, *sigma)
            }
            (ScalarModel::Normal { mu, sigma, .. }, ScalarModel::StudentT { nu, location, scale }) => {
                (*nu, *location, *scale, *mu, *sigma)
            }
            _ => return None,
        };
        let mean_diff = (mu - location).abs();
        let scale_rel_diff = (sigma - scale).abs() / sigma.max(0.01);
        if nu >= STUDENT_T_NORMAL_NU_THRESHOLD
            && mean_diff <= STUDENT_T_NORMAL_MEAN_TOLERANCE
            && scale_rel_diff <= STUDENT_T_NORMAL_SCALE_TOLERANCE
        {
            return Some(EquivalenceVerdict::yes(format!(
                "student_t(nu={nu:.1}) collapses to normal (mean diff {mean_diff:.3}, scale rel diff {scale_rel_diff:.3})"
            )));
        }
        None
    }

    /// A Beta whose shape parameters are both close to 1 (near-flat density)
    /// and whose support overlaps a Uniform's is equivalent to that Uniform.
    fn beta_uniform_rule(a: &ScalarModel, b: &ScalarModel) -> Option<EquivalenceVerdict> {
        let (beta, uniform) = match (a, b) {
            (ScalarModel::Beta { .. }, ScalarModel::Uniform { .. }) => (a, b),
            (ScalarModel::Uniform { .. }, ScalarModel::Beta { .. }) => (b, a),
            _ => return None,
        };
        if let (ScalarModel::Beta { alpha, beta: beta_param, lower: bl, upper: bu }, ScalarModel::Uniform { lower: ul, upper: uu }) = (beta, uniform) {
            let overlap = (bu.min(*uu) - bl.max(*ul)).max(0.0);
            let union = bu.max(*uu) - bl.min(*ul);
            let overlap_ratio = if union > 0.0 { overlap / union } else { 1.0 };
            let shape_close = (alpha - 1.0).abs() <= BETA_UNIFORM_TOLERANCE && (beta_param - 1.0).abs() <= BETA_UNIFORM_TOLERANCE;
            if shape_close && overlap_ratio >= BETA_UNIFORM_OVERLAP_MIN {
                return Some(EquivalenceVerdict::yes(format!(
                    "beta(alpha={alpha:.2}, beta={beta_param:.2}) within {BETA_UNIFORM_TOLERANCE} of uniform shape, overlap ratio {overlap_ratio:.3}"
                )));
            }
            return Some(EquivalenceVerdict::no(format!(
                "beta/uniform pair fails shape or overlap thresholds (overlap ratio {overlap_ratio:.3})"
            )));
        }
        None
    }

    /// Normal vs. Beta: neither has a moment relation to the other, so the
    /// comparison is done by sampling both CDFs over the Beta's support.
    fn normal_beta_rule(a: &ScalarModel, b: &ScalarModel) -> Option<EquivalenceVerdict> {
        match (a, b) {
            (ScalarModel::Normal { .. }, ScalarModel::Beta { .. }) | (ScalarModel::Beta { .. }, ScalarModel::Normal { .. }) => {
                Some(Self::check_by_cdf_sampling(
                    &DimensionModel::Simple(a.clone()),
                    &DimensionModel::Simple(b.clone()),
                    CDF_SAMPLE_TOLERANCE,
                ))
            }
            _ => None,
        }
    }

    /// Terminal fallback: compare mean, variance, skew, and kurtosis. All
    /// four must pass for the pair to be declared equivalent. Kurtosis is
    /// compared against an adaptive band that widens for heavier-tailed
    /// reference values, since relative kurtosis error grows faster there;
    /// the other three moments use the fixed base tolerance.
    fn moment_equivalence_rule(a: &ScalarModel, b: &ScalarModel) -> EquivalenceVerdict {
        let ma = a.moments();
        let mb = b.moments();
        if ![ma.mean, ma.variance, ma.skewness, ma.kurtosis, mb.mean, mb.variance, mb.skewness, mb.kurtosis]
            .iter()
            .all(|v| v.is_finite())
        {
            return EquivalenceVerdict::no("moment comparison undefined: one or both models have a non-finite moment");
        }

        let mean_ref = ma.mean.abs().max(mb.mean.abs()).max(1e-8);
        let mean_diff = (ma.mean - mb.mean).abs() / mean_ref;

        let var_ref = ma.variance.max(mb.variance).max(1e-8);
        let var_diff = (ma.variance - mb.variance).abs() / var_ref;

        let skew_ref = ma.skewness.abs().max(mb.skewness.abs()).max(1e-8);
        let skew_diff = (ma.skewness - mb.skewness).abs() / skew_ref;

        let kurt_ref = ma.kurtosis.max(mb.kurtosis).max(3.0);
        let kurt_band = (ADAPTIVE_KURTOSIS_MIN + (kurt_ref - 3.0) * 0.02).clamp(ADAPTIVE_KURTOSIS_MIN, ADAPTIVE_KURTOSIS_MAX);
        let kurt_diff = (ma.kurtosis - mb.kurtosis).abs() / kurt_ref;

        let all_pass = mean_diff < BASE_MOMENT_TOLERANCE
            && var_diff < BASE_MOMENT_TOLERANCE
            && skew_diff < BASE_MOMENT_TOLERANCE
            && kurt_diff < kurt_band;

        if all_pass {
            EquivalenceVerdict::yes(format!(
                "moments within tolerance (mean {mean_diff:.3}, variance {var_diff:.3}, skew {skew_diff:.3}, kurtosis {kurt_diff:.3} < band {kurt_band:.3})"
            ))
        } else {
            EquivalenceVerdict::no(format!(
                "moment mismatch (mean {mean_diff:.3}, variance {var_diff:.3}, skew {skew_diff:.3}, kurtosis {kurt_diff:.3} vs band {kurt_band:.3})"
            ))
        }
    }

    /// Sample both models' CDFs at `CDF_SAMPLE_POINTS` interior quantile
    /// points and require the *max* absolute difference to fall under
    /// `tolerance` — a single large localized discrepancy fails the rule even
    /// if every other sampled point agrees.
    fn check_by_cdf_sampling(a: &DimensionModel, b: &DimensionModel, tolerance: f64) -> EquivalenceVerdict {
        let mut max_diff = 0.0_f64;
        for i in 1..=CDF_SAMPLE_POINTS {
            let u = i as f64 / (CDF_SAMPLE_POINTS + 1) as f64;
            let xa = a.quantile(u);
            let diff = (a.cdf(xa) - b.cdf(xa)).abs();
            if diff > max_diff {
                max_diff = diff;
            }
        }
        if max_diff < tolerance {
            EquivalenceVerdict::yes(format!("max CDF-sample difference {max_diff:.4} within tolerance {tolerance:.4}"))
        } else {
            EquivalenceVerdict::no(format!("max CDF-sample difference {max_diff:.4} exceeds tolerance {tolerance:.4}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(m: ScalarModel) -> DimensionModel {
        DimensionModel::Simple(m)
    }

    #[test]
    fn reflexive_for_every_variant() {
        // P9: a model is always equivalent to itself.
        let models = vec![
            ScalarModel::Normal { mu: 0.0, sigma: 1.0, truncation: None },
            ScalarModel::Uniform { lower: 0.0, upper: 1.0 },
            ScalarModel::Beta { alpha: 2.0, beta: 5.0, lower: 0.0, upper: 1.0 },
            ScalarModel::Gamma { shape: 2.0, scale: 1.0, location: 0.0 },
            ScalarModel::StudentT { nu: 8.0, location: 0.0, scale: 1.0 },
        ];
        for m in models {
            let dm = simple(m);
            assert!(EquivalenceChecker::check(&dm, &dm).equivalent);
        }
    }

    #[test]
    fn symmetric_for_student_t_normal_pair() {
        // P9: equivalence is symmetric.
        let t = simple(ScalarModel::StudentT { nu: 50.0, location: 0.0, scale: 1.0 });
        let n = simple(ScalarModel::Normal { mu: 0.0, sigma: 1.0, truncation: None });
        let forward = EquivalenceChecker::check(&t, &n);
        let backward = EquivalenceChecker::check(&n, &t);
        assert_eq!(forward.equivalent, backward.equivalent);
        assert!(forward.equivalent);
    }

    #[test]
    fn student_t_below_threshold_not_collapsed() {
        let t = simple(ScalarModel::StudentT { nu: 5.0, location: 0.0, scale: 1.0 });
        let n = simple(ScalarModel::Normal { mu: 0.0, sigma: 1.0, truncation: None });
        let verdict = EquivalenceChecker::check(&t, &n);
        assert!(!verdict.equivalent);
    }

    #[test]
    fn near_flat_beta_matches_uniform() {
        let beta = simple(ScalarModel::Beta { alpha: 1.02, beta: 0.98, lower: 0.0, upper: 1.0 });
        let uniform = simple(ScalarModel::Uniform { lower: 0.0, upper: 1.0 });
        assert!(EquivalenceChecker::check(&beta, &uniform).equivalent);
    }

    #[test]
    fn skewed_beta_does_not_match_uniform() {
        let beta = simple(ScalarModel::Beta { alpha: 5.0, beta: 1.0, lower: 0.0, upper: 1.0 });
        let uniform = simple(ScalarModel::Uniform { lower: 0.0, upper: 1.0 });
        assert!(!EquivalenceChecker::check(&beta, &uniform).equivalent);
    }

    #[test]
    fn distant_normals_are_not_equivalent_despite_equal_kurtosis() {
        // Every Normal has kurtosis exactly 3 regardless of location/scale;
        // the fallback must also compare mean and variance, not kurtosis alone.
        let a = simple(ScalarModel::Normal { mu: 0.0, sigma: 1.0, truncation: None });
        let b = simple(ScalarModel::Normal { mu: 100.0, sigma: 50.0, truncation: None });
        assert!(!EquivalenceChecker::check(&a, &b).equivalent);
    }

    #[test]
    fn student_t_normal_pair_needs_matching_location_and_scale() {
        let t = simple(ScalarModel::StudentT { nu: 1000.0, location: 500.0, scale: 50.0 });
        let n = simple(ScalarModel::Normal { mu: 0.0, sigma: 1.0, truncation: None });
        assert!(!EquivalenceChecker::check(&t, &n).equivalent);
    }

    #[test]
    fn beta_uniform_pair_needs_overlap_not_just_endpoint_proximity() {
        // Two equal-width supports offset so they only half-overlap must not
        // pass on endpoint-distance alone.
        let beta = simple(ScalarModel::Beta { alpha: 1.0, beta: 1.0, lower: 0.0, upper: 1.0 });
        let uniform = simple(ScalarModel::Uniform { lower: 0.5, upper: 1.5 });
        assert!(!EquivalenceChecker::check(&beta, &uniform).equivalent);
    }

    #[test]
    fn normal_beta_rule_rejects_u_shaped_beta() {
        // An arcsine-shaped Beta (alpha=beta=0.5) is nothing like a bell
        // curve; the dedicated Normal<->Beta rule must reject it rather than
        // falling through to a looser comparison.
        let normal = simple(ScalarModel::Normal { mu: 0.5, sigma: 0.2, truncation: None });
        let beta = simple(ScalarModel::Beta { alpha: 0.5, beta: 0.5, lower: 0.0, upper: 1.0 });
        assert!(!EquivalenceChecker::check(&normal, &beta).equivalent);
    }
}
