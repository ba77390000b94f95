//! [`CompositeScalarModel`]: a weighted mixture of [`ScalarModel`]s.

use super::scalar::{Moments, ScalarModel};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A weighted mixture `sum_k w_k * f_k(x)`. `k = 1` is the "wrapped" simple
/// model case used when the equivalence checker collapses a composite back
/// to a single component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScalarModel {
    pub components: Vec<ScalarModel>,
    pub weights: Vec<f64>,
}

impl CompositeScalarModel {
    pub fn new(components: Vec<ScalarModel>, weights: Vec<f64>) -> Self {
        assert_eq!(components.len(), weights.len(), "components/weights length mismatch");
        let sum: f64 = weights.iter().sum();
        let weights = if (sum - 1.0).abs() > 1e-9 && sum > 0.0 {
            weights.iter().map(|w| w / sum).collect()
        } else {
            weights
        };
        CompositeScalarModel { components, weights }
    }

    pub fn k(&self) -> usize {
        self.components.len()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.components
            .iter()
            .zip(&self.weights)
            .map(|(c, w)| w * c.pdf(x))
            .sum()
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.components
            .iter()
            .zip(&self.weights)
            .map(|(c, w)| w * c.cdf(x))
            .sum()
    }

    /// Bisection against the mixture's own monotone CDF (no general
    /// closed-form inverse exists for a mixture).
    pub fn quantile(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let (mut lo, mut hi) = self.support_bracket();
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if self.cdf(mid) < u {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    fn support_bracket(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for c in &self.components {
            let m = c.moments();
            let spread = m.variance.max(1e-6).sqrt() * 60.0 + 60.0;
            lo = lo.min(m.mean - spread);
            hi = hi.max(m.mean + spread);
        }
        if !lo.is_finite() || !hi.is_finite() {
            (-1e6, 1e6)
        } else {
            (lo, hi)
        }
    }

    /// Sample by first drawing a component index from the categorical
    /// weights, then sampling that component directly.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (c, w) in self.components.iter().zip(&self.weights) {
            cumulative += w;
            if u <= cumulative {
                return c.sample(rng);
            }
        }
        self.components.last().unwrap().sample(rng)
    }

    /// Total mean/variance/skewness/kurtosis via the standard mixture
    /// central-moment decomposition (each component's raw central moments
    /// about the *global* mean, weighted and summed).
    pub fn moments(&self) -> Moments {
        let comp: Vec<Moments> = self.components.iter().map(|c| c.moments()).collect();

        let mean: f64 = comp.iter().zip(&self.weights).map(|(m, w)| w * m.mean).sum();

        let m2: f64 = comp
            .iter()
            .zip(&self.weights)
            .map(|(m, w)| {
                let d = m.mean - mean;
                w * (d * d + m.variance)
            })
            .sum();

        let m3: f64 = comp
            .iter()
            .zip(&self.weights)
            .map(|(m, w)| {
                let d = m.mean - mean;
                let sigma = m.variance.sqrt();
                let comp_m3 = m.skewness * sigma.powi(3);
                w * (d.powi(3) + 3.0 * d * m.variance + comp_m3)
            })
            .sum();

        let m4: f64 = comp
            .iter()
            .zip(&self.weights)
            .map(|(m, w)| {
                let d = m.mean - mean;
                let sigma = m.variance.sqrt();
                let comp_m3 = m.skewness * sigma.powi(3);
                let comp_m4 = m.kurtosis * m.variance.powi(2);
                w * (d.powi(4) + 6.0 * d * d * m.variance + 4.0 * d * comp_m3 + comp_m4)
            })
            .sum();

        let variance = m2;
        let sigma = variance.sqrt();
        let (skewness, kurtosis) = if sigma <= 1e-12 {
            (0.0, 3.0)
        } else {
            (m3 / sigma.powi(3), m4 / variance.powi(2))
        };

        Moments { mean, variance, skewness, kurtosis }
    }

    /// If `k == 1`, the "wrapped" equivalent simple model.
    pub fn as_simple(&self) -> Option<&ScalarModel> {
        if self.components.len() == 1 {
            self.components.first()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_mixture() -> CompositeScalarModel {
        CompositeScalarModel::new(
            vec![
                ScalarModel::Normal { mu: -2.0, sigma: 0.5, truncation: None },
                ScalarModel::Normal { mu: 3.0, sigma: 0.7, truncation: None },
            ],
            vec![0.6, 0.4],
        )
    }

    #[test]
    fn weights_renormalize_to_one() {
        let model = CompositeScalarModel::new(
            vec![
                ScalarModel::Uniform { lower: 0.0, upper: 1.0 },
                ScalarModel::Uniform { lower: 1.0, upper: 2.0 },
            ],
            vec![3.0, 1.0],
        );
        let sum: f64 = model.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((model.weights[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn cdf_monotone_and_bounded() {
        let model = two_point_mixture();
        let mut prev = 0.0;
        for i in 0..=200 {
            let x = -20.0 + 40.0 * i as f64 / 200.0;
            let c = model.cdf(x);
            assert!(c >= prev - 1e-9);
            prev = c;
        }
        assert!(model.cdf(-100.0) < 1e-6);
        assert!(model.cdf(100.0) > 1.0 - 1e-6);
    }

    #[test]
    fn quantile_cdf_roundtrip() {
        let model = two_point_mixture();
        for u in [0.01, 0.1, 0.5, 0.9, 0.99] {
            let x = model.quantile(u);
            assert!((model.cdf(x) - u).abs() < 1e-3);
        }
    }

    #[test]
    fn mixture_mean_matches_weighted_component_means() {
        let model = two_point_mixture();
        let moments = model.moments();
        let expected_mean = 0.6 * -2.0 + 0.4 * 3.0;
        assert!((moments.mean - expected_mean).abs() < 1e-9);
        assert!(moments.variance > 0.0);
    }

    #[test]
    fn k_one_is_wrapped_simple() {
        let model = CompositeScalarModel::new(
            vec![ScalarModel::Normal { mu: 0.0, sigma: 1.0, truncation: None }],
            vec![1.0],
        );
        assert!(model.as_simple().is_some());
        assert_eq!(model.k(), 1);
    }
}
