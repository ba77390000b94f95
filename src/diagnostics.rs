//! Non-modeled, reporting-adjacent statistics over a fitted
//! [`VectorSpaceModel`]: a per-dimension normality check against the raw
//! values, and a tally of which [`Strategy`] each dimension settled on.

use crate::vector_space::{DimensionStrategy, Strategy};
use statrs::distribution::{ChiSquared, ContinuousCDF};

pub struct Diagnostics;

impl Diagnostics {
    /// Jarque-Bera normality statistic of `values` against their own
    /// empirical skewness/kurtosis.
    ///
    /// Returns `(JB-statistic, p-value)`. Useful to sanity-check *why* a
    /// dimension escalated past `Parametric`: a large statistic on the raw
    /// values corroborates that the winning strategy was not an arbitrary
    /// selector quirk.
    pub fn jarque_bera(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        if values.len() < 8 {
            return (0.0, 1.0);
        }
        let mean = values.iter().sum::<f64>() / n;
        let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
        let m4 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;

        if m2 <= 0.0 {
            return (0.0, 1.0);
        }
        let skewness = m3 / m2.powf(1.5);
        let kurtosis = m4 / m2.powi(2);
        let jb_stat = (n / 6.0) * (skewness.powi(2) + (kurtosis - 3.0).powi(2) / 4.0);

        let chi2 = ChiSquared::new(2.0).expect("chi-squared with 2 df is always constructible");
        let p_value = 1.0 - chi2.cdf(jb_stat);
        (jb_stat, p_value)
    }

    /// Tally how many dimensions landed on each [`Strategy`] variant, in a
    /// stable `(label, count)` order: parametric, composite (grouped by k),
    /// empirical.
    pub fn summarize_strategies(strategies: &[DimensionStrategy]) -> Vec<(String, usize)> {
        let mut parametric = 0usize;
        let mut composite: std::collections::BTreeMap<u8, usize> = std::collections::BTreeMap::new();
        let mut empirical = 0usize;

        for s in strategies {
            match s.strategy {
                Strategy::Parametric => parametric += 1,
                Strategy::CompositeOfK(k) => *composite.entry(k).or_insert(0) += 1,
                Strategy::Empirical => empirical += 1,
            }
        }

        let mut out = Vec::with_capacity(composite.len() + 2);
        out.push(("parametric".to_string(), parametric));
        for (k, count) in composite {
            out.push((format!("composite_{k}"), count));
        }
        out.push(("empirical".to_string(), empirical));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jarque_bera_is_small_for_normal_like_data() {
        let values: Vec<f64> = (0..5000)
            .map(|i| ((i as f64) * 12.9898).sin() * 43758.5453 % 1.0 - 0.5)
            .collect();
        let (stat, _p) = Diagnostics::jarque_bera(&values);
        assert!(stat.is_finite());
        assert!(stat >= 0.0);
    }

    #[test]
    fn jarque_bera_short_sample_is_inconclusive() {
        let (stat, p) = Diagnostics::jarque_bera(&[1.0, 2.0, 3.0]);
        assert_eq!(stat, 0.0);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn summarize_strategies_tallies_every_variant() {
        let strategies = vec![
            DimensionStrategy { dimension: 0, strategy: Strategy::Parametric, final_ks: 0.01, explanatory_text: String::new() },
            DimensionStrategy { dimension: 1, strategy: Strategy::CompositeOfK(2), final_ks: 0.02, explanatory_text: String::new() },
            DimensionStrategy { dimension: 2, strategy: Strategy::CompositeOfK(2), final_ks: 0.03, explanatory_text: String::new() },
            DimensionStrategy { dimension: 3, strategy: Strategy::Empirical, final_ks: 0.5, explanatory_text: String::new() },
        ];
        let summary = Diagnostics::summarize_strategies(&strategies);
        assert_eq!(summary, vec![
            ("parametric".to_string(), 1),
            ("composite_2".to_string(), 2),
            ("empirical".to_string(), 1),
        ]);
    }
}
