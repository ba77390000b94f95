//! [`AdaptiveExtractor`]: the per-dimension decision pipeline. Tries a single
//! parametric fit first, escalates to a mixture when the fit scores poorly,
//! and falls back to the Empirical histogram when nothing else is accepted.
//! Internal verification can only demote a strategy to the next one down the
//! chain, never promote a rejected candidate back up.

use crate::config::ProfilerConfig;
use crate::composite_fitter::CompositeFitter;
use crate::fitters::{empirical::EmpiricalFitter, selector::SelectorPreset, BestFitSelector, Fitter};
use crate::models::DimensionModel;
use crate::moments::DimensionStatistics;
use crate::vector_space::{DimensionStrategy, FitResult, Strategy};
use crate::verifier::InternalVerifier;

pub struct AdaptiveExtractor;

impl AdaptiveExtractor {
    /// Run the full strategy chain for one dimension and return both the
    /// winning fit and an explanatory [`DimensionStrategy`] record.
    pub fn extract(
        dimension: usize,
        stats: &DimensionStatistics,
        values: &[f64],
        config: &ProfilerConfig,
        seed: u64,
    ) -> (FitResult, DimensionStrategy) {
        let selector = BestFitSelector::new(SelectorPreset::Default);
        let parametric = selector.best_fit(stats, values);

        if parametric.goodness_of_fit < config.ks_parametric {
            if let Some(strategy) = Self::accept(dimension, &parametric, Strategy::Parametric, config, seed) {
                return (parametric, strategy);
            }
        }

        tracing::debug!(dimension, ks = parametric.goodness_of_fit, "parametric fit did not clear threshold, escalating to composite");
        let composite = CompositeFitter::fit_best(stats, values, config);
        if composite.goodness_of_fit < config.ks_composite {
            let k = match &composite.model {
                DimensionModel::Composite(m) => m.k() as u8,
                DimensionModel::Simple(_) => 1,
            };
            if let Some(strategy) = Self::accept(dimension, &composite, Strategy::CompositeOfK(k), config, seed) {
                return (composite, strategy);
            }
        }

        // Neither parametric nor composite cleared its threshold and passed
        // verification: fall straight through to Empirical. Verification can
        // only demote a candidate, never hand back one it already rejected.
        tracing::debug!(dimension, "falling back to empirical histogram");
        let empirical = EmpiricalFitter.fit(stats, values);
        let strategy = DimensionStrategy {
            dimension,
            strategy: Strategy::Empirical,
            final_ks: empirical.goodness_of_fit,
            explanatory_text: "no parametric or composite fit cleared threshold; fell back to empirical histogram".to_string(),
        };
        (empirical, strategy)
    }

    fn accept(
        dimension: usize,
        fit: &FitResult,
        strategy: Strategy,
        config: &ProfilerConfig,
        seed: u64,
    ) -> Option<DimensionStrategy> {
        if config.verification_enabled {
            let verification = InternalVerifier::verify(&fit.model, seed ^ (dimension as u64), config);
            if !verification.passed {
                return None;
            }
            return Some(DimensionStrategy {
                dimension,
                strategy,
                final_ks: fit.goodness_of_fit,
                explanatory_text: format!(
                    "accepted after verification (max relative drift {:.4})",
                    verification.max_relative_drift
                ),
            });
        }
        Some(DimensionStrategy {
            dimension,
            strategy,
            final_ks: fit.goodness_of_fit,
            explanatory_text: "accepted without verification (disabled in config)".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::MomentAccumulator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn normal_sample_resolves_to_parametric() {
        let mut rng = StdRng::seed_from_u64(31);
        let dist = Normal::new(2.0, 1.0).unwrap();
        let values: Vec<f64> = (0..10_000).map(|_| dist.sample(&mut rng)).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();
        let config = ProfilerConfig::default();

        let (fit, strategy) = AdaptiveExtractor::extract(0, &stats, &values, &config, 99);
        assert_eq!(strategy.strategy, Strategy::Parametric);
        assert_eq!(fit.model_type, "normal");
    }

    #[test]
    fn bimodal_sample_resolves_to_composite_or_better() {
        let mut rng = StdRng::seed_from_u64(32);
        let a = Normal::new(-6.0, 1.0).unwrap();
        let b = Normal::new(6.0, 1.0).unwrap();
        let mut values: Vec<f64> = (0..3000).map(|_| a.sample(&mut rng)).collect();
        values.extend((0..3000).map(|_| b.sample(&mut rng)));
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();
        let config = ProfilerConfig::default();

        let (fit, strategy) = AdaptiveExtractor::extract(0, &stats, &values, &config, 100);
        assert!(!matches!(strategy.strategy, Strategy::Parametric));
        assert!(fit.goodness_of_fit < 0.2);
    }

    #[test]
    fn verification_can_only_demote_never_promote() {
        // P8: disabling verification must never change a rejected strategy
        // into an accepted one of the *same or higher* rank; it can only
        // make acceptance easier, not harder, once a fit already cleared
        // goodness-of-fit thresholds on its own.
        let mut rng = StdRng::seed_from_u64(33);
        let dist = Normal::new(0.0, 1.0).unwrap();
        let values: Vec<f64> = (0..2000).map(|_| dist.sample(&mut rng)).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();

        let verified_on = ProfilerConfig { verification_enabled: true, ..ProfilerConfig::default() };
        let verified_off = ProfilerConfig { verification_enabled: false, ..ProfilerConfig::default() };

        let (_, with_verification) = AdaptiveExtractor::extract(0, &stats, &values, &verified_on, 7);
        let (_, without_verification) = AdaptiveExtractor::extract(0, &stats, &values, &verified_off, 7);

        let rank = |s: &Strategy| match s {
            Strategy::Parametric => 2,
            Strategy::CompositeOfK(_) => 1,
            Strategy::Empirical => 0,
        };
        assert!(rank(&with_verification.strategy) <= rank(&without_verification.strategy));
    }
}
