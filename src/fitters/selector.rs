use super::{
    beta::BetaFitter, empirical::EmpiricalFitter, gamma::GammaFitter,
    inverse_gamma::InverseGammaFitter, normal::NormalFitter, pearson4::Pearson4Fitter,
    student_t::StudentTFitter, uniform::UniformFitter, Fitter,
};
use crate::moments::DimensionStatistics;
use crate::vector_space::FitResult;

/// A pre-declared, ordered set of fitters to try. Presets differ only in
/// which families are included; all run the same uniform KS scoring.
pub enum SelectorPreset {
    /// All eight families (excluding Empirical, which the adaptive
    /// extractor only reaches as a terminal fallback, not via the selector).
    Default,
    /// Families whose support is naturally bounded — skips Gamma,
    /// Inverse-Gamma, Student-t, Pearson-IV, which assume unbounded or
    /// one-sided support.
    BoundedData,
    /// Families from the Pearson distribution system: Normal, Beta, Gamma,
    /// Student-t, Pearson-IV.
    PearsonFamily,
}

pub struct BestFitSelector {
    fitters: Vec<Box<dyn Fitter + Send + Sync>>,
}

impl BestFitSelector {
    pub fn new(preset: SelectorPreset) -> Self {
        let fitters: Vec<Box<dyn Fitter + Send + Sync>> = match preset {
            SelectorPreset::Default => vec![
                Box::new(NormalFitter::new()),
                Box::new(UniformFitter),
                Box::new(BetaFitter),
                Box::new(GammaFitter),
                Box::new(InverseGammaFitter),
                Box::new(StudentTFitter),
                Box::new(Pearson4Fitter),
            ],
            SelectorPreset::BoundedData => vec![
                Box::new(NormalFitter::new()),
                Box::new(UniformFitter),
                Box::new(BetaFitter),
            ],
            SelectorPreset::PearsonFamily => vec![
                Box::new(NormalFitter::new()),
                Box::new(BetaFitter),
                Box::new(GammaFitter),
                Box::new(StudentTFitter),
                Box::new(Pearson4Fitter),
            ],
        };
        BestFitSelector { fitters }
    }

    /// Run every fitter in the preset and return the one with the lowest
    /// `goodness_of_fit`. Never fails: `EmpiricalFitter` is the guaranteed
    /// last-resort caller-side fallback, not part of this selection.
    pub fn best_fit(&self, stats: &DimensionStatistics, values: &[f64]) -> FitResult {
        self.fitters
            .iter()
            .map(|f| f.fit(stats, values))
            .min_by(|a, b| a.goodness_of_fit.partial_cmp(&b.goodness_of_fit).unwrap())
            .unwrap_or_else(|| EmpiricalFitter.fit(stats, values))
    }

    /// Run every fitter and report every score — used for the `AllFitsData`
    /// diagnostic table.
    pub fn all_fits(&self, stats: &DimensionStatistics, values: &[f64]) -> Vec<(String, f64)> {
        self.fitters
            .iter()
            .map(|f| {
                let result = f.fit(stats, values);
                (f.name().to_string(), result.goodness_of_fit)
            })
            .collect()
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
    fn best_fit_picks_normal_for_normal_data() {
        let mut rng = StdRng::seed_from_u64(99);
        let dist = Normal::new(5.0, 2.0).unwrap();
        let values: Vec<f64> = (0..10_000).map(|_| dist.sample(&mut rng)).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();

        let selector = BestFitSelector::new(SelectorPreset::Default);
        let result = selector.best_fit(&stats, &values);
        assert_eq!(result.model_type, "normal");
        assert!(result.goodness_of_fit < 0.03);
    }

    #[test]
    fn all_fits_reports_every_fitter() {
        let values: Vec<f64> = (0..500).map(|i| (i as f64) * 0.01).collect();
        let stats = MomentAccumulator::from_slice(0, &values).unwrap();
        let selector = BestFitSelector::new(SelectorPreset::Default);
        let all = selector.all_fits(&stats, &values);
        assert_eq!(all.len(), 7);
    }
}
