//! Output contract types: [`FitResult`], [`DimensionStrategy`], the final
//! [`VectorSpaceModel`], and the diagnostic [`AllFitsData`] table.

use crate::error::ProfileError;
use crate::models::DimensionModel;
use serde::{Deserialize, Serialize};

/// Result of a single fitter run: the fitted model, its goodness-of-fit
/// (lower is better; the KS D-statistic unless the fitter is documented to
/// use a surrogate — see the Empirical fitter), and a stable type tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: DimensionModel,
    pub goodness_of_fit: f64,
    pub model_type: String,
}

impl FitResult {
    pub fn new(model: DimensionModel, goodness_of_fit: f64) -> Self {
        let model_type = model.model_type();
        FitResult { model, goodness_of_fit, model_type }
    }
}

/// Which extraction strategy a dimension ultimately settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Parametric,
    CompositeOfK(u8),
    Empirical,
}

/// The adaptive extractor's verdict for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionStrategy {
    pub dimension: usize,
    pub strategy: Strategy,
    pub final_ks: f64,
    pub explanatory_text: String,
}

/// Every fitter's KS (or surrogate) score for a dimension, kept purely for
/// diagnostics — never consulted by the selector itself beyond the winning
/// entry already recorded in [`FitResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllFitsData {
    pub dimension: usize,
    pub scores: Vec<(String, f64)>,
}

/// The final output: one model per dimension plus the target unique-vector
/// count used by downstream generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSpaceModel {
    pub unique_vectors_target: u64,
    pub components: Vec<DimensionModel>,
}

impl VectorSpaceModel {
    pub fn dimensions(&self) -> usize {
        self.components.len()
    }

    /// Serialize to a pretty-printed JSON document, the interchange format
    /// for the output contract.
    pub fn to_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a model previously produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }
}
