pub mod composite;
pub mod scalar;

pub use composite::CompositeScalarModel;
use rand::Rng;
use serde::{Deserialize, Serialize};
pub use scalar::{Moments, ScalarModel};

/// The per-dimension model actually emitted by the pipeline: either a single
/// parametric/empirical [`ScalarModel`], or a [`CompositeScalarModel`]
/// mixture. This is the `ScalarModel[D]` slot referred to by
/// `VectorSpaceModel` in the data model — a dimension's chosen model is one
/// or the other, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DimensionModel {
    Simple(ScalarModel),
    Composite(CompositeScalarModel),
}

impl DimensionModel {
    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            DimensionModel::Simple(m) => m.pdf(x),
            DimensionModel::Composite(m) => m.pdf(x),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            DimensionModel::Simple(m) => m.cdf(x),
            DimensionModel::Composite(m) => m.cdf(x),
        }
    }

    pub fn quantile(&self, u: f64) -> f64 {
        match self {
            DimensionModel::Simple(m) => m.quantile(u),
            DimensionModel::Composite(m) => m.quantile(u),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            DimensionModel::Simple(m) => m.sample(rng),
            DimensionModel::Composite(m) => m.sample(rng),
        }
    }

    pub fn moments(&self) -> Moments {
        match self {
            DimensionModel::Simple(m) => m.moments(),
            DimensionModel::Composite(m) => m.moments(),
        }
    }

    pub fn model_type(&self) -> String {
        match self {
            DimensionModel::Simple(m) => m.model_type().to_string(),
            DimensionModel::Composite(m) => format!("composite_{}", m.k()),
        }
    }

    /// `Some(_)` when this is a [`DimensionModel::Simple`], or a
    /// [`DimensionModel::Composite`] with exactly one component.
    pub fn as_simple(&self) -> Option<&ScalarModel> {
        match self {
            DimensionModel::Simple(m) => Some(m),
            DimensionModel::Composite(m) => m.as_simple(),
        }
    }
}
