pub mod batch_moments;
pub mod composite_fitter;
pub mod config;
pub mod diagnostics;
pub mod em;
pub mod equivalence;
pub mod error;
pub mod extractor;
pub mod fitters;
pub mod models;
pub mod moments;
pub mod orchestrator;
pub mod transpose;
pub mod vector_space;
pub mod verifier;

pub use composite_fitter::CompositeFitter;
pub use config::{ProfilerConfig, VerificationLevel};
pub use diagnostics::Diagnostics;
pub use equivalence::{EquivalenceChecker, EquivalenceVerdict};
pub use error::ProfileError;
pub use extractor::AdaptiveExtractor;
pub use fitters::{ks_statistic, BestFitSelector};
pub use models::{CompositeScalarModel, DimensionModel, Moments, ScalarModel};
pub use moments::{DimensionStatistics, MomentAccumulator};
pub use orchestrator::{OrchestratorOutput, OrchestratorState, ParallelOrchestrator, ProgressHandle};
pub use vector_space::{AllFitsData, DimensionStrategy, FitResult, Strategy, VectorSpaceModel};
pub use verifier::{InternalVerifier, VerificationResult};
