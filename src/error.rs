use thiserror::Error;

/// Error types raised by the core profiling pipeline.
///
/// Per the error design: fitter inapplicability and internal-verification
/// failure are *not* represented here. A fitter signals "doesn't apply" by
/// returning a poor KS score or a sentinel parametrization, and the adaptive
/// extractor reacts to verification failure by escalating to the next
/// strategy. Only genuinely unrecoverable conditions surface as `ProfileError`.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Empty matrix, ragged rows, a zero-length dimension, or non-finite
    /// values that leave a fitter in an undefined state.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A division-by-zero or log(0) occurred outside a guarded codepath.
    /// Should be internally unreachable; if this surfaces, it is a bug.
    #[error("Numerical breakdown: {0}")]
    NumericalBreakdown(String),

    /// The orchestrator observed a cancellation request; partial results
    /// were discarded.
    #[error("Extraction cancelled")]
    CancelledExtraction,

    /// Wrapper for JSON (de)serialization failures in the ambient
    /// serialization helpers.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
