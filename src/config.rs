/// How many samples the internal verifier draws from a candidate model
/// before refitting and measuring parameter drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationLevel {
    Fast,
    Balanced,
    Thorough,
}

impl VerificationLevel {
    pub fn sample_count(self) -> usize {
        match self {
            VerificationLevel::Fast => 500,
            VerificationLevel::Balanced => 1000,
            VerificationLevel::Thorough => 5000,
        }
    }
}

/// Immutable configuration for the profiling pipeline.
///
/// Constructed explicitly (via [`ProfilerConfig::default`] and field updates)
/// rather than through a mutable builder: per the re-architecture notes, a
/// builder buys nothing here since every field has a sane default and
/// callers that need to override one just do so on the struct literal.
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Dimensions handed to a single worker task at a time.
    pub batch_size: usize,
    /// Lanes per SIMD-style batch (platform-native; 8 is the primary path).
    pub simd_lanes: usize,
    /// Number of worker threads in the pool. `None` means rayon's default
    /// (logical-CPU sized).
    pub worker_threads: Option<usize>,
    /// Attempt NUMA-aware per-node partitioning when a topology is probed.
    pub numa_enabled: bool,
    /// KS threshold below which a parametric fit is accepted outright.
    pub ks_parametric: f64,
    /// KS threshold below which a composite fit is accepted.
    pub ks_composite: f64,
    /// Upper bound on composite mixture components tried.
    pub max_composite_k: usize,
    /// Sample count used by the internal verifier.
    pub verification_level: VerificationLevel,
    /// Whether the internal verifier runs at all.
    pub verification_enabled: bool,
    /// Max allowed relative parameter drift for the internal verifier to pass.
    pub drift_threshold: f64,
    /// CDF-sampling tolerance used by Normal<->Beta and Composite<->Simple
    /// equivalence rules.
    pub equivalence_threshold: f64,
    /// EM iteration cap.
    pub em_max_iterations: usize,
    /// EM log-likelihood delta convergence threshold.
    pub em_convergence: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        ProfilerConfig {
            batch_size: 64,
            simd_lanes: 8,
            worker_threads: None,
            numa_enabled: true,
            ks_parametric: 0.03,
            ks_composite: 0.05,
            max_composite_k: 10,
            verification_level: VerificationLevel::Balanced,
            verification_enabled: true,
            drift_threshold: 0.005,
            equivalence_threshold: 0.08,
            em_max_iterations: 50,
            em_convergence: 1e-6,
        }
    }
}
