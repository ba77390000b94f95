//! Per-dimension moment accumulation: online (extended Welford) and
//! two-pass variants, plus the algebraic parallel combine operator.

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Immutable per-dimension summary produced by a [`MomentAccumulator`] or by
/// combining two such summaries for the same dimension.
///
/// Invariants: `count >= 0`; `min <= mean <= max` when `count > 0`;
/// `variance >= 0`; if `variance == 0` then `skewness == 0` and
/// `kurtosis == 3.0` by convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionStatistics {
    pub dimension: usize,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub variance: f64,
    pub skewness: f64,
    /// Raw kurtosis; 3.0 is the Normal baseline (not excess kurtosis).
    pub kurtosis: f64,
}

impl DimensionStatistics {
    /// Standard deviation, derived lazily from variance.
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Excess kurtosis (kurtosis - 3), the form most fitters reason about.
    pub fn excess_kurtosis(&self) -> f64 {
        self.kurtosis - 3.0
    }
}

/// Raw moment state shared by the online and two-pass accumulators. `m2`,
/// `m3`, `m4` are sums of powers of deviations from the running mean, not
/// yet divided by `count`.
#[derive(Debug, Clone, Copy)]
struct MomentState {
    dimension: usize,
    count: u64,
    min: f64,
    max: f64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl MomentState {
    fn empty(dimension: usize) -> Self {
        MomentState {
            dimension,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            m2: 0.0,
            m3: 0.0,
            m4: 0.0,
        }
    }

    /// Extended Welford online update. Order matters: M4, then M3, then M2,
    /// then the mean, each computed from the pre-update values of the others.
    fn push(&mut self, x: f64) {
        let n = self.count;
        let n_new = n + 1;
        let delta = x - self.mean;
        let delta_n = delta / n_new as f64;
        let delta_n2 = delta_n * delta_n;
        let t = delta * delta_n * n as f64;

        self.m4 += t * delta_n2 * ((n_new * n_new) as f64 - 3.0 * n_new as f64 + 3.0)
            + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += t * delta_n * (n_new as f64 - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += t;
        self.mean += delta_n;

        self.count = n_new;
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    fn finalize(&self) -> DimensionStatistics {
        if self.count == 0 {
            return DimensionStatistics {
                dimension: self.dimension,
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                variance: 0.0,
                skewness: 0.0,
                kurtosis: 3.0,
            };
        }
        let n = self.count as f64;
        let variance = self.m2 / n;
        let sigma = variance.sqrt();
        let (skewness, kurtosis) = if sigma == 0.0 {
            (0.0, 3.0)
        } else {
            ((self.m3 / n) / sigma.powi(3), (self.m4 / n) / variance.powi(2))
        };
        DimensionStatistics {
            dimension: self.dimension,
            count: self.count,
            min: self.min,
            max: self.max,
            mean: self.mean,
            variance,
            skewness,
            kurtosis,
        }
    }

    /// Chan/Pébay parallel combine for two non-empty states of the same
    /// dimension. Associative and commutative up to floating-point rounding.
    fn combine(a: &MomentState, b: &MomentState) -> MomentState {
        assert_eq!(
            a.dimension, b.dimension,
            "cannot combine moment states of different dimensions"
        );
        if a.count == 0 {
            return *b;
        }
        if b.count == 0 {
            return *a;
        }

        let na = a.count as f64;
        let nb = b.count as f64;
        let n = na + nb;
        let delta = b.mean - a.mean;

        let mean = a.mean + delta * nb / n;
        let m2 = a.m2 + b.m2 + delta * delta * na * nb / n;
        let m3 = a.m3
            + b.m3
            + delta.powi(3) * na * nb * (na - nb) / n.powi(2)
            + 3.0 * delta * (na * b.m2 - nb * a.m2) / n;
        let m4 = a.m4
            + b.m4
            + delta.powi(4) * na * nb * (na * na - na * nb + nb * nb) / n.powi(3)
            + 6.0 * delta * delta * (na * na * b.m2 + nb * nb * a.m2) / n.powi(2)
            + 4.0 * delta * (na * b.m3 - nb * a.m3) / n;

        MomentState {
            dimension: a.dimension,
            count: a.count + b.count,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
            mean,
            m2,
            m3,
            m4,
        }
    }
}

/// Online moment accumulator for a single dimension, guarded by a mutex so
/// concurrent producers can feed the same accumulator. Batch/thread-confined
/// accumulators should instead be merged via [`MomentAccumulator::combine`].
pub struct MomentAccumulator {
    state: Mutex<MomentState>,
}

impl MomentAccumulator {
    pub fn new(dimension: usize) -> Self {
        MomentAccumulator {
            state: Mutex::new(MomentState::empty(dimension)),
        }
    }

    /// Feed a single observed value for this dimension.
    pub fn push(&self, x: f64) {
        self.state.lock().unwrap().push(x);
    }

    /// Feed a slice of observed values for this dimension.
    pub fn push_all(&self, xs: &[f64]) {
        let mut state = self.state.lock().unwrap();
        for &x in xs {
            state.push(x);
        }
    }

    pub fn finalize(&self) -> DimensionStatistics {
        self.state.lock().unwrap().finalize()
    }

    /// Two-pass closed-form accumulation over a complete in-memory slice.
    /// Pass 1 computes min/max/mean; pass 2 computes M2/M3/M4.
    pub fn from_slice(dimension: usize, values: &[f64]) -> Result<DimensionStatistics, ProfileError> {
        if values.is_empty() {
            return Err(ProfileError::InvalidInput(format!(
                "dimension {dimension} has zero observations"
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ProfileError::InvalidInput(format!(
                "dimension {dimension} contains non-finite values"
            )));
        }

        let n = values.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &x in values {
            min = min.min(x);
            max = max.max(x);
            sum += x;
        }
        let mean = sum / n;

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &x in values {
            let d = x - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }

        let state = MomentState {
            dimension,
            count: values.len() as u64,
            min,
            max,
            mean,
            m2,
            m3,
            m4,
        };
        Ok(state.finalize())
    }

    /// Merge two per-dimension summaries. Only valid for the same dimension
    /// index; summaries for different dimensions must never be combined.
    pub fn combine(a: &DimensionStatistics, b: &DimensionStatistics) -> DimensionStatistics {
        assert_eq!(
            a.dimension, b.dimension,
            "combine requires matching dimension indices"
        );
        if a.count == 0 {
            return *b;
        }
        if b.count == 0 {
            return *a;
        }

        let na = a.count as f64;
        let nb = b.count as f64;
        let n = na + nb;
        let delta = b.mean - a.mean;

        let mean = a.mean + delta * nb / n;

        // Reconstruct raw M2/M3/M4 from the finalized (divided) moments to
        // run the same combine algebra as the online state.
        let a_m2 = a.variance * na;
        let b_m2 = b.variance * nb;
        let a_sigma = a.variance.sqrt();
        let b_sigma = b.variance.sqrt();
        let a_m3 = a.skewness * a_sigma.powi(3) * na;
        let b_m3 = b.skewness * b_sigma.powi(3) * nb;
        let a_m4 = a.kurtosis * a.variance.powi(2) * na;
        let b_m4 = b.kurtosis * b.variance.powi(2) * nb;

        let m2 = a_m2 + b_m2 + delta * delta * na * nb / n;
        let m3 = a_m3
            + b_m3
            + delta.powi(3) * na * nb * (na - nb) / n.powi(2)
            + 3.0 * delta * (na * b_m2 - nb * a_m2) / n;
        let m4 = a_m4
            + b_m4
            + delta.powi(4) * na * nb * (na * na - na * nb + nb * nb) / n.powi(3)
            + 6.0 * delta * delta * (na * na * b_m2 + nb * nb * a_m2) / n.powi(2)
            + 4.0 * delta * (na * b_m3 - nb * a_m3) / n;

        let count = a.count + b.count;
        let variance = m2 / n;
        let sigma = variance.sqrt();
        let (skewness, kurtosis) = if sigma == 0.0 {
            (0.0, 3.0)
        } else {
            ((m3 / n) / sigma.powi(3), (m4 / n) / variance.powi(2))
        };

        DimensionStatistics {
            dimension: a.dimension,
            count,
            min: a.min.min(b.min),
            max: a.max.max(b.max),
            mean,
            variance,
            skewness,
            kurtosis,
        }
    }
}
