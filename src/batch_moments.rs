//! Lane-parallel batch moment computation over an interleaved buffer.
//!
//! The pack contains no portable-SIMD dependency (no `std::simd` / `wide` /
//! `packed_simd` usage anywhere in the grounding examples), and `std::simd`
//! is nightly-only. "SIMD-batched" is therefore expressed as K independent
//! scalar accumulators advanced together one interleaved record at a time —
//! the auto-vectorizer turns this into real SIMD on a capable target, and
//! the numeric result is identical (modulo FP rounding) to running the
//! scalar per-dimension accumulator K times.

use crate::error::ProfileError;
use crate::moments::DimensionStatistics;

/// Compute `K = start_dims.len()` independent [`DimensionStatistics`] from an
/// interleaved buffer `buf[v * lanes + k] = data[v][start_dim + k]` laid out
/// by [`crate::transpose::interleave`].
///
/// `v_count` is the number of vectors (rows); `lanes` is the buffer's lane
/// width (padding lanes beyond the real dimension count are still computed
/// but the caller should discard them).
pub fn batch_moments(
    start_dim: usize,
    lanes: usize,
    v_count: usize,
    buf: &[f64],
) -> Result<Vec<DimensionStatistics>, ProfileError> {
    if buf.len() != lanes * v_count {
        return Err(ProfileError::InvalidInput(format!(
            "interleaved buffer has {} elements, expected lanes*v_count = {}",
            buf.len(),
            lanes * v_count
        )));
    }
    if v_count == 0 {
        return Err(ProfileError::InvalidInput(
            "batch_moments requires at least one vector".to_string(),
        ));
    }

    // Pass 1: K-lane min/max/sum.
    let mut min = vec![f64::INFINITY; lanes];
    let mut max = vec![f64::NEG_INFINITY; lanes];
    let mut sum = vec![0.0; lanes];
    for v in 0..v_count {
        let row = &buf[v * lanes..(v + 1) * lanes];
        for k in 0..lanes {
            let x = row[k];
            min[k] = min[k].min(x);
            max[k] = max[k].max(x);
            sum[k] += x;
        }
    }
    let mean: Vec<f64> = sum.iter().map(|s| s / v_count as f64).collect();

    // Pass 2: K-lane M2/M3/M4 via (x - mean)^2 accumulation.
    let mut m2 = vec![0.0; lanes];
    let mut m3 = vec![0.0; lanes];
    let mut m4 = vec![0.0; lanes];
    for v in 0..v_count {
        let row = &buf[v * lanes..(v + 1) * lanes];
        for k in 0..lanes {
            let d = row[k] - mean[k];
            let d2 = d * d;
            m2[k] += d2;
            m3[k] += d2 * d;
            m4[k] += d2 * d2;
        }
    }

    let n = v_count as f64;
    let mut out = Vec::with_capacity(lanes);
    for k in 0..lanes {
        let variance = m2[k] / n;
        let sigma = variance.sqrt();
        let (skewness, kurtosis) = if sigma == 0.0 {
            (0.0, 3.0)
        } else {
            ((m3[k] / n) / sigma.powi(3), (m4[k] / n) / variance.powi(2))
        };
        out.push(DimensionStatistics {
            dimension: start_dim + k,
            count: v_count as u64,
            min: min[k],
            max: max[k],
            mean: mean[k],
            variance,
            skewness,
            kurtosis,
        });
    }
    Ok(out)
}

/// Scalar fallback used for a final, not-full-width batch of dimensions
/// (trailing dimensions beyond the last full lane group).
pub fn scalar_moments(
    start_dim: usize,
    columns: &[&[f64]],
) -> Result<Vec<DimensionStatistics>, ProfileError> {
    columns
        .iter()
        .enumerate()
        .map(|(k, values)| crate::moments::MomentAccumulator::from_slice(start_dim + k, values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::MomentAccumulator;

    #[test]
    fn batch_matches_scalar_accumulator_per_lane() {
        // P5: SIMD vs scalar equivalence.
        let lanes = 4;
        let v_count = 500;
        let mut columns: Vec<Vec<f64>> = (0..lanes)
            .map(|k| {
                (0..v_count)
                    .map(|v| ((v as f64) * (0.01 + k as f64 * 0.003)).sin() * (1.0 + k as f64))
                    .collect()
            })
            .collect();
        // Make one lane have nontrivial skew/kurtosis via a shift.
        for (v, value) in columns[2].iter_mut().enumerate() {
            *value += (v % 13) as f64 * 0.05;
        }

        let mut buf = vec![0.0; lanes * v_count];
        for v in 0..v_count {
            for k in 0..lanes {
                buf[v * lanes + k] = columns[k][v];
            }
        }

        let batch = batch_moments(10, lanes, v_count, &buf).unwrap();
        for k in 0..lanes {
            let scalar = MomentAccumulator::from_slice(10 + k, &columns[k]).unwrap();
            assert_eq!(batch[k].dimension, 10 + k);
            let rel = |a: f64, b: f64| (a - b).abs() / b.abs().max(1e-9);
            assert!(rel(batch[k].mean, scalar.mean) < 1e-10);
            assert!(rel(batch[k].variance, scalar.variance) < 1e-8);
        }
    }

    #[test]
    fn rejects_mismatched_buffer_length() {
        let err = batch_moments(0, 4, 10, &[0.0; 39]).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidInput(_)));
    }
}
