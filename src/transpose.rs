//! Cache-blocked row-major <-> column-major transpose, and K-wide interleave
//! for SIMD-style batch processing.

use crate::error::ProfileError;

/// Tile width chosen so that `B^2 * 8` bytes (f64 tile) fits comfortably in
/// a typical 256KB-1MB L2 cache.
pub const DEFAULT_TILE: usize = 256;

/// Transpose a `V x D` row-major matrix (`data[v * d_count + d]`) into a
/// `D x V` column-major layout (`out[d * v_count + v]`), processing in
/// `tile x tile` blocks for cache locality.
///
/// `data.len()` must equal `v_count * d_count`.
pub fn transpose_blocked(
    data: &[f64],
    v_count: usize,
    d_count: usize,
    tile: usize,
) -> Result<Vec<f64>, ProfileError> {
    if data.len() != v_count * d_count {
        return Err(ProfileError::InvalidInput(format!(
            "matrix has {} elements, expected v_count*d_count = {}",
            data.len(),
            v_count * d_count
        )));
    }
    let tile = tile.max(1);
    let mut out = vec![0.0; v_count * d_count];

    let mut v0 = 0;
    while v0 < v_count {
        let v1 = (v0 + tile).min(v_count);
        let mut d0 = 0;
        while d0 < d_count {
            let d1 = (d0 + tile).min(d_count);
            for v in v0..v1 {
                for d in d0..d1 {
                    out[d * v_count + v] = data[v * d_count + d];
                }
            }
            d0 = d1;
        }
        v0 = v1;
    }
    Ok(out)
}

/// View the value at `(v, d)` in a column-major `D x V` buffer.
pub fn column_major_get(columns: &[f64], v_count: usize, v: usize, d: usize) -> f64 {
    columns[d * v_count + v]
}

/// Build the interleaved buffer for a SIMD batch of `lanes` dimensions
/// starting at `start_dim`: `buf[v * lanes + k] = columns[start_dim + k][v]`.
/// Lanes beyond the available dimension count (trailing padding) are
/// filled with 0.0; the caller must not interpret those lanes' results.
pub fn interleave(
    columns: &[f64],
    v_count: usize,
    d_count: usize,
    start_dim: usize,
    lanes: usize,
) -> Vec<f64> {
    let mut buf = vec![0.0; v_count * lanes];
    for k in 0..lanes {
        let d = start_dim + k;
        if d >= d_count {
            continue;
        }
        let col = &columns[d * v_count..(d + 1) * v_count];
        for v in 0..v_count {
            buf[v * lanes + k] = col[v];
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_round_trip_is_exact() {
        // P6: transposing twice returns the original matrix exactly.
        let v_count = 37;
        let d_count = 11;
        let data: Vec<f64> = (0..v_count * d_count).map(|i| i as f64 * 1.5).collect();

        let columns = transpose_blocked(&data, v_count, d_count, 8).unwrap();
        let back = transpose_blocked(&columns, d_count, v_count, 8).unwrap();

        assert_eq!(back, data);
    }

    #[test]
    fn transpose_places_elements_correctly() {
        let v_count = 4;
        let d_count = 3;
        let data: Vec<f64> = (0..v_count * d_count).map(|i| i as f64).collect();
        let columns = transpose_blocked(&data, v_count, d_count, DEFAULT_TILE).unwrap();
        for v in 0..v_count {
            for d in 0..d_count {
                assert_eq!(column_major_get(&columns, v_count, v, d), data[v * d_count + d]);
            }
        }
    }

    #[test]
    fn interleave_pads_trailing_lanes_with_zero() {
        let v_count = 5;
        let d_count = 6;
        let data: Vec<f64> = (0..v_count * d_count).map(|i| i as f64).collect();
        let columns = transpose_blocked(&data, v_count, d_count, DEFAULT_TILE).unwrap();

        let buf = interleave(&columns, v_count, d_count, 4, 4);
        // dims 4 and 5 are real, lanes 2 and 3 (dims 6, 7) don't exist: padded.
        for v in 0..v_count {
            assert_eq!(buf[v * 4 + 2], 0.0);
            assert_eq!(buf[v * 4 + 3], 0.0);
            assert_eq!(buf[v * 4 + 0], column_major_get(&columns, v_count, v, 4));
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let err = transpose_blocked(&[1.0, 2.0, 3.0], 2, 2, 8).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidInput(_)));
    }
}
