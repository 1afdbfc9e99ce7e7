//! Small fixed-size linear algebra helpers for grid and transform math.

/// Returns the `D x D` identity matrix.
pub(crate) fn identity<const D: usize>() -> [[f64; D]; D] {
    let mut m = [[0.0; D]; D];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

/// Computes `m * v`.
pub(crate) fn mat_vec<const D: usize>(m: &[[f64; D]; D], v: &[f64; D]) -> [f64; D] {
    let mut out = [0.0; D];
    for (o, row) in out.iter_mut().zip(m.iter()) {
        *o = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
    }
    out
}

/// Computes `a * b`.
#[cfg(test)]
pub(crate) fn mat_mul<const D: usize>(a: &[[f64; D]; D], b: &[[f64; D]; D]) -> [[f64; D]; D] {
    let mut out = [[0.0; D]; D];
    for i in 0..D {
        for j in 0..D {
            out[i][j] = (0..D).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Inverts a square matrix with Gauss-Jordan elimination and partial pivoting.
///
/// Returns `None` when a pivot vanishes relative to the matrix scale.
pub(crate) fn invert<const D: usize>(m: &[[f64; D]; D]) -> Option<[[f64; D]; D]> {
    let scale = m
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }

    let mut a = *m;
    let mut inv = identity::<D>();
    for col in 0..D {
        let pivot = (col..D).max_by(|&r0, &r1| a[r0][col].abs().total_cmp(&a[r1][col].abs()))?;
        if a[pivot][col].abs() <= scale * 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let p = a[col][col];
        for j in 0..D {
            a[col][j] /= p;
            inv[col][j] /= p;
        }
        for row in 0..D {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..D {
                a[row][j] -= factor * a[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }
    Some(inv)
}

/// Component-wise `a + b`.
pub(crate) fn add<const D: usize>(a: &[f64; D], b: &[f64; D]) -> [f64; D] {
    std::array::from_fn(|i| a[i] + b[i])
}

/// Component-wise `a - b`.
pub(crate) fn sub<const D: usize>(a: &[f64; D], b: &[f64; D]) -> [f64; D] {
    std::array::from_fn(|i| a[i] - b[i])
}

/// Smallest integer `>= n` whose only prime factors are 2, 3 and 5.
pub(crate) fn next_smooth_size(n: usize) -> usize {
    let mut candidate = n.max(1);
    loop {
        let mut rest = candidate;
        for p in [2, 3, 5] {
            while rest % p == 0 {
                rest /= p;
            }
        }
        if rest == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{identity, invert, mat_mul, mat_vec, next_smooth_size};

    #[test]
    fn invert_recovers_identity() {
        let m = [[0.0, 2.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.5, 4.0]];
        let inv = invert(&m).unwrap();
        let prod = mat_mul(&m, &inv);
        let id = identity::<3>();
        for i in 0..3 {
            for j in 0..3 {
                assert!((prod[i][j] - id[i][j]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn invert_rejects_singular() {
        assert!(invert(&[[1.0, 2.0], [2.0, 4.0]]).is_none());
        assert!(invert(&[[0.0, 0.0], [0.0, 0.0]]).is_none());
    }

    #[test]
    fn mat_vec_rotates_axis() {
        let rot = [[0.0, -1.0], [1.0, 0.0]];
        let v = mat_vec(&rot, &[1.0, 0.0]);
        assert!((v[0]).abs() < 1e-12);
        assert!((v[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn next_smooth_size_skips_large_primes() {
        assert_eq!(next_smooth_size(1), 1);
        assert_eq!(next_smooth_size(7), 8);
        assert_eq!(next_smooth_size(2047), 2048);
        assert_eq!(next_smooth_size(121), 125);
        assert_eq!(next_smooth_size(60), 60);
    }
}
