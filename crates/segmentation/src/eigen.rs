//! Closed-form eigen-analysis of 3x3 symmetric matrices.

use std::f64::consts::FRAC_PI_3;

/// Unit eigenvector for the smallest eigenvalue of the symmetric matrix
///
/// ```text
/// | a00  a01  a02 |
/// | a01  a11  a12 |
/// | a02  a12  a22 |
/// ```
///
/// Eigenvalues come from the trigonometric (Cardano) solution. Since
/// `A - λI` has rank <= 2 for an eigenvalue λ, the cross product of two of
/// its independent rows spans the null space; the largest of the three row
/// cross products is used.
///
/// Returns `None` when the matrix is (near) a multiple of the identity or the
/// smallest eigenvalue is repeated, i.e. when the direction is not unique.
pub(crate) fn smallest_eigenvector(
    a00: f64,
    a01: f64,
    a02: f64,
    a11: f64,
    a12: f64,
    a22: f64,
) -> Option<[f64; 3]> {
    let entries = [a00, a01, a02, a11, a12, a22];
    if !entries.iter().all(|v| v.is_finite()) {
        return None;
    }
    let scale = entries.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return None;
    }

    let m = (a00 + a11 + a22) / 3.0;
    let b00 = a00 - m;
    let b11 = a11 - m;
    let b22 = a22 - m;

    let off_diagonal = a01 * a01 + a02 * a02 + a12 * a12;
    let p = (b00 * b00 + b11 * b11 + b22 * b22 + 2.0 * off_diagonal) / 6.0;
    if p <= (f64::EPSILON * scale).powi(2) {
        return None;
    }

    let q = (b00 * (b11 * b22 - a12 * a12) - a01 * (a01 * b22 - a12 * a02)
        + a02 * (a01 * a12 - b11 * a02))
        / 2.0;

    let sqrt_p = p.sqrt();
    let ratio = (q / (p * sqrt_p)).clamp(-1.0, 1.0);
    let phi = ratio.acos() / 3.0;
    let lambda = m + 2.0 * sqrt_p * (phi + 2.0 * FRAC_PI_3).cos();

    let r0 = [a00 - lambda, a01, a02];
    let r1 = [a01, a11 - lambda, a12];
    let r2 = [a02, a12, a22 - lambda];

    let candidates = [cross(r0, r1), cross(r0, r2), cross(r1, r2)];
    let (best, len2) = candidates
        .iter()
        .map(|c| (*c, c[0] * c[0] + c[1] * c[1] + c[2] * c[2]))
        .fold(([0.0; 3], 0.0f64), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

    if !len2.is_finite() || len2 <= (1e-12 * scale * scale).powi(2) {
        return None;
    }

    let inv = 1.0 / len2.sqrt();
    Some([best[0] * inv, best[1] * inv, best[2] * inv])
}

#[inline]
pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
