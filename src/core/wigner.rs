//! Angular-momentum coupling coefficients: factorials, Wigner 3-j symbols
//! and the Wigner small-d rotation matrix elements.
//!
//! All tables are process-wide constants computed at first use. Orders are
//! small (l <= 10) so plain f64 factorials are exact enough.

use std::sync::LazyLock;

static FACTORIALS: LazyLock<[f64; 35]> = LazyLock::new(|| {
    let mut f = [1.0; 35];
    for n in 1..35 {
        f[n] = f[n - 1] * n as f64;
    }
    f
});

#[inline]
pub(crate) fn factorial(n: i32) -> f64 {
    FACTORIALS[n as usize]
}

/// Wigner 3-j symbol (l l l; m1 m2 m3) for three equal integer momenta.
/// Zero unless m1+m2+m3 == 0 and every |m| <= l.
pub(crate) fn wigner_3j(l: i32, m1: i32, m2: i32, m3: i32) -> f64 {
    if m1 + m2 + m3 != 0 || m1.abs() > l || m2.abs() > l || m3.abs() > l {
        return 0.0;
    }
    // Racah formula specialised to j1 = j2 = j3 = l
    let delta = factorial(l).powi(3) / factorial(3 * l + 1);
    let norm = (delta
        * factorial(l + m1)
        * factorial(l - m1)
        * factorial(l + m2)
        * factorial(l - m2)
        * factorial(l + m3)
        * factorial(l - m3))
        .sqrt();
    let t_min = 0.max(-m1).max(m2);
    let t_max = l.min(l - m1).min(l + m2);
    let mut sum = 0.0;
    for t in t_min..=t_max {
        let denom = factorial(t)
            * factorial(t + m1)
            * factorial(t - m2)
            * factorial(l - t)
            * factorial(l - m1 - t)
            * factorial(l + m2 - t);
        sum += (-1.0f64).powi(t) / denom;
    }
    let phase = (-1.0f64).powi(m3);
    phase * norm * sum
}

/// Wigner small-d matrix element d^l_{mp,m}(beta).
pub(crate) fn wigner_small_d(l: i32, mp: i32, m: i32, beta: f64) -> f64 {
    let norm = (factorial(l + m)
        * factorial(l - m)
        * factorial(l + mp)
        * factorial(l - mp))
        .sqrt();
    let (c, s) = ((beta / 2.0).cos(), (beta / 2.0).sin());
    let k_min = 0.max(m - mp);
    let k_max = (l + m).min(l - mp);
    let mut sum = 0.0;
    for k in k_min..=k_max {
        let denom = factorial(l + m - k) * factorial(k) * factorial(l - mp - k)
            * factorial(mp - m + k);
        sum += (-1.0f64).powi(mp - m + k) * c.powi(2 * l + m - mp - 2 * k)
            * s.powi(mp - m + 2 * k)
            / denom;
    }
    norm * sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-12;

    #[test]
    fn threej_known_values() {
        // (2 2 2; 0 0 0) = -sqrt(2/35)
        assert!((wigner_3j(2, 0, 0, 0) + (2.0f64 / 35.0).sqrt()).abs() < TOL);
        assert!((wigner_3j(2, 1, -1, 0) - (1.0f64 / 70.0).sqrt()).abs() < TOL);
        assert!((wigner_3j(2, 2, -2, 0) - (2.0f64 / 35.0).sqrt()).abs() < TOL);
        assert!((wigner_3j(2, 2, -1, -1) + (3.0f64 / 35.0).sqrt()).abs() < TOL);
        // unbalanced m or out of range vanishes
        assert_eq!(wigner_3j(2, 2, 2, 2), 0.0);
        assert_eq!(wigner_3j(2, 3, -3, 0), 0.0);
    }

    #[test]
    fn threej_permutation_symmetry() {
        // Even l: invariant under any permutation and global sign flip
        let a = wigner_3j(4, 3, -1, -2);
        assert!((a - wigner_3j(4, -1, 3, -2)).abs() < TOL);
        assert!((a - wigner_3j(4, -2, -1, 3)).abs() < TOL);
        assert!((a - wigner_3j(4, -3, 1, 2)).abs() < TOL);
    }

    #[test]
    fn small_d_identity_and_halfturn() {
        for l in [0, 2, 6] {
            for mp in -l..=l {
                for m in -l..=l {
                    let expect = if m == mp { 1.0 } else { 0.0 };
                    assert!((wigner_small_d(l, mp, m, 0.0) - expect).abs() < TOL);
                    // d(pi) connects m and -m: |d^l_{mp,m}(pi)| = delta_{mp,-m}
                    let hp = wigner_small_d(l, mp, m, PI);
                    let expect = if mp == -m { 1.0 } else { 0.0 };
                    assert!((hp.abs() - expect).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn small_d_orthogonality() {
        let l = 6;
        let beta = 0.7;
        for m1 in -l..=l {
            for m2 in -l..=l {
                let dot: f64 = (-l..=l)
                    .map(|k| wigner_small_d(l, m1, k, beta) * wigner_small_d(l, m2, k, beta))
                    .sum();
                let expect = if m1 == m2 { 1.0 } else { 0.0 };
                assert!((dot - expect).abs() < 1e-9);
            }
        }
    }
}
