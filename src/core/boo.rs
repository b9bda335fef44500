use crate::core::{factorial, wigner_3j, wigner_small_d, Cplx, Vector3d};
use std::f64::consts::PI;
use std::sync::LazyLock;

/// Number of stored coefficients: (l, m) for even l in 0..=10, m in 0..=l.
pub const BOO_LEN: usize = 36;

/// Order of each stored coefficient.
pub const I2L: [usize; BOO_LEN] = [
    0, //
    2, 2, 2, //
    4, 4, 4, 4, 4, //
    6, 6, 6, 6, 6, 6, 6, //
    8, 8, 8, 8, 8, 8, 8, 8, 8, //
    10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10,
];

/// Degree of each stored coefficient.
pub const I2M: [usize; BOO_LEN] = [
    0, //
    0, 1, 2, //
    0, 1, 2, 3, 4, //
    0, 1, 2, 3, 4, 5, 6, //
    0, 1, 2, 3, 4, 5, 6, 7, 8, //
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10,
];

// Non-redundant Wigner 3-j values (l l l; m1 m2 m3), canonicalized by the
// sorted absolute values of the m's. Indexed by l-offset + offset of the
// largest |m| + the smallest |m|.
const W3J_L_OFFSET: [usize; 6] = [0, 1, 5, 14, 30, 55];
const W3J_M1_OFFSET: [usize; 11] = [0, 1, 2, 4, 6, 9, 12, 16, 20, 25, 30];

static W3J: LazyLock<[f64; 91]> = LazyLock::new(|| {
    let mut table = [0.0; 91];
    for l2 in 0..6usize {
        let l = 2 * l2;
        for big in 0..=l {
            for small in 0..=big / 2 {
                table[W3J_L_OFFSET[l2] + W3J_M1_OFFSET[big] + small] = wigner_3j(
                    l as i32,
                    big as i32,
                    -(small as i32),
                    small as i32 - big as i32,
                );
            }
        }
    }
    table
});

/// Wigner 3-j symbol (l l l; m1 m2 -m1-m2) from the static table.
/// Even l symbols are invariant under permutations and global sign flip,
/// so only the sorted absolute values matter.
pub fn w3j(l: usize, m1: i32, m2: i32) -> f64 {
    let mut m = [m1.unsigned_abs() as usize, m2.unsigned_abs() as usize, (m1 + m2).unsigned_abs() as usize];
    m.sort_unstable();
    W3J[W3J_L_OFFSET[l / 2] + W3J_M1_OFFSET[m[2]] + m[0]]
}

// Associated Legendre P_l^m(x) with the Condon-Shortley phase,
// by the standard stable recurrence over l at fixed m.
fn legendre_plm(l: usize, m: usize, x: f64) -> f64 {
    let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
    // P_m^m = (-1)^m (2m-1)!! (1-x^2)^{m/2}
    let mut pmm = 1.0;
    for k in 1..=m {
        pmm *= -((2 * k - 1) as f64) * somx2;
    }
    if l == m {
        return pmm;
    }
    // P_{m+1}^m = x (2m+1) P_m^m
    let mut pm1 = x * (2 * m + 1) as f64 * pmm;
    if l == m + 1 {
        return pm1;
    }
    let mut plm = 0.0;
    for ll in (m + 2)..=l {
        plm = (x * (2 * ll - 1) as f64 * pm1 - (ll + m - 1) as f64 * pmm) / (ll - m) as f64;
        pmm = pm1;
        pm1 = plm;
    }
    plm
}

/// Spherical harmonic Y_lm(theta, phi), Condon-Shortley convention, m >= 0.
pub fn sph_harm(l: usize, m: usize, theta: f64, phi: f64) -> Cplx {
    let norm = ((2 * l + 1) as f64 / (4.0 * PI) * factorial((l - m) as i32)
        / factorial((l + m) as i32))
        .sqrt();
    let plm = legendre_plm(l, m, theta.cos());
    Cplx::from_polar(1.0, m as f64 * phi) * norm * plm
}

/// Bond-orientational-order data: coefficients q_lm of the local symmetry
/// on the spherical harmonics base, for even l in 0..=10 and m in 0..=l.
/// Negative m coefficients are implicit via q_{l,-m} = (-1)^m conj(q_{l,m}).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BooData(pub [Cplx; BOO_LEN]);

impl Default for BooData {
    fn default() -> Self {
        Self([Cplx::new(0.0, 0.0); BOO_LEN])
    }
}

#[inline]
fn storage_index(l: usize, m: usize) -> usize {
    m + l * l / 4
}

impl BooData {
    /// Spherical harmonics of a single bond vector.
    pub fn from_bond(rij: &Vector3d) -> Self {
        let r = rij.norm();
        let theta = if r == 0.0 { 0.0 } else { (rij.z / r).acos() };
        let phi = rij.y.atan2(rij.x);
        let mut ret = Self::default();
        for i in 0..BOO_LEN {
            ret.0[i] = sph_harm(I2L[i], I2M[i], theta, phi);
        }
        ret
    }

    /// Coefficient q_lm for any -l <= m <= l.
    #[inline]
    pub fn at(&self, l: usize, m: i32) -> Cplx {
        if m < 0 {
            let v = self.0[storage_index(l, (-m) as usize)].conj();
            if m % 2 == 0 {
                v
            } else {
                -v
            }
        } else {
            self.0[storage_index(l, m as usize)]
        }
    }

    /// Stored (m >= 0) coefficient.
    #[inline]
    pub fn get(&self, l: usize, m: usize) -> Cplx {
        self.0[storage_index(l, m)]
    }

    #[inline]
    pub fn set(&mut self, l: usize, m: usize, v: Cplx) {
        self.0[storage_index(l, m)] = v;
    }

    /// Sum of |q_lm|^2 over all m in -l..=l.
    pub fn sum_norm2(&self, l: usize) -> f64 {
        let base = storage_index(l, 0);
        let mut s = self.0[base].norm_sqr();
        for m in 1..=l {
            s += 2.0 * self.0[base + m].norm_sqr();
        }
        s
    }

    /// Rotational invariant Q_l = sqrt(4 pi / (2l+1) * sum |q_lm|^2).
    pub fn ql(&self, l: usize) -> f64 {
        (4.0 * PI / (2 * l + 1) as f64 * self.sum_norm2(l)).sqrt()
    }

    /// Third-order rotational invariant W_l, un-normalized.
    pub fn wl(&self, l: usize) -> Cplx {
        let li = l as i32;
        let mut sum = Cplx::new(0.0, 0.0);
        for m1 in -li..=li {
            for m2 in -li..=li {
                let m3 = -m1 - m2;
                if m3.abs() <= li {
                    sum += w3j(l, m1, m2) * self.at(l, m1) * self.at(l, m2) * self.at(l, m3);
                }
            }
        }
        sum
    }

    /// The invariant pair (Q_l, w_l) where w_l is the real part of W_l
    /// normalized by (sum |q_lm|^2)^{3/2}. A zero descriptor yields zeros.
    pub fn invariants(&self, l: usize) -> (f64, f64) {
        let s = self.sum_norm2(l);
        if 1.0 + s * s == 1.0 {
            return (0.0, 0.0);
        }
        let q = (4.0 * PI / (2 * l + 1) as f64 * s).sqrt();
        let w = self.wl(l).re / s.powf(1.5);
        (q, w)
    }

    /// Half-turn rotation of the descriptor about the given axis,
    /// via the Wigner D-matrix for angle pi.
    pub fn rotate_by_pi(&self, axis: &Vector3d) -> Self {
        let r = axis.norm();
        let theta = if r == 0.0 { 0.0 } else { (axis.z / r).acos() };
        let phi = axis.y.atan2(axis.x);
        let mut ret = Self::default();
        for &l in &[0usize, 2, 4, 6, 8, 10] {
            let li = l as i32;
            // D_{m m'} = sum_k e^{-i m phi} d_{m k} (-1)^k d_{m' k} e^{i m' phi}
            for m in 0..=li {
                let mut q = Cplx::new(0.0, 0.0);
                for mp in -li..=li {
                    let mut d = 0.0;
                    for k in -li..=li {
                        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                        d += wigner_small_d(li, m, k, theta)
                            * sign
                            * wigner_small_d(li, mp, k, theta);
                    }
                    let phase = Cplx::from_polar(1.0, (mp - m) as f64 * phi);
                    q += phase * d * self.at(l, mp);
                }
                ret.set(l, m as usize, q);
            }
        }
        ret
    }
}

impl std::ops::AddAssign<&BooData> for BooData {
    fn add_assign(&mut self, rhs: &BooData) {
        for i in 0..BOO_LEN {
            self.0[i] += rhs.0[i];
        }
    }
}

impl std::ops::Add for BooData {
    type Output = BooData;
    fn add(mut self, rhs: BooData) -> BooData {
        self += &rhs;
        self
    }
}

impl std::ops::DivAssign<f64> for BooData {
    fn div_assign(&mut self, rhs: f64) {
        for c in self.0.iter_mut() {
            *c /= rhs;
        }
    }
}
