//! Raw, central and normalized central moments and Hu invariants of a binary mask
//!
//! All indices are zero-based with `i` the row and `j` the column. `p` is
//! always the power of the row term and `q` the power of the column term:
//!
//! - `M_pq = Σ i^p · j^q · f(i,j)`
//! - `μ_pq = Σ (i-ȳ)^p · (j-x̄)^q · f(i,j)` with `x̄ = Σj/M00`, `ȳ = Σi/M00`
//! - `η_pq = μ_pq / μ00^(1 + (p+q)/2)`
//!
//! # Accumulation order
//!
//! Floating-point addition is not associative, so results are only
//! reproducible if every sum sees its terms in the same order. Every sum
//! here is accumulated in `f64`, row-major: `i` ascending, and for each `i`,
//! `j` ascending. Integer powers are repeated multiplications starting from
//! 1.0. The batched [`MomentEngine::compute`] keeps one accumulator per
//! `(p, q)` and feeds each one in that same order, so it is bit-identical to
//! calling the per-pair methods one at a time.

use std::borrow::Cow;

use log::debug;

use crate::config::MOMENT_BINARIZE_THRESHOLD;
use crate::models::{
    BinaryMask, CentralMoments, Centroid, HuInvariants, MomentSet, NormalizedMoments, PixelGrid,
    RawMoments,
};
use crate::utils::binarization::Binarizer;
use crate::utils::traversal;

/// `(p, q)` pairs carried in a [`MomentSet`], in [`RawMoments`] field order
const RAW_ORDERS: [(u32, u32); 10] = [
    (0, 0),
    (1, 0),
    (0, 1),
    (1, 1),
    (2, 0),
    (0, 2),
    (3, 0),
    (0, 3),
    (2, 1),
    (1, 2),
];

/// `(p, q)` pairs carried in [`CentralMoments`], in field order
const CENTRAL_ORDERS: [(u32, u32); 8] = [
    (0, 0),
    (1, 1),
    (2, 0),
    (0, 2),
    (3, 0),
    (0, 3),
    (2, 1),
    (1, 2),
];

/// `base^exp` by repeated multiplication; `x^0 == 1` for every `x`, including 0
#[inline]
fn pow_int(base: f64, exp: u32) -> f64 {
    let mut r = 1.0;
    for _ in 0..exp {
        r *= base;
    }
    r
}

/// Moment computations over one binary mask
#[derive(Debug, Clone)]
pub struct MomentEngine<'a> {
    mask: Cow<'a, BinaryMask>,
}

impl<'a> MomentEngine<'a> {
    /// Use a mask as-is
    pub fn from_mask(mask: &'a BinaryMask) -> Self {
        Self {
            mask: Cow::Borrowed(mask),
        }
    }

    /// Force a gray grid into {0,1} with the fixed threshold 128, then use it
    ///
    /// This always runs, regardless of how the grid was produced; a 0/255
    /// image is normalized the same way as any other.
    pub fn from_grid(grid: &PixelGrid) -> MomentEngine<'static> {
        let mask = Binarizer::single_high(MOMENT_BINARIZE_THRESHOLD as i32)
            .binarize(grid)
            .mask;
        MomentEngine {
            mask: Cow::Owned(mask),
        }
    }

    /// The mask every moment is computed from
    pub fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Sum `term(i, j)` over set pixels, row-major
    fn accumulate<const N: usize>(
        &self,
        mut term: impl FnMut(f64, f64, &mut [f64; N]),
    ) -> [f64; N] {
        traversal::record();
        let mut sums = [0.0f64; N];
        for (i, j) in self.mask.iter_ones() {
            term(i as f64, j as f64, &mut sums);
        }
        sums
    }

    /// `(M00, Σj, Σi)` from the engine's own pass
    fn centroid_sums(&self) -> [f64; 3] {
        self.accumulate(|y, x, s: &mut [f64; 3]| {
            s[0] += 1.0;
            s[1] += x;
            s[2] += y;
        })
    }

    fn centroid_from_sums([m00, sum_j, sum_i]: [f64; 3]) -> Option<Centroid> {
        (m00 != 0.0).then(|| Centroid::new(sum_j / m00, sum_i / m00))
    }

    /// `M_pq = Σ i^p · j^q · f(i,j)`
    pub fn raw_moment(&self, p: u32, q: u32) -> f64 {
        self.accumulate(|y, x, s: &mut [f64; 1]| s[0] += pow_int(y, p) * pow_int(x, q))[0]
    }

    /// `(x̄, ȳ) = (Σj/M00, Σi/M00)`, `None` for an empty mask
    pub fn centroid(&self) -> Option<Centroid> {
        Self::centroid_from_sums(self.centroid_sums())
    }

    /// `μ_pq`; 0 for every `(p, q)` when the mask is empty
    pub fn central_moment(&self, p: u32, q: u32) -> f64 {
        let Some(c) = self.centroid() else {
            return 0.0;
        };
        self.accumulate(|y, x, s: &mut [f64; 1]| {
            s[0] += pow_int(y - c.y, p) * pow_int(x - c.x, q);
        })[0]
    }

    /// `η_pq = μ_pq / μ00^(1 + (p+q)/2)`; 0 when `μ00 == 0`
    pub fn normalized_central_moment(&self, p: u32, q: u32) -> f64 {
        let mu00 = self.raw_moment(0, 0);
        if mu00 == 0.0 {
            return 0.0;
        }
        normalize(self.central_moment(p, q), mu00, p, q)
    }

    /// φ1..φ7
    pub fn hu_invariants(&self) -> HuInvariants {
        self.compute().hu
    }

    /// Every moment in two passes: raw sums, then central sums
    pub fn compute(&self) -> MomentSet {
        let raw = self.accumulate(|y, x, s: &mut [f64; 10]| {
            for (k, &(p, q)) in RAW_ORDERS.iter().enumerate() {
                s[k] += pow_int(y, p) * pow_int(x, q);
            }
        });
        let raw = RawMoments {
            m00: raw[0],
            m10: raw[1],
            m01: raw[2],
            m11: raw[3],
            m20: raw[4],
            m02: raw[5],
            m30: raw[6],
            m03: raw[7],
            m21: raw[8],
            m12: raw[9],
        };

        // Σj and Σi are the M01 and M10 accumulators, fed in the same order.
        let centroid = Self::centroid_from_sums([raw.m00, raw.m01, raw.m10]);
        let central = match centroid {
            Some(c) => {
                let mu = self.accumulate(|y, x, s: &mut [f64; 8]| {
                    let (dy, dx) = (y - c.y, x - c.x);
                    for (k, &(p, q)) in CENTRAL_ORDERS.iter().enumerate() {
                        s[k] += pow_int(dy, p) * pow_int(dx, q);
                    }
                });
                CentralMoments {
                    mu00: mu[0],
                    mu11: mu[1],
                    mu20: mu[2],
                    mu02: mu[3],
                    mu30: mu[4],
                    mu03: mu[5],
                    mu21: mu[6],
                    mu12: mu[7],
                }
            }
            None => CentralMoments::default(),
        };

        let normalized = normalize_all(&central, raw.m00);
        let hu = hu_from_normalized(&normalized);
        debug!(
            "moments on {}x{} mask: M00={}, centroid={:?}, phi1={:e}",
            self.mask.rows(),
            self.mask.cols(),
            raw.m00,
            centroid,
            hu.0[0]
        );

        MomentSet {
            raw,
            centroid,
            central,
            normalized,
            hu,
        }
    }
}

#[inline]
fn normalize(mu: f64, mu00: f64, p: u32, q: u32) -> f64 {
    let gamma = 1.0 + 0.5 * (p + q) as f64;
    mu / mu00.powf(gamma)
}

fn normalize_all(c: &CentralMoments, mu00: f64) -> NormalizedMoments {
    if mu00 == 0.0 {
        return NormalizedMoments::default();
    }
    NormalizedMoments {
        eta11: normalize(c.mu11, mu00, 1, 1),
        eta20: normalize(c.mu20, mu00, 2, 0),
        eta02: normalize(c.mu02, mu00, 0, 2),
        eta30: normalize(c.mu30, mu00, 3, 0),
        eta03: normalize(c.mu03, mu00, 0, 3),
        eta21: normalize(c.mu21, mu00, 2, 1),
        eta12: normalize(c.mu12, mu00, 1, 2),
    }
}

/// The seven Hu polynomials of the normalized central moments
pub fn hu_from_normalized(n: &NormalizedMoments) -> HuInvariants {
    let NormalizedMoments {
        eta11: n11,
        eta20: n20,
        eta02: n02,
        eta30: n30,
        eta03: n03,
        eta21: n21,
        eta12: n12,
    } = *n;

    let phi1 = n20 + n02;
    let phi2 = (n20 - n02) * (n20 - n02) + 4.0 * n11 * n11;
    let phi3 = (n30 - 3.0 * n12) * (n30 - 3.0 * n12) + (3.0 * n21 - n03) * (3.0 * n21 - n03);
    let phi4 = (n30 + n12) * (n30 + n12) + (n21 + n03) * (n21 + n03);
    let phi5 = (n30 - 3.0 * n12)
        * (n30 + n12)
        * ((n30 + n12) * (n30 + n12) - 3.0 * (n21 + n03) * (n21 + n03))
        + (3.0 * n21 - n03)
            * (n21 + n03)
            * (3.0 * (n30 + n12) * (n30 + n12) - (n21 + n03) * (n21 + n03));
    let phi6 = (n20 - n02) * ((n30 + n12) * (n30 + n12) - (n21 + n03) * (n21 + n03))
        + 4.0 * n11 * (n30 + n12) * (n21 + n03);
    // Sign of the second term is negative, unlike φ5.
    let phi7 = (3.0 * n21 - n03)
        * (n30 + n12)
        * ((n30 + n12) * (n30 + n12) - 3.0 * (n21 + n03) * (n21 + n03))
        - (n30 - 3.0 * n12)
            * (n21 + n03)
            * (3.0 * (n30 + n12) * (n30 + n12) - (n21 + n03) * (n21 + n03));

    HuInvariants([phi1, phi2, phi3, phi4, phi5, phi6, phi7])
}

/// Moments of a mask
pub fn compute_moments(mask: &BinaryMask) -> MomentSet {
    MomentEngine::from_mask(mask).compute()
}

/// Moments of a gray grid after the fixed 128 binarization
pub fn compute_grid_moments(grid: &PixelGrid) -> MomentSet {
    MomentEngine::from_grid(grid).compute()
}
