//! Moment records produced by the moment engine
//!
//! Index convention throughout: `p` is the power of the row index `i`,
//! `q` the power of the column index `j`.

use super::region::Centroid;

/// Magnitudes below this map to 0 in the log-scaled Hu vector
pub const HU_LOG_FLOOR: f64 = 1e-30;

/// Raw moments `M_pq = Σ i^p j^q f(i,j)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawMoments {
    /// M00
    pub m00: f64,
    /// M10
    pub m10: f64,
    /// M01
    pub m01: f64,
    /// M11
    pub m11: f64,
    /// M20
    pub m20: f64,
    /// M02
    pub m02: f64,
    /// M30
    pub m30: f64,
    /// M03
    pub m03: f64,
    /// M21
    pub m21: f64,
    /// M12
    pub m12: f64,
}

/// Central moments `μ_pq = Σ (i-ȳ)^p (j-x̄)^q f(i,j)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CentralMoments {
    /// μ00
    pub mu00: f64,
    /// μ11
    pub mu11: f64,
    /// μ20
    pub mu20: f64,
    /// μ02
    pub mu02: f64,
    /// μ30
    pub mu30: f64,
    /// μ03
    pub mu03: f64,
    /// μ21
    pub mu21: f64,
    /// μ12
    pub mu12: f64,
}

/// Scale-normalized central moments `η_pq = μ_pq / μ00^(1+(p+q)/2)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedMoments {
    /// η11
    pub eta11: f64,
    /// η20
    pub eta20: f64,
    /// η02
    pub eta02: f64,
    /// η30
    pub eta30: f64,
    /// η03
    pub eta03: f64,
    /// η21
    pub eta21: f64,
    /// η12
    pub eta12: f64,
}

/// The seven Hu invariants, `phi[0]` is φ1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HuInvariants(pub [f64; 7]);

impl HuInvariants {
    /// φk for k in 1..=7
    ///
    /// # Panics
    /// Panics if `k` is outside 1..=7.
    pub fn phi(&self, k: usize) -> f64 {
        assert!((1..=7).contains(&k), "Hu invariant index {k} out of range");
        self.0[k - 1]
    }

    /// All seven values
    pub fn as_array(&self) -> &[f64; 7] {
        &self.0
    }

    /// `-log10|φk|` per component, 0 for negligible magnitudes
    pub fn log_scaled(&self) -> [f64; 7] {
        self.0.map(|v| {
            let a = v.abs();
            if a < HU_LOG_FLOOR { 0.0 } else { -a.log10() }
        })
    }
}

/// Every moment quantity derived from one binary mask
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentSet {
    /// Raw moments
    pub raw: RawMoments,
    /// `None` when the mask has no set pixel
    pub centroid: Option<Centroid>,
    /// Central moments about the centroid
    pub central: CentralMoments,
    /// Normalized central moments
    pub normalized: NormalizedMoments,
    /// Hu invariants φ1..φ7
    pub hu: HuInvariants,
}

impl MomentSet {
    /// Number of set pixels (M00)
    pub fn area(&self) -> f64 {
        self.raw.m00
    }

    /// True when the mask was all background
    pub fn is_empty(&self) -> bool {
        self.raw.m00 == 0.0
    }

    /// Principal-axis angle in radians, measured from the column axis
    /// toward increasing rows. `None` for an empty mask.
    pub fn orientation(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let c = &self.central;
        // μ20 is the row spread here, so the column-axis variance is μ02.
        Some(0.5 * (2.0 * c.mu11).atan2(c.mu02 - c.mu20))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_scaled_floor() {
        let hu = HuInvariants([1e-3, -1e-2, 0.0, 1e-31, 1.0, 10.0, -1e-40]);
        let scaled = hu.log_scaled();
        assert!((scaled[0] - 3.0).abs() < 1e-12);
        assert!((scaled[1] - 2.0).abs() < 1e-12);
        assert_eq!(scaled[2], 0.0);
        assert_eq!(scaled[3], 0.0);
        assert_eq!(scaled[4], 0.0);
        assert!((scaled[5] + 1.0).abs() < 1e-12);
        assert_eq!(scaled[6], 0.0);
    }

    #[test]
    fn test_phi_indexing() {
        let hu = HuInvariants([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(hu.phi(1), 1.0);
        assert_eq!(hu.phi(7), 7.0);
    }
}
