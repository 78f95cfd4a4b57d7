//! Core data structures shared by the engines

/// Gray-value input grid
pub mod grid;
/// Bit-packed binary mask
pub mod mask;
/// Raw, central, normalized moments and Hu invariants
pub mod moments;
/// Region statistics and their dual (object/complement) form
pub mod region;

pub use grid::PixelGrid;
pub use mask::BinaryMask;
pub use moments::{CentralMoments, HuInvariants, MomentSet, NormalizedMoments, RawMoments};
pub use region::{BoundingBox, Centroid, DualRegionResult, RegionResult, RegionStats};
