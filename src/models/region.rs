/// Sub-pixel position, `x` = column, `y` = row
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Centroid {
    /// Mean column index
    pub x: f64,
    /// Mean row index
    pub y: f64,
}

impl Centroid {
    /// Create a new centroid
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Inclusive bounding box in grid indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Smallest row index
    pub min_i: usize,
    /// Smallest column index
    pub min_j: usize,
    /// Largest row index
    pub max_i: usize,
    /// Largest column index
    pub max_j: usize,
}

impl BoundingBox {
    /// Sentinel tuple used for empty regions
    pub const SENTINEL: (i64, i64, i64, i64) = (-1, -1, -1, -1);

    /// Box height in rows
    pub fn height(&self) -> usize {
        self.max_i - self.min_i + 1
    }

    /// Box width in columns
    pub fn width(&self) -> usize {
        self.max_j - self.min_j + 1
    }

    /// `(min_i, min_j, max_i, max_j)` as signed values
    pub fn as_tuple(&self) -> (i64, i64, i64, i64) {
        (
            self.min_i as i64,
            self.min_j as i64,
            self.max_i as i64,
            self.max_j as i64,
        )
    }
}

/// Measurements of a non-empty region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    /// Pixel count, always > 0
    pub area: u64,
    /// Center of mass
    pub centroid: Centroid,
    /// Inclusive extent
    pub bbox: BoundingBox,
}

/// Area, centroid and bounding box of one partition of a grid
///
/// An empty partition is its own variant; it is not an object of area 0 at
/// the origin. Sentinel accessors (`NaN` centroid, `-1` box) are provided for
/// consumers that expect them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionResult {
    /// No pixel fell in this partition
    Empty,
    /// At least one pixel fell in this partition
    Object(RegionStats),
}

impl RegionResult {
    /// Pixel count, 0 when empty
    pub fn area(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Object(stats) => stats.area,
        }
    }

    /// True when the partition holds at least one pixel
    pub fn has_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Stats of a non-empty region
    pub fn stats(&self) -> Option<&RegionStats> {
        match self {
            Self::Empty => None,
            Self::Object(stats) => Some(stats),
        }
    }

    /// Centroid, `None` when empty
    pub fn centroid(&self) -> Option<Centroid> {
        self.stats().map(|s| s.centroid)
    }

    /// Bounding box, `None` when empty
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.stats().map(|s| s.bbox)
    }

    /// Centroid column, `NaN` when empty
    pub fn centroid_x(&self) -> f64 {
        self.centroid().map_or(f64::NAN, |c| c.x)
    }

    /// Centroid row, `NaN` when empty
    pub fn centroid_y(&self) -> f64 {
        self.centroid().map_or(f64::NAN, |c| c.y)
    }

    /// `(min_i, min_j, max_i, max_j)`, or `(-1, -1, -1, -1)` when empty
    pub fn bbox_or_sentinel(&self) -> (i64, i64, i64, i64) {
        self.bbox()
            .map_or(BoundingBox::SENTINEL, |b| b.as_tuple())
    }
}

/// Two complementary partitions measured in the same traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualRegionResult {
    /// Pixels matching the classification rule
    pub primary: RegionResult,
    /// Every other pixel
    pub complement: RegionResult,
}

impl DualRegionResult {
    /// Pair two already-computed results
    pub fn new(primary: RegionResult, complement: RegionResult) -> Self {
        Self {
            primary,
            complement,
        }
    }

    /// Exchange primary and complement without touching any pixels
    #[must_use]
    pub fn swap(self) -> Self {
        Self {
            primary: self.complement,
            complement: self.primary,
        }
    }

    /// Sum of both areas; equals the grid's pixel count
    pub fn total_area(&self) -> u64 {
        self.primary.area() + self.complement.area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinels() {
        let empty = RegionResult::Empty;
        assert_eq!(empty.area(), 0);
        assert!(!empty.has_object());
        assert!(empty.centroid_x().is_nan());
        assert!(empty.centroid_y().is_nan());
        assert_eq!(empty.bbox_or_sentinel(), (-1, -1, -1, -1));
    }

    #[test]
    fn test_object_accessors() {
        let stats = RegionStats {
            area: 4,
            centroid: Centroid::new(2.5, 1.5),
            bbox: BoundingBox {
                min_i: 1,
                min_j: 2,
                max_i: 2,
                max_j: 3,
            },
        };
        let region = RegionResult::Object(stats);
        assert_eq!(region.area(), 4);
        assert_eq!(region.centroid_x(), 2.5);
        assert_eq!(region.centroid_y(), 1.5);
        assert_eq!(region.bbox_or_sentinel(), (1, 2, 2, 3));
        assert_eq!(stats.bbox.width(), 2);
        assert_eq!(stats.bbox.height(), 2);
    }

    #[test]
    fn test_swap_exchanges() {
        let one = RegionResult::Object(RegionStats {
            area: 1,
            centroid: Centroid::new(0.0, 0.0),
            bbox: BoundingBox {
                min_i: 0,
                min_j: 0,
                max_i: 0,
                max_j: 0,
            },
        });
        let dual = DualRegionResult::new(one, RegionResult::Empty);
        let swapped = dual.swap();
        assert_eq!(swapped.primary, RegionResult::Empty);
        assert_eq!(swapped.complement, one);
        assert_eq!(swapped.swap(), dual);
    }
}
