//! Nearest-template shape classification in log-scaled Hu space

use std::fmt;
use std::sync::OnceLock;

use crate::config;
use crate::models::{BinaryMask, HuInvariants, MomentSet};

use super::moments::compute_moments;

/// Reference shapes with built-in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceShape {
    /// Filled disc
    Circle,
    /// Axis-aligned square
    Square,
    /// Axis-aligned 2:1 rectangle
    Rectangle,
    /// Equilateral triangle, flat edge on top
    Triangle,
}

impl ReferenceShape {
    /// Every shape, in template order
    pub const ALL: [ReferenceShape; 4] =
        [Self::Circle, Self::Square, Self::Rectangle, Self::Triangle];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Circle => "Circle",
            Self::Square => "Square",
            Self::Rectangle => "Rectangle",
            Self::Triangle => "Triangle",
        }
    }

    /// Position in [`ReferenceShape::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Draw the shape centered on an `n` x `n` canvas
    pub fn render(&self, n: usize) -> BinaryMask {
        let n = n.max(8);
        let scaled = |ratio: f64| ((ratio * n as f64) as usize).max(1);
        match self {
            Self::Circle => circle(n, (0.35 * n as f64) as usize),
            Self::Square => square(n, scaled(0.6)),
            Self::Rectangle => rectangle(n, scaled(0.35), scaled(0.7)),
            Self::Triangle => triangle(n, scaled(0.7)),
        }
    }
}

impl fmt::Display for ReferenceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filled disc of radius `r` around the canvas center
pub(crate) fn circle(n: usize, r: usize) -> BinaryMask {
    let c = (n / 2) as i64;
    let r2 = (r * r) as i64;
    BinaryMask::pack(
        n,
        n,
        (0..n as i64).flat_map(|i| {
            (0..n as i64).map(move |j| (i - c) * (i - c) + (j - c) * (j - c) <= r2)
        }),
    )
}

/// Centered `side` x `side` square
pub(crate) fn square(n: usize, side: usize) -> BinaryMask {
    rectangle(n, side, side)
}

/// Centered rectangle, `h` rows by `w` columns, both clipped to the canvas
pub(crate) fn rectangle(n: usize, h: usize, w: usize) -> BinaryMask {
    let (h, w) = (h.min(n), w.min(n));
    let top = (n - h) / 2;
    let left = (n - w) / 2;
    BinaryMask::pack(
        n,
        n,
        (0..n).flat_map(move |i| {
            (0..n).map(move |j| (top..top + h).contains(&i) && (left..left + w).contains(&j))
        }),
    )
}

/// Equilateral triangle with its flat edge on top and apex pointing down
pub(crate) fn triangle(n: usize, side: usize) -> BinaryMask {
    let side = side.min(n);
    let c = n / 2;
    let top = (n - side) / 2;
    let height = (side as f64 * 3f64.sqrt() / 2.0).round_ties_even() as usize;
    let base = (n - 1).min(top + height);
    let span = (base - top).max(1) as f64;
    let half_side = (side / 2) as f64;
    BinaryMask::pack(
        n,
        n,
        (0..n).flat_map(move |i| {
            let half = (top..=base).contains(&i).then(|| {
                let t = (i - top) as f64 / span;
                ((1.0 - t) * half_side).round_ties_even() as usize
            });
            (0..n).map(move |j| {
                half.is_some_and(|half| c.saturating_sub(half) <= j && j <= (n - 1).min(c + half))
            })
        }),
    )
}

/// Best template for a mask and its distance in log-scaled Hu space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMatch {
    /// Closest reference shape
    pub shape: ReferenceShape,
    /// Euclidean distance between log-scaled Hu vectors
    pub distance: f64,
}

/// Log-scaled Hu templates of the reference shapes
#[derive(Debug, Clone)]
pub struct ShapeClassifier {
    templates: Vec<(ReferenceShape, [f64; 7])>,
}

static SHARED: OnceLock<ShapeClassifier> = OnceLock::new();

impl ShapeClassifier {
    /// Render every template on an `n` x `n` canvas
    pub fn new(n: usize) -> Self {
        let templates = ReferenceShape::ALL
            .iter()
            .map(|&shape| (shape, compute_moments(&shape.render(n)).hu.log_scaled()))
            .collect();
        Self { templates }
    }

    /// Process-wide classifier sized by `config::shape_template_size()`
    pub fn shared() -> &'static Self {
        SHARED.get_or_init(|| Self::new(config::shape_template_size()))
    }

    /// Template vectors, in [`ReferenceShape::ALL`] order
    pub fn templates(&self) -> &[(ReferenceShape, [f64; 7])] {
        &self.templates
    }

    /// Nearest template to a set of Hu invariants
    pub fn classify_hu(&self, hu: &HuInvariants) -> ShapeMatch {
        let v = hu.log_scaled();
        let mut best = ShapeMatch {
            shape: ReferenceShape::Circle,
            distance: f64::INFINITY,
        };
        for (shape, t) in &self.templates {
            let d2: f64 = v.iter().zip(t).map(|(a, b)| (a - b) * (a - b)).sum();
            let distance = d2.sqrt();
            if distance < best.distance {
                best = ShapeMatch {
                    shape: *shape,
                    distance,
                };
            }
        }
        best
    }

    /// Nearest template to a moment set
    pub fn classify(&self, moments: &MomentSet) -> ShapeMatch {
        self.classify_hu(&moments.hu)
    }

    /// Compute moments of a mask and classify them
    pub fn classify_mask(&self, mask: &BinaryMask) -> ShapeMatch {
        self.classify(&compute_moments(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_classify_as_themselves() {
        let classifier = ShapeClassifier::new(100);
        for shape in ReferenceShape::ALL {
            let m = classifier.classify_mask(&shape.render(100));
            assert_eq!(m.shape, shape);
            assert_eq!(m.distance, 0.0);
        }
    }

    #[test]
    fn test_classify_other_sizes() {
        let classifier = ShapeClassifier::new(100);
        let disc = BinaryMask::from_fn(90, 90, |i, j| {
            let (di, dj) = (i as i64 - 45, j as i64 - 45);
            di * di + dj * dj <= 30 * 30
        })
        .unwrap();
        assert_eq!(classifier.classify_mask(&disc).shape, ReferenceShape::Circle);

        let square =
            BinaryMask::from_fn(80, 80, |i, j| (20..60).contains(&i) && (20..60).contains(&j))
                .unwrap();
        assert_eq!(classifier.classify_mask(&square).shape, ReferenceShape::Square);

        let rect =
            BinaryMask::from_fn(90, 90, |i, j| (30..60).contains(&i) && (15..75).contains(&j))
                .unwrap();
        assert_eq!(classifier.classify_mask(&rect).shape, ReferenceShape::Rectangle);
    }

    #[test]
    fn test_render_sizes() {
        let n = 100;
        assert_eq!(ReferenceShape::Square.render(n).count_ones(), 60 * 60);
        assert_eq!(ReferenceShape::Rectangle.render(n).count_ones(), 70 * 35);
        let tri = ReferenceShape::Triangle.render(n);
        // widest row is the top edge
        let top_row = (0..n).filter(|&j| tri.get(15, j)).count();
        assert_eq!(top_row, 2 * 35 + 1);
    }

    #[test]
    fn test_sized_shapes_are_clipped_to_canvas() {
        assert_eq!(rectangle(20, 5, 40).count_ones(), 5 * 20);
        assert_eq!(square(20, 4).count_ones(), 16);
        assert_eq!(circle(20, 0).count_ones(), 1);
        assert!(triangle(20, 50).count_ones() > 0);
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(ReferenceShape::Triangle.to_string(), "Triangle");
    }
}
