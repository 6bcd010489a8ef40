use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of agent positions in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn include(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn merge(mut self, other: BoundingBox) -> BoundingBox {
        for i in 0..3 {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
        self
    }
}

/// Integer extent of the grid, padded by one box length on every side.
///
/// Every axis extent is an exact multiple of the box length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDimensions {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl GridDimensions {
    pub fn new(min: [i32; 3], max: [i32; 3]) -> Self {
        Self { min, max }
    }

    /// Cube spanning `[min, max]` on every axis.
    pub fn cube(min: i32, max: i32) -> Self {
        Self {
            min: [min; 3],
            max: [max; 3],
        }
    }

    /// The six bounds as `[x_min, x_max, y_min, y_max, z_min, z_max]`.
    pub fn to_array(&self) -> [i32; 6] {
        [
            self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2],
        ]
    }

    pub fn extent(&self, axis: usize) -> i32 {
        self.max[axis] - self.min[axis]
    }

    /// Smallest of the six bounds.
    pub fn lowest(&self) -> i32 {
        self.min.iter().copied().min().unwrap_or(i32::MAX)
    }

    /// Largest of the six bounds.
    pub fn highest(&self) -> i32 {
        self.max.iter().copied().max().unwrap_or(i32::MIN)
    }

    pub(crate) fn unset() -> Self {
        Self {
            min: [i32::MAX; 3],
            max: [i32::MIN; 3],
        }
    }
}

/// Remembered `(min, max)` of earlier grid dimensions, used to detect growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DimensionThresholds {
    pub min: i32,
    pub max: i32,
}

impl DimensionThresholds {
    pub(crate) fn unset() -> Self {
        Self {
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    /// Widens the thresholds to cover `dims`; returns whether they moved.
    pub(crate) fn expand_to(&mut self, dims: &GridDimensions) -> (bool, bool) {
        let lowest = dims.lowest();
        let highest = dims.highest();
        let mut below = false;
        let mut above = false;
        if lowest < self.min {
            self.min = lowest;
            below = true;
        }
        if highest > self.max {
            self.max = highest;
            above = true;
        }
        (below, above)
    }
}

/// A closed simulation space `[min, max]` applied to all three axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedBound {
    pub min: i32,
    pub max: i32,
}

impl FixedBound {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

impl From<FixedBound> for DimensionThresholds {
    fn from(b: FixedBound) -> Self {
        Self {
            min: b.min,
            max: b.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_merge_covers_both() {
        let mut a = BoundingBox::empty();
        assert!(a.is_empty());
        a.include([1.0, -2.0, 3.0]);
        let mut b = BoundingBox::empty();
        b.include([-5.0, 4.0, 0.5]);
        let m = a.merge(b);
        assert_eq!(m.min, [-5.0, -2.0, 0.5]);
        assert_eq!(m.max, [1.0, 4.0, 3.0]);
    }

    #[test]
    fn thresholds_only_move_outwards() {
        let mut t = DimensionThresholds::unset();
        assert_eq!(t.expand_to(&GridDimensions::cube(-10, 60)), (true, true));
        assert_eq!(t.expand_to(&GridDimensions::cube(0, 50)), (false, false));
        assert_eq!(
            t.expand_to(&GridDimensions::new([0, -20, 0], [10, 10, 10])),
            (true, false)
        );
        assert_eq!(t, DimensionThresholds { min: -20, max: 60 });
    }
}
