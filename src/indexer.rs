use crate::bounds::GridDimensions;

/// Pure coordinate math between positions, box coordinates and linear box indices.
///
/// Boxes are laid out x-fastest: `index = z * nx * ny + y * nx + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxIndexer {
    min: [i32; 3],
    box_length: u32,
    num_boxes_axis: [usize; 3],
    num_boxes_xy: usize,
}

impl BoxIndexer {
    /// Creates an indexer for a grid whose extents are exact multiples of `box_length`.
    pub fn new(dims: &GridDimensions, box_length: u32) -> Self {
        debug_assert!(box_length > 0, "box length must be positive");
        let mut num_boxes_axis = [0usize; 3];
        for (axis, n) in num_boxes_axis.iter_mut().enumerate() {
            let extent = dims.extent(axis);
            debug_assert!(
                extent >= 0 && extent as u32 % box_length == 0,
                "grid extent {extent} is not a multiple of the box length {box_length}"
            );
            *n = (extent.max(0) as u32 / box_length) as usize;
        }
        Self {
            min: dims.min,
            box_length,
            num_boxes_axis,
            num_boxes_xy: num_boxes_axis[0] * num_boxes_axis[1],
        }
    }

    /// An indexer for a grid without boxes.
    pub fn empty() -> Self {
        Self {
            min: [0; 3],
            box_length: 1,
            num_boxes_axis: [0; 3],
            num_boxes_xy: 0,
        }
    }

    pub fn box_length(&self) -> u32 {
        self.box_length
    }

    pub fn num_boxes_axis(&self) -> [usize; 3] {
        self.num_boxes_axis
    }

    pub fn num_boxes_xy(&self) -> usize {
        self.num_boxes_xy
    }

    pub fn num_boxes(&self) -> usize {
        self.num_boxes_xy * self.num_boxes_axis[2]
    }

    /// Box coordinate containing `pos`.
    ///
    /// The position is floored before subtracting the integer grid minimum, so a
    /// position a hair below a box boundary stays in the lower box.
    #[inline]
    pub fn position_to_coordinate(&self, pos: [f64; 3]) -> [usize; 3] {
        let len = self.box_length as f64;
        [
            ((pos[0].floor() - self.min[0] as f64) / len).floor() as usize,
            ((pos[1].floor() - self.min[1] as f64) / len).floor() as usize,
            ((pos[2].floor() - self.min[2] as f64) / len).floor() as usize,
        ]
    }

    #[inline]
    pub fn coordinate_to_linear(&self, coord: [usize; 3]) -> usize {
        debug_assert!(
            coord[0] < self.num_boxes_axis[0]
                && coord[1] < self.num_boxes_axis[1]
                && coord[2] < self.num_boxes_axis[2],
            "box coordinate {coord:?} outside grid of {:?} boxes",
            self.num_boxes_axis
        );
        coord[2] * self.num_boxes_xy + coord[1] * self.num_boxes_axis[0] + coord[0]
    }

    /// Inverse of [`coordinate_to_linear`](Self::coordinate_to_linear).
    /// `index` must be below [`num_boxes`](Self::num_boxes).
    #[inline]
    pub fn linear_to_coordinate(&self, index: usize) -> [usize; 3] {
        debug_assert!(index < self.num_boxes(), "box index {index} outside grid of {} boxes", self.num_boxes());
        let z = index / self.num_boxes_xy;
        let rem = index % self.num_boxes_xy;
        [rem % self.num_boxes_axis[0], rem / self.num_boxes_axis[0], z]
    }

    #[inline]
    pub fn position_to_linear(&self, pos: [f64; 3]) -> usize {
        self.coordinate_to_linear(self.position_to_coordinate(pos))
    }
}
