use crate::grid_box::{BoxIter, GridBox};
use crate::handle::ObjectHandle;
use crate::successors::SuccessorTable;
use serde::{Deserialize, Serialize};

/// Maximum number of boxes in a Moore neighborhood (the box itself plus 26).
pub const MAX_MOORE_BOXES: usize = 27;

/// Number of boxes in a half Moore neighborhood (the box itself plus 13).
pub const HALF_MOORE_BOXES: usize = 14;

/// How many of the 26 surrounding boxes take part in a neighbor query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdjacencyLevel {
    /// Only the query box itself.
    None,
    /// The 6 face-adjacent boxes.
    Face,
    /// Face boxes plus the 12 edge-adjacent boxes.
    Edge,
    /// All 26 surrounding boxes.
    #[default]
    Corner,
}

impl AdjacencyLevel {
    /// Number of boxes visited per query, including the query box.
    pub fn num_boxes(self) -> usize {
        match self {
            AdjacencyLevel::None => 1,
            AdjacencyLevel::Face => 7,
            AdjacencyLevel::Edge => 19,
            AdjacencyLevel::Corner => 27,
        }
    }
}

/// Fixed-capacity list of up to 27 box indices.
#[derive(Clone, Copy, Debug)]
pub struct BoxSet {
    indices: [usize; MAX_MOORE_BOXES],
    len: usize,
}

impl BoxSet {
    pub fn new() -> Self {
        Self {
            indices: [0; MAX_MOORE_BOXES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, index: usize) {
        self.indices[self.len] = index;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices[..self.len]
    }

    pub fn sort(&mut self) {
        self.indices[..self.len].sort_unstable();
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for BoxSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed linear-index offsets from a box to its Moore neighbors.
///
/// The grid is padded by one box on every side, so for any box that holds an
/// agent all offsets stay inside the box array.
#[derive(Clone, Copy, Debug)]
pub struct MooreOffsets {
    offsets: [isize; MAX_MOORE_BOXES],
    len: usize,
}

impl MooreOffsets {
    pub fn new(num_boxes_x: usize, num_boxes_xy: usize, level: AdjacencyLevel) -> Self {
        let x = num_boxes_x as isize;
        let xy = num_boxes_xy as isize;
        let mut offsets = [0isize; MAX_MOORE_BOXES];
        let mut len = 1;
        let mut push = |off: isize| {
            offsets[len] = off;
            len += 1;
        };

        if level >= AdjacencyLevel::Face {
            for off in [-xy, xy, -x, x, -1, 1] {
                push(off);
            }
        }
        if level >= AdjacencyLevel::Edge {
            for off in [
                -xy - x,
                -xy - 1,
                -x - 1,
                xy - x,
                xy - 1,
                x - 1,
                -xy + x,
                -xy + 1,
                -x + 1,
                xy + x,
                xy + 1,
                x + 1,
            ] {
                push(off);
            }
        }
        if level >= AdjacencyLevel::Corner {
            for off in [
                -xy - x - 1,
                -xy - x + 1,
                -xy + x - 1,
                -xy + x + 1,
                xy - x - 1,
                xy - x + 1,
                xy + x - 1,
                xy + x + 1,
            ] {
                push(off);
            }
        }
        Self { offsets, len }
    }

    pub fn as_slice(&self) -> &[isize] {
        &self.offsets[..self.len]
    }

    /// Indices of `box_idx` and its neighbors, query box first.
    ///
    /// An index that would fall outside the grid wraps to a huge value, so the
    /// subsequent box lookup fails loudly instead of reading a wrong box.
    #[inline]
    pub fn boxes_around(&self, box_idx: usize) -> BoxSet {
        let mut set = BoxSet::new();
        for &off in self.as_slice() {
            set.push(box_idx.wrapping_add_signed(off));
        }
        set
    }
}

/// Offsets of the box itself and 13 of its neighbors, one from every
/// centro-symmetric pair, for loops that must visit each box pair once.
///
/// That is all nine boxes of the plane above plus four of the eight in the
/// box's own plane.
pub fn half_moore_offsets(num_boxes_x: usize, num_boxes_xy: usize) -> [isize; HALF_MOORE_BOXES] {
    let x = num_boxes_x as isize;
    let xy = num_boxes_xy as isize;
    [
        0,
        x - 1,
        xy - x - 1,
        xy - 1,
        xy + x - 1,
        x,
        xy - x,
        xy,
        xy + x,
        1,
        x + 1,
        xy - x + 1,
        xy + 1,
        xy + x + 1,
    ]
}

/// Lazy walk over every agent in a set of candidate boxes.
///
/// Empty (and padding) boxes are skipped without emitting anything. The walk
/// is single pass; rebuild it from the same box set to iterate again.
#[derive(Clone, Debug)]
pub struct NeighborIterator<'a> {
    boxes: &'a [GridBox],
    successors: &'a SuccessorTable,
    candidates: BoxSet,
    next_candidate: usize,
    current: BoxIter<'a>,
}

impl<'a> NeighborIterator<'a> {
    pub fn new(boxes: &'a [GridBox], successors: &'a SuccessorTable, candidates: BoxSet) -> Self {
        Self {
            boxes,
            successors,
            candidates,
            next_candidate: 0,
            current: BoxIter::exhausted(successors),
        }
    }

    /// Moves to the next non-empty candidate box; `false` once all are exhausted.
    fn forward_to_non_empty_box(&mut self) -> bool {
        while self.next_candidate < self.candidates.len() {
            let b = &self.boxes[self.candidates.as_slice()[self.next_candidate]];
            self.next_candidate += 1;
            if !b.is_empty() {
                self.current = b.iter(self.successors);
                return true;
            }
        }
        false
    }
}

impl Iterator for NeighborIterator<'_> {
    type Item = ObjectHandle;

    #[inline]
    fn next(&mut self) -> Option<ObjectHandle> {
        loop {
            if let Some(h) = self.current.next() {
                return Some(h);
            }
            if !self.forward_to_non_empty_box() {
                return None;
            }
        }
    }
}

#[inline]
pub fn squared_euclidean_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    dx * dx + dy * dy + dz * dz
}

/// `true` if `|a - b|^2 < squared_radius`, bailing out early on the x and
/// x + y partial sums.
#[inline]
pub fn within_squared_euclidean_distance(squared_radius: f64, a: [f64; 3], b: [f64; 3]) -> bool {
    let dx = b[0] - a[0];
    let dx2 = dx * dx;
    if dx2 > squared_radius {
        return false;
    }

    let dy = b[1] - a[1];
    let dy2_plus_dx2 = dy * dy + dx2;
    if dy2_plus_dx2 > squared_radius {
        return false;
    }

    let dz = b[2] - a[2];
    dz * dz + dy2_plus_dx2 < squared_radius
}
