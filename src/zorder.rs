use crate::grid_box::GridBox;
use crate::handle::ObjectHandle;
use crate::indexer::BoxIndexer;
use crate::successors::SuccessorTable;
use rayon::prelude::*;

/// Bits per axis that survive interleaving into a 64-bit Morton code.
pub const MORTON_BITS: u32 = 21;

/// Morton (Z-order) code of a box coordinate.
#[inline]
pub fn morton_encode(x: usize, y: usize, z: usize) -> u64 {
    interleave_3(x as u64) | (interleave_3(y as u64) << 1) | (interleave_3(z as u64) << 2)
}

fn interleave_3(mut x: u64) -> u64 {
    x &= 0x1fffff;
    x = (x | x << 32) & 0x1f00000000ffff;
    x = (x | x << 16) & 0x1f0000ff0000ff;
    x = (x | x << 8) & 0x100f00f00f00f00f;
    x = (x | x << 4) & 0x10c30c30c30c30c3;
    x = (x | x << 2) & 0x1249249249249249;
    x
}

/// All grid boxes sorted by Morton code, with the number of agents that
/// precede each box in that order.
///
/// Rebuilt on demand, never kept current incrementally. The prefix sums let a
/// full sweep be cut into ranges of equal agent count for parallel workers.
#[derive(Debug, Default)]
pub struct ZOrderIndex {
    sorted_boxes: Vec<usize>,
    agent_offsets: Vec<usize>,
    num_agents: usize,
}

impl ZOrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, indexer: &BoxIndexer, boxes: &[GridBox]) {
        let mut keyed: Vec<(u64, usize)> = (0..boxes.len())
            .into_par_iter()
            .map(|i| {
                let [x, y, z] = indexer.linear_to_coordinate(i);
                (morton_encode(x, y, z), i)
            })
            .collect();
        keyed.par_sort_unstable_by_key(|&(code, _)| code);

        self.sorted_boxes.clear();
        self.sorted_boxes.extend(keyed.iter().map(|&(_, i)| i));

        self.agent_offsets.clear();
        self.agent_offsets.reserve(self.sorted_boxes.len());
        let mut acc = 0;
        for &b in &self.sorted_boxes {
            self.agent_offsets.push(acc);
            acc += boxes[b].len();
        }
        self.num_agents = acc;
    }

    /// Box indices in ascending Morton order.
    pub fn sorted_boxes(&self) -> &[usize] {
        &self.sorted_boxes
    }

    /// Agents counted at the last rebuild.
    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    /// Visits every agent box by box in Morton order.
    pub fn for_each<F>(&self, boxes: &[GridBox], successors: &SuccessorTable, mut visit: F)
    where
        F: FnMut(ObjectHandle),
    {
        for &b in &self.sorted_boxes {
            boxes[b].iter(successors).for_each(&mut visit);
        }
    }

    /// Visits agents `start..end` of the Morton-ordered agent sequence.
    pub fn for_each_in_range<F>(
        &self,
        boxes: &[GridBox],
        successors: &SuccessorTable,
        start: usize,
        end: usize,
        mut visit: F,
    ) where
        F: FnMut(ObjectHandle),
    {
        let end = end.min(self.num_agents);
        if start >= end {
            return;
        }
        // Last box whose first agent is at or before `start`; empty boxes share
        // their successor's offset and sort before it, so they are skipped.
        let mut pos = self.agent_offsets.partition_point(|&o| o <= start) - 1;
        let mut skip = start - self.agent_offsets[pos];
        let mut remaining = end - start;
        while remaining > 0 && pos < self.sorted_boxes.len() {
            for h in boxes[self.sorted_boxes[pos]].iter(successors).skip(skip) {
                visit(h);
                remaining -= 1;
                if remaining == 0 {
                    return;
                }
            }
            skip = 0;
            pos += 1;
        }
    }
}
