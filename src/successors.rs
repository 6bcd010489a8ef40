use crate::handle::ObjectHandle;
use std::sync::atomic::{AtomicU64, Ordering};

/// Flat "next handle in the same box" table, keyed by object handle.
///
/// One row per storage container, one slot per agent. Together with the box
/// heads this forms an intrusive singly-linked list per box. Entries are only
/// meaningful for the rebuild that wrote them.
#[derive(Debug, Default)]
pub struct SuccessorTable {
    rows: Vec<Vec<AtomicU64>>,
}

impl SuccessorTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Resizes to the given per-container agent counts, reusing allocations.
    pub fn resize(&mut self, container_sizes: &[usize]) {
        self.rows.truncate(container_sizes.len());
        while self.rows.len() < container_sizes.len() {
            self.rows.push(Vec::new());
        }
        for (row, &size) in self.rows.iter_mut().zip(container_sizes) {
            if row.len() > size {
                row.truncate(size);
            } else {
                let missing = size - row.len();
                row.extend((0..missing).map(|_| AtomicU64::new(ObjectHandle::NULL.to_bits())));
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Total number of slots over all containers.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successor of `handle`. Panics if `handle` is outside the table.
    #[inline]
    pub fn get(&self, handle: ObjectHandle) -> ObjectHandle {
        ObjectHandle::from_bits(self.rows[handle.container()][handle.slot()].load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn set(&self, handle: ObjectHandle, next: ObjectHandle) {
        self.rows[handle.container()][handle.slot()].store(next.to_bits(), Ordering::Relaxed);
    }
}
