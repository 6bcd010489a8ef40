use crate::neighbors::{BoxSet, MooreOffsets};
use std::hint::spin_loop;
use std::sync::atomic::{AtomicBool, Ordering};

/// Busy-waiting lock guarding one box.
#[derive(Debug, Default)]
struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    #[inline]
    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    #[inline]
    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Hands out locks over a box's whole Moore neighborhood.
///
/// Holds one spinlock per grid box. Every [`NeighborLock`] acquires its boxes
/// in ascending index order, so overlapping neighborhoods locked from
/// different threads can never wait on each other in a cycle.
#[derive(Debug)]
pub struct NeighborMutexBuilder {
    locks: Vec<SpinLock>,
    offsets: MooreOffsets,
}

impl NeighborMutexBuilder {
    pub(crate) fn new(offsets: MooreOffsets, num_boxes: usize) -> Self {
        let mut builder = Self {
            locks: Vec::new(),
            offsets,
        };
        builder.update(offsets, num_boxes);
        builder
    }

    /// Matches the lock array to a rebuilt grid.
    pub(crate) fn update(&mut self, offsets: MooreOffsets, num_boxes: usize) {
        self.offsets = offsets;
        self.locks.truncate(num_boxes);
        self.locks.resize_with(num_boxes, SpinLock::default);
    }

    pub fn num_locks(&self) -> usize {
        self.locks.len()
    }

    /// Lock over `box_idx` and its neighbors.
    pub fn get_mutex(&self, box_idx: usize) -> NeighborLock<'_> {
        let mut indices = self.offsets.boxes_around(box_idx);
        indices.sort();
        NeighborLock {
            builder: self,
            indices,
        }
    }
}

/// Lock over one neighborhood; borrowed from the builder, so it cannot outlive
/// the rebuild it was created for.
#[derive(Debug)]
pub struct NeighborLock<'a> {
    builder: &'a NeighborMutexBuilder,
    indices: BoxSet,
}

impl<'a> NeighborLock<'a> {
    /// Box indices covered by this lock, ascending.
    pub fn box_indices(&self) -> &[usize] {
        self.indices.as_slice()
    }

    /// Acquires every box lock in ascending order, spinning while one is held.
    pub fn lock(&self) {
        for idx in self.indices.iter() {
            self.builder.locks[idx].lock();
        }
    }

    /// Releases every box lock in ascending order.
    pub fn unlock(&self) {
        for idx in self.indices.iter() {
            self.builder.locks[idx].unlock();
        }
    }

    /// Acquires the lock and releases it when the guard is dropped.
    pub fn guard(&self) -> NeighborLockGuard<'_, 'a> {
        self.lock();
        NeighborLockGuard { lock: self }
    }
}

/// Releases its [`NeighborLock`] on drop.
#[derive(Debug)]
pub struct NeighborLockGuard<'l, 'a> {
    lock: &'l NeighborLock<'a>,
}

impl Drop for NeighborLockGuard<'_, '_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
