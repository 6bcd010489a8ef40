use crate::handle::ObjectHandle;
use crate::successors::SuccessorTable;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// A single cube of the grid.
///
/// `head` is the first handle of the intrusive list of agents inside the box;
/// the next element of `h` is `successors.get(h)`. `length == 0` exactly when
/// `head` is null.
#[derive(Debug)]
pub struct GridBox {
    head: AtomicU64,
    length: AtomicU32,
}

impl Default for GridBox {
    fn default() -> Self {
        Self {
            head: AtomicU64::new(ObjectHandle::NULL.to_bits()),
            length: AtomicU32::new(0),
        }
    }
}

impl GridBox {
    /// Pushes `handle` onto this box.
    ///
    /// Lock-free: the head is exchanged atomically and the previous head becomes
    /// the successor of `handle`, so concurrent pushes from many threads never
    /// lose an element. The resulting order reflects completion order.
    #[inline]
    pub fn add_object(&self, handle: ObjectHandle, successors: &SuccessorTable) {
        let previous = self.head.swap(handle.to_bits(), Ordering::AcqRel);
        successors.set(handle, ObjectHandle::from_bits(previous));
        self.length.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length.load(Ordering::Acquire) == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length.load(Ordering::Acquire) as usize
    }

    #[inline]
    pub fn head(&self) -> ObjectHandle {
        ObjectHandle::from_bits(self.head.load(Ordering::Acquire))
    }

    pub(crate) fn reset(&mut self) {
        *self.head.get_mut() = ObjectHandle::NULL.to_bits();
        *self.length.get_mut() = 0;
    }

    /// Walks the agents of this box. Must not run concurrently with
    /// [`add_object`](Self::add_object) on the same box.
    pub fn iter<'a>(&self, successors: &'a SuccessorTable) -> BoxIter<'a> {
        BoxIter {
            successors,
            current: self.head(),
            remaining: self.len(),
        }
    }
}

/// Read-only walk along one box's successor chain, exactly `length` steps long.
#[derive(Clone, Debug)]
pub struct BoxIter<'a> {
    successors: &'a SuccessorTable,
    current: ObjectHandle,
    remaining: usize,
}

impl<'a> BoxIter<'a> {
    pub(crate) fn exhausted(successors: &'a SuccessorTable) -> Self {
        Self {
            successors,
            current: ObjectHandle::NULL,
            remaining: 0,
        }
    }
}

impl Iterator for BoxIter<'_> {
    type Item = ObjectHandle;

    #[inline]
    fn next(&mut self) -> Option<ObjectHandle> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.current;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.current = self.successors.get(handle);
        }
        Some(handle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BoxIter<'_> {}
