/// Sentinel bit pattern of the null handle.
const NULL_BITS: u64 = u64::MAX;

/// An opaque reference to one simulation agent.
///
/// A handle names a storage container (e.g. one per NUMA domain) and a slot
/// inside it. The grid never dereferences a handle; it only uses it as a key
/// into the [`SuccessorTable`](crate::SuccessorTable) and hands it back to
/// callers during neighbor iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle {
    container: u32,
    slot: u32,
}

impl ObjectHandle {
    /// The null handle: terminates successor chains and marks empty boxes.
    pub const NULL: ObjectHandle = ObjectHandle {
        container: u32::MAX,
        slot: u32::MAX,
    };

    pub fn new(container: u32, slot: u32) -> Self {
        Self { container, slot }
    }

    pub fn container(&self) -> usize {
        self.container as usize
    }

    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Packs the handle into a single word so it fits in one atomic slot.
    #[inline]
    pub(crate) fn to_bits(self) -> u64 {
        ((self.container as u64) << 32) | self.slot as u64
    }

    #[inline]
    pub(crate) fn from_bits(bits: u64) -> Self {
        if bits == NULL_BITS {
            return Self::NULL;
        }
        Self {
            container: (bits >> 32) as u32,
            slot: bits as u32,
        }
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::NULL
    }
}
