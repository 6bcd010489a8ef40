use crate::handle::ObjectHandle;
use crate::population::{self, Population};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stable identifier of an agent; unlike a handle it survives removals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentUid(pub u64);

#[derive(Debug, Default)]
struct Container {
    positions: Vec<[f64; 3]>,
    diameters: Vec<f64>,
    uids: Vec<AgentUid>,
    box_indices: Vec<AtomicUsize>,
}

impl Container {
    fn len(&self) -> usize {
        self.positions.len()
    }
}

/// A simple agent store: struct-of-arrays storage split over one or more
/// containers (e.g. one per NUMA domain).
///
/// Removing an agent moves the last agent of its container into the freed
/// slot, so handles are only valid until the next removal.
#[derive(Debug)]
pub struct AgentStore {
    containers: Vec<Container>,
    next_uid: u64,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::with_containers(1)
    }

    /// Creates a store with `n` containers (at least one).
    pub fn with_containers(n: usize) -> Self {
        Self {
            containers: (0..n.max(1)).map(|_| Container::default()).collect(),
            next_uid: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.containers.iter().map(Container::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds an agent to the least populated container.
    pub fn add_agent(&mut self, position: [f64; 3], diameter: f64) -> ObjectHandle {
        let idx = (0..self.containers.len())
            .min_by_key(|&i| self.containers[i].len())
            .unwrap_or(0);
        let container = &mut self.containers[idx];
        let uid = AgentUid(self.next_uid);
        self.next_uid += 1;
        container.positions.push(position);
        container.diameters.push(diameter);
        container.uids.push(uid);
        container.box_indices.push(AtomicUsize::new(0));
        ObjectHandle::new(idx as u32, (container.len() - 1) as u32)
    }

    /// Removes the agent behind `handle`, returning its uid.
    pub fn remove_agent(&mut self, handle: ObjectHandle) -> Option<AgentUid> {
        let container = self.containers.get_mut(handle.container())?;
        let slot = handle.slot();
        if slot >= container.len() {
            return None;
        }
        container.positions.swap_remove(slot);
        container.diameters.swap_remove(slot);
        container.box_indices.swap_remove(slot);
        Some(container.uids.swap_remove(slot))
    }

    pub fn remove_by_uid(&mut self, uid: AgentUid) -> bool {
        match self.handle_of(uid) {
            Some(h) => self.remove_agent(h).is_some(),
            None => false,
        }
    }

    pub fn handle_of(&self, uid: AgentUid) -> Option<ObjectHandle> {
        self.containers.iter().enumerate().find_map(|(c, container)| {
            container
                .uids
                .iter()
                .position(|&u| u == uid)
                .map(|slot| ObjectHandle::new(c as u32, slot as u32))
        })
    }

    pub fn uid(&self, handle: ObjectHandle) -> AgentUid {
        self.containers[handle.container()].uids[handle.slot()]
    }

    pub fn set_position(&mut self, handle: ObjectHandle, position: [f64; 3]) {
        self.containers[handle.container()].positions[handle.slot()] = position;
    }

    pub fn set_diameter(&mut self, handle: ObjectHandle, diameter: f64) {
        self.containers[handle.container()].diameters[handle.slot()] = diameter;
    }

    pub fn clear(&mut self) {
        let n = self.containers.len();
        self.containers = (0..n).map(|_| Container::default()).collect();
    }

    /// Handles of all agents, container by container.
    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        population::handles(self)
    }
}

impl Default for AgentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Population for AgentStore {
    fn num_agents(&self) -> usize {
        self.len()
    }

    fn container_sizes(&self) -> Vec<usize> {
        self.containers.iter().map(Container::len).collect()
    }

    #[inline]
    fn position(&self, handle: ObjectHandle) -> [f64; 3] {
        self.containers[handle.container()].positions[handle.slot()]
    }

    #[inline]
    fn diameter(&self, handle: ObjectHandle) -> f64 {
        self.containers[handle.container()].diameters[handle.slot()]
    }

    #[inline]
    fn set_box_index(&self, handle: ObjectHandle, box_idx: usize) {
        self.containers[handle.container()].box_indices[handle.slot()].store(box_idx, Ordering::Relaxed);
    }

    #[inline]
    fn box_index(&self, handle: ObjectHandle) -> usize {
        self.containers[handle.container()].box_indices[handle.slot()].load(Ordering::Relaxed)
    }
}
