use crate::handle::ObjectHandle;
use rayon::prelude::*;

/// The narrow view of the agent storage that the grid needs.
///
/// The grid reads positions and diameters, writes each agent's box index back,
/// and never holds on to an agent between rebuilds. `set_box_index` is called
/// concurrently from the rebuild's worker threads, so implementations keep the
/// tag in an atomic or otherwise thread-safe slot.
pub trait Population: Sync {
    /// Number of live agents.
    fn num_agents(&self) -> usize;

    /// Live agents per storage container; handles are `(container, 0..size)`.
    fn container_sizes(&self) -> Vec<usize>;

    fn position(&self, handle: ObjectHandle) -> [f64; 3];

    fn diameter(&self, handle: ObjectHandle) -> f64;

    /// Records the box an agent was assigned to during the last rebuild.
    fn set_box_index(&self, handle: ObjectHandle, box_idx: usize);

    /// Box index recorded by the last rebuild.
    fn box_index(&self, handle: ObjectHandle) -> usize;
}

/// All handles of `population` as a parallel iterator, split into work items of
/// at least `chunk` agents that rayon distributes dynamically.
pub fn par_handles<P>(population: &P, chunk: usize) -> impl ParallelIterator<Item = ObjectHandle>
where
    P: Population + ?Sized,
{
    let chunk = chunk.max(1);
    population
        .container_sizes()
        .into_par_iter()
        .enumerate()
        .flat_map(move |(container, size)| {
            (0..size as u32)
                .into_par_iter()
                .with_min_len(chunk)
                .map(move |slot| ObjectHandle::new(container as u32, slot))
        })
}

/// All handles of `population` in container-then-slot order.
pub fn handles<P>(population: &P) -> impl Iterator<Item = ObjectHandle>
where
    P: Population + ?Sized,
{
    population
        .container_sizes()
        .into_iter()
        .enumerate()
        .flat_map(|(container, size)| (0..size as u32).map(move |slot| ObjectHandle::new(container as u32, slot)))
}
