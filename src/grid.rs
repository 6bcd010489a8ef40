use crate::bounds::{BoundingBox, DimensionThresholds, GridDimensions};
use crate::config::{GridConfig, ThreadSafetyMechanism};
use crate::error::GridError;
use crate::grid_box::GridBox;
use crate::handle::ObjectHandle;
use crate::indexer::BoxIndexer;
use crate::mutex::NeighborMutexBuilder;
use crate::neighbors::{
    half_moore_offsets, within_squared_euclidean_distance, AdjacencyLevel, BoxSet, MooreOffsets,
    NeighborIterator, HALF_MOORE_BOXES,
};
use crate::population::{par_handles, Population};
use crate::successors::SuccessorTable;
use crate::zorder::ZOrderIndex;
use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

/// Neighbors whose squared distance is computed together.
const DISTANCE_BATCH: usize = 64;

/// Uniform-grid spatial index over all agents of a simulation.
///
/// Space is cut into cubic boxes whose edge is the largest agent diameter
/// (rounded up), so every agent closer than one diameter to a query agent lies
/// in the query's box or one of its 26 neighbors. The grid is rebuilt from the
/// full population by [`update`](Self::update) once per step and then queried
/// read-only, possibly from many threads.
#[derive(Debug)]
pub struct UniformGrid {
    config: GridConfig,
    initialized: bool,
    boxes: Vec<GridBox>,
    successors: SuccessorTable,
    indexer: BoxIndexer,
    offsets: MooreOffsets,
    dimensions: GridDimensions,
    thresholds: DimensionThresholds,
    largest_object_size: f64,
    has_grown: bool,
    zorder: ZOrderIndex,
    mutex_builder: Option<NeighborMutexBuilder>,
}

impl UniformGrid {
    /// Creates an empty grid; nothing is indexed until the first update.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        let offsets = MooreOffsets::new(0, 0, config.adjacency);
        let mutex_builder = match config.thread_safety {
            ThreadSafetyMechanism::Automatic => Some(NeighborMutexBuilder::new(offsets, 0)),
            _ => None,
        };
        Ok(Self {
            config,
            initialized: false,
            boxes: Vec::new(),
            successors: SuccessorTable::new(),
            indexer: BoxIndexer::empty(),
            offsets,
            dimensions: GridDimensions::unset(),
            thresholds: DimensionThresholds::unset(),
            largest_object_size: 0.0,
            has_grown: false,
            zorder: ZOrderIndex::new(),
            mutex_builder,
        })
    }

    /// Fixes the adjacency level and performs the first rebuild.
    pub fn initialize<P>(&mut self, population: &P, adjacency: AdjacencyLevel) -> Result<(), GridError>
    where
        P: Population + ?Sized,
    {
        self.config.adjacency = adjacency;
        self.update(population)
    }

    /// Rebuilds the grid from the current positions and diameters of all agents.
    pub fn update<P>(&mut self, population: &P) -> Result<(), GridError>
    where
        P: Population + ?Sized,
    {
        let num_agents = population.num_agents();
        let _span = info_span!("UniformGrid::update", n_agents = num_agents).entered();
        self.has_grown = false;

        if num_agents == 0 {
            return self.update_without_agents();
        }

        let chunk = self.config.parallel_chunk;
        let (bounds, largest) = {
            let _s = info_span!("reduce_bounds").entered();
            par_handles(population, chunk)
                .fold(
                    || (BoundingBox::empty(), 0.0f64),
                    |(mut bounds, largest), h| {
                        bounds.include(population.position(h));
                        (bounds, largest.max(population.diameter(h)))
                    },
                )
                .reduce(
                    || (BoundingBox::empty(), 0.0f64),
                    |(a, la), (b, lb)| (a.merge(b), la.max(lb)),
                )
        };
        self.largest_object_size = largest;

        let box_length = self.resolve_box_length(largest)?;
        let dimensions = grid_dimensions_for(&bounds, box_length);
        self.apply_dimensions(dimensions, box_length);
        self.check_grid_growth();

        self.successors.resize(&population.container_sizes());
        {
            let _s = info_span!("assign_to_boxes").entered();
            let indexer = &self.indexer;
            let boxes = &self.boxes;
            let successors = &self.successors;
            par_handles(population, chunk).for_each(|h| {
                let idx = indexer.position_to_linear(population.position(h));
                boxes[idx].add_object(h, successors);
                population.set_box_index(h, idx);
            });
        }

        if let Some(builder) = self.mutex_builder.as_mut() {
            builder.update(self.offsets, self.boxes.len());
        }
        self.initialized = true;
        Ok(())
    }

    fn update_without_agents(&mut self) -> Result<(), GridError> {
        if self.initialized {
            // Everything was removed since the last step: keep the extent.
            self.boxes.par_iter_mut().for_each(GridBox::reset);
            self.successors.clear();
            return Ok(());
        }
        let Some(bound) = self.config.fixed_bound else {
            return Err(GridError::EmptyUnbounded);
        };
        self.dimensions = GridDimensions::cube(bound.min, bound.max);
        self.thresholds = bound.into();
        self.has_grown = true;
        self.initialized = true;
        debug!(min = bound.min, max = bound.max, "grid seeded from fixed bound");
        Ok(())
    }

    fn resolve_box_length(&self, largest: f64) -> Result<u32, GridError> {
        if let Some(custom) = self.config.box_length {
            if (custom as f64) < largest {
                warn!(
                    box_length = custom,
                    largest_object_size = largest,
                    "custom box length is smaller than the largest agent; neighbor queries may miss agents"
                );
            }
            return Ok(custom);
        }
        let length = largest.ceil();
        if !(length > 0.0) {
            return Err(GridError::NonPositiveBoxLength {
                largest_object_size: largest,
            });
        }
        Ok(length.min(u32::MAX as f64) as u32)
    }

    fn apply_dimensions(&mut self, dimensions: GridDimensions, box_length: u32) {
        self.dimensions = dimensions;
        self.indexer = BoxIndexer::new(&dimensions, box_length);
        self.offsets = MooreOffsets::new(
            self.indexer.num_boxes_axis()[0],
            self.indexer.num_boxes_xy(),
            self.config.adjacency,
        );

        let n = self.indexer.num_boxes();
        self.boxes.truncate(n);
        self.boxes.par_iter_mut().for_each(GridBox::reset);
        if self.boxes.capacity() < n {
            self.boxes.reserve(2 * n - self.boxes.len());
        }
        self.boxes.resize_with(n, GridBox::default);

        debug!(
            dimensions = ?dimensions.to_array(),
            box_length,
            num_boxes_axis = ?self.indexer.num_boxes_axis(),
            num_boxes = n,
            "grid rebuilt"
        );
    }

    fn check_grid_growth(&mut self) {
        let (below, above) = self.thresholds.expand_to(&self.dimensions);
        if above {
            info!(
                "agents are getting near the edge of the simulation space; be aware of boundary conditions"
            );
        }
        self.has_grown = below || above;
        if let Some(bound) = self.config.fixed_bound {
            // Closed space: compare against the bound again on the next update.
            self.thresholds = bound.into();
        }
    }

    /// Index of the box containing `position`.
    #[inline]
    pub fn get_box_index(&self, position: [f64; 3]) -> usize {
        self.indexer.position_to_linear(position)
    }

    /// Box coordinate `(x, y, z)` of a linear box index, `None` if the grid
    /// has no such box.
    pub fn box_coordinates(&self, box_idx: usize) -> Option<[usize; 3]> {
        (box_idx < self.indexer.num_boxes()).then(|| self.indexer.linear_to_coordinate(box_idx))
    }

    /// `box_idx` followed by the neighbor boxes selected by the adjacency level.
    #[inline]
    pub fn moore_box_indices(&self, box_idx: usize) -> BoxSet {
        self.offsets.boxes_around(box_idx)
    }

    /// `box_idx` and one box of each of the 13 centro-symmetric neighbor pairs.
    pub fn half_moore_box_indices(&self, box_idx: usize) -> [usize; HALF_MOORE_BOXES] {
        half_moore_offsets(self.indexer.num_boxes_axis()[0], self.indexer.num_boxes_xy())
            .map(|off| box_idx.wrapping_add_signed(off))
    }

    /// All agents in the Moore neighborhood of `box_idx`, the box's own included.
    pub fn neighbor_iter(&self, box_idx: usize) -> NeighborIterator<'_> {
        NeighborIterator::new(&self.boxes, &self.successors, self.moore_box_indices(box_idx))
    }

    /// Calls `visit` on every agent in the query's Moore neighborhood except
    /// the query itself. No distance filtering.
    pub fn for_each_neighbor<P, F>(&self, population: &P, query: ObjectHandle, mut visit: F)
    where
        P: Population + ?Sized,
        F: FnMut(ObjectHandle),
    {
        for h in self.neighbor_iter(population.box_index(query)) {
            if h != query {
                visit(h);
            }
        }
    }

    /// Like [`for_each_neighbor`](Self::for_each_neighbor) but also passes the
    /// squared distance to the query, computed in batches.
    pub fn for_each_neighbor_with_distance<P, F>(&self, population: &P, query: ObjectHandle, mut visit: F)
    where
        P: Population + ?Sized,
        F: FnMut(ObjectHandle, f64),
    {
        let origin = population.position(query);
        let mut batch = DistanceBatch::new();
        for h in self.neighbor_iter(population.box_index(query)) {
            if h == query {
                continue;
            }
            batch.push(h, population.position(h));
            if batch.is_full() {
                batch.flush(origin, &mut visit);
            }
        }
        batch.flush(origin, &mut visit);
    }

    /// Calls `visit` on every neighbor strictly closer than `sqrt(squared_radius)`.
    pub fn for_each_neighbor_within_radius<P, F>(
        &self,
        population: &P,
        query: ObjectHandle,
        squared_radius: f64,
        mut visit: F,
    ) where
        P: Population + ?Sized,
        F: FnMut(ObjectHandle),
    {
        let origin = population.position(query);
        for h in self.neighbor_iter(population.box_index(query)) {
            if h != query && within_squared_euclidean_distance(squared_radius, origin, population.position(h)) {
                visit(h);
            }
        }
    }

    /// Rebuilds the z-order view and visits every agent once, box by box in
    /// Morton order. Agents inside a box come in no particular order.
    pub fn iterate_in_zorder<F>(&mut self, visit: F)
    where
        F: FnMut(ObjectHandle),
    {
        self.rebuild_zorder();
        self.zorder.for_each(&self.boxes, &self.successors, visit);
    }

    /// Rebuilds the z-order view and visits every agent once from rayon
    /// workers, each taking a contiguous run of equal agent count.
    pub fn par_iterate_in_zorder<F>(&mut self, visit: F)
    where
        F: Fn(ObjectHandle) + Sync + Send,
    {
        self.rebuild_zorder();
        let total = self.zorder.num_agents();
        if total == 0 {
            return;
        }
        let chunk = total.div_ceil(rayon::current_num_threads() * 8).max(1);
        let zorder = &self.zorder;
        let boxes = &self.boxes;
        let successors = &self.successors;
        (0..total.div_ceil(chunk)).into_par_iter().for_each(|c| {
            zorder.for_each_in_range(boxes, successors, c * chunk, (c + 1) * chunk, &visit);
        });
    }

    fn rebuild_zorder(&mut self) {
        let _s = info_span!("zorder_rebuild", n_boxes = self.boxes.len()).entered();
        self.zorder.rebuild(&self.indexer, &self.boxes);
    }

    /// The z-order view as of the last z-order sweep.
    pub fn zorder_index(&self) -> &ZOrderIndex {
        &self.zorder
    }

    /// Present only with [`ThreadSafetyMechanism::Automatic`].
    pub fn neighbor_mutex_builder(&self) -> Option<&NeighborMutexBuilder> {
        self.mutex_builder.as_ref()
    }

    /// Sets a box length to use instead of the largest agent diameter from the
    /// next update on.
    pub fn set_box_length(&mut self, box_length: u32) -> Result<(), GridError> {
        if box_length == 0 {
            return Err(GridError::InvalidBoxLength(box_length));
        }
        self.config.box_length = Some(box_length);
        Ok(())
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn adjacency(&self) -> AdjacencyLevel {
        self.config.adjacency
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// `true` if the last update expanded the grid past every earlier extent.
    pub fn has_grown(&self) -> bool {
        self.has_grown
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn dimension_thresholds(&self) -> DimensionThresholds {
        self.thresholds
    }

    pub fn num_boxes(&self) -> usize {
        self.boxes.len()
    }

    pub fn num_boxes_axis(&self) -> [usize; 3] {
        self.indexer.num_boxes_axis()
    }

    pub fn box_length(&self) -> u32 {
        self.indexer.box_length()
    }

    pub fn largest_object_size(&self) -> f64 {
        self.largest_object_size
    }

    /// Default search radius for neighbor queries, squared.
    pub fn largest_object_size_squared(&self) -> f64 {
        self.largest_object_size * self.largest_object_size
    }

    pub fn boxes(&self) -> &[GridBox] {
        &self.boxes
    }

    pub fn successors(&self) -> &SuccessorTable {
        &self.successors
    }

    pub fn indexer(&self) -> &BoxIndexer {
        &self.indexer
    }
}

/// Integer grid extent for agents inside `bounds`.
///
/// Bounds are rounded outwards, each axis is extended to a multiple of
/// `box_length` (by a whole extra box if it already was one, as the outermost
/// agent then sits exactly on the border), and one box of padding is added on
/// every side so neighbor offsets never leave the box array.
pub fn grid_dimensions_for(bounds: &BoundingBox, box_length: u32) -> GridDimensions {
    let len = box_length as i32;
    let mut min = [0i32; 3];
    let mut max = [0i32; 3];
    for axis in 0..3 {
        min[axis] = bounds.min[axis].floor() as i32;
        max[axis] = bounds.max[axis].ceil() as i32;
        let r = (max[axis] - min[axis]) % len;
        max[axis] += if r != 0 { len - r } else { len };
        min[axis] -= len;
        max[axis] += len;
    }
    GridDimensions::new(min, max)
}

/// Fixed-size staging area for neighbor positions awaiting a distance pass.
struct DistanceBatch {
    handles: [ObjectHandle; DISTANCE_BATCH],
    x: [f64; DISTANCE_BATCH],
    y: [f64; DISTANCE_BATCH],
    z: [f64; DISTANCE_BATCH],
    len: usize,
}

impl DistanceBatch {
    fn new() -> Self {
        Self {
            handles: [ObjectHandle::NULL; DISTANCE_BATCH],
            x: [0.0; DISTANCE_BATCH],
            y: [0.0; DISTANCE_BATCH],
            z: [0.0; DISTANCE_BATCH],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, handle: ObjectHandle, pos: [f64; 3]) {
        self.handles[self.len] = handle;
        self.x[self.len] = pos[0];
        self.y[self.len] = pos[1];
        self.z[self.len] = pos[2];
        self.len += 1;
    }

    fn is_full(&self) -> bool {
        self.len == DISTANCE_BATCH
    }

    fn flush<F: FnMut(ObjectHandle, f64)>(&mut self, origin: [f64; 3], visit: &mut F) {
        let n = self.len;
        let mut squared = [0.0f64; DISTANCE_BATCH];
        for i in 0..n {
            let dx = self.x[i] - origin[0];
            let dy = self.y[i] - origin[1];
            let dz = self.z[i] - origin[2];
            squared[i] = dx * dx + dy * dy + dz * dz;
        }
        for i in 0..n {
            visit(self.handles[i], squared[i]);
        }
        self.len = 0;
    }
}
