//! # agentgrid
//!
//! `agentgrid` is a uniform-grid spatial index for agent-based simulations, usable from Rust
//! as well as compiled to WebAssembly (WASM). Once per simulation step the grid is rebuilt from
//! the positions and diameters of all agents; afterwards neighbor queries run read-only from
//! any number of threads.
//!
//! ## Features
//!
//! - **Lock-free rebuild**: agents are pushed into boxes from rayon workers through atomic
//!   intrusive lists, no per-box locking.
//! - **Moore-neighborhood queries**: iterate the agents of a box and its face, edge or corner
//!   neighbors, optionally filtered by squared distance.
//! - **Neighborhood locks**: deadlock-free locking of a box and all its neighbors for agents
//!   that modify each other.
//! - **Z-order sweeps**: visit all agents box by box in Morton order, serially or split into
//!   ranges of equal agent count.
//! - **WASM-first facade**: [`wasm::GridSimulation`] over flat coordinate arrays.
//!
//! ## Main Interface
//!
//! The primary entry point is [`UniformGrid`], which indexes anything implementing
//! [`Population`]. [`AgentStore`] is a ready-made population.

mod bounds;
mod config;
mod error;
mod grid;
mod grid_box;
mod handle;
mod indexer;
mod mutex;
mod neighbors;
mod population;
mod store;
mod successors;
mod zorder;
pub mod wasm;

pub use bounds::{BoundingBox, DimensionThresholds, FixedBound, GridDimensions};
pub use config::{GridConfig, ThreadSafetyMechanism, DEFAULT_PARALLEL_CHUNK};
pub use error::{GridError, SimulationError};
pub use grid::{grid_dimensions_for, UniformGrid};
pub use grid_box::{BoxIter, GridBox};
pub use handle::ObjectHandle;
pub use indexer::BoxIndexer;
pub use mutex::{NeighborLock, NeighborLockGuard, NeighborMutexBuilder};
pub use neighbors::{
    half_moore_offsets, squared_euclidean_distance, within_squared_euclidean_distance,
    AdjacencyLevel, BoxSet, MooreOffsets, NeighborIterator, HALF_MOORE_BOXES, MAX_MOORE_BOXES,
};
pub use population::{handles, par_handles, Population};
pub use store::{AgentStore, AgentUid};
pub use successors::SuccessorTable;
pub use zorder::{morton_encode, ZOrderIndex, MORTON_BITS};
