use thiserror::Error;

/// Fatal conditions that abort a grid rebuild.
///
/// None of these resolve by retrying: they point at a configuration problem
/// or at agents that were never properly initialized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// No agents and no fixed bound, so the simulation space has no extent.
    #[error(
        "cannot size an empty simulation without a fixed bound; add agents or configure a fixed bound"
    )]
    EmptyUnbounded,
    /// The largest agent diameter rounds up to a non-positive box length.
    #[error(
        "largest object size {largest_object_size} gives a non-positive box length; check that agent diameters are initialized"
    )]
    NonPositiveBoxLength { largest_object_size: f64 },
    /// A custom box length of zero was requested.
    #[error("invalid box length {0}: must be at least 1")]
    InvalidBoxLength(u32),
    /// The fixed bound is inverted or empty.
    #[error("invalid fixed bound [{min}, {max}]: min must be below max")]
    InvalidFixedBound { min: i32, max: i32 },
}

/// Failures of the [`GridSimulation`](crate::wasm::GridSimulation) facade;
/// turned into JS errors at the wasm boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Grid(#[from] GridError),
    /// Agents changed since the last update, so box tags are stale.
    #[error("agents changed since the last update; call update() before querying neighbors")]
    StaleGrid,
    #[error("agent index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("unknown adjacency level {0}")]
    UnknownAdjacency(u8),
    #[error("positions must be a multiple of 3 coordinates")]
    RaggedPositions,
    #[error("expected one diameter per agent or a single shared diameter")]
    DiameterCount,
}
