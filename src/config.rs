use crate::bounds::FixedBound;
use crate::error::GridError;
use crate::neighbors::AdjacencyLevel;
use serde::{Deserialize, Serialize};

/// Default minimum number of agents per parallel work item during a rebuild.
pub const DEFAULT_PARALLEL_CHUNK: usize = 1000;

/// How agents that modify their neighbors are kept from racing each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadSafetyMechanism {
    /// No protection.
    None,
    /// Callers protect their own critical regions.
    #[default]
    UserSpecified,
    /// The grid maintains one spinlock per box and hands out neighborhood locks.
    Automatic,
}

/// Grid settings passed in by the owning simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Which surrounding boxes take part in neighbor queries.
    pub adjacency: AdjacencyLevel,
    /// Closed simulation space; required when the grid is built without agents.
    pub fixed_bound: Option<FixedBound>,
    /// Overrides the box length derived from the largest agent.
    pub box_length: Option<u32>,
    pub thread_safety: ThreadSafetyMechanism,
    /// Minimum agents per parallel work item when assigning agents to boxes.
    pub parallel_chunk: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            adjacency: AdjacencyLevel::Corner,
            fixed_bound: None,
            box_length: None,
            thread_safety: ThreadSafetyMechanism::UserSpecified,
            parallel_chunk: DEFAULT_PARALLEL_CHUNK,
        }
    }
}

impl GridConfig {
    pub fn with_adjacency(mut self, adjacency: AdjacencyLevel) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn with_fixed_bound(mut self, min: i32, max: i32) -> Self {
        self.fixed_bound = Some(FixedBound::new(min, max));
        self
    }

    pub fn with_box_length(mut self, box_length: u32) -> Self {
        self.box_length = Some(box_length);
        self
    }

    pub fn with_thread_safety(mut self, mechanism: ThreadSafetyMechanism) -> Self {
        self.thread_safety = mechanism;
        self
    }

    pub fn with_parallel_chunk(mut self, chunk: usize) -> Self {
        self.parallel_chunk = chunk;
        self
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if let Some(FixedBound { min, max }) = self.fixed_bound {
            if min >= max {
                return Err(GridError::InvalidFixedBound { min, max });
            }
        }
        if self.box_length == Some(0) {
            return Err(GridError::InvalidBoxLength(0));
        }
        Ok(())
    }
}
