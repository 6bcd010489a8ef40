use crate::config::GridConfig;
use crate::error::SimulationError;
use crate::grid::UniformGrid;
use crate::handle::ObjectHandle;
use crate::neighbors::AdjacencyLevel;
use crate::population::Population;
use crate::store::AgentStore;
use rand::prelude::*;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_ADJACENCY: &'static str = r#"
export const ADJACENCY_NONE = 0;
export const ADJACENCY_FACE = 1;
export const ADJACENCY_EDGE = 2;
export const ADJACENCY_CORNER = 3;
"#;

impl From<SimulationError> for JsValue {
    fn from(err: SimulationError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn adjacency_from_u8(level: u8) -> Result<AdjacencyLevel, SimulationError> {
    match level {
        0 => Ok(AdjacencyLevel::None),
        1 => Ok(AdjacencyLevel::Face),
        2 => Ok(AdjacencyLevel::Edge),
        3 => Ok(AdjacencyLevel::Corner),
        _ => Err(SimulationError::UnknownAdjacency(level)),
    }
}

/// A single-container agent population indexed by a uniform grid.
///
/// Agents are addressed by their index in the flat position array. Removing an
/// agent moves the last agent into its index. Neighbor queries are rejected
/// while agents have changed since the last [`update`](Self::update).
#[wasm_bindgen]
pub struct GridSimulation {
    grid: UniformGrid,
    store: AgentStore,
    stale: bool,
}

#[wasm_bindgen]
impl GridSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(adjacency: u8, fixed_min: Option<i32>, fixed_max: Option<i32>) -> Result<GridSimulation, JsValue> {
        Ok(Self::build(adjacency, fixed_min, fixed_max)?)
    }

    /// Replaces all agents. `positions` is `[x0, y0, z0, x1, ...]`; `diameters`
    /// holds one value per agent or a single value for all.
    pub fn set_agents(&mut self, positions: &[f64], diameters: &[f64]) -> Result<(), JsValue> {
        Ok(self.replace_agents(positions, diameters)?)
    }

    /// Replaces all agents with `count` agents placed uniformly in `[min, max)^3`.
    pub fn random_agents(&mut self, count: usize, min: f64, max: f64, diameter: f64) {
        let mut rng = StdRng::seed_from_u64(get_seed());
        self.store.clear();
        self.stale = true;
        for _ in 0..count {
            let p = [
                rng.gen_range(min..max),
                rng.gen_range(min..max),
                rng.gen_range(min..max),
            ];
            self.store.add_agent(p, diameter);
        }
    }

    pub fn add_agent(&mut self, x: f64, y: f64, z: f64, diameter: f64) -> usize {
        self.stale = true;
        self.store.add_agent([x, y, z], diameter).slot()
    }

    pub fn set_agent_position(&mut self, index: usize, x: f64, y: f64, z: f64) -> Result<(), JsValue> {
        let h = self.handle(index)?;
        self.store.set_position(h, [x, y, z]);
        self.stale = true;
        Ok(())
    }

    pub fn remove_agent(&mut self, index: usize) -> Result<(), JsValue> {
        let h = self.handle(index)?;
        self.store.remove_agent(h);
        self.stale = true;
        Ok(())
    }

    pub fn set_box_length(&mut self, box_length: u32) -> Result<(), JsValue> {
        self.grid
            .set_box_length(box_length)
            .map_err(|e| SimulationError::from(e).into())
    }

    /// Rebuilds the grid from the current agents.
    pub fn update(&mut self) -> Result<(), JsValue> {
        Ok(self.rebuild()?)
    }

    /// Indices of all agents in the Moore neighborhood of agent `index`.
    pub fn neighbors(&self, index: usize) -> Result<Vec<u32>, JsValue> {
        Ok(self.query_neighbors(index)?)
    }

    /// Indices of all agents strictly closer than `radius` to agent `index`.
    pub fn neighbors_within_radius(&self, index: usize, radius: f64) -> Result<Vec<u32>, JsValue> {
        Ok(self.query_neighbors_within_radius(index, radius)?)
    }

    pub fn box_index(&self, x: f64, y: f64, z: f64) -> usize {
        self.grid.get_box_index([x, y, z])
    }

    #[wasm_bindgen(getter)]
    pub fn count_agents(&self) -> usize {
        self.store.len()
    }

    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> Vec<f64> {
        self.store
            .handles()
            .flat_map(|h| self.store.position(h))
            .collect()
    }

    /// `[x_min, x_max, y_min, y_max, z_min, z_max]` of the grid.
    #[wasm_bindgen(getter)]
    pub fn dimensions(&self) -> Vec<i32> {
        self.grid.dimensions().to_array().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn num_boxes(&self) -> usize {
        self.grid.num_boxes()
    }

    #[wasm_bindgen(getter)]
    pub fn box_length(&self) -> u32 {
        self.grid.box_length()
    }

    #[wasm_bindgen(getter)]
    pub fn has_grown(&self) -> bool {
        self.grid.has_grown()
    }
}

impl GridSimulation {
    pub fn build(adjacency: u8, fixed_min: Option<i32>, fixed_max: Option<i32>) -> Result<Self, SimulationError> {
        let mut config = GridConfig::default().with_adjacency(adjacency_from_u8(adjacency)?);
        if let (Some(min), Some(max)) = (fixed_min, fixed_max) {
            config = config.with_fixed_bound(min, max);
        }
        Ok(GridSimulation {
            grid: UniformGrid::new(config)?,
            store: AgentStore::new(),
            stale: false,
        })
    }

    pub fn replace_agents(&mut self, positions: &[f64], diameters: &[f64]) -> Result<(), SimulationError> {
        if positions.len() % 3 != 0 {
            return Err(SimulationError::RaggedPositions);
        }
        let count = positions.len() / 3;
        if diameters.len() != count && diameters.len() != 1 {
            return Err(SimulationError::DiameterCount);
        }
        self.store.clear();
        self.stale = true;
        for (i, p) in positions.chunks_exact(3).enumerate() {
            let d = if diameters.len() == 1 { diameters[0] } else { diameters[i] };
            self.store.add_agent([p[0], p[1], p[2]], d);
        }
        Ok(())
    }

    pub fn rebuild(&mut self) -> Result<(), SimulationError> {
        self.grid.update(&self.store)?;
        self.stale = false;
        Ok(())
    }

    pub fn query_neighbors(&self, index: usize) -> Result<Vec<u32>, SimulationError> {
        let h = self.query_handle(index)?;
        let mut out = Vec::new();
        self.grid
            .for_each_neighbor(&self.store, h, |n| out.push(n.slot() as u32));
        Ok(out)
    }

    pub fn query_neighbors_within_radius(&self, index: usize, radius: f64) -> Result<Vec<u32>, SimulationError> {
        let h = self.query_handle(index)?;
        let mut out = Vec::new();
        self.grid
            .for_each_neighbor_within_radius(&self.store, h, radius * radius, |n| out.push(n.slot() as u32));
        Ok(out)
    }

    /// True while agents changed since the last successful update.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn query_handle(&self, index: usize) -> Result<ObjectHandle, SimulationError> {
        if self.stale {
            return Err(SimulationError::StaleGrid);
        }
        self.handle(index)
    }

    fn handle(&self, index: usize) -> Result<ObjectHandle, SimulationError> {
        if index < self.store.len() {
            Ok(ObjectHandle::new(0, index as u32))
        } else {
            Err(SimulationError::IndexOutOfRange(index))
        }
    }

    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }
}

fn get_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * 4294967296.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        123456789 // Fixed seed for tests
    }
}
