//! In-memory world used for headless capture, tests and benches

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{BlockPos, BlockState, FluidState, WorldAccess};

#[derive(Default)]
struct Cells {
    blocks: HashMap<BlockPos, BlockState>,
    fluids: HashMap<BlockPos, FluidState>,
    light: HashMap<BlockPos, u8>,
    tints: HashMap<BlockPos, u32>,
}

/// Sparse, thread-safe voxel world.
///
/// Unset positions are air, dry, fully lit and untinted.
pub struct GridWorld {
    bottom_y: i32,
    top_y: i32,
    cells: RwLock<Cells>,
}

impl GridWorld {
    /// Create an empty world spanning `bottom_y..top_y`
    pub fn new(bottom_y: i32, top_y: i32) -> Self {
        Self {
            bottom_y,
            top_y: top_y.max(bottom_y),
            cells: RwLock::new(Cells::default()),
        }
    }

    /// Set a block, returning the previous state
    pub fn set_block(&self, pos: BlockPos, state: BlockState) -> BlockState {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        let previous = if state.is_air() {
            cells.blocks.remove(&pos)
        } else {
            cells.blocks.insert(pos, state)
        };
        previous.unwrap_or_default()
    }

    /// Set or clear the fluid at a position
    pub fn set_fluid(&self, pos: BlockPos, fluid: FluidState) {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        if fluid.is_empty() {
            cells.fluids.remove(&pos);
        } else {
            cells.fluids.insert(pos, fluid);
        }
    }

    /// Override the light level at a position
    pub fn set_light(&self, pos: BlockPos, level: u8) {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        cells.light.insert(pos, level.min(15));
    }

    /// Set the tint color (0xRRGGBB) at a position
    pub fn set_tint(&self, pos: BlockPos, rgb: u32) {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        cells.tints.insert(pos, rgb & 0x00FF_FFFF);
    }

    /// Fill the inclusive box `from..=to` with one block state
    pub fn fill(&self, from: BlockPos, to: BlockPos, state: &BlockState) {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for z in from.z.min(to.z)..=from.z.max(to.z) {
                for x in from.x.min(to.x)..=from.x.max(to.x) {
                    self.set_block(BlockPos::new(x, y, z), state.clone());
                }
            }
        }
    }

    /// Number of non-air blocks stored
    pub fn block_count(&self) -> usize {
        self.cells.read().unwrap_or_else(PoisonError::into_inner).blocks.len()
    }
}

impl WorldAccess for GridWorld {
    fn bottom_y(&self) -> i32 {
        self.bottom_y
    }

    fn top_y(&self) -> i32 {
        self.top_y
    }

    fn block_state(&self, pos: BlockPos) -> BlockState {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.blocks.get(&pos).cloned().unwrap_or_default()
    }

    fn fluid_state(&self, pos: BlockPos) -> FluidState {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.fluids.get(&pos).cloned().unwrap_or_default()
    }

    fn light_level(&self, pos: BlockPos) -> u8 {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.light.get(&pos).copied().unwrap_or(15)
    }

    fn block_tint(&self, pos: BlockPos, _state: &BlockState) -> Option<u32> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.tints.get(&pos).copied()
    }
}
