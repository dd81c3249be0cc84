//! World query interface consumed by frame capture
//!
//! The live world belongs to the host. Capture only reads it through
//! [`WorldAccess`], once per voxel per frame.

pub mod pos;
pub mod state;
pub mod grid;

pub use pos::{BlockPos, ChunkBox, ChunkPos, CHUNK_WIDTH};
pub use state::{BlockState, FluidState};
pub use grid::GridWorld;

/// Read access to block, fluid and light state.
///
/// Implementations must be cheap to call repeatedly; a keyframe queries
/// every voxel of the capture box.
pub trait WorldAccess: Send + Sync {
    /// Lowest buildable Y (inclusive)
    fn bottom_y(&self) -> i32;

    /// Highest buildable Y (exclusive)
    fn top_y(&self) -> i32;

    /// Block state at a position. Unloaded positions report air.
    fn block_state(&self, pos: BlockPos) -> BlockState;

    /// Fluid state at a position
    fn fluid_state(&self, pos: BlockPos) -> FluidState;

    /// Combined light level (0-15)
    fn light_level(&self, _pos: BlockPos) -> u8 {
        15
    }

    /// Biome/color tint applied to tinted faces, as 0xRRGGBB
    fn block_tint(&self, _pos: BlockPos, _state: &BlockState) -> Option<u32> {
        None
    }

    /// Number of block layers in the world's height range
    fn height(&self) -> i32 {
        (self.top_y() - self.bottom_y()).max(0)
    }
}
