//! Full snapshots of the capture box

use crate::context::ExportContext;
use crate::model::ModelProvider;
use crate::world::{BlockPos, ChunkBox, WorldAccess};

use super::voxel::{resolve_voxel, VoxelState};

/// Every voxel of the capture box at one timestamp, stored densely in
/// [`ChunkBox::positions`] order.
#[derive(Clone, Debug)]
pub struct Keyframe {
    time: f64,
    bounds: ChunkBox,
    bottom_y: i32,
    top_y: i32,
    voxels: Vec<VoxelState>,
}

impl Keyframe {
    /// Capture the whole box from the world's bottom to its top
    pub fn capture(
        world: &dyn WorldAccess,
        models: &dyn ModelProvider,
        bounds: ChunkBox,
        ctx: &mut ExportContext,
        time: f64,
    ) -> Self {
        let (bottom_y, top_y) = (world.bottom_y(), world.top_y());
        let voxels = bounds
            .positions(bottom_y, top_y)
            .map(|pos| resolve_voxel(world, models, ctx, pos))
            .collect();

        Self {
            time,
            bounds,
            bottom_y,
            top_y,
            voxels,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn bounds(&self) -> ChunkBox {
        self.bounds
    }

    pub fn bottom_y(&self) -> i32 {
        self.bottom_y
    }

    /// Number of block layers captured
    pub fn height(&self) -> i32 {
        self.top_y - self.bottom_y
    }

    /// Number of voxels, always the box volume
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Voxel state at a position, `None` outside the box
    pub fn voxel(&self, pos: BlockPos) -> Option<&VoxelState> {
        let index = self.bounds.index_of(pos, self.bottom_y, self.top_y)?;
        self.voxels.get(index)
    }

    /// Voxels in dense box order
    pub fn voxels(&self) -> &[VoxelState] {
        &self.voxels
    }
}
