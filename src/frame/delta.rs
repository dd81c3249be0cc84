//! Sparse frames holding only voxels that changed

use std::collections::{BTreeMap, BTreeSet};

use crate::context::ExportContext;
use crate::model::ModelProvider;
use crate::world::{BlockPos, WorldAccess};

use super::sequence::FrameView;
use super::voxel::{resolve_voxel, VoxelState};

/// Voxels whose resolved state differs from the preceding frame
#[derive(Clone, Debug, Default)]
pub struct DeltaFrame {
    time: f64,
    voxels: BTreeMap<BlockPos, VoxelState>,
}

impl DeltaFrame {
    /// Capture the changes at `changed` relative to `prior`.
    ///
    /// Each changed position and its six direct neighbours are re-queried,
    /// since fluids and light move without a direct placement. Expansion is
    /// one level only. Positions outside the captured box are skipped.
    pub fn capture<'a>(
        world: &dyn WorldAccess,
        models: &dyn ModelProvider,
        changed: impl IntoIterator<Item = &'a BlockPos>,
        time: f64,
        prior: &FrameView<'_>,
        ctx: &mut ExportContext,
    ) -> Self {
        let candidates: BTreeSet<BlockPos> = changed
            .into_iter()
            .flat_map(|pos| std::iter::once(*pos).chain(pos.neighbors()))
            .collect();

        let mut voxels = BTreeMap::new();
        for pos in candidates {
            let Some(previous) = prior.voxel(pos) else {
                continue;
            };
            let current = resolve_voxel(world, models, ctx, pos);
            if current != *previous {
                voxels.insert(pos, current);
            }
        }

        Self { time, voxels }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of changed voxels
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// State recorded for `pos`, if it changed in this frame
    pub fn voxel(&self, pos: BlockPos) -> Option<&VoxelState> {
        self.voxels.get(&pos)
    }

    /// Changed voxels in position order
    pub fn voxels(&self) -> impl Iterator<Item = (&BlockPos, &VoxelState)> {
        self.voxels.iter()
    }
}
