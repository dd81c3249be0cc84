//! Model resolution collaborator and a table-driven implementation

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::types::{Vec2, Vec3};
use crate::material::TRANSPARENT_TINTED_MAT;
use crate::mesh::{Mesh, MeshBuilder};
use crate::world::{BlockState, FluidState};

use super::{BlockModel, ModelTransform};

/// Resolves block states to model geometry and fluids to meshes.
///
/// Returning `None` means "nothing renderable"; capture records the
/// empty mesh for that voxel instead of failing.
pub trait ModelProvider: Send + Sync {
    /// Geometry and orientation for a block state
    fn block_model(&self, state: &BlockState) -> Option<(Arc<BlockModel>, ModelTransform)>;

    /// Mesh for a fluid state. Fluids skip the model indirection.
    fn fluid_mesh(&self, fluid: &FluidState) -> Option<Mesh>;
}

/// Atlas region used by one fluid type
#[derive(Clone, Copy, Debug)]
struct FluidTexture {
    uv_min: Vec2,
    uv_max: Vec2,
}

/// Lookup table from block name to model.
///
/// A `facing` property rotates the model about Y; every other property
/// shares the block's geometry.
#[derive(Default)]
pub struct ModelTable {
    blocks: HashMap<String, Arc<BlockModel>>,
    fluids: HashMap<String, FluidTexture>,
}

impl ModelTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the model for a block name
    pub fn insert_block(&mut self, block: impl Into<String>, model: BlockModel) {
        self.blocks.insert(block.into(), Arc::new(model));
    }

    /// Register the atlas region for a fluid type
    pub fn insert_fluid(&mut self, fluid: impl Into<String>, uv_min: Vec2, uv_max: Vec2) {
        self.fluids.insert(fluid.into(), FluidTexture { uv_min, uv_max });
    }

    /// Builder form of [`ModelTable::insert_block`]
    pub fn with_block(mut self, block: impl Into<String>, model: BlockModel) -> Self {
        self.insert_block(block, model);
        self
    }

    /// Builder form of [`ModelTable::insert_fluid`]
    pub fn with_fluid(mut self, fluid: impl Into<String>, uv_min: Vec2, uv_max: Vec2) -> Self {
        self.insert_fluid(fluid, uv_min, uv_max);
        self
    }

    /// Number of block models registered
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl ModelProvider for ModelTable {
    fn block_model(&self, state: &BlockState) -> Option<(Arc<BlockModel>, ModelTransform)> {
        let model = self.blocks.get(&state.block)?;
        let transform = state
            .property("facing")
            .map(ModelTransform::from_facing)
            .unwrap_or_default();
        Some((Arc::clone(model), transform))
    }

    fn fluid_mesh(&self, fluid: &FluidState) -> Option<Mesh> {
        let tex = self.fluids.get(&fluid.fluid)?;
        let height = if fluid.falling {
            1.0
        } else {
            f32::from(fluid.level.min(8)) / 9.0
        };

        let (u0, v0, u1, v1) = (tex.uv_min.x, tex.uv_min.y, tex.uv_max.x, tex.uv_max.y);
        let uvs = [
            Vec2::new(u0, v1),
            Vec2::new(u1, v1),
            Vec2::new(u1, v0),
            Vec2::new(u0, v0),
        ];
        let h = height;
        let faces = [
            // Surface
            [[0.0, h, 0.0], [0.0, h, 1.0], [1.0, h, 1.0], [1.0, h, 0.0]],
            // North, south, west, east
            [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, h, 0.0], [1.0, h, 0.0]],
            [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, h, 1.0], [0.0, h, 1.0]],
            [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, h, 1.0], [0.0, h, 0.0]],
            [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, h, 0.0], [1.0, h, 1.0]],
        ];

        let mut builder = MeshBuilder::new();
        for face in faces {
            builder.quad(face.map(Vec3::from_array), uvs, 0, TRANSPARENT_TINTED_MAT);
        }
        Some(builder.build())
    }
}
