//! Per-voxel render state shared by both frame kinds

use log::{debug, warn};

use crate::context::{ExportContext, MeshId};
use crate::model::{ModelEntry, ModelProvider};
use crate::world::{BlockPos, WorldAccess};

/// Resolved render state of one voxel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelState {
    /// Block mesh, `EMPTY_MESH` for air or unrenderable blocks
    pub model: MeshId,
    /// Fluid mesh, if a fluid occupies the voxel
    pub fluid: Option<MeshId>,
    /// Vertex tint for tinted faces, 0xRRGGBB
    pub tint: Option<u32>,
    pub light: u8,
}

/// Query the world at `pos` and resolve it through the registry.
///
/// Blocks or fluids the provider cannot resolve degrade to the empty mesh.
pub fn resolve_voxel(
    world: &dyn WorldAccess,
    models: &dyn ModelProvider,
    ctx: &mut ExportContext,
    pos: BlockPos,
) -> VoxelState {
    let state = world.block_state(pos);

    let (model, tint) = if state.is_air() {
        (ctx.empty_mesh(), None)
    } else {
        let model = match models.block_model(&state) {
            Some((model, _)) if model.is_empty() => {
                debug!("Block {state} at {pos} has no geometry");
                ctx.empty_mesh()
            }
            Some((model, transform)) => ctx.register_model(ModelEntry::new(model, transform)),
            None => {
                warn!("No model for {state} at {pos}, recording as empty");
                ctx.empty_mesh()
            }
        };
        (model, world.block_tint(pos, &state))
    };

    let fluid = if ctx.settings().include_fluids {
        let fluid = world.fluid_state(pos);
        if fluid.is_empty() {
            None
        } else {
            ctx.register_fluid(&fluid, models)
        }
    } else {
        None
    };

    VoxelState {
        model,
        fluid,
        tint,
        light: world.light_level(pos),
    }
}
