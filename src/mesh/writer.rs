//! Conversion of deduplicated model entries into meshes

use std::collections::HashMap;

use rand::Rng;

use crate::material::material_name;
use crate::model::{ModelEntry, ModelVariant};

use super::{Mesh, MeshBuilder};

/// Id of the canonical zero-geometry mesh. Always present in an archive;
/// fluid meshes fall back to it.
pub const EMPTY_MESH: &str = "EMPTY_MESH";

/// A written mesh and the number of material layers it uses
#[derive(Clone, Debug)]
pub struct MeshInfo {
    pub mesh: Mesh,
    pub num_layers: u32,
}

/// Stateless mesh generation for model entries
pub struct MeshWriter;

impl MeshWriter {
    /// Build the mesh for a model entry.
    ///
    /// The only random decision is the weighted variant pick, drawn from
    /// `rng` and only when the model has more than one variant. A quad whose
    /// corners coincide with an earlier quad stacks onto the next layer.
    pub fn write_block_mesh<R: Rng + ?Sized>(entry: &ModelEntry, rng: &mut R) -> MeshInfo {
        let model = entry.model();
        let Some(variant) = pick_variant(&model.variants, rng) else {
            return Self::empty();
        };
        if variant.quads.is_empty() {
            return Self::empty();
        }

        let transform = entry.transform();
        let mut builder = MeshBuilder::new();
        let mut stacked: HashMap<[[u32; 3]; 4], u32> = HashMap::new();
        let mut num_layers = 0;

        for quad in &variant.quads {
            let mut placed = quad.clone();
            placed.positions = quad.positions.map(|p| transform.apply(p));

            let layer = stacked.entry(placed.corner_key()).or_insert(0);
            let material = material_name(model.transparent, placed.tint_index.is_some());
            builder.quad(placed.positions, placed.uvs, *layer, material);
            num_layers = num_layers.max(*layer + 1);
            *layer += 1;
        }

        MeshInfo {
            mesh: builder.build(),
            num_layers,
        }
    }

    /// The canonical empty mesh
    pub fn empty() -> MeshInfo {
        MeshInfo {
            mesh: Mesh::empty(),
            num_layers: 0,
        }
    }
}

fn pick_variant<'a, R: Rng + ?Sized>(variants: &'a [ModelVariant], rng: &mut R) -> Option<&'a ModelVariant> {
    match variants {
        [] => None,
        [only] => Some(only),
        _ => {
            let total: u64 = variants.iter().map(|v| u64::from(v.weight)).sum();
            if total == 0 {
                return variants.first();
            }
            let mut roll = rng.gen_range(0..total);
            for variant in variants {
                let weight = u64::from(variant.weight);
                if roll < weight {
                    return Some(variant);
                }
                roll -= weight;
            }
            variants.last()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::core::types::Vec2;
    use crate::material::{TINTED_MAT, WORLD_MAT};
    use crate::mesh::write_obj;
    use crate::model::{BlockModel, ModelTransform};

    fn entry(model: BlockModel) -> ModelEntry {
        ModelEntry::new(Arc::new(model), ModelTransform::IDENTITY)
    }

    #[test]
    fn test_cube_single_layer() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let info = MeshWriter::write_block_mesh(&entry(BlockModel::cube(Vec2::ZERO, Vec2::ONE)), &mut rng);
        assert_eq!(info.num_layers, 1);
        assert_eq!(info.mesh.triangle_count(), 12);
        assert!(info.mesh.groups().iter().all(|g| g.material == WORLD_MAT));
    }

    #[test]
    fn test_overlay_uses_second_layer() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let model = BlockModel::cube_with_overlay(Vec2::ZERO, Vec2::splat(0.5), Vec2::splat(0.5), Vec2::ONE);
        let info = MeshWriter::write_block_mesh(&entry(model), &mut rng);
        assert_eq!(info.num_layers, 2);
        let overlay = info.mesh.groups().iter().find(|g| g.layer == 1).unwrap();
        assert_eq!(overlay.material, TINTED_MAT);
        assert_eq!(overlay.faces.len(), 8);
    }

    #[test]
    fn test_no_geometry_is_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let info = MeshWriter::write_block_mesh(&entry(BlockModel::single(Vec::new())), &mut rng);
        assert!(info.mesh.is_empty());
        assert_eq!(info.num_layers, 0);
    }

    #[test]
    fn test_variant_pick_reproducible_with_seed() {
        let variants: Vec<_> = (0..4)
            .map(|i| {
                let lo = i as f32 * 0.25;
                let cube = BlockModel::cube(Vec2::splat(lo), Vec2::splat(lo + 0.25));
                cube.variants.into_iter().next().unwrap()
            })
            .collect();
        let model = entry(BlockModel { variants, transparent: false });

        let render = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut out = Vec::new();
            for _ in 0..8 {
                write_obj(&MeshWriter::write_block_mesh(&model, &mut rng).mesh, &mut out).unwrap();
            }
            out
        };
        assert_eq!(render(42), render(42));
    }

    #[test]
    fn test_zero_weight_falls_back_to_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = ModelVariant { weight: 0, quads: Vec::new() };
        let b = ModelVariant { weight: 0, quads: Vec::new() };
        let variants = vec![a, b];
        let picked = pick_variant(&variants, &mut rng).unwrap();
        assert!(std::ptr::eq(picked, &variants[0]));
    }
}
