//! Block model geometry and the deduplication key for meshes
//!
//! A [`ModelEntry`] is the identity used to share one mesh between every
//! voxel that renders the same geometry. Its key is computed once from the
//! resolved geometry, so identity never depends on a live model object.

pub mod provider;

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::core::types::{Vec2, Vec3};

pub use provider::{ModelProvider, ModelTable};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// One textured quad of a block model, corners counter-clockwise seen from outside
#[derive(Clone, Debug)]
pub struct ModelQuad {
    /// Corner positions in block space (0..1)
    pub positions: [Vec3; 4],
    /// Atlas UVs per corner, origin top-left
    pub uvs: [Vec2; 4],
    /// Tint slot; tinted quads take the per-voxel color at render time
    pub tint_index: Option<u8>,
}

impl ModelQuad {
    /// Create an untinted quad
    pub fn new(positions: [Vec3; 4], uvs: [Vec2; 4]) -> Self {
        Self {
            positions,
            uvs,
            tint_index: None,
        }
    }

    /// Return a copy using the given tint slot
    pub fn with_tint(mut self, index: u8) -> Self {
        self.tint_index = Some(index);
        self
    }

    /// Corner positions as sorted bit patterns, independent of winding start
    pub fn corner_key(&self) -> [[u32; 3]; 4] {
        let mut corners = self.positions.map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]);
        corners.sort_unstable();
        corners
    }

    fn bits(&self) -> impl Iterator<Item = u32> + '_ {
        self.positions
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .chain(self.uvs.iter().flat_map(|uv| [uv.x, uv.y]))
            .map(f32::to_bits)
    }
}

impl PartialEq for ModelQuad {
    fn eq(&self, other: &Self) -> bool {
        self.tint_index == other.tint_index && self.bits().eq(other.bits())
    }
}

impl Eq for ModelQuad {}

/// One weighted geometry alternative of a block model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelVariant {
    pub weight: u32,
    pub quads: Vec<ModelQuad>,
}

impl ModelVariant {
    /// Variant with weight 1
    pub fn new(quads: Vec<ModelQuad>) -> Self {
        Self { weight: 1, quads }
    }
}

/// Resolved block geometry; more than one variant means a random pick per mesh
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockModel {
    pub variants: Vec<ModelVariant>,
    /// Rendered in the translucent pass
    pub transparent: bool,
}

impl BlockModel {
    /// Model with a single geometry variant
    pub fn single(quads: Vec<ModelQuad>) -> Self {
        Self {
            variants: vec![ModelVariant::new(quads)],
            transparent: false,
        }
    }

    /// Full unit cube using one atlas region on all six faces
    pub fn cube(uv_min: Vec2, uv_max: Vec2) -> Self {
        Self::single(cube_faces(uv_min, uv_max, &CUBE_FACES))
    }

    /// Unit cube plus a tinted overlay on the four side faces
    pub fn cube_with_overlay(uv_min: Vec2, uv_max: Vec2, overlay_min: Vec2, overlay_max: Vec2) -> Self {
        let mut quads = cube_faces(uv_min, uv_max, &CUBE_FACES);
        quads.extend(
            cube_faces(overlay_min, overlay_max, &CUBE_FACES[2..])
                .into_iter()
                .map(|q| q.with_tint(0)),
        );
        Self::single(quads)
    }

    /// Mark the model as translucent
    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    /// Check if no variant carries any geometry
    pub fn is_empty(&self) -> bool {
        self.variants.iter().all(|v| v.quads.is_empty())
    }
}

// Down, up, north, south, west, east
const CUBE_FACES: [[[f32; 3]; 4]; 6] = [
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]],
];

fn cube_faces(uv_min: Vec2, uv_max: Vec2, faces: &[[[f32; 3]; 4]]) -> Vec<ModelQuad> {
    let uvs = [
        Vec2::new(uv_min.x, uv_max.y),
        Vec2::new(uv_max.x, uv_max.y),
        Vec2::new(uv_max.x, uv_min.y),
        Vec2::new(uv_min.x, uv_min.y),
    ];
    faces
        .iter()
        .map(|face| ModelQuad::new(face.map(Vec3::from_array), uvs))
        .collect()
}

/// Whole-model rotation in quarter turns about the block center
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelTransform {
    /// Quarter turns about X, applied first
    pub x: u8,
    /// Quarter turns about Y
    pub y: u8,
}

impl ModelTransform {
    pub const IDENTITY: ModelTransform = ModelTransform { x: 0, y: 0 };

    /// Create a transform; turns wrap modulo 4
    pub fn new(x: u8, y: u8) -> Self {
        Self { x: x % 4, y: y % 4 }
    }

    /// Y rotation for a horizontal `facing` property (north = 0)
    pub fn from_facing(facing: &str) -> Self {
        match facing {
            "east" => Self::new(0, 1),
            "south" => Self::new(0, 2),
            "west" => Self::new(0, 3),
            _ => Self::IDENTITY,
        }
    }

    /// Rotate a block-space point. Quarter turns only swap and negate
    /// offsets from the center, so dyadic coordinates stay exact.
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let mut d = p - Vec3::splat(0.5);
        for _ in 0..self.x {
            d = Vec3::new(d.x, -d.z, d.y);
        }
        for _ in 0..self.y {
            d = Vec3::new(-d.z, d.y, d.x);
        }
        d + Vec3::splat(0.5)
    }
}

/// Deduplication identity: geometry plus orientation.
///
/// `Hash` uses the precomputed content key; equality falls back to a full
/// structural comparison so different geometry never shares a mesh id.
#[derive(Clone, Debug)]
pub struct ModelEntry {
    model: Arc<BlockModel>,
    transform: ModelTransform,
    key: u64,
}

impl ModelEntry {
    /// Create an entry, computing its canonical key
    pub fn new(model: Arc<BlockModel>, transform: ModelTransform) -> Self {
        let key = Self::compute_key(&model, transform);
        Self { model, transform, key }
    }

    /// Geometry of this entry
    pub fn model(&self) -> &BlockModel {
        &self.model
    }

    /// Orientation of this entry
    pub fn transform(&self) -> ModelTransform {
        self.transform
    }

    /// Canonical content key
    pub fn key(&self) -> u64 {
        self.key
    }

    /// FNV-1a over the geometry descriptor
    fn compute_key(model: &BlockModel, transform: ModelTransform) -> u64 {
        let mut hash = FNV_OFFSET;
        let mut mix = |value: u64| {
            hash ^= value;
            hash = hash.wrapping_mul(FNV_PRIME);
        };

        mix(model.transparent as u64);
        mix(transform.x as u64);
        mix(transform.y as u64);
        for variant in &model.variants {
            mix(variant.weight as u64);
            mix(variant.quads.len() as u64);
            for quad in &variant.quads {
                mix(quad.tint_index.map_or(u64::MAX, u64::from));
                for bits in quad.bits() {
                    mix(bits as u64);
                }
            }
        }
        hash
    }
}

impl PartialEq for ModelEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.transform == other.transform
            && (Arc::ptr_eq(&self.model, &other.model) || *self.model == *other.model)
    }
}

impl Eq for ModelEntry {}

impl Hash for ModelEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.key);
    }
}
