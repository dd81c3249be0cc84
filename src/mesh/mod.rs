//! Renderer-agnostic triangle meshes

pub mod obj;
pub mod writer;

use crate::core::types::{Vec2, Vec3};

pub use obj::write_obj;
pub use writer::{MeshInfo, MeshWriter, EMPTY_MESH};

/// Corner of a triangle: indices into the mesh attribute arrays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: u32,
    pub uv: u32,
    pub normal: u32,
}

/// Triangles sharing a material layer and a material
#[derive(Clone, Debug, PartialEq)]
pub struct FaceGroup {
    pub layer: u32,
    pub material: String,
    pub faces: Vec<[FaceVertex; 3]>,
}

/// Indexed triangle mesh grouped by layer and material
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    groups: Vec<FaceGroup>,
}

impl Mesh {
    /// Mesh with no geometry
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Face groups, ordered by layer then material
    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    /// Check if the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.faces.is_empty())
    }

    /// Total triangle count
    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.faces.len()).sum()
    }

    /// Highest layer used plus one, 0 for an empty mesh
    pub fn layer_count(&self) -> u32 {
        self.groups
            .iter()
            .filter(|g| !g.faces.is_empty())
            .map(|g| g.layer + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Incremental mesh construction from quads
#[derive(Default)]
pub struct MeshBuilder {
    mesh: Mesh,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a planar quad as two triangles. Corners must be
    /// counter-clockwise seen from the front.
    pub fn quad(&mut self, positions: [Vec3; 4], uvs: [Vec2; 4], layer: u32, material: &str) {
        let base = self.mesh.positions.len() as u32;
        let uv_base = self.mesh.uvs.len() as u32;
        let normal = (positions[1] - positions[0])
            .cross(positions[2] - positions[0])
            .normalize_or_zero();
        let normal_index = self.mesh.normals.len() as u32;

        self.mesh.positions.extend_from_slice(&positions);
        self.mesh.uvs.extend_from_slice(&uvs);
        self.mesh.normals.push(normal);

        let corner = |i: u32| FaceVertex {
            position: base + i,
            uv: uv_base + i,
            normal: normal_index,
        };
        let faces = [[corner(0), corner(1), corner(2)], [corner(0), corner(2), corner(3)]];

        match self
            .mesh
            .groups
            .iter_mut()
            .find(|g| g.layer == layer && g.material == material)
        {
            Some(group) => group.faces.extend_from_slice(&faces),
            None => self.mesh.groups.push(FaceGroup {
                layer,
                material: material.to_string(),
                faces: faces.to_vec(),
            }),
        }
    }

    /// Finish the mesh, sorting groups for stable output
    pub fn build(mut self) -> Mesh {
        self.mesh
            .groups
            .sort_by(|a, b| a.layer.cmp(&b.layer).then_with(|| a.material.cmp(&b.material)));
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn test_quad_splits_into_triangles() {
        let mut builder = MeshBuilder::new();
        builder.quad(unit_quad(), [Vec2::ZERO; 4], 0, "world");
        let mesh = builder.build();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.positions().len(), 4);
        assert_eq!(mesh.normals(), &[Vec3::Z]);
        assert_eq!(mesh.layer_count(), 1);
    }

    #[test]
    fn test_groups_sorted_by_layer_then_material() {
        let mut builder = MeshBuilder::new();
        builder.quad(unit_quad(), [Vec2::ZERO; 4], 1, "world");
        builder.quad(unit_quad(), [Vec2::ZERO; 4], 0, "world");
        builder.quad(unit_quad(), [Vec2::ZERO; 4], 0, "tinted");
        let mesh = builder.build();
        let order: Vec<_> = mesh.groups().iter().map(|g| (g.layer, g.material.as_str())).collect();
        assert_eq!(order, vec![(0, "tinted"), (0, "world"), (1, "world")]);
        assert_eq!(mesh.layer_count(), 2);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::empty();
        assert!(mesh.is_empty());
        assert_eq!(mesh.layer_count(), 0);
    }
}
