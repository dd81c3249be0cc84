//! Wavefront OBJ serialization

use std::io::{self, Write};

use super::Mesh;

/// Format a float without a negative zero so output is canonical
fn num(v: f32) -> f32 {
    if v == 0.0 { 0.0 } else { v }
}

/// Write a mesh as OBJ text.
///
/// Output depends only on the mesh contents. UVs are flipped to the
/// bottom-left origin OBJ expects; indices are 1-based.
pub fn write_obj<W: Write>(mesh: &Mesh, mut out: W) -> io::Result<()> {
    writeln!(out, "# vcap mesh")?;
    for p in mesh.positions() {
        writeln!(out, "v {} {} {}", num(p.x), num(p.y), num(p.z))?;
    }
    for uv in mesh.uvs() {
        writeln!(out, "vt {} {}", num(uv.x), num(1.0 - uv.y))?;
    }
    for n in mesh.normals() {
        writeln!(out, "vn {} {} {}", num(n.x), num(n.y), num(n.z))?;
    }
    for group in mesh.groups() {
        if group.faces.is_empty() {
            continue;
        }
        writeln!(out, "g {}", group.layer)?;
        writeln!(out, "usemtl {}", group.material)?;
        for face in &group.faces {
            write!(out, "f")?;
            for v in face {
                write!(out, " {}/{}/{}", v.position + 1, v.uv + 1, v.normal + 1)?;
            }
            writeln!(out)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Vec2, Vec3};
    use crate::mesh::MeshBuilder;

    #[test]
    fn test_write_quad() {
        let mut builder = MeshBuilder::new();
        builder.quad(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            [Vec2::new(0.0, 0.25), Vec2::new(0.25, 0.25), Vec2::new(0.25, 0.0), Vec2::ZERO],
            0,
            "world",
        );
        let mut out = Vec::new();
        write_obj(&builder.build(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("v 1 0 1\n"));
        assert!(text.contains("vt 0.25 0.75\n"));
        assert!(text.contains("vn 0 -1 0\n"));
        assert!(text.contains("g 0\nusemtl world\nf 1/1/1 2/2/1 3/3/1\nf 1/1/1 3/3/1 4/4/1\n"));
    }

    #[test]
    fn test_empty_mesh_is_header_only() {
        let mut out = Vec::new();
        write_obj(&Mesh::empty(), &mut out).unwrap();
        assert_eq!(out, b"# vcap mesh\n");
    }
}
