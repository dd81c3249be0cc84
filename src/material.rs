//! Material descriptors shared by every mesh in an archive

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Opaque, untinted
pub const WORLD_MAT: &str = "world";
/// Translucent, untinted
pub const TRANSPARENT_MAT: &str = "transparent";
/// Opaque, colored by the per-voxel tint
pub const TINTED_MAT: &str = "tinted";
/// Translucent and tinted; fluids use this one
pub const TRANSPARENT_TINTED_MAT: &str = "transparent_tinted";

/// Name of the atlas texture the materials sample
pub const ATLAS_TEXTURE: &str = "world";

const ROUGHNESS: f64 = 0.7;

/// A material field: a constant or a reference to a named texture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Scalar(f64),
    Texture(String),
}

/// Renderer-facing material descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub color: Field,
    pub roughness: Field,
    pub transparent: bool,
    pub use_vertex_colors: bool,
}

impl Material {
    fn atlas(transparent: bool, tinted: bool) -> Self {
        Self {
            color: Field::Texture(ATLAS_TEXTURE.to_string()),
            roughness: Field::Scalar(ROUGHNESS),
            transparent,
            use_vertex_colors: tinted,
        }
    }

    /// Write as pretty-printed JSON
    pub fn write_json<W: Write>(&self, out: W) -> Result<()> {
        serde_json::to_writer_pretty(out, self)?;
        Ok(())
    }
}

/// Material name for a quad's (transparent, tinted) combination
pub fn material_name(transparent: bool, tinted: bool) -> &'static str {
    match (transparent, tinted) {
        (false, false) => WORLD_MAT,
        (true, false) => TRANSPARENT_MAT,
        (false, true) => TINTED_MAT,
        (true, true) => TRANSPARENT_TINTED_MAT,
    }
}

/// The four materials every archive carries, in emission order
pub fn canonical_materials() -> [(&'static str, Material); 4] {
    [
        (WORLD_MAT, Material::atlas(false, false)),
        (TRANSPARENT_MAT, Material::atlas(true, false)),
        (TINTED_MAT, Material::atlas(false, true)),
        (TRANSPARENT_TINTED_MAT, Material::atlas(true, true)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_names() {
        assert_eq!(material_name(false, false), "world");
        assert_eq!(material_name(true, true), "transparent_tinted");
        let names: Vec<_> = canonical_materials().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["world", "transparent", "tinted", "transparent_tinted"]);
    }

    #[test]
    fn test_json_shape() {
        let (_, tinted) = canonical_materials()[3].clone();
        let mut out = Vec::new();
        tinted.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["color"], "world");
        assert_eq!(value["roughness"], 0.7);
        assert_eq!(value["transparent"], true);
        assert_eq!(value["useVertexColors"], true);

        let back: Material = serde_json::from_slice(&out).unwrap();
        assert_eq!(back, tinted);
    }
}
