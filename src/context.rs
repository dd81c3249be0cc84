//! Per-session mesh registry and capture settings

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::mesh::{Mesh, EMPTY_MESH};
use crate::model::{ModelEntry, ModelProvider};
use crate::world::FluidState;

/// Id of a mesh in the archive; `mesh/<id>.obj`
pub type MeshId = Arc<str>;

/// Entry compression inside the archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    Stored,
    #[default]
    Deflated,
}

/// Capture configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcapSettings {
    /// Record fluid meshes alongside blocks
    pub include_fluids: bool,
    /// Seed for the mesh variant RNG used at save time
    pub seed: u64,
    pub compression: ArchiveCompression,
}

impl Default for VcapSettings {
    fn default() -> Self {
        Self {
            include_fluids: true,
            seed: 0,
            compression: ArchiveCompression::Deflated,
        }
    }
}

impl VcapSettings {
    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Registry mapping model entries and fluids to mesh ids.
///
/// Ids are handed out in first-seen order and never removed or reassigned,
/// so every id a frame references stays valid until the archive is written.
pub struct ExportContext {
    empty: MeshId,
    models: Vec<(MeshId, ModelEntry)>,
    model_ids: HashMap<ModelEntry, usize>,
    fluids: Vec<(MeshId, Mesh)>,
    fluid_ids: HashMap<FluidState, MeshId>,
    settings: VcapSettings,
}

impl ExportContext {
    /// Create an empty registry
    pub fn new(settings: VcapSettings) -> Self {
        Self {
            empty: MeshId::from(EMPTY_MESH),
            models: Vec::new(),
            model_ids: HashMap::new(),
            fluids: Vec::new(),
            fluid_ids: HashMap::new(),
            settings,
        }
    }

    /// Id of the canonical empty mesh
    pub fn empty_mesh(&self) -> MeshId {
        self.empty.clone()
    }

    /// Mesh id for a model entry, allocating one on first encounter
    pub fn register_model(&mut self, entry: ModelEntry) -> MeshId {
        if let Some(&index) = self.model_ids.get(&entry) {
            return self.models[index].0.clone();
        }
        let id: MeshId = format!("model_{}", self.models.len()).into();
        self.model_ids.insert(entry.clone(), self.models.len());
        self.models.push((id.clone(), entry));
        id
    }

    /// Mesh id for a fluid state, generating its mesh on first encounter.
    ///
    /// Fluids the provider cannot mesh yield `None`.
    pub fn register_fluid(&mut self, fluid: &FluidState, provider: &dyn ModelProvider) -> Option<MeshId> {
        if let Some(id) = self.fluid_ids.get(fluid) {
            return Some(id.clone());
        }
        let Some(mesh) = provider.fluid_mesh(fluid) else {
            warn!("No mesh for fluid {}, recording as empty", fluid.fluid);
            return None;
        };
        let id: MeshId = format!("fluid_{}", self.fluids.len()).into();
        self.fluid_ids.insert(fluid.clone(), id.clone());
        self.fluids.push((id.clone(), mesh));
        Some(id)
    }

    /// Registered model entries in insertion order
    pub fn models(&self) -> impl Iterator<Item = (&MeshId, &ModelEntry)> {
        self.models.iter().map(|(id, entry)| (id, entry))
    }

    /// Registered fluid meshes in insertion order
    pub fn fluid_meshes(&self) -> impl Iterator<Item = (&MeshId, &Mesh)> {
        self.fluids.iter().map(|(id, mesh)| (id, mesh))
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn fluid_count(&self) -> usize {
        self.fluids.len()
    }

    pub fn settings(&self) -> &VcapSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::model::{BlockModel, ModelTable, ModelTransform};
    use tempfile::TempDir;

    #[test]
    fn test_dedup_idempotent() {
        let mut ctx = ExportContext::new(VcapSettings::default());
        let stone = Arc::new(BlockModel::cube(Vec2::ZERO, Vec2::splat(0.5)));
        let a = ctx.register_model(ModelEntry::new(stone.clone(), ModelTransform::IDENTITY));
        let b = ctx.register_model(ModelEntry::new(stone.clone(), ModelTransform::IDENTITY));
        // Separately built but identical geometry
        let copy = Arc::new(BlockModel::cube(Vec2::ZERO, Vec2::splat(0.5)));
        let c = ctx.register_model(ModelEntry::new(copy, ModelTransform::IDENTITY));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(ctx.model_count(), 1);

        let rotated = ctx.register_model(ModelEntry::new(stone, ModelTransform::new(0, 1)));
        assert_ne!(a, rotated);
        let ids: Vec<_> = ctx.models().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, ["model_0", "model_1"]);
    }

    #[test]
    fn test_fluid_registration() {
        let table = ModelTable::new().with_fluid("minecraft:water", Vec2::ZERO, Vec2::ONE);
        let mut ctx = ExportContext::new(VcapSettings::default());
        let water = FluidState::source("minecraft:water");
        let a = ctx.register_fluid(&water, &table);
        let b = ctx.register_fluid(&water, &table);
        assert_eq!(a.as_deref(), Some("fluid_0"));
        assert_eq!(a, b);
        assert_eq!(ctx.fluid_count(), 1);

        assert!(ctx.register_fluid(&FluidState::source("minecraft:lava"), &table).is_none());
        assert_eq!(ctx.fluid_count(), 1);
    }

    #[test]
    fn test_settings_roundtrip_and_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/settings.json");
        let settings = VcapSettings {
            include_fluids: false,
            seed: 99,
            compression: ArchiveCompression::Stored,
        };
        settings.save_sync(&path).unwrap();
        assert_eq!(VcapSettings::load_sync(&path).unwrap(), settings);

        let partial: VcapSettings = serde_json::from_str(r#"{"seed": 5}"#).unwrap();
        assert!(partial.include_fluids);
        assert_eq!(partial.compression, ArchiveCompression::Deflated);
        assert_eq!(partial.seed, 5);
    }
}
