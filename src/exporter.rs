//! Capture session state and the archive save pass

use std::collections::HashSet;
use std::io::{Seek, Write};
use std::sync::Arc;

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;

use crate::archive::{mesh_entry, material_entry, VcapArchive, VcapMeta, ATLAS_ENTRY, META_ENTRY, WORLD_ENTRY};
use crate::atlas::{encode_png, RenderHandle};
use crate::context::{ExportContext, VcapSettings};
use crate::core::{Error, Result};
use crate::frame::{write_world, DeltaFrame, Frame, FrameSequence, Keyframe};
use crate::material::canonical_materials;
use crate::mesh::{write_obj, MeshWriter, EMPTY_MESH};
use crate::model::ModelProvider;
use crate::world::{BlockPos, ChunkBox, ChunkPos, WorldAccess};

/// One capture session: bounds, frames and the mesh registry.
///
/// Frames are appended through the capture methods; [`VcapExporter::save`]
/// writes everything out once at the end.
pub struct VcapExporter {
    world: Arc<dyn WorldAccess>,
    models: Arc<dyn ModelProvider>,
    bounds: ChunkBox,
    frames: FrameSequence,
    context: ExportContext,
}

impl VcapExporter {
    /// Create an exporter over `min` (inclusive) to `max` (exclusive)
    pub fn new(
        world: Arc<dyn WorldAccess>,
        models: Arc<dyn ModelProvider>,
        min: ChunkPos,
        max: ChunkPos,
        settings: VcapSettings,
    ) -> Result<Self> {
        Ok(Self {
            world,
            models,
            bounds: ChunkBox::new(min, max)?,
            frames: FrameSequence::new(),
            context: ExportContext::new(settings),
        })
    }

    pub fn bounds(&self) -> ChunkBox {
        self.bounds
    }

    /// Change the box used by later keyframes
    pub fn set_bounds(&mut self, min: ChunkPos, max: ChunkPos) -> Result<()> {
        self.bounds = ChunkBox::new(min, max)?;
        Ok(())
    }

    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }

    pub fn context(&self) -> &ExportContext {
        &self.context
    }

    pub fn settings(&self) -> &VcapSettings {
        self.context.settings()
    }

    /// Capture a keyframe of the whole box
    pub fn capture_iframe(&mut self, time: f64) -> Result<()> {
        let frame = Keyframe::capture(
            self.world.as_ref(),
            self.models.as_ref(),
            self.bounds,
            &mut self.context,
            time,
        );
        debug!("Captured keyframe at {time:.3}s ({} voxels)", frame.len());
        self.frames.push(Frame::Key(frame))
    }

    /// Capture a delta frame against the exporter's own world
    pub fn capture_pframe(&mut self, time: f64, blocks: &HashSet<BlockPos>) -> Result<()> {
        let world = self.world.clone();
        self.capture_pframe_in(time, blocks, world.as_ref())
    }

    /// Capture a delta frame of `blocks` and their neighbours, reading `world`.
    ///
    /// Fails if no frame has been captured yet.
    pub fn capture_pframe_in(
        &mut self,
        time: f64,
        blocks: &HashSet<BlockPos>,
        world: &dyn WorldAccess,
    ) -> Result<()> {
        let frame = {
            let prior = self.frames.view()?;
            DeltaFrame::capture(world, self.models.as_ref(), blocks, time, &prior, &mut self.context)
        };
        debug!("Captured delta frame at {time:.3}s ({} changed)", frame.len());
        self.frames.push(Frame::Delta(frame))
    }

    /// Write the archive.
    ///
    /// Entries are written as: `world.dat`, model meshes, fluid meshes,
    /// `EMPTY_MESH`, the four materials, the atlas, `meta.json`. The atlas is
    /// read on the next render tick, so this must not be awaited on the
    /// render context. A failed save leaves `out` in an unusable state.
    pub async fn save<W: Write + Seek + Send>(&self, out: W, render: &RenderHandle) -> Result<W> {
        let settings = self.context.settings();
        let mut archive = VcapArchive::new(out, settings.compression);

        info!("Compiling frames");
        archive.write_entry(WORLD_ENTRY, |w| write_world(self.frames.frames(), w))?;

        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let mut num_layers = 0;
        for (id, entry) in self.context.models() {
            let mesh = MeshWriter::write_block_mesh(entry, &mut rng);
            num_layers = num_layers.max(mesh.num_layers);
            debug!("Writing mesh {id} ({} triangles)", mesh.mesh.triangle_count());
            archive.write_entry(&mesh_entry(id), |w| Ok(write_obj(&mesh.mesh, w)?))?;
        }
        for (id, mesh) in self.context.fluid_meshes() {
            num_layers = num_layers.max(mesh.layer_count());
            debug!("Writing fluid mesh {id}");
            archive.write_entry(&mesh_entry(id), |w| Ok(write_obj(mesh, w)?))?;
        }
        let empty = MeshWriter::empty();
        archive.write_entry(&mesh_entry(EMPTY_MESH), |w| Ok(write_obj(&empty.mesh, w)?))?;

        for (name, material) in canonical_materials() {
            archive.write_entry(&material_entry(name), |w| material.write_json(w))?;
        }

        info!("Extracting world texture");
        let atlas = render.extract_atlas().await?;
        archive.write_entry(ATLAS_ENTRY, |w| encode_png(&atlas, w))?;

        info!("Writing Vcap metadata");
        let meta = VcapMeta { num_layers };
        archive.write_entry(META_ENTRY, |w| Ok(serde_json::to_writer_pretty(w, &meta)?))?;

        let out = archive.finish()?;
        info!("Finished writing Vcap");
        Ok(out)
    }

    /// Run [`VcapExporter::save`] as a background task.
    ///
    /// Panics if called outside a tokio runtime context.
    pub fn save_async<W>(self, out: W, render: RenderHandle) -> SaveHandle<W>
    where
        W: Write + Seek + Send + 'static,
    {
        let task = tokio::spawn(async move { self.save(out, &render).await });
        SaveHandle { task }
    }
}

/// Completion of a background save; resolves exactly once
pub struct SaveHandle<W> {
    task: JoinHandle<Result<W>>,
}

impl<W> SaveHandle<W> {
    /// Wait for the save to finish
    pub async fn wait(self) -> Result<W> {
        self.task.await.map_err(|e| Error::Save(e.to_string()))?
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read, SeekFrom};

    use image::RgbaImage;

    use crate::atlas::{RenderQueue, StaticAtlas};
    use crate::core::types::Vec2;
    use crate::model::{BlockModel, ModelTable};
    use crate::world::{BlockState, FluidState, GridWorld};

    fn table() -> Arc<ModelTable> {
        Arc::new(
            ModelTable::new()
                .with_block("minecraft:stone", BlockModel::cube(Vec2::ZERO, Vec2::splat(0.5)))
                .with_block(
                    "minecraft:grass_block",
                    BlockModel::cube_with_overlay(Vec2::ZERO, Vec2::splat(0.5), Vec2::splat(0.5), Vec2::ONE),
                )
                .with_fluid("minecraft:water", Vec2::splat(0.5), Vec2::ONE),
        )
    }

    fn exporter(world: &Arc<GridWorld>) -> VcapExporter {
        VcapExporter::new(
            world.clone(),
            table(),
            ChunkPos::new(0, 0),
            ChunkPos::new(1, 1),
            VcapSettings::default(),
        )
        .unwrap()
    }

    fn render() -> (RenderQueue, RenderHandle) {
        RenderQueue::new(StaticAtlas::new(RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]))))
    }

    fn read_archive(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    async fn save(exporter: &VcapExporter) -> Vec<(String, Vec<u8>)> {
        let (mut queue, handle) = render();
        let out = queue
            .drive(exporter.save(Cursor::new(Vec::new()), &handle))
            .await
            .unwrap();
        read_archive(out.into_inner())
    }

    fn meta(entries: &[(String, Vec<u8>)]) -> VcapMeta {
        let (_, data) = entries.iter().find(|(name, _)| name == META_ENTRY).unwrap();
        serde_json::from_slice(data).unwrap()
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let world = Arc::new(GridWorld::new(0, 4));
        let result = VcapExporter::new(
            world,
            table(),
            ChunkPos::new(2, 0),
            ChunkPos::new(1, 1),
            VcapSettings::default(),
        );
        assert!(matches!(result, Err(Error::InvalidBounds { .. })));
    }

    #[test]
    fn test_pframe_requires_prior_frame() {
        let world = Arc::new(GridWorld::new(0, 4));
        let mut exporter = exporter(&world);
        let result = exporter.capture_pframe(1.0, &HashSet::new());
        assert!(matches!(result, Err(Error::Sequencing(_))));
        assert!(exporter.frames().is_empty());
    }

    #[tokio::test]
    async fn test_all_air_archive() {
        let world = Arc::new(GridWorld::new(0, 4));
        let mut exporter = exporter(&world);
        exporter.capture_iframe(0.0).unwrap();
        assert_eq!(exporter.frames().frames()[0].len(), 16 * 16 * 4);

        let entries = save(&exporter).await;
        let names: Vec<_> = entries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            [
                "world.dat",
                "mesh/EMPTY_MESH.obj",
                "mat/world.json",
                "mat/transparent.json",
                "mat/tinted.json",
                "mat/transparent_tinted.json",
                "tex/world.png",
                "meta.json",
            ]
        );
        assert_eq!(meta(&entries).num_layers, 0);
    }

    #[tokio::test]
    async fn test_placed_block_delta() {
        let world = Arc::new(GridWorld::new(0, 4));
        let mut exporter = exporter(&world);
        exporter.capture_iframe(0.0).unwrap();

        let pos = BlockPos::new(4, 1, 4);
        world.set_block(pos, BlockState::new("minecraft:grass_block"));
        exporter.capture_pframe(1.0, &HashSet::from([pos])).unwrap();
        assert!(exporter.frames().last().unwrap().len() >= 1);

        let entries = save(&exporter).await;
        assert!(entries.iter().any(|(name, _)| name == "mesh/model_0.obj"));
        assert_eq!(meta(&entries).num_layers, 2);
    }

    #[tokio::test]
    async fn test_empty_frames_still_valid() {
        let world = Arc::new(GridWorld::new(0, 4));
        let entries = save(&exporter(&world)).await;
        assert_eq!(entries.len(), 8);
        assert_eq!(meta(&entries).num_layers, 0);
    }

    #[tokio::test]
    async fn test_repeated_saves_identical() {
        let world = Arc::new(GridWorld::new(0, 4));
        world.fill(BlockPos::new(0, 0, 0), BlockPos::new(15, 0, 15), &BlockState::new("minecraft:stone"));
        world.set_fluid(BlockPos::new(3, 1, 3), FluidState::source("minecraft:water"));
        let mut exporter = exporter(&world);
        exporter.capture_iframe(0.0).unwrap();

        let first = save(&exporter).await;
        let second = save(&exporter).await;
        assert_eq!(first, second);
        assert!(first.iter().any(|(name, _)| name == "mesh/fluid_0.obj"));
    }

    #[tokio::test]
    async fn test_save_async_resolves() {
        let world = Arc::new(GridWorld::new(0, 2));
        let mut exporter = exporter(&world);
        exporter.capture_iframe(0.0).unwrap();

        let (mut queue, handle) = render();
        let save = exporter.save_async(Cursor::new(Vec::new()), handle);
        let out = queue.drive(save.wait()).await.unwrap();
        assert_eq!(read_archive(out.into_inner()).len(), 8);
    }

    #[tokio::test]
    async fn test_save_fails_without_render_context() {
        let world = Arc::new(GridWorld::new(0, 2));
        let exporter = exporter(&world);
        let (queue, handle) = render();
        drop(queue);
        let result = exporter.save(Cursor::new(Vec::new()), &handle).await;
        assert!(matches!(result, Err(Error::RenderUnavailable(_))));
    }

    /// Output whose every write fails
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FullDisk {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    fn is_write_error(result: &Result<FullDisk>) -> bool {
        matches!(result, Err(Error::Io(_) | Error::Archive(_)))
    }

    #[tokio::test]
    async fn test_write_failure_reaches_caller() {
        let world = Arc::new(GridWorld::new(0, 2));
        let mut exporter = exporter(&world);
        exporter.capture_iframe(0.0).unwrap();

        let (mut queue, handle) = render();
        let result = queue.drive(exporter.save(FullDisk, &handle)).await;
        assert!(is_write_error(&result), "{:?}", result.err());

        let save = exporter.save_async(FullDisk, handle);
        let result = queue.drive(save.wait()).await;
        assert!(is_write_error(&result), "{:?}", result.err());
    }
}
