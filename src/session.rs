//! Lifecycle of one capture: keyframe, live deltas, hand-off for saving

use std::time::Instant;

use log::info;

use crate::atlas::RenderHandle;
use crate::capture::CaptureScheduler;
use crate::core::{Error, Result};
use crate::events::{BlockEventBus, Subscription};
use crate::exporter::VcapExporter;
use crate::world::BlockPos;

/// An active capture, owned by whatever front end started it
pub struct CaptureSession {
    name: String,
    scheduler: CaptureScheduler,
    subscription: Subscription,
}

impl CaptureSession {
    /// Capture the opening keyframe at t=0 and start listening to `bus`
    pub fn start(
        name: impl Into<String>,
        mut exporter: VcapExporter,
        bus: &BlockEventBus,
        render: RenderHandle,
    ) -> Result<Self> {
        let name = name.into();
        exporter.capture_iframe(0.0)?;
        let start = Instant::now();
        let bounds = exporter.bounds();
        let scheduler = CaptureScheduler::new(exporter, render);
        let subscription = scheduler.listen(bus, Some(start));
        info!("Started Vcap capture '{name}' over chunks {} to {}", bounds.min(), bounds.max());
        Ok(Self {
            name,
            scheduler,
            subscription,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Changes waiting for the next render tick
    pub fn pending(&self) -> Vec<BlockPos> {
        self.scheduler.pending()
    }

    pub fn frame_count(&self) -> usize {
        self.scheduler.frame_count()
    }

    /// Stop listening and return the exporter for saving
    pub fn finish(self) -> Result<VcapExporter> {
        self.subscription.unsubscribe();
        let exporter = self
            .scheduler
            .finish()
            .ok_or_else(|| Error::Sequencing(format!("capture '{}' was already finished", self.name)))?;
        info!("Stopped Vcap capture '{}' after {} frame(s)", self.name, exporter.frames().len());
        Ok(exporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use image::RgbaImage;

    use crate::atlas::{RenderQueue, StaticAtlas};
    use crate::context::VcapSettings;
    use crate::core::types::Vec2;
    use crate::model::{BlockModel, ModelTable};
    use crate::world::{BlockState, ChunkPos, GridWorld};

    #[tokio::test]
    async fn test_session_lifecycle() {
        let world = Arc::new(GridWorld::new(0, 4));
        let table = Arc::new(ModelTable::new().with_block("minecraft:stone", BlockModel::cube(Vec2::ZERO, Vec2::ONE)));
        let exporter = VcapExporter::new(
            world.clone(),
            table,
            ChunkPos::new(0, 0),
            ChunkPos::new(1, 1),
            VcapSettings::default(),
        )
        .unwrap();
        let (mut queue, render) = RenderQueue::new(StaticAtlas::new(RgbaImage::new(2, 2)));
        let bus = BlockEventBus::new();

        let session = CaptureSession::start("demo", exporter, &bus, render.clone()).unwrap();
        assert_eq!(session.name(), "demo");
        assert_eq!(session.frame_count(), 1);
        assert_eq!(bus.listener_count(), 1);

        let pos = BlockPos::new(2, 1, 2);
        let stone = BlockState::new("minecraft:stone");
        world.set_block(pos, stone.clone());
        bus.publish(pos, &stone);
        assert_eq!(session.pending(), vec![pos]);
        queue.pump();
        assert_eq!(session.frame_count(), 2);

        let exporter = session.finish().unwrap();
        assert_eq!(bus.listener_count(), 0);
        bus.publish(pos, &stone);
        assert_eq!(queue.pump(), 0);

        let out = queue.drive(exporter.save(Cursor::new(Vec::new()), &render)).await.unwrap();
        assert!(!out.into_inner().is_empty());
    }
}
