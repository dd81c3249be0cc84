//! Render-bound atlas readback
//!
//! The texture atlas can only be read on the render context. Work that
//! needs it is queued through a [`RenderHandle`] from any thread and run by
//! the owner of the [`RenderQueue`] once per render tick.

use std::future::Future;
use std::io::Write;
use std::marker::PhantomData;
use std::time::Duration;

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use log::debug;
use tokio::sync::{mpsc, oneshot};

use crate::core::{Error, Result};

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Proof of running inside a render tick.
///
/// Only the [`RenderQueue`] creates one, and it is `!Send`, so it cannot
/// leak to another thread.
pub struct RenderContext {
    tick: u64,
    _not_send: PhantomData<*const ()>,
}

impl RenderContext {
    /// Index of the current tick, starting at 1
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// Producer of the combined block texture atlas
pub trait AtlasSource {
    fn read_atlas(&mut self, ctx: &RenderContext) -> Result<RgbaImage>;
}

/// What a queued task sees during its tick
pub struct RenderTick<'a> {
    ctx: &'a RenderContext,
    atlas: &'a mut dyn AtlasSource,
}

impl RenderTick<'_> {
    pub fn context(&self) -> &RenderContext {
        self.ctx
    }

    /// Read the atlas back from the render context
    pub fn read_atlas(&mut self) -> Result<RgbaImage> {
        self.atlas.read_atlas(self.ctx)
    }
}

type RenderTask = Box<dyn FnOnce(&mut RenderTick<'_>) + Send>;

/// Render-side end of the channel, owned by the render loop
pub struct RenderQueue {
    atlas: Box<dyn AtlasSource>,
    tasks: mpsc::UnboundedReceiver<RenderTask>,
    tick: u64,
    tick_interval: Duration,
}

impl RenderQueue {
    /// Create a queue over an atlas source and a handle for submitting work
    pub fn new(atlas: impl AtlasSource + 'static) -> (Self, RenderHandle) {
        let (sender, tasks) = mpsc::unbounded_channel();
        let queue = Self {
            atlas: Box::new(atlas),
            tasks,
            tick: 0,
            tick_interval: DEFAULT_TICK_INTERVAL,
        };
        (queue, RenderHandle { tasks: sender })
    }

    /// Set the delay between ticks used by [`RenderQueue::drive`]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one render tick.
    ///
    /// Only tasks queued before the tick started run; anything they queue
    /// waits for the next tick. Returns the number of tasks run.
    pub fn pump(&mut self) -> usize {
        let mut batch = Vec::new();
        while let Ok(task) = self.tasks.try_recv() {
            batch.push(task);
        }

        self.tick += 1;
        let ctx = RenderContext {
            tick: self.tick,
            _not_send: PhantomData,
        };
        let mut frame = RenderTick {
            ctx: &ctx,
            atlas: self.atlas.as_mut(),
        };

        let count = batch.len();
        for task in batch {
            task(&mut frame);
        }
        if count > 0 {
            debug!("Render tick {} ran {} task(s)", self.tick, count);
        }
        count
    }

    /// Tick on `tick_interval` until `future` completes.
    ///
    /// For hosts without a real render loop. Never call this from inside a
    /// task, or the future can never be pumped.
    pub async fn drive<F: Future>(&mut self, future: F) -> F::Output {
        tokio::pin!(future);
        loop {
            self.pump();
            tokio::select! {
                biased;
                output = &mut future => return output,
                _ = tokio::time::sleep(self.tick_interval) => {}
            }
        }
    }
}

/// Cloneable, thread-safe submitter of render tasks
#[derive(Clone)]
pub struct RenderHandle {
    tasks: mpsc::UnboundedSender<RenderTask>,
}

impl RenderHandle {
    /// Queue a task for the next render tick
    pub fn record<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce(&mut RenderTick<'_>) + Send + 'static,
    {
        self.tasks
            .send(Box::new(task))
            .map_err(|_| Error::RenderUnavailable("render queue is closed".to_string()))
    }

    /// Read the atlas on the next render tick.
    ///
    /// Resolves only after the queue has ticked, so awaiting this on the
    /// render context itself deadlocks.
    pub async fn extract_atlas(&self) -> Result<RgbaImage> {
        let (reply, response) = oneshot::channel();
        self.record(move |frame| {
            let _ = reply.send(frame.read_atlas());
        })?;
        response
            .await
            .map_err(|_| Error::RenderUnavailable("atlas request dropped before its tick".to_string()))?
    }

    /// Check whether the render side still accepts work
    pub fn is_closed(&self) -> bool {
        self.tasks.is_closed()
    }
}

/// Atlas source returning a fixed image
pub struct StaticAtlas {
    image: RgbaImage,
}

impl StaticAtlas {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }
}

impl AtlasSource for StaticAtlas {
    fn read_atlas(&mut self, _ctx: &RenderContext) -> Result<RgbaImage> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(Error::Atlas("atlas has no texels".to_string()));
        }
        Ok(self.image.clone())
    }
}

/// Encode an RGBA image as PNG
pub fn encode_png<W: Write>(image: &RgbaImage, out: W) -> Result<()> {
    PngEncoder::new(out).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_pump_runs_only_queued_tasks() {
        let (mut queue, handle) = RenderQueue::new(StaticAtlas::new(checker()));
        let runs = Arc::new(AtomicUsize::new(0));

        let inner_handle = handle.clone();
        let inner_runs = runs.clone();
        handle
            .record(move |_| {
                inner_runs.fetch_add(1, Ordering::SeqCst);
                let again = inner_runs.clone();
                inner_handle
                    .record(move |_| {
                        again.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            })
            .unwrap();

        assert_eq!(queue.pump(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pump(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(queue.pump(), 0);
    }

    #[tokio::test]
    async fn test_extract_atlas_round_trip() {
        let (mut queue, handle) = RenderQueue::new(StaticAtlas::new(checker()));
        let queue_ticks = queue.tick;
        let image = queue.drive(handle.extract_atlas()).await.unwrap();
        assert_eq!(image, checker());
        assert!(queue.tick > queue_ticks);
    }

    #[tokio::test]
    async fn test_closed_queue_unavailable() {
        let (queue, handle) = RenderQueue::new(StaticAtlas::new(checker()));
        drop(queue);
        assert!(handle.is_closed());
        let result = handle.extract_atlas().await;
        assert!(matches!(result, Err(Error::RenderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_atlas_fails() {
        let (mut queue, handle) = RenderQueue::new(StaticAtlas::new(RgbaImage::new(0, 0)));
        let result = queue.drive(handle.extract_atlas()).await;
        assert!(matches!(result, Err(Error::Atlas(_))));
    }

    #[test]
    fn test_png_signature() {
        let mut out = Vec::new();
        encode_png(&checker(), &mut out).unwrap();
        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded, checker());
    }
}
