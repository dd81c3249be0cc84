//! Batching of world changes into at most one delta capture per render tick

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::{error, trace};

use crate::atlas::RenderHandle;
use crate::events::{BlockEventBus, Subscription};
use crate::exporter::VcapExporter;
use crate::world::BlockPos;

struct SchedulerState {
    exporter: Option<VcapExporter>,
    pending: HashSet<BlockPos>,
    queued: bool,
    start: Instant,
    listening: bool,
}

/// Collects changed positions and captures them on the render context.
///
/// The first notification after a tick queues one render task; later ones
/// only grow the pending set, so a burst of N changes costs one capture.
#[derive(Clone)]
pub struct CaptureScheduler {
    state: Arc<Mutex<SchedulerState>>,
    render: RenderHandle,
}

impl CaptureScheduler {
    /// Frame timestamps count from now until [`CaptureScheduler::listen`]
    /// supplies an explicit start.
    pub fn new(exporter: VcapExporter, render: RenderHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                exporter: Some(exporter),
                pending: HashSet::new(),
                queued: false,
                start: Instant::now(),
                listening: false,
            })),
            render,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed block placements from `bus` into this scheduler.
    ///
    /// Frame timestamps count from `start_time` if given; only the first
    /// call can move the start.
    #[must_use = "dropping the subscription stops capturing"]
    pub fn listen(&self, bus: &BlockEventBus, start_time: Option<Instant>) -> Subscription {
        {
            let mut state = self.lock();
            if !state.listening {
                state.listening = true;
                if let Some(start) = start_time {
                    state.start = start;
                }
            }
        }
        let scheduler = self.clone();
        bus.subscribe(move |pos, _| scheduler.notify(pos))
    }

    /// Record a changed position, queueing a capture if none is pending
    pub fn notify(&self, pos: BlockPos) {
        {
            let mut state = self.lock();
            if state.exporter.is_none() {
                return;
            }
            state.pending.insert(pos);
            if state.queued {
                return;
            }
            state.queued = true;
        }

        let state = self.state.clone();
        let queued = self.render.record(move |_| {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            capture_pending(&mut state);
        });
        if let Err(e) = queued {
            error!("Unable to schedule Vcap frame: {e}");
            self.lock().queued = false;
        }
    }

    /// Positions waiting for the next tick, sorted
    pub fn pending(&self) -> Vec<BlockPos> {
        let mut pending: Vec<_> = self.lock().pending.iter().copied().collect();
        pending.sort_unstable();
        pending
    }

    /// Frames captured so far, 0 once finished
    pub fn frame_count(&self) -> usize {
        self.lock().exporter.as_ref().map_or(0, |e| e.frames().len())
    }

    /// Stop capturing and hand back the exporter. Later calls return `None`.
    pub fn finish(&self) -> Option<VcapExporter> {
        let mut state = self.lock();
        state.pending.clear();
        state.exporter.take()
    }
}

/// Capture everything pending. A failed capture keeps its positions pending
/// so the next tick retries them.
fn capture_pending(state: &mut SchedulerState) {
    let blocks = std::mem::take(&mut state.pending);
    state.queued = false;
    let time = state.start.elapsed().as_secs_f64();
    let Some(exporter) = state.exporter.as_mut() else {
        return;
    };
    trace!("Capturing {} changed position(s) at {time:.3}s", blocks.len());
    if let Err(e) = exporter.capture_pframe(time, &blocks) {
        error!("Failed to capture Vcap frame, keeping {} position(s) pending: {e}", blocks.len());
        state.pending.extend(blocks);
    }
}
