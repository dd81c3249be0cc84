//! Time-ordered frame list and point-in-time voxel lookup

use std::collections::HashMap;

use crate::core::{Error, Result};
use crate::world::BlockPos;

use super::keyframe::Keyframe;
use super::voxel::VoxelState;
use super::Frame;

/// Ordered frames of one capture session.
///
/// The first frame is always a keyframe and timestamps strictly increase.
/// Changes recorded since the latest keyframe are folded into an overlay,
/// so lookups do not depend on how many deltas were captured.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    /// Index of the latest keyframe
    key: usize,
    overlay: HashMap<BlockPos, VoxelState>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame, enforcing ordering
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        match self.frames.last() {
            None if matches!(frame, Frame::Delta(_)) => {
                return Err(Error::Sequencing(
                    "the first frame of a capture must be a keyframe".to_string(),
                ));
            }
            Some(last) if frame.time() <= last.time() => {
                return Err(Error::Sequencing(format!(
                    "frame at {}s does not follow frame at {}s",
                    frame.time(),
                    last.time()
                )));
            }
            _ => {}
        }
        match &frame {
            Frame::Key(_) => {
                self.key = self.frames.len();
                self.overlay.clear();
            }
            Frame::Delta(delta) => {
                self.overlay
                    .extend(delta.voxels().map(|(pos, voxel)| (*pos, voxel.clone())));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// State as of the latest frame. Fails when nothing was captured yet.
    pub fn view(&self) -> Result<FrameView<'_>> {
        match self.frames.get(self.key) {
            Some(Frame::Key(key)) => Ok(FrameView {
                key,
                overlay: &self.overlay,
            }),
            _ => Err(Error::Sequencing(
                "no prior frame; capture a keyframe first".to_string(),
            )),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Voxel state as of the last frame of a non-empty sequence
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    key: &'a Keyframe,
    overlay: &'a HashMap<BlockPos, VoxelState>,
}

impl<'a> FrameView<'a> {
    /// Latest recorded state of `pos`.
    /// `None` means the position lies outside the captured box.
    pub fn voxel(&self, pos: BlockPos) -> Option<&'a VoxelState> {
        self.overlay.get(&pos).or_else(|| self.key.voxel(pos))
    }
}
