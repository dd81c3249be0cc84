//! Keyframes, delta frames and their `world.dat` encoding

pub mod voxel;
pub mod keyframe;
pub mod delta;
pub mod sequence;
pub mod data;

pub use voxel::{resolve_voxel, VoxelState};
pub use keyframe::Keyframe;
pub use delta::DeltaFrame;
pub use sequence::{FrameSequence, FrameView};
pub use data::{write_world, FrameRecord};

/// One captured frame
#[derive(Clone, Debug)]
pub enum Frame {
    Key(Keyframe),
    Delta(DeltaFrame),
}

impl Frame {
    /// Seconds since the start of the capture
    pub fn time(&self) -> f64 {
        match self {
            Frame::Key(key) => key.time(),
            Frame::Delta(delta) => delta.time(),
        }
    }

    /// Number of voxel records
    pub fn len(&self) -> usize {
        match self {
            Frame::Key(key) => key.len(),
            Frame::Delta(delta) => delta.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, Frame::Key(_))
    }

    /// Serializable record for `world.dat`
    pub fn frame_data(&self) -> FrameRecord {
        match self {
            Frame::Key(key) => FrameRecord::from_keyframe(key),
            Frame::Delta(delta) => FrameRecord::from_delta(delta),
        }
    }
}
