//! NBT layout of `world.dat`
//!
//! The document root is `{frames: [...]}`. Every frame carries its own
//! palette of mesh ids; voxel columns index into it, with `-1` for "none".

use std::collections::HashMap;
use std::io::Write;

use fastnbt::{ByteArray, IntArray};
use serde::Serialize;

use crate::context::MeshId;
use crate::core::Result;

use super::voxel::VoxelState;
use super::{DeltaFrame, Frame, Keyframe};

const KEYFRAME_TYPE: i8 = 0;
const DELTA_TYPE: i8 = 1;
const NONE: i32 = -1;

/// A frame as stored in the world document
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FrameRecord {
    Key(KeyframeRecord),
    Delta(DeltaRecord),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeRecord {
    #[serde(rename = "type")]
    kind: i8,
    time: f64,
    min_chunk: IntArray,
    max_chunk: IntArray,
    bottom_y: i32,
    height: i32,
    palette: Vec<String>,
    blocks: IntArray,
    fluids: IntArray,
    tints: IntArray,
    light: ByteArray,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaRecord {
    #[serde(rename = "type")]
    kind: i8,
    time: f64,
    palette: Vec<String>,
    /// Flattened x, y, z triples
    positions: IntArray,
    blocks: IntArray,
    fluids: IntArray,
    tints: IntArray,
    light: ByteArray,
}

impl FrameRecord {
    pub fn from_keyframe(frame: &Keyframe) -> Self {
        let mut columns = Columns::with_capacity(frame.len());
        for voxel in frame.voxels() {
            columns.push(voxel);
        }
        let bounds = frame.bounds();
        FrameRecord::Key(KeyframeRecord {
            kind: KEYFRAME_TYPE,
            time: frame.time(),
            min_chunk: IntArray::new(vec![bounds.min().x, bounds.min().z]),
            max_chunk: IntArray::new(vec![bounds.max().x, bounds.max().z]),
            bottom_y: frame.bottom_y(),
            height: frame.height(),
            palette: columns.palette,
            blocks: IntArray::new(columns.blocks),
            fluids: IntArray::new(columns.fluids),
            tints: IntArray::new(columns.tints),
            light: ByteArray::new(columns.light),
        })
    }

    pub fn from_delta(frame: &DeltaFrame) -> Self {
        let mut columns = Columns::with_capacity(frame.len());
        let mut positions = Vec::with_capacity(frame.len() * 3);
        for (pos, voxel) in frame.voxels() {
            positions.extend([pos.x, pos.y, pos.z]);
            columns.push(voxel);
        }
        FrameRecord::Delta(DeltaRecord {
            kind: DELTA_TYPE,
            time: frame.time(),
            palette: columns.palette,
            positions: IntArray::new(positions),
            blocks: IntArray::new(columns.blocks),
            fluids: IntArray::new(columns.fluids),
            tints: IntArray::new(columns.tints),
            light: ByteArray::new(columns.light),
        })
    }
}

/// Palette-indexed voxel columns
struct Columns {
    palette: Vec<String>,
    lookup: HashMap<MeshId, i32>,
    blocks: Vec<i32>,
    fluids: Vec<i32>,
    tints: Vec<i32>,
    light: Vec<i8>,
}

impl Columns {
    fn with_capacity(n: usize) -> Self {
        Self {
            palette: Vec::new(),
            lookup: HashMap::new(),
            blocks: Vec::with_capacity(n),
            fluids: Vec::with_capacity(n),
            tints: Vec::with_capacity(n),
            light: Vec::with_capacity(n),
        }
    }

    fn index(&mut self, id: &MeshId) -> i32 {
        if let Some(&index) = self.lookup.get(id) {
            return index;
        }
        let index = self.palette.len() as i32;
        self.palette.push(id.to_string());
        self.lookup.insert(id.clone(), index);
        index
    }

    fn push(&mut self, voxel: &VoxelState) {
        let block = self.index(&voxel.model);
        let fluid = voxel.fluid.as_ref().map_or(NONE, |id| self.index(id));
        self.blocks.push(block);
        self.fluids.push(fluid);
        // Tints are 24-bit RGB, so they never collide with -1
        self.tints.push(voxel.tint.map_or(NONE, |rgb| (rgb & 0xff_ffff) as i32));
        self.light.push(voxel.light.min(15) as i8);
    }
}

#[derive(Serialize)]
struct WorldDocument {
    frames: Vec<FrameRecord>,
}

/// Encode the ordered frame list as uncompressed NBT
pub fn write_world<W: Write>(frames: &[Frame], mut out: W) -> Result<()> {
    let document = WorldDocument {
        frames: frames.iter().map(Frame::frame_data).collect(),
    };
    let bytes = fastnbt::to_bytes(&document)?;
    out.write_all(&bytes)?;
    Ok(())
}
