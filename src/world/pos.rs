//! Block and chunk coordinates and the capture bounding box

use std::fmt;

use crate::core::{Error, Result};

/// Width of a chunk column in blocks (X and Z)
pub const CHUNK_WIDTH: i32 = 16;

/// Integer block coordinate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset by a delta
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent positions (-X, +X, -Y, +Y, -Z, +Z)
    pub const fn neighbors(self) -> [BlockPos; 6] {
        [
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
            self.offset(0, -1, 0),
            self.offset(0, 1, 0),
            self.offset(0, 0, -1),
            self.offset(0, 0, 1),
        ]
    }

    /// Chunk column containing this block
    pub fn chunk(self) -> ChunkPos {
        ChunkPos::new(
            self.x.div_euclid(CHUNK_WIDTH),
            self.z.div_euclid(CHUNK_WIDTH),
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk column coordinate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    /// Create a new chunk coordinate
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// X of the first block column in this chunk
    pub const fn min_block_x(self) -> i32 {
        self.x * CHUNK_WIDTH
    }

    /// Z of the first block column in this chunk
    pub const fn min_block_z(self) -> i32 {
        self.z * CHUNK_WIDTH
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Chunk-aligned capture region: `min` inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkBox {
    min: ChunkPos,
    max: ChunkPos,
}

impl ChunkBox {
    /// Create a box, rejecting `min` past `max` on either axis and boxes
    /// whose block coordinates or widths do not fit in an `i32`.
    pub fn new(min: ChunkPos, max: ChunkPos) -> Result<Self> {
        if min.x > max.x || min.z > max.z {
            return Err(Error::InvalidBounds { min, max });
        }
        let span = |lo: i32, hi: i32| {
            let lo = lo.checked_mul(CHUNK_WIDTH)?;
            hi.checked_mul(CHUNK_WIDTH)?.checked_sub(lo)
        };
        if span(min.x, max.x).is_none() || span(min.z, max.z).is_none() {
            return Err(Error::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Box spanning `radius` chunks on each side of `origin`.
    pub fn around(origin: ChunkPos, radius: u32) -> Result<Self> {
        let invalid = || Error::InvalidBounds {
            min: origin,
            max: origin,
        };
        let r = i32::try_from(radius).map_err(|_| invalid())?;
        let min_x = origin.x.checked_sub(r).ok_or_else(invalid)?;
        let min_z = origin.z.checked_sub(r).ok_or_else(invalid)?;
        let max_x = origin.x.checked_add(r).ok_or_else(invalid)?;
        let max_z = origin.z.checked_add(r).ok_or_else(invalid)?;
        Self::new(ChunkPos::new(min_x, min_z), ChunkPos::new(max_x, max_z))
    }

    /// Minimum chunk (inclusive)
    pub fn min(&self) -> ChunkPos {
        self.min
    }

    /// Maximum chunk (exclusive)
    pub fn max(&self) -> ChunkPos {
        self.max
    }

    /// Number of block columns along X
    pub fn width_x(&self) -> i32 {
        (self.max.x - self.min.x) * CHUNK_WIDTH
    }

    /// Number of block columns along Z
    pub fn width_z(&self) -> i32 {
        (self.max.z - self.min.z) * CHUNK_WIDTH
    }

    /// Number of block columns in the box
    pub fn column_count(&self) -> usize {
        self.width_x() as usize * self.width_z() as usize
    }

    /// Whether the block column (x, z) lies inside the box
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        x >= self.min.min_block_x()
            && x < self.max.min_block_x()
            && z >= self.min.min_block_z()
            && z < self.max.min_block_z()
    }

    /// Iterate every block position between `bottom_y` and `top_y` (exclusive).
    ///
    /// Order is Y-major, then Z, then X; the dense index of a position in
    /// this sequence is [`ChunkBox::index_of`].
    pub fn positions(&self, bottom_y: i32, top_y: i32) -> impl Iterator<Item = BlockPos> + use<> {
        let (x0, x1) = (self.min.min_block_x(), self.max.min_block_x());
        let (z0, z1) = (self.min.min_block_z(), self.max.min_block_z());
        (bottom_y..top_y).flat_map(move |y| {
            (z0..z1).flat_map(move |z| (x0..x1).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    /// Dense index of `pos` in [`ChunkBox::positions`] order, if inside.
    pub fn index_of(&self, pos: BlockPos, bottom_y: i32, top_y: i32) -> Option<usize> {
        if pos.y < bottom_y || pos.y >= top_y || !self.contains_column(pos.x, pos.z) {
            return None;
        }
        let lx = (pos.x - self.min.min_block_x()) as usize;
        let lz = (pos.z - self.min.min_block_z()) as usize;
        let ly = (pos.y - bottom_y) as usize;
        let wx = self.width_x() as usize;
        let wz = self.width_z() as usize;
        Some((ly * wz + lz) * wx + lx)
    }
}
