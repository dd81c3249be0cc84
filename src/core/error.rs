//! Error types for Vcap capture and export

use thiserror::Error;

use crate::world::ChunkPos;

/// Main error type for capture and export
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid capture bounds: min chunk {min}, max chunk {max}")]
    InvalidBounds { min: ChunkPos, max: ChunkPos },

    #[error("Sequencing error: {0}")]
    Sequencing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("NBT error: {0}")]
    Nbt(#[from] fastnbt::error::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Render context unavailable: {0}")]
    RenderUnavailable(String),

    #[error("Atlas extraction failed: {0}")]
    Atlas(String),

    #[error("Save failed: {0}")]
    Save(String),
}
