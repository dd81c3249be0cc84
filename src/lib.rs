//! Vcap - voxel world capture into portable animation archives

pub mod core;
pub mod world;
pub mod model;
pub mod mesh;
pub mod material;
pub mod context;
pub mod frame;
pub mod atlas;
pub mod archive;
pub mod exporter;
pub mod events;
pub mod capture;
pub mod session;

pub use atlas::{AtlasSource, RenderHandle, RenderQueue};
pub use context::{ExportContext, VcapSettings};
pub use exporter::{SaveHandle, VcapExporter};
pub use session::CaptureSession;
