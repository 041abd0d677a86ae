//! render-ngin
//!
//! A backend-agnostic rendering core. Declarative 2D/3D scene descriptions
//! (vertices/edges/faces, materials, cameras, instance poses) are compiled
//! into GPU buffers and turned into draw calls through a pluggable
//! [`GraphicsDevice`](device::GraphicsDevice) collaborator, so the same
//! scene code runs against a browser canvas context, a desktop graphics
//! context or a recording mock.
//!
//! High-level modules
//! - `camera`: planar and spatial cameras with projection/unprojection
//! - `context`: central context that owns the device, camera and clear colour
//! - `data_structures`: engine data models (geometry, materials, textures, scene objects)
//! - `device`: the graphics-device trait every backend implements
//! - `error`: the pass-local error taxonomy
//! - `pipelines`: shaders and the semantic binding resolver
//! - `render`: per-frame draw orchestration
//! - `resources`: texture loading and image decode helpers
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod device;
pub mod error;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use crate::{
    context::Context,
    error::RenderError,
    render::{DrawPass, Renderer},
};
pub use cgmath::*;

/// Wire up `env_logger` as the log sink, the usual choice for native
/// binaries. Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    if let Err(e) = env_logger::try_init() {
        log::debug!("logger was already initialized: {e}");
    }
}
