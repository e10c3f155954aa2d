//! wgpu render backend.
//!
//! Draws every mesh node of a scene graph lit by its point lights, instanced
//! per distinct geometry, into a window surface.
//!
//! # Invariants
//! - Drawing never mutates the scene or the camera.
//! - Surface `Outdated`/`Timeout` skip a frame; any other surface failure or a
//!   lost device is reported as `RenderError::ContextLost`.
//! - At most `MAX_LIGHTS` point lights contribute to a frame.

mod gpu;
pub mod mesh;
mod shaders;

pub use gpu::{GpuInitError, WgpuRenderer};
pub use mesh::{GeometryKey, MeshData, Vertex};
pub use shaders::MAX_LIGHTS;

pub fn crate_info() -> &'static str {
    "orbitview-render-wgpu v0.1.0"
}
