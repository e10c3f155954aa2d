//! Rendering adapter: renderer-agnostic interface plus the viewport.
//!
//! # Invariants
//! - Renderers never mutate the scene graph or the camera.
//! - `camera.aspect == surface.width / surface.height` after every resize.
//! - Resizing to the current size is a no-op and does not reconfigure the
//!   renderer.
//!
//! Backends implement [`Renderer`]; [`DebugTextRenderer`] is the headless
//! implementation used by the CLI and tests.

mod renderer;
mod viewport;

pub use renderer::{DebugTextRenderer, RenderError, Renderer, SurfaceSize};
pub use viewport::{Camera, Projection, ProjectionError, Viewport};

pub fn crate_info() -> &'static str {
    "orbitview-render v0.1.0"
}
