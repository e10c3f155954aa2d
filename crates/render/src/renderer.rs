use crate::viewport::Camera;
use orbitview_scene::{SceneGraph, SceneInspector};
use serde::Serialize;
use std::fmt::Write as _;

/// Drawable surface dimensions in physical pixels. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// Zero dimensions (minimized windows) are clamped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Errors a renderer can report from `draw`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The drawing surface or device is gone; drawing again will not help.
    #[error("drawing context lost: {0}")]
    ContextLost(String),
}

/// Renderer-agnostic interface. All backends implement this trait.
///
/// The renderer reads the scene and camera and produces a frame. It never
/// mutates either; scene state is owned by the graph, camera state by the
/// viewport.
pub trait Renderer {
    /// (Re)configure the output surface.
    fn configure(&mut self, surface: SurfaceSize, antialias: bool);

    /// Draw one frame of `scene` as seen through `camera`.
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn configure(&mut self, surface: SurfaceSize, antialias: bool) {
        (**self).configure(surface, antialias);
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        (**self).draw(scene, camera)
    }
}

/// Headless renderer producing a human-readable dump of each frame.
///
/// Used by the CLI and tests. It can simulate a lost context after a given
/// number of frames to exercise the render loop's shutdown path.
#[derive(Debug)]
pub struct DebugTextRenderer {
    surface: SurfaceSize,
    antialias: bool,
    frames: u64,
    last_frame: String,
    lose_context_after: Option<u64>,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self {
            surface: SurfaceSize::new(1, 1),
            antialias: false,
            frames: 0,
            last_frame: String::new(),
            lose_context_after: None,
        }
    }

    /// Fail every draw once `frames` frames have been produced.
    pub fn with_context_loss_after(mut self, frames: u64) -> Self {
        self.lose_context_after = Some(frames);
        self
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Number of frames successfully drawn.
    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Text of the most recent frame; empty before the first draw.
    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    pub fn render_text(&self, scene: &SceneGraph, camera: &Camera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}, antialias={}) ===",
            self.frames + 1,
            self.surface.width,
            self.surface.height,
            self.antialias
        );
        let _ = writeln!(out, "Nodes: {}", scene.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees(),
            camera.aspect()
        );
        for info in SceneInspector::nodes(scene) {
            let _ = writeln!(out, "  {info}");
        }
        out
    }
}

impl Renderer for DebugTextRenderer {
    fn configure(&mut self, surface: SurfaceSize, antialias: bool) {
        tracing::debug!(
            width = surface.width,
            height = surface.height,
            antialias,
            "debug renderer configured"
        );
        self.surface = surface;
        self.antialias = antialias;
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        if self.lose_context_after.is_some_and(|limit| self.frames >= limit) {
            return Err(RenderError::ContextLost(format!(
                "simulated loss after {} frames",
                self.frames
            )));
        }
        self.last_frame = self.render_text(scene, camera);
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orbitview_scene::{CapsuleGeometry, Drawable, Geometry, Node, StandardMaterial};

    #[test]
    fn surface_size_clamps_zero() {
        let s = SurfaceSize::new(0, 0);
        assert_eq!((s.width, s.height), (1, 1));
        assert_eq!(SurfaceSize::new(1600, 900).aspect(), 16.0 / 9.0);
    }

    #[test]
    fn debug_renderer_empty_scene() {
        let mut renderer = DebugTextRenderer::new();
        renderer.draw(&SceneGraph::new(), &Camera::default()).unwrap();
        assert_eq!(renderer.frames_drawn(), 1);
        assert!(renderer.last_frame().contains("Frame 1"));
        assert!(renderer.last_frame().contains("Nodes: 0"));
    }

    #[test]
    fn debug_renderer_lists_nodes() {
        let mut scene = SceneGraph::new();
        scene.add(
            Node::new(
                "capsule",
                Drawable::mesh(
                    Geometry::Capsule(CapsuleGeometry::default()),
                    StandardMaterial::default(),
                ),
            )
            .with_position(Vec3::new(1.0, 2.0, 3.0)),
        );
        let mut renderer = DebugTextRenderer::new();
        renderer.configure(SurfaceSize::new(800, 600), true);
        renderer.draw(&scene, &Camera::default()).unwrap();

        let frame = renderer.last_frame();
        assert!(frame.contains("800x600"));
        assert!(frame.contains("antialias=true"));
        assert!(frame.contains("capsule (capsule) pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn simulated_context_loss() {
        let mut renderer = DebugTextRenderer::new().with_context_loss_after(2);
        let scene = SceneGraph::new();
        let camera = Camera::default();
        assert!(renderer.draw(&scene, &camera).is_ok());
        assert!(renderer.draw(&scene, &camera).is_ok());
        assert!(matches!(
            renderer.draw(&scene, &camera),
            Err(RenderError::ContextLost(_))
        ));
        assert_eq!(renderer.frames_drawn(), 2);
    }

    #[test]
    fn boxed_renderer_forwards() {
        let mut boxed: Box<dyn Renderer> = Box::new(DebugTextRenderer::new());
        boxed.configure(SurfaceSize::new(10, 10), false);
        assert!(boxed.draw(&SceneGraph::new(), &Camera::default()).is_ok());
    }
}
