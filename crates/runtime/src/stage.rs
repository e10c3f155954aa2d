use orbitview_input::{OrbitControls, PointerEvent};
use orbitview_render::{Renderer, Viewport};
use orbitview_scene::SceneGraph;

/// Everything a frame needs, owned in one place.
///
/// The render loop borrows a stage per tick; hosts forward resize and
/// pointer events to it directly.
pub struct Stage<R> {
    pub scene: SceneGraph,
    pub viewport: Viewport,
    pub controls: OrbitControls,
    pub renderer: R,
}

impl<R: Renderer> Stage<R> {
    /// Assemble a stage and configure the renderer for the viewport's surface.
    pub fn new(scene: SceneGraph, viewport: Viewport, controls: OrbitControls, mut renderer: R) -> Self {
        viewport.attach(&mut renderer);
        Self {
            scene,
            viewport,
            controls,
            renderer,
        }
    }

    /// Host resize. Returns whether the surface actually changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.viewport.resize(width, height, &mut self.renderer)
    }

    /// Host pointer input. Returns whether the controls consumed it.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.controls.handle_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orbitview_render::{DebugTextRenderer, Projection, SurfaceSize};

    fn stage() -> Stage<DebugTextRenderer> {
        let viewport = Viewport::new(SurfaceSize::new(640, 480), Projection::default(), true).unwrap();
        let controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        Stage::new(SceneGraph::new(), viewport, controls, DebugTextRenderer::new())
    }

    #[test]
    fn new_configures_renderer() {
        let s = stage();
        assert_eq!(s.renderer.surface(), SurfaceSize::new(640, 480));
        assert!(s.renderer.antialias());
    }

    #[test]
    fn resize_reaches_viewport_and_renderer() {
        let mut s = stage();
        assert!(s.resize(1600, 900));
        assert!(!s.resize(1600, 900));
        assert_eq!(s.viewport.camera().aspect(), 16.0 / 9.0);
        assert_eq!(s.renderer.surface(), SurfaceSize::new(1600, 900));
    }

    #[test]
    fn pointer_events_reach_controls() {
        let mut s = stage();
        assert!(s.handle_pointer(PointerEvent::Wheel { delta: 1.0 }));
    }
}
