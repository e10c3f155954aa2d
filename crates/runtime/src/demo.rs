//! Explicit initialization of the demo stage.

use crate::animation::Spin;
use crate::config::DemoConfig;
use crate::render_loop::RenderLoop;
use crate::stage::Stage;
use glam::Vec3;
use orbitview_common::{Color, NodeId, Transform};
use orbitview_input::{ControlsError, OrbitControls};
use orbitview_render::{Projection, ProjectionError, Renderer, SurfaceSize, Viewport};
use orbitview_scene::{
    CapsuleGeometry, Drawable, DrawableError, Geometry, Node, PointLight, SceneGraph,
    StandardMaterial,
};

/// Squared sine of the smallest accepted angle between the view and up axes.
const POLE_CROSS_EPSILON: f32 = 1e-8;

/// Anything that can be wrong with a configuration, caught before the first
/// frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Drawable(#[from] DrawableError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Controls(#[from] ControlsError),
    #[error("camera must be finite, apart from its target and not looking straight along the up axis")]
    DegenerateCamera,
    #[error("spin step must be finite, got {0}")]
    InvalidSpin(Vec3),
}

/// Ids of the nodes the demo creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoHandles {
    pub capsule: NodeId,
    pub light: NodeId,
}

/// A ready-to-run demo: the loop is stopped until the host starts it.
pub struct Demo<R> {
    pub stage: Stage<R>,
    pub render_loop: RenderLoop,
    pub handles: DemoHandles,
}

/// Build the demo scene: one capsule and one point light, both roots.
pub fn build_scene(config: &DemoConfig) -> Result<(SceneGraph, DemoHandles), SetupError> {
    let c = &config.capsule;
    let geometry = CapsuleGeometry::new(c.radius, c.length, c.cap_segments, c.radial_segments)?;
    let material = StandardMaterial::new(Color::from_hex(c.color))
        .with_roughness(c.roughness)?
        .with_metalness(c.metalness)?;

    let l = &config.light;
    let light = PointLight::new(Color::from_hex(l.color), l.intensity)?.with_range(l.distance, l.decay)?;

    let mut scene = SceneGraph::new();
    let capsule = scene.add(Node::new(
        "capsule",
        Drawable::mesh(Geometry::Capsule(geometry), material),
    ));
    let light = scene.add(
        Node::new("light", Drawable::PointLight(light))
            .with_transform(Transform::from_position(l.position)),
    );
    Ok((scene, DemoHandles { capsule, light }))
}

/// Validate `config` and assemble a stage around `renderer` for a
/// `width` x `height` surface.
pub fn build_stage<R: Renderer>(
    config: &DemoConfig,
    renderer: R,
    width: u32,
    height: u32,
) -> Result<Demo<R>, SetupError> {
    let cam = &config.camera;
    if !(cam.position.is_finite() && cam.target.is_finite()) || cam.position == cam.target {
        return Err(SetupError::DegenerateCamera);
    }
    // The view basis is built from forward x up; a parallel pair has no basis.
    let forward = (cam.target - cam.position).normalize();
    if forward.cross(Vec3::Y).length_squared() < POLE_CROSS_EPSILON {
        return Err(SetupError::DegenerateCamera);
    }
    if !config.animation.spin.is_finite() {
        return Err(SetupError::InvalidSpin(config.animation.spin));
    }

    let projection = Projection {
        fov_degrees: cam.fov,
        near: cam.near,
        far: cam.far,
    };
    let mut viewport = Viewport::new(
        SurfaceSize::new(width, height),
        projection,
        config.renderer.antialias,
    )?;
    viewport.camera_mut().position = cam.position;
    viewport.camera_mut().target = cam.target;

    let ctl = &config.controls;
    let controls = OrbitControls::new(cam.position, cam.target)
        .with_damping(ctl.enable_damping, ctl.damping_factor)?
        .with_distance_limits(ctl.min_distance, ctl.max_distance.unwrap_or(f32::INFINITY))?;

    let (scene, handles) = build_scene(config)?;

    let mut render_loop = RenderLoop::new();
    render_loop.add_animation(Spin::new(handles.capsule, config.animation.spin));

    let stage = Stage::new(scene, viewport, controls, renderer);
    tracing::info!(
        width = stage.viewport.surface().width,
        height = stage.viewport.surface().height,
        antialias = config.renderer.antialias,
        nodes = stage.scene.len(),
        "demo stage ready"
    );
    Ok(Demo {
        stage,
        render_loop,
        handles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ManualDriver;
    use orbitview_render::DebugTextRenderer;

    fn demo(config: &DemoConfig) -> Result<Demo<DebugTextRenderer>, SetupError> {
        build_stage(config, DebugTextRenderer::new(), 800, 600)
    }

    #[test]
    fn default_demo_builds() {
        let demo = demo(&DemoConfig::default()).unwrap();
        assert_eq!(demo.stage.scene.len(), 2);
        assert!(!demo.render_loop.is_running());
        assert_eq!(demo.render_loop.animation_count(), 1);
        assert_eq!(demo.stage.renderer.surface(), SurfaceSize::new(800, 600));
        assert!(demo.stage.renderer.antialias());

        let light = demo.stage.scene.get(demo.handles.light).unwrap();
        assert_eq!(light.transform.position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(light.drawable.as_light().unwrap().intensity(), 40.0);

        let capsule = demo.stage.scene.get(demo.handles.capsule).unwrap();
        match capsule.drawable {
            Drawable::Mesh { material, .. } => assert_eq!(material.color.to_hex(), 0xfa8072),
            other => panic!("expected mesh, got {other:?}"),
        }
    }

    #[test]
    fn default_demo_spins_one_radian_in_hundred_ticks() {
        let mut demo = demo(&DemoConfig::default()).unwrap();
        demo.render_loop.start();
        let report = ManualDriver::new(100).run(&mut demo.render_loop, &mut demo.stage);
        assert_eq!(report.frames_drawn, 100);
        let rotation = demo.stage.scene.get(demo.handles.capsule).unwrap().transform.rotation;
        assert!((rotation.x - 1.0).abs() < 1e-4);
        assert!((rotation.y - 1.0).abs() < 1e-4);
        // No input: the camera stays where it was configured.
        assert!(demo.stage.viewport.camera().position.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-4));
    }

    #[test]
    fn invalid_values_are_rejected_up_front() {
        let mut config = DemoConfig::default();
        config.camera.fov = 180.0;
        assert!(matches!(demo(&config), Err(SetupError::Projection(_))));

        let mut config = DemoConfig::default();
        config.camera.near = 2000.0;
        assert!(matches!(demo(&config), Err(SetupError::Projection(_))));

        let mut config = DemoConfig::default();
        config.capsule.radius = 0.0;
        assert!(matches!(demo(&config), Err(SetupError::Drawable(_))));

        let mut config = DemoConfig::default();
        config.capsule.roughness = 1.5;
        assert!(matches!(demo(&config), Err(SetupError::Drawable(_))));

        let mut config = DemoConfig::default();
        config.light.intensity = -1.0;
        assert!(matches!(demo(&config), Err(SetupError::Drawable(_))));

        let mut config = DemoConfig::default();
        config.controls.damping_factor = 1.0;
        assert!(matches!(demo(&config), Err(SetupError::Controls(_))));

        let mut config = DemoConfig::default();
        config.camera.target = config.camera.position;
        assert_eq!(demo(&config).err(), Some(SetupError::DegenerateCamera));

        let mut config = DemoConfig::default();
        config.animation.spin = Vec3::new(f32::NAN, 0.0, 0.0);
        assert!(matches!(demo(&config), Err(SetupError::InvalidSpin(_))));
    }

    #[test]
    fn camera_straight_above_or_below_target_is_rejected() {
        for position in [Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0)] {
            let mut config = DemoConfig::default();
            config.camera.position = position;
            config.camera.target = Vec3::ZERO;
            config.controls.damping_factor = 0.0;
            assert_eq!(demo(&config).err(), Some(SetupError::DegenerateCamera));
        }
    }

    #[test]
    fn steep_camera_keeps_a_finite_view() {
        let mut config = DemoConfig::default();
        config.camera.position = Vec3::new(0.05, 5.0, 0.0);
        config.controls.damping_factor = 0.0;
        let mut demo = demo(&config).unwrap();
        assert!(demo.stage.viewport.camera().view_projection().is_finite());

        demo.render_loop.start();
        ManualDriver::new(3).run(&mut demo.render_loop, &mut demo.stage);
        assert!(demo.stage.viewport.camera().view_projection().is_finite());
    }

    #[test]
    fn configured_camera_is_applied() {
        let mut config = DemoConfig::default();
        config.camera.position = Vec3::new(0.0, 3.0, 4.0);
        config.camera.fov = 50.0;
        let demo = demo(&config).unwrap();
        let camera = demo.stage.viewport.camera();
        assert_eq!(camera.position, Vec3::new(0.0, 3.0, 4.0));
        assert_eq!(camera.fov_degrees(), 50.0);
        assert_eq!(camera.aspect(), 800.0 / 600.0);
    }
}
