use crate::renderer::{Renderer, SurfaceSize};
use glam::{Mat4, Quat, Vec3};

/// Errors from out-of-range projection parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("field of view must be within (0, 180) degrees, got {0}")]
    InvalidFov(f32),
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClipPlanes { near: f32, far: f32 },
}

/// Perspective projection parameters (aspect excluded; it follows the surface).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn validate(&self) -> Result<(), ProjectionError> {
        // Negated comparisons so NaN is rejected too.
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ProjectionError::InvalidFov(self.fov_degrees));
        }
        if !(self.near > 0.0 && self.near < self.far && self.far.is_finite()) {
            return Err(ProjectionError::InvalidClipPlanes {
                near: self.near,
                far: self.far,
            });
        }
        Ok(())
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Perspective camera looking from `position` at `target`.
///
/// Pose fields are public; projection fields are owned by [`Viewport`] so
/// the aspect ratio can only change through a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let projection = Projection::default();
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: projection.fov_degrees,
            aspect: 1.0,
            near: projection.near,
            far: projection.far,
        }
    }
}

impl Camera {
    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn projection(&self) -> Projection {
        Projection {
            fov_degrees: self.fov_degrees,
            near: self.near,
            far: self.far,
        }
    }

    /// Unit vector from the eye toward the target (-Z when they coincide).
    pub fn forward(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length_squared() > f32::EPSILON {
            dir.normalize()
        } else {
            Vec3::NEG_Z
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.up)
    }

    /// World-space orientation of the camera (its local -Z faces forward).
    pub fn orientation(&self) -> Quat {
        Quat::from_mat4(&self.view_matrix().inverse()).normalize()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// A camera paired with the output surface it projects onto.
#[derive(Debug, Clone)]
pub struct Viewport {
    camera: Camera,
    surface: SurfaceSize,
    antialias: bool,
}

impl Viewport {
    pub fn new(
        surface: SurfaceSize,
        projection: Projection,
        antialias: bool,
    ) -> Result<Self, ProjectionError> {
        projection.validate()?;
        let camera = Camera {
            fov_degrees: projection.fov_degrees,
            aspect: surface.aspect(),
            near: projection.near,
            far: projection.far,
            ..Camera::default()
        };
        Ok(Self {
            camera,
            surface,
            antialias,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable access to the camera pose. Projection stays viewport-owned.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Push the current surface to a renderer (initial configuration).
    pub fn attach<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        renderer.configure(self.surface, self.antialias);
    }

    /// Track a new surface size. Returns false (and touches nothing) when the
    /// size is unchanged.
    pub fn resize<R: Renderer + ?Sized>(&mut self, width: u32, height: u32, renderer: &mut R) -> bool {
        let surface = SurfaceSize::new(width, height);
        if surface == self.surface {
            return false;
        }
        self.surface = surface;
        self.camera.aspect = surface.aspect();
        renderer.configure(surface, self.antialias);
        tracing::debug!(
            width = surface.width,
            height = surface.height,
            aspect = self.camera.aspect,
            "viewport resized"
        );
        true
    }

    /// Replace the projection. On error nothing changes.
    pub fn set_projection(&mut self, fov_degrees: f32, near: f32, far: f32) -> Result<(), ProjectionError> {
        let projection = Projection {
            fov_degrees,
            near,
            far,
        };
        projection.validate()?;
        self.camera.fov_degrees = fov_degrees;
        self.camera.near = near;
        self.camera.far = far;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderError;
    use orbitview_scene::SceneGraph;

    #[derive(Default)]
    struct ConfigLog {
        configured: Vec<(SurfaceSize, bool)>,
    }

    impl Renderer for ConfigLog {
        fn configure(&mut self, surface: SurfaceSize, antialias: bool) {
            self.configured.push((surface, antialias));
        }

        fn draw(&mut self, _: &SceneGraph, _: &Camera) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(SurfaceSize::new(1280, 720), Projection::default(), true).unwrap()
    }

    #[test]
    fn default_camera_matches_demo() {
        let cam = *viewport().camera();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(cam.fov_degrees(), 75.0);
        assert_eq!(cam.near(), 0.1);
        assert_eq!(cam.far(), 1000.0);
        assert_eq!(cam.aspect(), 1280.0 / 720.0);
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn resize_scenario_ends_at_sixteen_nine() {
        let mut vp = viewport();
        let mut renderer = ConfigLog::default();
        assert!(vp.resize(800, 600, &mut renderer));
        assert_eq!(vp.camera().aspect(), 800.0 / 600.0);
        assert!(vp.resize(1600, 900, &mut renderer));
        assert_eq!(vp.camera().aspect(), 16.0 / 9.0);
        assert_eq!(
            renderer.configured,
            vec![
                (SurfaceSize::new(800, 600), true),
                (SurfaceSize::new(1600, 900), true)
            ]
        );
    }

    #[test]
    fn resize_is_idempotent() {
        let mut vp = viewport();
        let mut renderer = ConfigLog::default();
        vp.resize(1024, 768, &mut renderer);
        let after_first = *vp.camera();
        assert!(!vp.resize(1024, 768, &mut renderer));
        assert_eq!(*vp.camera(), after_first);
        assert_eq!(renderer.configured.len(), 1);
    }

    #[test]
    fn resize_to_zero_is_clamped() {
        let mut vp = viewport();
        let mut renderer = ConfigLog::default();
        vp.resize(640, 0, &mut renderer);
        assert_eq!(vp.surface(), SurfaceSize::new(640, 1));
        assert_eq!(vp.camera().aspect(), 640.0);
    }

    #[test]
    fn valid_projections_are_accepted_and_keep_aspect() {
        let mut renderer = ConfigLog::default();
        for (fov, near, far) in [(1.0, 0.001, 0.002), (45.0, 0.1, 100.0), (179.0, 10.0, 1e6)] {
            let mut vp = viewport();
            vp.set_projection(fov, near, far).unwrap();
            vp.resize(300, 200, &mut renderer);
            assert_eq!(vp.camera().projection(), Projection { fov_degrees: fov, near, far });
            assert_eq!(vp.camera().aspect(), 300.0 / 200.0);
        }
    }

    #[test]
    fn invalid_projections_leave_state_unchanged() {
        let mut vp = viewport();
        let before = *vp.camera();
        let cases = [
            (0.0, 0.1, 100.0),
            (-10.0, 0.1, 100.0),
            (180.0, 0.1, 100.0),
            (200.0, 0.1, 100.0),
            (f32::NAN, 0.1, 100.0),
            (60.0, 0.0, 100.0),
            (60.0, 100.0, 100.0),
            (60.0, 200.0, 100.0),
            (60.0, f32::NAN, 100.0),
            (60.0, 0.1, f32::INFINITY),
        ];
        for (fov, near, far) in cases {
            assert!(
                vp.set_projection(fov, near, far).is_err(),
                "accepted fov={fov} near={near} far={far}"
            );
            assert_eq!(vp.camera().projection(), before.projection());
        }
        assert!(matches!(
            vp.set_projection(180.0, 0.1, 1.0),
            Err(ProjectionError::InvalidFov(_))
        ));
        assert!(matches!(
            vp.set_projection(60.0, 2.0, 1.0),
            Err(ProjectionError::InvalidClipPlanes { .. })
        ));
    }

    #[test]
    fn new_rejects_bad_projection() {
        let bad = Projection {
            fov_degrees: 90.0,
            near: 5.0,
            far: 1.0,
        };
        assert!(Viewport::new(SurfaceSize::new(10, 10), bad, false).is_err());
    }

    #[test]
    fn orientation_faces_target() {
        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam.target = Vec3::ZERO;
        let facing = cam.orientation() * Vec3::NEG_Z;
        assert!(facing.abs_diff_eq(Vec3::NEG_Z, 1e-5));

        cam.position = Vec3::new(5.0, 0.0, 0.0);
        let facing = cam.orientation() * Vec3::NEG_Z;
        assert!(facing.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn attach_pushes_current_surface() {
        let vp = viewport();
        let mut renderer = ConfigLog::default();
        vp.attach(&mut renderer);
        assert_eq!(renderer.configured, vec![(SurfaceSize::new(1280, 720), true)]);
    }
}
