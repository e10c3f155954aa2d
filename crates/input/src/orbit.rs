//! Orbit controls: drag to rotate around a target, right-drag to pan,
//! wheel or middle-drag to dolly.
//!
//! Events only move the *goal* orbit. The render loop polls a
//! [`ControlsState`] once per tick and eases the camera toward it.

use crate::event::{PointerButton, PointerEvent};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Keeps the polar angle off the poles so the view basis stays defined.
const POLE_EPSILON: f32 = 1e-4;

/// Middle-drag pixels per wheel notch.
const DOLLY_PIXELS_PER_NOTCH: f32 = 50.0;

/// Errors from controls configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlsError {
    #[error("damping factor must be within [0, 1), got {0}")]
    InvalidDamping(f32),
    #[error("distance limits must satisfy 0 < min <= max, got min={min} max={max}")]
    InvalidDistance { min: f32, max: f32 },
}

/// Spherical coordinates around a target, Y up.
///
/// `phi` is the polar angle from +Y, `theta` the azimuth from +Z toward +X.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Snapshot of the controls handed to the render loop each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlsState {
    pub enable_damping: bool,
    /// Fraction of the remaining distance covered per tick, in `[0, 1)`.
    pub damping_factor: f32,
    /// Goal look-at point.
    pub target: Vec3,
    /// Goal camera placement relative to `target`.
    pub orbit: Spherical,
    /// Pointer drag (pixels) accumulated since the previous poll.
    pub drag_velocity: Vec2,
}

impl ControlsState {
    /// Interpolation factor for this tick: the damping factor, or 1 (snap)
    /// when damping is off.
    pub fn step_factor(&self) -> f32 {
        if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        }
    }

    /// Goal eye position.
    pub fn eye(&self) -> Vec3 {
        self.target + self.orbit.to_offset()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
    Dolly,
}

/// Orbit camera controls.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    enable_damping: bool,
    damping_factor: f32,
    min_distance: f32,
    max_distance: f32,
    goal: Spherical,
    target: Vec3,
    drag: Option<(PointerButton, DragMode)>,
    last_pointer: Option<Vec2>,
    rotate_delta: Vec2,
    pan_delta: Vec2,
    zoom_delta: f32,
}

impl OrbitControls {
    /// Controls orbiting `target` from `eye`, damping off.
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.01,
            max_distance: f32::INFINITY,
            goal: clamp_polar(Spherical::from_offset(eye - target)),
            target,
            drag: None,
            last_pointer: None,
            rotate_delta: Vec2::ZERO,
            pan_delta: Vec2::ZERO,
            zoom_delta: 0.0,
        }
    }

    pub fn with_damping(mut self, enabled: bool, factor: f32) -> Result<Self, ControlsError> {
        if !(0.0..1.0).contains(&factor) {
            return Err(ControlsError::InvalidDamping(factor));
        }
        self.enable_damping = enabled;
        self.damping_factor = factor;
        Ok(self)
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Result<Self, ControlsError> {
        if !(min > 0.0 && min <= max) {
            return Err(ControlsError::InvalidDistance { min, max });
        }
        self.min_distance = min;
        self.max_distance = max;
        self.goal.radius = self.goal.radius.clamp(min, max);
        Ok(self)
    }

    pub fn enable_damping(&self) -> bool {
        self.enable_damping
    }

    pub fn damping_factor(&self) -> f32 {
        self.damping_factor
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn goal(&self) -> Spherical {
        self.goal
    }

    /// Discard pending input and aim the goal at a new eye/target pair.
    pub fn reset(&mut self, eye: Vec3, target: Vec3) {
        self.target = target;
        self.goal = clamp_polar(Spherical::from_offset(eye - target));
        self.goal.radius = self.goal.radius.clamp(self.min_distance, self.max_distance);
        self.drag = None;
        self.last_pointer = None;
        self.rotate_delta = Vec2::ZERO;
        self.pan_delta = Vec2::ZERO;
        self.zoom_delta = 0.0;
    }

    /// Feed one host event. Returns true if the controls consumed it.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        if !self.enabled {
            return false;
        }
        // Every positioned event updates the tracked pointer, so a drag delta
        // is always measured from the last known position.
        let last = match event.position() {
            Some(position) => self.last_pointer.replace(position),
            None => self.last_pointer,
        };
        match event {
            PointerEvent::Down { button, .. } => {
                let mode = match button {
                    PointerButton::Primary => DragMode::Rotate,
                    PointerButton::Secondary => DragMode::Pan,
                    PointerButton::Middle => DragMode::Dolly,
                };
                tracing::trace!(?button, ?mode, "orbit drag started");
                self.drag = Some((button, mode));
                true
            }
            PointerEvent::Move { position } => {
                let (Some((_, mode)), Some(last)) = (self.drag, last) else {
                    return false;
                };
                let delta = position - last;
                match mode {
                    DragMode::Rotate => self.rotate_delta += delta,
                    DragMode::Pan => self.pan_delta += delta,
                    DragMode::Dolly => self.zoom_delta += delta.y / DOLLY_PIXELS_PER_NOTCH,
                }
                true
            }
            PointerEvent::Up { button } => match self.drag {
                Some((held, _)) if held == button => {
                    self.drag = None;
                    true
                }
                _ => false,
            },
            PointerEvent::Wheel { delta } => {
                if !delta.is_finite() {
                    return false;
                }
                self.zoom_delta += delta;
                true
            }
        }
    }

    /// Fold pending input into the goal and return the state for this tick.
    ///
    /// `surface_height` scales pixel drags so a full-height drag rotates one
    /// full turn regardless of window size.
    pub fn poll(&mut self, surface_height: u32) -> ControlsState {
        let height = surface_height.max(1) as f32;
        let drag_velocity = self.rotate_delta + self.pan_delta;

        if self.rotate_delta != Vec2::ZERO {
            self.goal.theta -= TAU * self.rotate_delta.x / height * self.rotate_speed;
            self.goal.phi -= TAU * self.rotate_delta.y / height * self.rotate_speed;
            self.goal = clamp_polar(self.goal);
        }

        if self.zoom_delta != 0.0 {
            let scale = 0.95_f32.powf(-self.zoom_delta * self.zoom_speed);
            self.goal.radius = (self.goal.radius * scale).clamp(self.min_distance, self.max_distance);
        }

        if self.pan_delta != Vec2::ZERO {
            let forward = -self.goal.to_offset().normalize_or_zero();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward);
            let world_per_pixel = 2.0 * self.goal.radius / height * self.pan_speed;
            self.target += (-right * self.pan_delta.x + up * self.pan_delta.y) * world_per_pixel;
        }

        self.rotate_delta = Vec2::ZERO;
        self.pan_delta = Vec2::ZERO;
        self.zoom_delta = 0.0;

        ControlsState {
            enable_damping: self.enable_damping,
            damping_factor: self.damping_factor,
            target: self.target,
            orbit: self.goal,
            drag_velocity,
        }
    }
}

fn clamp_polar(mut s: Spherical) -> Spherical {
    s.phi = s.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
    }

    fn drag(c: &mut OrbitControls, button: PointerButton, from: Vec2, to: Vec2) {
        c.handle_event(PointerEvent::Down {
            button,
            position: from,
        });
        c.handle_event(PointerEvent::Move { position: to });
        c.handle_event(PointerEvent::Up { button });
    }

    #[test]
    fn spherical_round_trips_offsets() {
        for offset in [
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(3.0, 4.0, -2.0),
            Vec3::new(-1.0, -1.0, 0.5),
        ] {
            let back = Spherical::from_offset(offset).to_offset();
            assert!(back.abs_diff_eq(offset, 1e-5), "{offset:?} -> {back:?}");
        }
    }

    #[test]
    fn initial_state_matches_eye() {
        let mut c = controls();
        let state = c.poll(600);
        assert!(state.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-4));
        assert_eq!(state.drag_velocity, Vec2::ZERO);
        assert_eq!(state.step_factor(), 1.0);
    }

    #[test]
    fn damping_factor_is_validated() {
        assert!(controls().with_damping(true, 0.0).is_ok());
        assert!(controls().with_damping(true, 0.05).is_ok());
        assert_eq!(
            controls().with_damping(true, 1.0).unwrap_err(),
            ControlsError::InvalidDamping(1.0)
        );
        assert!(controls().with_damping(true, -0.1).is_err());
        assert!(controls().with_damping(true, f32::NAN).is_err());

        let mut damped = controls().with_damping(true, 0.05).unwrap();
        assert_eq!(damped.poll(600).step_factor(), 0.05);
    }

    #[test]
    fn horizontal_drag_rotates_azimuth_and_reports_velocity() {
        let mut c = controls();
        drag(&mut c, PointerButton::Primary, Vec2::ZERO, Vec2::new(150.0, 0.0));
        let state = c.poll(600);
        assert!((state.orbit.theta - (-TAU * 0.25)).abs() < 1e-5);
        assert!((state.orbit.radius - 5.0).abs() < 1e-5);
        assert_eq!(state.drag_velocity, Vec2::new(150.0, 0.0));
        // Accumulators reset after a poll.
        assert_eq!(c.poll(600).drag_velocity, Vec2::ZERO);
    }

    #[test]
    fn vertical_drag_is_clamped_off_the_pole() {
        let mut c = controls();
        drag(&mut c, PointerButton::Primary, Vec2::ZERO, Vec2::new(0.0, 10_000.0));
        let state = c.poll(600);
        assert!(state.orbit.phi >= POLE_EPSILON);
        assert!(state.orbit.phi < PI);
    }

    #[test]
    fn move_without_button_is_ignored() {
        let mut c = controls();
        assert!(!c.handle_event(PointerEvent::Move {
            position: Vec2::new(5.0, 5.0)
        }));
        assert!(!c.handle_event(PointerEvent::Up {
            button: PointerButton::Primary
        }));
        assert_eq!(c.poll(600).orbit, controls().poll(600).orbit);
    }

    #[test]
    fn drag_delta_starts_at_the_press_point() {
        let mut c = controls();
        c.handle_event(PointerEvent::Move {
            position: Vec2::new(300.0, 300.0),
        });
        drag(&mut c, PointerButton::Primary, Vec2::new(100.0, 100.0), Vec2::new(160.0, 100.0));

        let mut expected = controls();
        drag(&mut expected, PointerButton::Primary, Vec2::ZERO, Vec2::new(60.0, 0.0));
        let (got, want) = (c.poll(600).orbit, expected.poll(600).orbit);
        assert!((got.theta - want.theta).abs() < 1e-5);
        assert!((got.phi - want.phi).abs() < 1e-5);
    }

    #[test]
    fn wheel_dollies_within_limits() {
        let mut c = controls().with_distance_limits(1.0, 10.0).unwrap();
        c.handle_event(PointerEvent::Wheel { delta: 1.0 });
        let out = c.poll(600).orbit.radius;
        assert!(out > 5.0);
        c.handle_event(PointerEvent::Wheel { delta: -2.0 });
        assert!(c.poll(600).orbit.radius < out);
        c.handle_event(PointerEvent::Wheel { delta: 1000.0 });
        assert_eq!(c.poll(600).orbit.radius, 10.0);
        c.handle_event(PointerEvent::Wheel { delta: -1000.0 });
        assert_eq!(c.poll(600).orbit.radius, 1.0);
        assert!(!c.handle_event(PointerEvent::Wheel { delta: f32::NAN }));
    }

    #[test]
    fn middle_drag_dollies() {
        let mut c = controls();
        drag(&mut c, PointerButton::Middle, Vec2::ZERO, Vec2::new(0.0, 100.0));
        assert!(c.poll(600).orbit.radius > 5.0);
    }

    #[test]
    fn right_drag_pans_target() {
        let mut c = controls();
        drag(&mut c, PointerButton::Secondary, Vec2::ZERO, Vec2::new(60.0, 0.0));
        let state = c.poll(600);
        // Dragging right slides the view left: the target moves toward -X.
        assert!(state.target.x < 0.0);
        assert!(state.target.y.abs() < 1e-5);
        // Panning keeps the orbit itself unchanged.
        assert!((state.orbit.radius - 5.0).abs() < 1e-5);
    }

    #[test]
    fn disabled_controls_ignore_events() {
        let mut c = controls();
        c.enabled = false;
        assert!(!c.handle_event(PointerEvent::Wheel { delta: 3.0 }));
        assert!((c.poll(600).orbit.radius - 5.0).abs() < 1e-5);
    }

    #[test]
    fn reset_discards_pending_input() {
        let mut c = controls();
        c.handle_event(PointerEvent::Wheel { delta: 3.0 });
        c.reset(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let state = c.poll(600);
        assert_eq!(state.target, Vec3::new(0.0, 1.0, 0.0));
        assert!((state.orbit.radius - 1.0).abs() < 1e-5);
    }
}
