use crate::animation::Animation;
use crate::stage::Stage;
use orbitview_input::{ControlsState, Spherical};
use orbitview_render::{Camera, RenderError, Renderer};
use std::f32::consts::{PI, TAU};

/// Loop state. Ticks only have an effect while `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The loop is stopped; nothing was touched.
    Idle,
    /// A frame was drawn. `frame` counts successful draws from 1.
    Drawn { frame: u64 },
    /// The renderer failed and the loop stopped. Reported once.
    Halted(RenderError),
}

/// Single-threaded render loop driven by an external tick source.
///
/// Each tick, while running: advance animations, ease the camera toward
/// the controls' goal, then draw. A failed draw stops the loop; it is never
/// retried.
pub struct RenderLoop {
    state: LoopState,
    animations: Vec<Box<dyn Animation>>,
    frames: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    /// A stopped loop with no animations.
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            animations: Vec::new(),
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Successful draws since construction.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn add_animation(&mut self, animation: impl Animation + 'static) {
        self.animations.push(Box::new(animation));
    }

    /// Stopped -> Running. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = LoopState::Running;
        tracing::info!(frames = self.frames, "render loop started");
        true
    }

    /// Running -> Stopped. Takes effect before the next tick.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = LoopState::Stopped;
        tracing::info!(frames = self.frames, "render loop stopped");
        true
    }

    /// Run one tick against `stage`.
    pub fn tick<R: Renderer>(&mut self, stage: &mut Stage<R>) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        let _span = tracing::trace_span!("tick", frame = self.frames + 1).entered();

        let scene = &mut stage.scene;
        self.animations.retain_mut(|animation| {
            let alive = animation.advance(scene);
            if !alive {
                tracing::warn!(animation = %animation.label(), "animation target gone; dropping");
            }
            alive
        });

        let goal = stage.controls.poll(stage.viewport.surface().height);
        damp_camera(stage.viewport.camera_mut(), &goal);

        match stage.renderer.draw(&stage.scene, stage.viewport.camera()) {
            Ok(()) => {
                self.frames += 1;
                TickOutcome::Drawn { frame: self.frames }
            }
            Err(err) => {
                tracing::error!(error = %err, frames = self.frames, "draw failed; stopping render loop");
                self.state = LoopState::Stopped;
                TickOutcome::Halted(err)
            }
        }
    }
}

/// Move the camera a `goal.step_factor()` fraction of the way toward the
/// goal pose: `pose <- pose + (goal - pose) * d`.
///
/// The look-at target is interpolated linearly, the eye in spherical
/// coordinates around it so orbiting keeps its distance. Azimuth takes the
/// shorter way around.
pub fn damp_camera(camera: &mut Camera, goal: &ControlsState) {
    let factor = goal.step_factor();
    let mut current = Spherical::from_offset(camera.position - camera.target);
    current.theta = goal.orbit.theta + wrap_angle(current.theta - goal.orbit.theta);

    let next = Spherical {
        radius: lerp(current.radius, goal.orbit.radius, factor),
        phi: lerp(current.phi, goal.orbit.phi, factor),
        theta: lerp(current.theta, goal.orbit.theta, factor),
    };
    camera.target = camera.target.lerp(goal.target, factor);
    camera.position = camera.target + next.to_offset();
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Map an angle into `[-PI, PI)`.
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}
