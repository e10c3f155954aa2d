//! Runtime: the render loop, the stage it drives, and demo setup.
//!
//! # Invariants
//! - Ticks run sequentially on the host thread; a tick borrows the stage mutably.
//! - A stopped loop performs no animation, camera, or draw work.
//! - A failed draw stops the loop and is reported exactly once.
//! - Configuration errors surface from `build_stage`, never from a tick.

pub mod animation;
pub mod config;
pub mod demo;
pub mod driver;
pub mod render_loop;
pub mod stage;

pub use animation::{Animation, Spin};
pub use config::{
    AnimationConfig, CameraConfig, CapsuleConfig, ConfigError, ControlsConfig, DemoConfig,
    LightConfig, RendererConfig,
};
pub use demo::{Demo, DemoHandles, SetupError, build_scene, build_stage};
pub use driver::{ManualDriver, RunReport};
pub use render_loop::{LoopState, RenderLoop, TickOutcome, damp_camera};
pub use stage::Stage;

pub fn crate_info() -> &'static str {
    "orbitview-runtime v0.1.0"
}
