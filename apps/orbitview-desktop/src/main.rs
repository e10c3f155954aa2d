use anyhow::{Context, Result, anyhow};
use clap::Parser;
use glam::Vec2;
use orbitview_input::{PointerButton, PointerEvent};
use orbitview_render_wgpu::WgpuRenderer;
use orbitview_runtime::{Demo, DemoConfig, TickOutcome, build_stage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Touchpad pixels that count as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 50.0;

#[derive(Parser)]
#[command(name = "orbitview-desktop", about = "Spinning capsule viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML demo configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial window width (overrides the config)
    #[arg(long)]
    width: Option<u32>,

    /// Initial window height (overrides the config)
    #[arg(long)]
    height: Option<u32>,
}

struct ViewerApp {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    demo: Option<Demo<WgpuRenderer>>,
    cursor: Vec2,
    failure: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            window: None,
            demo: None,
            cursor: Vec2::ZERO,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("orbitview")
            .with_inner_size(PhysicalSize::new(
                self.config.renderer.width,
                self.config.renderer.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let size = window.inner_size();
        let renderer = pollster::block_on(WgpuRenderer::new(window.clone(), size.width, size.height))
            .context("initialize GPU")?;
        tracing::info!(format = ?renderer.surface_format(), "GPU initialized");

        let mut demo = build_stage(&self.config, renderer, size.width, size.height)
            .context("build demo stage")?;
        demo.render_loop.start();

        window.request_redraw();
        self.window = Some(window);
        self.demo = Some(demo);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(demo) = &mut self.demo {
            demo.stage.handle_pointer(event);
        }
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// winit scrolls positive away from the user; the controls dolly out on
/// positive deltas.
fn wheel_notches(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) / PIXELS_PER_NOTCH,
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(demo) = &mut self.demo {
                    demo.stage.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    if let Some(demo) = &mut self.demo {
                        if !demo.render_loop.start() {
                            demo.render_loop.stop();
                        }
                    }
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.pointer(PointerEvent::Move {
                    position: self.cursor,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = pointer_button(button) else {
                    return;
                };
                let event = match state {
                    ElementState::Pressed => PointerEvent::Down {
                        button,
                        position: self.cursor,
                    },
                    ElementState::Released => PointerEvent::Up { button },
                };
                self.pointer(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.pointer(PointerEvent::Wheel {
                    delta: wheel_notches(delta),
                });
            }
            WindowEvent::RedrawRequested => {
                let Some(demo) = &mut self.demo else {
                    return;
                };
                if let TickOutcome::Halted(err) = demo.render_loop.tick(&mut demo.stage) {
                    self.fail(event_loop, anyhow!(err).context("render loop halted"));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let running = self
            .demo
            .as_ref()
            .is_some_and(|demo| demo.render_loop.is_running());
        if let (true, Some(window)) = (running, &self.window) {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("orbitview-desktop starting");

    let mut config = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    if let Some(width) = cli.width {
        config.renderer.width = width;
    }
    if let Some(height) = cli.height {
        config.renderer.height = height;
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn buttons_map_to_pointer_buttons() {
        assert_eq!(pointer_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(pointer_button(MouseButton::Right), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(MouseButton::Middle), Some(PointerButton::Middle));
        assert_eq!(pointer_button(MouseButton::Back), None);
    }

    #[test]
    fn scrolling_up_dollies_in() {
        assert_eq!(wheel_notches(MouseScrollDelta::LineDelta(0.0, 1.0)), -1.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -100.0));
        assert_eq!(wheel_notches(pixels), 2.0);
    }
}
