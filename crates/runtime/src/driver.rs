use crate::render_loop::{RenderLoop, TickOutcome};
use crate::stage::Stage;
use orbitview_render::Renderer;
use serde::Serialize;

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Ticks that reached a running loop.
    pub ticks: u64,
    /// Successful draws during this run.
    pub frames_drawn: u64,
    /// Why the loop halted, if it did.
    pub halted: Option<String>,
}

/// Drives a render loop without a display: the tick source for tests and
/// the CLI.
#[derive(Debug, Clone, Copy)]
pub struct ManualDriver {
    max_ticks: u64,
}

impl ManualDriver {
    pub fn new(max_ticks: u64) -> Self {
        Self { max_ticks }
    }

    pub fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Tick up to `max_ticks` times. Stops early once the loop is idle or
    /// halts.
    pub fn run<R: Renderer>(&self, render_loop: &mut RenderLoop, stage: &mut Stage<R>) -> RunReport {
        let mut report = RunReport {
            ticks: 0,
            frames_drawn: 0,
            halted: None,
        };
        for _ in 0..self.max_ticks {
            match render_loop.tick(stage) {
                TickOutcome::Idle => break,
                TickOutcome::Drawn { .. } => {
                    report.ticks += 1;
                    report.frames_drawn += 1;
                }
                TickOutcome::Halted(err) => {
                    report.ticks += 1;
                    report.halted = Some(err.to_string());
                    break;
                }
            }
        }
        tracing::debug!(
            ticks = report.ticks,
            frames = report.frames_drawn,
            halted = report.halted.is_some(),
            "manual run finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orbitview_input::OrbitControls;
    use orbitview_render::{DebugTextRenderer, Projection, SurfaceSize, Viewport};
    use orbitview_scene::SceneGraph;

    fn stage(renderer: DebugTextRenderer) -> Stage<DebugTextRenderer> {
        let viewport = Viewport::new(SurfaceSize::new(320, 240), Projection::default(), false).unwrap();
        let controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        Stage::new(SceneGraph::new(), viewport, controls, renderer)
    }

    #[test]
    fn runs_requested_ticks() {
        let mut s = stage(DebugTextRenderer::new());
        let mut lp = RenderLoop::new();
        lp.start();
        let report = ManualDriver::new(25).run(&mut lp, &mut s);
        assert_eq!(report.ticks, 25);
        assert_eq!(report.frames_drawn, 25);
        assert_eq!(report.halted, None);
        assert_eq!(s.renderer.frames_drawn(), 25);
    }

    #[test]
    fn stopped_loop_runs_nothing() {
        let mut s = stage(DebugTextRenderer::new());
        let mut lp = RenderLoop::new();
        let report = ManualDriver::new(10).run(&mut lp, &mut s);
        assert_eq!(report.ticks, 0);
        assert_eq!(s.renderer.frames_drawn(), 0);
    }

    #[test]
    fn halts_early_on_context_loss() {
        let mut s = stage(DebugTextRenderer::new().with_context_loss_after(3));
        let mut lp = RenderLoop::new();
        lp.start();
        let report = ManualDriver::new(10).run(&mut lp, &mut s);
        assert_eq!(report.frames_drawn, 3);
        assert_eq!(report.ticks, 4);
        assert!(report.halted.is_some());
        assert!(!lp.is_running());
    }
}
