use anyhow::Context;
use clap::{Parser, Subcommand};
use orbitview_render::DebugTextRenderer;
use orbitview_runtime::{DemoConfig, ManualDriver, RunReport, build_stage};
use orbitview_scene::SceneInspector;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbitview-cli", about = "Headless tools for the orbitview demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the demo loop headless with the text renderer
    Run {
        /// Number of ticks to run
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        /// YAML demo configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Surface width
        #[arg(long, default_value = "800")]
        width: u32,
        /// Surface height
        #[arg(long, default_value = "600")]
        height: u32,
        /// Simulate a lost drawing context after this many frames
        #[arg(long)]
        lose_context_after: Option<u64>,
        /// Print the last frame's text dump
        #[arg(long)]
        show_frame: bool,
        /// Emit a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the demo scene summary and node listing
    Inspect {
        /// YAML demo configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a YAML demo configuration
    CheckConfig {
        /// Path to the config file
        path: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct RunSummary {
    #[serde(flatten)]
    report: RunReport,
    capsule_rotation: [f32; 3],
    camera_position: [f32; 3],
    #[serde(skip)]
    last_frame: String,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DemoConfig> {
    match path {
        Some(path) => DemoConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(DemoConfig::default()),
    }
}

fn run_demo(
    config: &DemoConfig,
    ticks: u64,
    width: u32,
    height: u32,
    lose_context_after: Option<u64>,
) -> anyhow::Result<RunSummary> {
    let mut renderer = DebugTextRenderer::new();
    if let Some(frames) = lose_context_after {
        renderer = renderer.with_context_loss_after(frames);
    }
    let mut demo = build_stage(config, renderer, width, height)?;
    demo.render_loop.start();
    let report = ManualDriver::new(ticks).run(&mut demo.render_loop, &mut demo.stage);

    let capsule = demo
        .stage
        .scene
        .get(demo.handles.capsule)
        .context("capsule node missing after run")?;
    Ok(RunSummary {
        report,
        capsule_rotation: capsule.transform.rotation.to_array(),
        camera_position: demo.stage.viewport.camera().position.to_array(),
        last_frame: demo.stage.renderer.last_frame().to_string(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("orbitview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", orbitview_common::crate_info());
            println!("scene: {}", orbitview_scene::crate_info());
            println!("render: {}", orbitview_render::crate_info());
            println!("input: {}", orbitview_input::crate_info());
            println!("runtime: {}", orbitview_runtime::crate_info());
        }
        Commands::Run {
            ticks,
            config,
            width,
            height,
            lose_context_after,
            show_frame,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let summary = run_demo(&config, ticks, width, height, lose_context_after)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let [rx, ry, rz] = summary.capsule_rotation;
                let [cx, cy, cz] = summary.camera_position;
                println!(
                    "Ran {} ticks: {} frames drawn",
                    summary.report.ticks, summary.report.frames_drawn
                );
                println!("Capsule rotation: ({rx:.4}, {ry:.4}, {rz:.4})");
                println!("Camera position: ({cx:.3}, {cy:.3}, {cz:.3})");
                if let Some(reason) = &summary.report.halted {
                    println!("Halted: {reason}");
                }
                if show_frame {
                    print!("{}", summary.last_frame);
                }
            }
        }
        Commands::Inspect { config } => {
            let config = load_config(config.as_deref())?;
            let demo = build_stage(&config, DebugTextRenderer::new(), 800, 600)?;
            println!("{}", SceneInspector::summary(&demo.stage.scene));
            for info in SceneInspector::nodes(&demo.stage.scene) {
                println!("{info}");
            }
        }
        Commands::CheckConfig { path } => {
            let config = load_config(Some(path.as_path()))?;
            build_stage(&config, DebugTextRenderer::new(), 800, 600)
                .with_context(|| format!("invalid config {}", path.display()))?;
            println!("{}: OK", path.display());
        }
    }

    Ok(())
}
