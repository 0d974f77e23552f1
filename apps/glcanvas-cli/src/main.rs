use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use glcanvas_canvas::{CanvasBridge, CanvasConfig, ConversionMode, NullDisplay};
use glcanvas_common::config::{DEFAULT_PIXEL_BITS, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use glcanvas_input::{ControlSignal, ControlSurface, Direction};
use glcanvas_render::{RenderConfig, RenderSession};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glcanvas-cli", about = "Headless host for the glcanvas render pipeline")]
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
    /// Render frames through the canvas bridge and report timing
    Run {
        /// Number of frames to render
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// D-pad presses, one per frame: U, D, L, R (`.` for none)
        #[arg(short, long, default_value = "")]
        script: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Render frames and write the canvas as a binary PPM image
    Snapshot {
        /// Output file
        #[arg(short, long, default_value = "frame.ppm")]
        output: PathBuf,
        /// Frames to render before capturing
        #[arg(short, long, default_value = "1")]
        frames: u64,
        #[command(flatten)]
        display: DisplayArgs,
    },
}

#[derive(Args)]
struct DisplayArgs {
    /// Framebuffer width in pixels
    #[arg(long, default_value_t = DISPLAY_WIDTH)]
    width: u32,
    /// Framebuffer height in pixels
    #[arg(long, default_value_t = DISPLAY_HEIGHT)]
    height: u32,
    /// Native pixel depth: 32 or 16
    #[arg(long, default_value_t = DEFAULT_PIXEL_BITS)]
    bits: u32,
    /// 16-bit widening: shift or replicate
    #[arg(long, default_value = "shift")]
    mode: ConversionMode,
    /// Skip the FPS overlay
    #[arg(long)]
    no_overlay: bool,
}

impl DisplayArgs {
    fn open(&self) -> anyhow::Result<(RenderSession, CanvasBridge)> {
        let session = RenderSession::open_with(RenderConfig {
            width: self.width,
            height: self.height,
            pixel_bits: self.bits,
            overlay: !self.no_overlay,
            ..RenderConfig::default()
        })
        .context("failed to open render session")?;
        let canvas = CanvasBridge::init_with(
            CanvasConfig {
                width: self.width,
                height: self.height,
                mode: self.mode,
            },
            NullDisplay,
        )
        .context("failed to initialize canvas")?;
        Ok((session, canvas))
    }
}

fn parse_script(script: &str) -> anyhow::Result<Vec<Option<Direction>>> {
    script
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'U' => Ok(Some(Direction::Up)),
            'D' => Ok(Some(Direction::Down)),
            'L' => Ok(Some(Direction::Left)),
            'R' => Ok(Some(Direction::Right)),
            '.' => Ok(None),
            other => bail!("unknown script step '{other}' (expected U, D, L, R or .)"),
        })
        .collect()
}

/// Render `frames` frames, pressing and releasing one scripted button
/// before each.
fn drive(
    session: &mut RenderSession,
    canvas: &mut CanvasBridge,
    frames: u64,
    script: &[Option<Direction>],
) -> anyhow::Result<()> {
    let mut pad = ControlSurface::default();
    for frame in 0..frames {
        if let Some(Some(direction)) = script.get(frame as usize) {
            pad.dispatch(ControlSignal::pressed(*direction), session)?;
            pad.dispatch(ControlSignal::released(*direction), session)?;
        }
        if !session.render_frame()?.is_rendered() {
            continue;
        }
        canvas.update(session.framebuffer());
        canvas.present();
    }
    Ok(())
}

fn write_ppm(canvas: &CanvasBridge, path: &Path) -> anyhow::Result<()> {
    let Some(pixels) = canvas.pixels() else {
        bail!("canvas has no pixels");
    };
    let mut out = format!("P6\n{} {}\n255\n", canvas.width(), canvas.height()).into_bytes();
    out.reserve(pixels.len() * 3);
    for c in pixels {
        out.extend_from_slice(&c.rgb());
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "snapshot written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("glcanvas-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", glcanvas_common::crate_info());
            println!("raster: {}", glcanvas_raster::crate_info());
            println!("render: {}", glcanvas_render::crate_info());
            println!("canvas: {}", glcanvas_canvas::crate_info());
            println!("input: {}", glcanvas_input::crate_info());
        }
        Commands::Run {
            frames,
            script,
            display,
        } => {
            let script = parse_script(&script)?;
            let (mut session, mut canvas) = display.open()?;
            println!(
                "Running {frames} frames at {}x{} ({} bits, {:?})",
                display.width, display.height, display.bits, display.mode
            );

            drive(&mut session, &mut canvas, frames, &script)?;

            let stats = session.stats();
            println!(
                "Frames: {} fps={:.1} render avg={:.3} ms min={:.3} ms max={:.3} ms",
                stats.frames_rendered,
                stats.fps,
                stats.average_render_ms,
                stats.min_render_ms,
                stats.max_render_ms
            );
            println!("{}", session.summary());

            canvas.cleanup();
            session.close();
        }
        Commands::Snapshot {
            output,
            frames,
            display,
        } => {
            let (mut session, mut canvas) = display.open()?;
            drive(&mut session, &mut canvas, frames.max(1), &[])?;
            write_ppm(&canvas, &output)?;
            println!(
                "Snapshot: {}x{} -> {}",
                canvas.width(),
                canvas.height(),
                output.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_parses_directions_and_gaps() {
        let steps = parse_script("U.d L r").unwrap();
        assert_eq!(
            steps,
            vec![
                Some(Direction::Up),
                None,
                Some(Direction::Down),
                Some(Direction::Left),
                Some(Direction::Right),
            ]
        );
        assert!(parse_script("UX").is_err());
    }

    #[test]
    fn scripted_run_moves_camera() {
        let mut session = RenderSession::open(32, 32, 16).unwrap();
        let mut canvas = CanvasBridge::init(32, 32, NullDisplay).unwrap();
        drive(&mut session, &mut canvas, 3, &parse_script("UU").unwrap()).unwrap();
        assert_eq!(session.stats().frames_rendered, 3);
        assert!((session.camera().position().z - 2.8).abs() < 1e-5);
        assert_eq!(canvas.frames(), 3);
    }
}
