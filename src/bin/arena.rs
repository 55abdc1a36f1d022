//! `arena`: draw on the LED arena from the command line.
//!
//! ```text
//! arena clear [colour]
//! arena set <x> <y> <colour>
//! arena --mode parallel dot-bar --ticks 100
//! arena --mode duplicate optic-flow forward --fps 30
//! ```
//!
//! Text mode prints the arena. The hardware modes drive the dry-run transport,
//! which logs every transmission at `trace` level (`RUST_LOG=trace`).

use core::sync::atomic::{AtomicBool, Ordering};
use std::error::Error;
use std::path::PathBuf;

use arena_envoy::animate::{self, Scene, StdDelay, Ticks};
use arena_envoy::scene::{DotBar, Flow, Motion, OpticFlow};
use arena_envoy::sim::{Journal, RecordingBus, RecordingPin, recording_pins};
use arena_envoy::transport::StripBus;
use arena_envoy::{Arena, ArenaConfig, ColorName, Mode};
use clap::{Parser, Subcommand, ValueEnum};
use embedded_hal::digital::StatefulOutputPin;
use log::{debug, info, warn};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

const CLEAR_USAGE: &str = "Usage: arena clear [colour]";
const SET_USAGE: &str = "Usage: arena set <x> <y> <colour>";
const OPTIC_FLOW_USAGE: &str = "Usage: arena optic-flow [rotate-right|rotate-left|forward|backward] [--colour <colour>]";
#[cfg(feature = "host")]
const PREVIEW_MAX_DIMENSION: u32 = 1024;
const MAX_CAPTURED_FRAMES: usize = 512;

static STOP: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(version)]
#[command(about = "Draw on a toroidal LED arena", long_about = None)]
struct CliArgs {
    /// Display mode: text, serial, parallel or duplicate
    #[arg(short, long, value_name = "MODE", default_value = "text")]
    mode: String,

    /// TOML file overriding the arena dimensions, clock and pins
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write a PNG preview (an APNG for animations) to this file
    #[cfg(feature = "host")]
    #[arg(long, value_name = "FILE")]
    png: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set every pixel to one colour (black by default)
    Clear {
        /// Colour name
        colour: Option<String>,
    },
    /// Set one pixel; coordinates wrap around the arena
    Set {
        /// Column
        x: String,
        /// Row
        y: String,
        /// Colour name
        colour: String,
    },
    /// A bar and a dot, each hidden, stationary or moving
    DotBar {
        /// What the dot does
        #[arg(long, value_enum, default_value_t = MotionArg::Moving)]
        dot: MotionArg,
        /// What the bar does
        #[arg(long, value_enum, default_value_t = MotionArg::Stationary)]
        bar: MotionArg,
        /// Frames per second
        #[arg(long, default_value_t = 21)]
        fps: u32,
        /// Frames to run for (forever if omitted)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Rotating or streaming vertical stripes
    OpticFlow {
        /// Direction of motion
        #[arg(value_enum, default_value_t = FlowArg::RotateRight)]
        flow: FlowArg,
        /// Frames per second
        #[arg(long, default_value_t = 21)]
        fps: u32,
        /// Frames to run for (forever if omitted)
        #[arg(long)]
        ticks: Option<u64>,
        /// Stripe colour
        #[arg(long, default_value = "green")]
        colour: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MotionArg {
    Hidden,
    Stationary,
    Moving,
}

impl From<MotionArg> for Motion {
    fn from(motion: MotionArg) -> Self {
        match motion {
            MotionArg::Hidden => Self::Hidden,
            MotionArg::Stationary => Self::Stationary,
            MotionArg::Moving => Self::Moving,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FlowArg {
    RotateRight,
    RotateLeft,
    Forward,
    Backward,
}

impl From<FlowArg> for Flow {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::RotateRight => Self::RotateRight,
            FlowArg::RotateLeft => Self::RotateLeft,
            FlowArg::Forward => Self::Forward,
            FlowArg::Backward => Self::Backward,
        }
    }
}

type DryRunArena = Arena<RecordingBus, RecordingPin>;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = CliArgs::parse();
    debug!("arena: {args:?}");

    let config = match &args.config {
        Some(path) => ArenaConfig::from_toml_file(path)?,
        None => ArenaConfig::default(),
    };
    let mode: Mode = args.mode.parse()?;
    let journal = Journal::log_only();
    let pins = recording_pins(&config, &journal);
    let arena = Arena::new(config, RecordingBus::new(journal), pins, mode)?;

    #[cfg(feature = "host")]
    let preview = args.png.clone();
    #[cfg(not(feature = "host"))]
    let preview: Option<PathBuf> = None;

    match args.command {
        Command::Clear { colour } => {
            let color = match colour.as_deref().map(str::parse::<ColorName>) {
                None => ColorName::Black,
                Some(Ok(color)) => color,
                Some(Err(_)) => {
                    println!("{CLEAR_USAGE}");
                    return Ok(());
                }
            };
            still(arena, preview, |arena| arena.clear(color))
        }
        Command::Set { x, y, colour } => {
            let (Some(x), Some(y), Ok(color)) = (coordinate(&x), coordinate(&y), colour.parse::<ColorName>()) else {
                println!("{SET_USAGE}");
                return Ok(());
            };
            still(arena, preview, |arena| arena.set_pixel(x, y, color))
        }
        Command::DotBar { dot, bar, fps, ticks } => {
            let scene = DotBar::for_mode(mode).with_motion(dot.into(), bar.into());
            animation(arena, scene, ticks, fps, preview)
        }
        Command::OpticFlow {
            flow,
            fps,
            ticks,
            colour,
        } => {
            let Some(foreground) = stripe_colour(&colour) else {
                println!("{OPTIC_FLOW_USAGE}");
                return Ok(());
            };
            let scene = OpticFlow::new(flow.into()).with_foreground(foreground);
            animation(arena, scene, ticks, fps, preview)
        }
    }
}

fn stripe_colour(colour: &str) -> Option<ColorName> {
    colour.parse().ok()
}

// Non-negative decimal integers only; anything else is a usage error.
fn coordinate(text: &str) -> Option<i32> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn still(
    mut arena: DryRunArena,
    preview: Option<PathBuf>,
    draw: impl FnOnce(&mut DryRunArena),
) -> Result<(), Box<dyn Error>> {
    draw(&mut arena);
    arena.render()?;
    if let Some(path) = preview {
        write_preview(&arena, &path)?;
    }
    arena.shutdown()?;
    Ok(())
}

fn animation<S: Scene>(
    arena: DryRunArena,
    scene: S,
    ticks: Option<u64>,
    fps: u32,
    preview: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    install_stop_handler()?;
    let ticks = ticks.map_or(Ticks::Forever, Ticks::Count);
    info!("arena: animating at {fps} fps for {ticks:?}");

    let mut capture = Capture {
        scene,
        frames: Vec::new(),
        enabled: preview.is_some(),
    };
    let outcome = animate::run(arena, &mut capture, ticks, fps, &mut StdDelay, &STOP);
    let summary = match outcome {
        Ok(summary) => Some(summary),
        Err(arena_envoy::Error::Interrupted) => None,
        Err(error) => return Err(error.into()),
    };
    if let Some(summary) = summary {
        info!("arena: {} frames, {} late", summary.ticks, summary.late_frames);
    }
    if let Some(path) = preview {
        write_animation_preview(&capture.frames, fps, &path)?;
    }
    Ok(())
}

// Keeps a copy of every drawn frame for the animation preview.
struct Capture<S> {
    scene: S,
    frames: Vec<arena_envoy::frame::Framebuffer>,
    enabled: bool,
}

impl<S: Scene> Scene for Capture<S> {
    fn setup<B: StripBus, P: StatefulOutputPin>(&mut self, arena: &mut Arena<B, P>) -> arena_envoy::Result<()> {
        self.scene.setup(arena)
    }

    fn draw<B: StripBus, P: StatefulOutputPin>(
        &mut self,
        tick: u64,
        arena: &mut Arena<B, P>,
    ) -> arena_envoy::Result<()> {
        self.scene.draw(tick, arena)?;
        if self.enabled {
            if self.frames.len() < MAX_CAPTURED_FRAMES {
                self.frames.push(arena.frame().clone());
            } else if self.frames.len() == MAX_CAPTURED_FRAMES {
                warn!("arena: preview keeps only the first {MAX_CAPTURED_FRAMES} frames");
                self.enabled = false;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "host")]
fn write_preview(arena: &DryRunArena, path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    arena_envoy::to_png::write_frame_png(arena.frame(), path, PREVIEW_MAX_DIMENSION)
}

#[cfg(not(feature = "host"))]
fn write_preview(_arena: &DryRunArena, path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    warn!("arena: built without the host feature, not writing {}", path.display());
    Ok(())
}

#[cfg(feature = "host")]
fn write_animation_preview(
    frames: &[arena_envoy::frame::Framebuffer],
    fps: u32,
    path: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    let delay_ms = u16::try_from(1000 / fps.max(1)).unwrap_or(u16::MAX);
    arena_envoy::to_png::write_frames_apng(frames, path, PREVIEW_MAX_DIMENSION, delay_ms)
}

#[cfg(not(feature = "host"))]
fn write_animation_preview(
    _frames: &[arena_envoy::frame::Framebuffer],
    _fps: u32,
    path: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    warn!("arena: built without the host feature, not writing {}", path.display());
    Ok(())
}

extern "C" fn on_stop_signal(_signal: nix::libc::c_int) {
    STOP.store(true, Ordering::Relaxed);
}

#[expect(unsafe_code, reason = "the handler only stores to an atomic")]
fn install_stop_handler() -> nix::Result<()> {
    let action = SigAction::new(SigHandler::Handler(on_stop_signal), SaFlags::empty(), SigSet::empty());
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: `on_stop_signal` is async-signal-safe; it performs one atomic store.
        unsafe { sigaction(signal, &action) }?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stripe_colour_is_a_usage_error() {
        let args = CliArgs::try_parse_from(["arena", "optic-flow", "forward", "--colour", "ultraviolet"])
            .expect("clap accepts any colour text");
        let Command::OpticFlow { colour, .. } = args.command else {
            panic!("expected optic-flow");
        };
        assert_eq!(stripe_colour(&colour), None);
        assert_eq!(stripe_colour("Red"), Some(ColorName::Red));
        assert!(OPTIC_FLOW_USAGE.contains("--colour"));
    }

    #[test]
    fn coordinates_are_plain_digits() {
        assert_eq!(coordinate("63"), Some(63));
        assert_eq!(coordinate("-1"), None);
        assert_eq!(coordinate(""), None);
    }
}
