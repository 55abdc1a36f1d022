//! Fixed-rate animation driver.
//!
//! [`run`] owns the arena for the length of an animation: it draws and renders
//! one frame per tick, sleeps off whatever is left of the frame period, and
//! shuts the arena down however the loop ends.
//!
//! ```rust
//! use core::sync::atomic::AtomicBool;
//!
//! use arena_envoy::animate::{self, Ticks};
//! use arena_envoy::scene::DotBar;
//! use arena_envoy::sim::{Journal, RecordingBus, RecordingDelay, recording_pins};
//! use arena_envoy::{Arena, ArenaConfig, Mode};
//!
//! let config = ArenaConfig::default();
//! let journal = Journal::new();
//! let pins = recording_pins(&config, &journal);
//! let arena = Arena::new(config, RecordingBus::new(journal), pins, Mode::SingleChain)?;
//!
//! let mut scene = DotBar::for_mode(Mode::SingleChain);
//! let stop = AtomicBool::new(false);
//! let summary = animate::run(arena, &mut scene, Ticks::Count(5), 21, &mut RecordingDelay::default(), &stop)?;
//! assert_eq!(summary.ticks, 5);
//! # Ok::<(), arena_envoy::Error>(())
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use log::{info, warn};

use crate::arena::Arena;
use crate::transport::StripBus;
use crate::{Error, Result};

/// How long an animation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ticks {
    /// Exactly this many frames.
    Count(u64),
    /// Until the stop flag is raised.
    Forever,
}

/// Something that draws one frame per tick.
pub trait Scene {
    /// Draw the starting state. Called once before the first tick.
    ///
    /// # Errors
    ///
    /// Returns any arena error.
    fn setup<B: StripBus, P: StatefulOutputPin>(&mut self, _arena: &mut Arena<B, P>) -> Result<()> {
        Ok(())
    }

    /// Draw frame `tick` (counting from 1). The driver renders afterwards.
    ///
    /// # Errors
    ///
    /// Returns any arena error.
    fn draw<B: StripBus, P: StatefulOutputPin>(&mut self, tick: u64, arena: &mut Arena<B, P>) -> Result<()>;
}

/// How a completed animation went.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames drawn and rendered.
    pub ticks: u64,
    /// Frames that took longer than the frame period.
    pub late_frames: u64,
}

/// Sleeps the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Animate `scene` on `arena` at `fps` frames per second, then shut the arena down.
///
/// `stop` is checked before every frame; raise it from a signal handler or
/// another thread to end the loop.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for a zero frame rate, [`Error::Interrupted`]
/// if `stop` was raised, or the first error from the scene, the render, or the
/// shutdown. The arena is released in every case.
pub fn run<B, P, S, D>(
    mut arena: Arena<B, P>,
    scene: &mut S,
    ticks: Ticks,
    fps: u32,
    delay: &mut D,
    stop: &AtomicBool,
) -> Result<RunSummary>
where
    B: StripBus,
    P: StatefulOutputPin,
    S: Scene,
    D: DelayNs,
{
    let outcome = drive(&mut arena, scene, ticks, fps, delay, stop);
    let released = arena.shutdown();
    match (outcome, released) {
        (Ok(summary), Ok(())) => {
            info!("animate::run: {} frames, {} late", summary.ticks, summary.late_frames);
            Ok(summary)
        }
        (Ok(_), Err(error)) => Err(error),
        (Err(error), released) => {
            if let Err(cleanup_error) = released {
                warn!("animate::run: cleanup after {error} also failed: {cleanup_error}");
            }
            Err(error)
        }
    }
}

fn drive<B, P, S, D>(
    arena: &mut Arena<B, P>,
    scene: &mut S,
    ticks: Ticks,
    fps: u32,
    delay: &mut D,
    stop: &AtomicBool,
) -> Result<RunSummary>
where
    B: StripBus,
    P: StatefulOutputPin,
    S: Scene,
    D: DelayNs,
{
    if fps == 0 {
        return Err(Error::InvalidConfig {
            reason: "frame rate must be positive".to_owned(),
        });
    }
    let period = Duration::from_secs(1) / fps;
    let mut summary = RunSummary::default();

    scene.setup(arena)?;
    loop {
        if matches!(ticks, Ticks::Count(count) if summary.ticks >= count) {
            return Ok(summary);
        }
        if stop.load(Ordering::Relaxed) {
            info!("animate::run: stopped after {} frames", summary.ticks);
            return Err(Error::Interrupted);
        }

        let started = Instant::now();
        summary.ticks += 1;
        scene.draw(summary.ticks, arena)?;
        arena.render()?;

        match period.checked_sub(started.elapsed()) {
            Some(remaining) => {
                delay.delay_ns(u32::try_from(remaining.as_nanos()).unwrap_or(u32::MAX));
            }
            None => summary.late_frames += 1,
        }
    }
}
