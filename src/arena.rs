//! The arena: framebuffer, topology, transports and select lines in one owned value.
//!
//! An [`Arena`] is built for one [`Mode`] and rebuilt in place by
//! [`Arena::switch_mode`]. Drawing calls ([`Arena::set_pixel`],
//! [`Arena::clear`], or any `embedded-graphics` primitive) only touch the
//! framebuffer and mark segments dirty; [`Arena::render`] sends the changed
//! pixels of dirty segments and latches each touched segment once.
//!
//! # Example
//!
//! Light one pixel on the 16×128 arena and confirm only one panel is touched:
//!
//! ```rust
//! use arena_envoy::{Arena, ArenaConfig, ColorName, Mode};
//! use arena_envoy::sim::{Journal, RecordingBus, recording_pins};
//! use smart_leds::RGB8;
//!
//! let config = ArenaConfig::default();
//! let journal = Journal::new();
//! let pins = recording_pins(&config, &journal);
//! let mut arena = Arena::new(config, RecordingBus::new(journal.clone()), pins, Mode::Independent)?;
//!
//! arena.clear(ColorName::Black);
//! arena.set_pixel(63, 12, ColorName::Red);
//! let stats = arena.render()?;
//! assert_eq!(stats.segments_touched, 1);
//! assert_eq!(journal.writes(3), [(243, RGB8::new(15, 0, 0))]);
//!
//! // Nothing changed since, so nothing is sent.
//! assert_eq!(arena.render()?.segments_touched, 0);
//! arena.shutdown()?;
//! # Ok::<(), arena_envoy::Error>(())
//! ```

use core::convert::Infallible;
use std::io::{self, Write as _};

use embedded_graphics::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
};
use embedded_hal::digital::StatefulOutputPin;
use log::{debug, info, trace, warn};

use crate::color::{ColorName, ColorTable};
use crate::config::ArenaConfig;
use crate::frame::Framebuffer;
use crate::gpio::PanelPins;
use crate::mapping::{Edges, pixel_index};
use crate::topology::{Mode, Owner, Topology};
use crate::transport::{PixelStrip, StripBus};
use crate::{Error, Result};

/// What one [`Arena::render`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Segments that received at least one pixel and a latch.
    pub segments_touched: usize,
    /// LED writes across all segments.
    pub pixels_written: usize,
}

struct Segment<S> {
    strip: S,
    dirty: bool,
    enabled: bool,
    // Set when the shared shadow no longer describes this segment; the next render sends every LED.
    repaint: bool,
}

/// A toroidal LED arena.
///
/// Generic over the transport `B` and the select-line pin type `P`.
/// See the [module docs](mod@crate::arena) for an example.
pub struct Arena<B: StripBus, P: StatefulOutputPin> {
    config: ArenaConfig,
    colors: ColorTable,
    topology: Topology,
    frame: Framebuffer,
    segments: Vec<Segment<B::Strip>>,
    bus: B,
    pins: PanelPins<P>,
    text_output: Box<dyn io::Write>,
    released: bool,
}

impl<B: StripBus, P: StatefulOutputPin> Arena<B, P> {
    /// Build an arena in `mode`, configuring a strip per segment.
    ///
    /// Diagnostic output goes to standard output until [`Self::set_text_output`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unusable configuration or too few
    /// panel pins, or any transport/pin error raised while switching to `mode`.
    pub fn new(config: ArenaConfig, bus: B, pins: PanelPins<P>, mode: Mode) -> Result<Self> {
        config.validate()?;
        if pins.panel_count() < config.segment_count {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "{} panels need {} enable pins, got {}",
                    config.segment_count,
                    config.segment_count,
                    pins.panel_count()
                ),
            });
        }
        let topology = Topology::new(Mode::Diagnostic, &config)?;
        let mut arena = Self {
            frame: Framebuffer::new(topology.grid(), ColorName::Black),
            colors: ColorTable::ARENA,
            topology,
            segments: Vec::new(),
            bus,
            pins,
            config,
            text_output: Box::new(io::stdout()),
            released: false,
        };
        arena.switch_mode(mode)?;
        Ok(arena)
    }

    /// Replace the colour table.
    #[must_use]
    pub const fn with_colors(mut self, colors: ColorTable) -> Self {
        self.colors = colors;
        self
    }

    /// Send diagnostic-mode renders to `output` instead of standard output.
    pub fn set_text_output(&mut self, output: impl io::Write + 'static) {
        self.text_output = Box::new(output);
    }

    /// Rebuild dimensions, framebuffer, segments and transports for `mode`.
    ///
    /// The framebuffer starts black. If a transport fails part way, the arena
    /// keeps the new dimensions but has no transports, and [`Self::render`]
    /// returns [`Error::UninitializedTransport`] until a later switch succeeds.
    ///
    /// # Errors
    ///
    /// Returns any error raised while releasing the old transports, driving the
    /// select lines, or configuring and starting the new strips.
    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        let topology = Topology::new(mode, &self.config)?;
        info!(
            "Arena::switch_mode: {} -> {mode} ({}x{}, {} segments)",
            self.topology.mode(),
            topology.width(),
            topology.height(),
            topology.segment_count()
        );
        self.detach()?;
        self.topology = topology;
        self.frame = Framebuffer::new(topology.grid(), ColorName::Black);
        self.pins.apply(mode)?;

        let mut segments = Vec::with_capacity(topology.segment_count());
        for segment in 0..topology.segment_count() {
            match self.attach(segment) {
                Ok(strip) => segments.push(Segment {
                    strip,
                    dirty: false,
                    enabled: true,
                    repaint: false,
                }),
                Err(error) => {
                    for (index, built) in segments.into_iter().enumerate() {
                        if let Err(release_error) = self.bus.release(index, built.strip) {
                            warn!("Arena::switch_mode: releasing segment {index}: {release_error}");
                        }
                    }
                    return Err(error);
                }
            }
        }
        self.segments = segments;
        Ok(())
    }

    fn attach(&mut self, segment: usize) -> Result<B::Strip> {
        let mut strip = self.bus.configure(
            segment,
            self.topology.pixels_per_segment(),
            self.config.clock_hz,
        )?;
        let independent = self.topology.mode() == Mode::Independent;
        if independent {
            self.pins.set(segment, true)?;
        }
        let begun = strip.begin();
        let disabled = if independent {
            self.pins.set(segment, false)
        } else {
            Ok(())
        };
        match begun.and(disabled) {
            Ok(()) => Ok(strip),
            Err(error) => {
                if let Err(release_error) = self.bus.release(segment, strip) {
                    warn!("Arena::attach: releasing segment {segment}: {release_error}");
                }
                Err(error)
            }
        }
    }

    fn detach(&mut self) -> Result<()> {
        let mut first_error = None;
        for (index, segment) in self.segments.drain(..).enumerate() {
            if let Err(error) = self.bus.release(index, segment.strip) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.topology.mode()
    }

    /// Current topology.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Arena width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.topology.width()
    }

    /// Arena height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.topology.height()
    }

    /// The configuration the arena was built with.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The colour table in use.
    #[must_use]
    pub const fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// The framebuffer, including the shadow of what was last rendered.
    #[must_use]
    pub const fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    /// The transport.
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Whether `segment` has changes that have not been rendered.
    #[must_use]
    pub fn is_dirty(&self, segment: usize) -> bool {
        self.segments.get(segment).is_some_and(|segment| segment.dirty)
    }

    /// Set every pixel to `color` and mark every segment dirty.
    pub fn clear(&mut self, color: ColorName) {
        self.frame.clear(color);
        self.mark_all_dirty();
    }

    /// Set one pixel, wrapping out-of-range coordinates around the torus.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: ColorName) {
        let (x, y) = self.frame.grid().wrap(x, y);
        self.write_cell(x, y, color);
    }

    /// Set one pixel under an explicit edge policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for an out-of-range coordinate under [`Edges::Strict`];
    /// the framebuffer is unchanged.
    pub fn try_set_pixel(&mut self, x: i32, y: i32, color: ColorName, edges: Edges) -> Result<()> {
        let (x, y) = self.frame.grid().resolve(x, y, edges)?;
        self.write_cell(x, y, color);
        Ok(())
    }

    /// Colour of one pixel, wrapping out-of-range coordinates around the torus.
    #[must_use]
    pub fn get_pixel(&self, x: i32, y: i32) -> ColorName {
        let (x, y) = self.frame.grid().wrap(x, y);
        self.frame.get(x, y)
    }

    /// Colour of one pixel under an explicit edge policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for an out-of-range coordinate under [`Edges::Strict`].
    pub fn try_get_pixel(&self, x: i32, y: i32, edges: Edges) -> Result<ColorName> {
        let (x, y) = self.frame.grid().resolve(x, y, edges)?;
        Ok(self.frame.get(x, y))
    }

    /// Forget what the hardware shows, so the next render repaints every enabled segment in full.
    pub fn invalidate(&mut self) {
        self.frame.invalidate();
        self.mark_all_dirty();
    }

    /// Enable or disable one panel.
    ///
    /// In duplicate mode this drives the panel's enable line, so the panel
    /// ignores (or again accepts) the shared data. In independent mode a
    /// disabled panel is skipped by [`Self::render`] and keeps its pending
    /// changes until it is enabled again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToggle`] in single-chain and diagnostic modes,
    /// [`Error::NoSuchPanel`] for an unknown panel, or [`Error::Pin`] if the line cannot be driven.
    pub fn toggle_panel(&mut self, panel: usize, on: bool) -> Result<()> {
        let mode = self.mode();
        let segment_count = self.topology.segment_count();
        if !matches!(mode, Mode::Independent | Mode::Duplicate) {
            return Err(Error::InvalidToggle { panel, mode });
        }
        if panel >= segment_count {
            return Err(Error::NoSuchPanel {
                panel,
                segment_count,
            });
        }
        debug!("Arena::toggle_panel: panel {panel} {}", if on { "on" } else { "off" });
        if mode == Mode::Duplicate {
            return self.pins.set(panel, on);
        }
        let segment = self
            .segments
            .get_mut(panel)
            .ok_or(Error::UninitializedTransport { mode })?;
        segment.enabled = on;
        Ok(())
    }

    /// Send every pending change to the hardware (or, in diagnostic mode, print the arena).
    ///
    /// Only dirty segments are visited, only pixels that differ from the
    /// shadow are written, and a segment with nothing to write is not latched.
    /// In independent mode each segment's enable line is raised for its
    /// transmission and lowered afterwards.
    ///
    /// If a segment fails, rendering stops and the error is returned. That
    /// segment (and any not yet visited) stays dirty with its shadow untouched,
    /// so the next render sends the same pixels again. In duplicate mode the
    /// shadow follows the panels that did latch, and the others are sent in
    /// full next time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UninitializedTransport`] if the last mode switch did not
    /// finish, or the first transport, pin or text output error.
    pub fn render(&mut self) -> Result<RenderStats> {
        if self.mode() == Mode::Diagnostic {
            let mut output = core::mem::replace(&mut self.text_output, Box::new(io::sink()));
            let painted = self.paint_text(&mut output);
            self.text_output = output;
            return painted.map(|()| RenderStats::default());
        }
        if self.segments.len() != self.topology.segment_count() {
            return Err(Error::UninitializedTransport { mode: self.mode() });
        }

        let Self {
            topology,
            frame,
            segments,
            pins,
            colors,
            ..
        } = self;
        let independent = topology.mode() == Mode::Independent;
        let mut stats = RenderStats::default();
        let mut rendered = Vec::with_capacity(segments.len());
        let mut failure = None;

        for (index, segment) in segments.iter_mut().enumerate() {
            if !segment.dirty {
                continue;
            }
            if !segment.enabled {
                trace!("Arena::render: segment {index} disabled, leaving it dirty");
                continue;
            }
            match render_segment(index, segment, topology, frame, colors, pins, independent) {
                Ok(written) => {
                    segment.dirty = false;
                    segment.repaint = false;
                    rendered.push(index);
                    if written > 0 {
                        stats.segments_touched += 1;
                        stats.pixels_written += written;
                    }
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        let dirty_left = segments.iter().any(|segment| segment.dirty);
        if topology.is_mirrored() {
            // Mirrored segments share one shadow. It follows the segments that latched;
            // the rest are repainted in full.
            if !rendered.is_empty() {
                frame.commit();
                for segment in segments.iter_mut().filter(|segment| segment.dirty) {
                    segment.repaint = true;
                }
            }
        } else if dirty_left {
            for index in rendered {
                frame.commit_columns(topology.segment_columns(index));
            }
        } else {
            frame.commit();
        }

        if let Some(error) = failure {
            warn!("Arena::render: {error}");
            return Err(error);
        }
        debug!(
            "Arena::render: {} segments touched, {} LEDs written",
            stats.segments_touched, stats.pixels_written
        );
        Ok(stats)
    }

    /// Write the arena as text: one glyph per pixel, one line per row.
    ///
    /// Works in every mode and never reads or updates the shadow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TextOutput`] if `output` fails.
    pub fn paint_text(&self, output: &mut impl io::Write) -> Result<()> {
        let mut line = String::with_capacity(self.width() + 1);
        for y in 0..self.height() {
            line.clear();
            line.extend((0..self.width()).map(|x| self.colors.glyph(self.frame.get(x, y))));
            line.push('\n');
            output.write_all(line.as_bytes())?;
        }
        output.flush()?;
        Ok(())
    }

    /// Disable every select line and hand every strip back to the transport.
    ///
    /// Dropping an arena does the same on a best-effort basis; call this to see the errors.
    ///
    /// # Errors
    ///
    /// Returns the first error; every step is still attempted.
    pub fn shutdown(mut self) -> Result<()> {
        self.release_hardware()
    }

    fn release_hardware(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let mut first_error = self.pins.release().err();
        if let Err(error) = self.detach() {
            first_error.get_or_insert(error);
        }
        if let Err(error) = self.bus.cleanup() {
            first_error.get_or_insert(error);
        }
        if let Err(error) = self.text_output.flush() {
            first_error.get_or_insert(error.into());
        }
        info!("Arena::shutdown: select lines off, transports released");
        first_error.map_or(Ok(()), Err)
    }

    fn write_cell(&mut self, x: usize, y: usize, color: ColorName) {
        self.frame.set(x, y, color);
        match self.topology.owner(x) {
            Owner::Nobody => {}
            Owner::Segment(index) => {
                if let Some(segment) = self.segments.get_mut(index) {
                    segment.dirty = true;
                }
            }
            Owner::Every => self.mark_all_dirty(),
        }
    }

    fn mark_all_dirty(&mut self) {
        for segment in &mut self.segments {
            segment.dirty = true;
        }
    }
}

fn render_segment<S: PixelStrip, P: StatefulOutputPin>(
    index: usize,
    segment: &mut Segment<S>,
    topology: &Topology,
    frame: &Framebuffer,
    colors: &ColorTable,
    pins: &mut PanelPins<P>,
    independent: bool,
) -> Result<usize> {
    let height = topology.height();
    let offset = topology.column_offset(index);
    let mut written = 0;
    for x in topology.segment_columns(index) {
        for y in 0..height {
            let pending = if segment.repaint {
                Some(frame.get(x, y))
            } else {
                frame.changed(x, y)
            };
            if let Some(color) = pending {
                let local = pixel_index(x - offset, y, height);
                segment.strip.set_pixel_color(local, colors.device(color))?;
                written += 1;
            }
        }
    }
    if written == 0 {
        return Ok(0);
    }

    trace!("render_segment: segment {index}, {written} LEDs");
    if independent {
        pins.set(index, true)?;
    }
    let shown = segment.strip.show();
    let disabled = if independent {
        pins.set(index, false)
    } else {
        Ok(())
    };
    shown.and(disabled)?;
    Ok(written)
}

impl<B: StripBus, P: StatefulOutputPin> Drop for Arena<B, P> {
    fn drop(&mut self) {
        if let Err(error) = self.release_hardware() {
            warn!("Arena::drop: cleanup failed: {error}");
        }
    }
}

impl<B: StripBus, P: StatefulOutputPin> OriginDimensions for Arena<B, P> {
    fn size(&self) -> Size {
        let width = u32::try_from(self.width()).unwrap_or(u32::MAX);
        let height = u32::try_from(self.height()).unwrap_or(u32::MAX);
        Size::new(width, height)
    }
}

// Drawn pixels wrap around the torus, so shapes may cross the arena edges.
impl<B: StripBus, P: StatefulOutputPin> DrawTarget for Arena<B, P> {
    type Color = ColorName;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}
