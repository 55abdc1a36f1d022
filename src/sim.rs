//! Recording stand-ins for the arena's hardware, for tests and dry runs.
//!
//! Every double writes into a shared [`Journal`], so the order of pin changes,
//! pixel writes and latches across all segments can be inspected afterwards.
//! A journal built with [`Journal::log_only`] keeps nothing and only logs, which
//! is what the `arena` binary uses for its hardware modes.

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use log::{debug, trace};
use smart_leds::RGB8;

use crate::config::ArenaConfig;
use crate::error::PinRole;
use crate::gpio::PanelPins;
use crate::transport::{PixelStrip, StripBus};
use crate::{Error, Result};

/// One recorded hardware interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A strip was configured.
    Configure {
        /// Segment index.
        segment: usize,
        /// LEDs on the strip.
        pixel_count: usize,
        /// Requested clock.
        clock_hz: u32,
    },
    /// A strip was started.
    Begin {
        /// Segment index.
        segment: usize,
    },
    /// One LED colour was buffered.
    SetPixel {
        /// Segment index.
        segment: usize,
        /// LED index on the strip.
        index: usize,
        /// Device colour.
        color: RGB8,
    },
    /// A strip latched its buffer.
    Show {
        /// Segment index.
        segment: usize,
    },
    /// A strip was handed back.
    Release {
        /// Segment index.
        segment: usize,
    },
    /// The bus was torn down.
    Cleanup,
    /// A select line was driven.
    Pin {
        /// Which line.
        role: PinRole,
        /// New level.
        high: bool,
    },
}

#[derive(Default)]
struct JournalState {
    keep: bool,
    events: Vec<Event>,
    failing_shows: BTreeSet<usize>,
}

/// Shared, cloneable record of [`Event`]s.
#[derive(Clone)]
pub struct Journal(Rc<RefCell<JournalState>>);

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    /// A journal that keeps every event.
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(JournalState {
            keep: true,
            ..JournalState::default()
        })))
    }

    /// A journal that only logs events at `trace` level.
    #[must_use]
    pub fn log_only() -> Self {
        Self(Rc::new(RefCell::new(JournalState::default())))
    }

    fn record(&self, event: Event) {
        trace!("Journal::record: {event:?}");
        let mut state = self.0.borrow_mut();
        if state.keep {
            state.events.push(event);
        }
    }

    /// Every event so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    /// Forget the events so far.
    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }

    /// `(index, colour)` of every pixel write to `segment`, oldest first.
    #[must_use]
    pub fn writes(&self, segment: usize) -> Vec<(usize, RGB8)> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|event| match *event {
                Event::SetPixel {
                    segment: written,
                    index,
                    color,
                } if written == segment => Some((index, color)),
                _ => None,
            })
            .collect()
    }

    /// Segments that latched, in order.
    #[must_use]
    pub fn shows(&self) -> Vec<usize> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|event| match *event {
                Event::Show { segment } => Some(segment),
                _ => None,
            })
            .collect()
    }

    /// Make every later [`PixelStrip::show`] on `segment` fail until [`Self::heal`] is called.
    pub fn fail_shows(&self, segment: usize) {
        self.0.borrow_mut().failing_shows.insert(segment);
    }

    /// Undo [`Self::fail_shows`].
    pub fn heal(&self, segment: usize) {
        self.0.borrow_mut().failing_shows.remove(&segment);
    }

    fn show_fails(&self, segment: usize) -> bool {
        self.0.borrow().failing_shows.contains(&segment)
    }
}

/// A strip that records instead of transmitting.
pub struct RecordingStrip {
    segment: usize,
    pixels: Vec<RGB8>,
    journal: Journal,
}

impl RecordingStrip {
    /// Colours buffered so far (what the panel would show after the next latch).
    #[must_use]
    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }
}

impl PixelStrip for RecordingStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn begin(&mut self) -> Result<()> {
        self.pixels.fill(RGB8::default());
        self.journal.record(Event::Begin {
            segment: self.segment,
        });
        Ok(())
    }

    fn set_pixel_color(&mut self, index: usize, color: RGB8) -> Result<()> {
        let segment = self.segment;
        let pixel = self.pixels.get_mut(index).ok_or(Error::Transport {
            segment,
            reason: "LED index past the end of the chain",
        })?;
        *pixel = color;
        self.journal.record(Event::SetPixel {
            segment,
            index,
            color,
        });
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        if self.journal.show_fails(self.segment) {
            return Err(Error::Transport {
                segment: self.segment,
                reason: "simulated transmission failure",
            });
        }
        debug!("RecordingStrip::show: segment {}", self.segment);
        self.journal.record(Event::Show {
            segment: self.segment,
        });
        Ok(())
    }
}

/// A bus that hands out [`RecordingStrip`]s for any segment.
pub struct RecordingBus {
    journal: Journal,
}

impl RecordingBus {
    /// Record into `journal`.
    #[must_use]
    pub const fn new(journal: Journal) -> Self {
        Self { journal }
    }

    /// The journal being recorded into.
    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl StripBus for RecordingBus {
    type Strip = RecordingStrip;

    fn configure(&mut self, segment: usize, pixel_count: usize, clock_hz: u32) -> Result<Self::Strip> {
        self.journal.record(Event::Configure {
            segment,
            pixel_count,
            clock_hz,
        });
        Ok(RecordingStrip {
            segment,
            pixels: vec![RGB8::default(); pixel_count],
            journal: self.journal.clone(),
        })
    }

    fn release(&mut self, segment: usize, _strip: Self::Strip) -> Result<()> {
        self.journal.record(Event::Release { segment });
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.journal.record(Event::Cleanup);
        Ok(())
    }
}

/// An output pin that records its level changes.
pub struct RecordingPin {
    role: PinRole,
    high: bool,
    journal: Journal,
}

impl RecordingPin {
    /// A pin for `role`, starting low.
    #[must_use]
    pub const fn new(role: PinRole, journal: Journal) -> Self {
        Self {
            role,
            high: false,
            journal,
        }
    }

    fn drive(&mut self, high: bool) {
        self.high = high;
        self.journal.record(Event::Pin {
            role: self.role,
            high,
        });
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

impl StatefulOutputPin for RecordingPin {
    fn is_set_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(!self.high)
    }
}

/// A toggle pin plus one recording pin per configured panel pin.
#[must_use]
pub fn recording_pins(config: &ArenaConfig, journal: &Journal) -> PanelPins<RecordingPin> {
    PanelPins::new(
        RecordingPin::new(PinRole::Toggle, journal.clone()),
        (0..config.panel_pins.len()).map(|panel| RecordingPin::new(PinRole::Panel(panel), journal.clone())),
    )
}

/// A delay that returns immediately and remembers what was asked of it.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    requests_ns: Vec<u32>,
}

impl RecordingDelay {
    /// Every requested delay in nanoseconds, oldest first.
    #[must_use]
    pub fn requests_ns(&self) -> &[u32] {
        &self.requests_ns
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.requests_ns.push(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_only_journal_keeps_nothing() {
        let journal = Journal::log_only();
        let mut bus = RecordingBus::new(journal.clone());
        let mut strip = bus.configure(0, 4, 1).unwrap();
        strip.set_pixel_color(1, RGB8::new(1, 2, 3)).unwrap();
        assert!(journal.events().is_empty());
        assert_eq!(strip.pixels()[1], RGB8::new(1, 2, 3));
    }

    #[test]
    fn failing_shows_can_be_healed() {
        let journal = Journal::new();
        let mut strip = RecordingBus::new(journal.clone()).configure(2, 4, 1).unwrap();
        journal.fail_shows(2);
        assert!(matches!(strip.show(), Err(Error::Transport { segment: 2, .. })));
        journal.heal(2);
        assert_eq!(strip.show(), Ok(()));
        assert_eq!(journal.shows(), [2]);
    }

    #[test]
    fn set_pixel_past_the_end_is_an_error() {
        let mut strip = RecordingBus::new(Journal::new()).configure(0, 4, 1).unwrap();
        assert!(strip.set_pixel_color(4, RGB8::default()).is_err());
    }
}
