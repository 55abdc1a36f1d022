//! The seam between the render engine and the pixel-strip output devices.
//!
//! A [`StripBus`] hands out one [`PixelStrip`] per segment when a mode is
//! selected and takes them back when the mode changes or the arena shuts down.
//! Strips buffer [`set_pixel_color`](PixelStrip::set_pixel_color) writes and
//! only transmit on [`show`](PixelStrip::show).
//!
//! [`apa102`] drives DotStar (APA102) chains over an `embedded-hal` SPI bus;
//! [`crate::sim`] records calls for tests and dry runs.

pub mod apa102;

use smart_leds::RGB8;

use crate::Result;

/// One physical LED chain.
pub trait PixelStrip {
    /// Number of LEDs on the chain.
    fn len(&self) -> usize;

    /// Whether the chain has no LEDs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prepare the chain for use. Called once after [`StripBus::configure`].
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the device cannot be initialised.
    fn begin(&mut self) -> Result<()>;

    /// Buffer a colour for one LED; nothing is transmitted until [`Self::show`].
    ///
    /// # Errors
    ///
    /// Returns the transport's error if `index` is out of range.
    fn set_pixel_color(&mut self, index: usize, color: RGB8) -> Result<()>;

    /// Transmit the buffered colours and latch them. Blocks until done.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the transmission fails.
    fn show(&mut self) -> Result<()>;
}

/// Source of per-segment strips for the current mode.
pub trait StripBus {
    /// Strip type handed out for each segment.
    type Strip: PixelStrip;

    /// Create the strip for `segment`, sized for `pixel_count` LEDs at `clock_hz`.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the segment has no output device.
    fn configure(&mut self, segment: usize, pixel_count: usize, clock_hz: u32) -> Result<Self::Strip>;

    /// Take back a strip created by [`Self::configure`].
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the device cannot be released cleanly.
    fn release(&mut self, segment: usize, strip: Self::Strip) -> Result<()>;

    /// Tear down the whole device set. Called once at shutdown, after every strip is released.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if teardown fails.
    fn cleanup(&mut self) -> Result<()>;
}
