//! DotStar (APA102) LED chains over an `embedded-hal` SPI bus.
//!
//! Each transmission is a start frame of four zero bytes, four bytes per LED
//! (`0b111` + 5-bit global brightness, then blue, green, red), and an end frame
//! of `0xFF` bytes long enough to clock the data through every LED.
//!
//! The SPI clock rate is a property of the bus the caller constructs; the rate
//! requested by [`StripBus::configure`] is only checked against
//! [`Apa102Bus::max_clock_hz`].

use embedded_hal::spi::{Error as _, SpiBus};
use log::{debug, warn};
use smart_leds::RGB8;

use crate::transport::{PixelStrip, StripBus};
use crate::{Error, Result};

/// Full global brightness.
pub const MAX_BRIGHTNESS: u8 = 0b1_1111;

const START_FRAME: [u8; 4] = [0; 4];
const LED_FRAME_MARKER: u8 = 0b1110_0000;

/// Bytes of `0xFF` needed after `pixel_count` LED frames.
#[must_use]
pub const fn end_frame_len(pixel_count: usize) -> usize {
    pixel_count.div_ceil(16)
}

/// One APA102 chain on its own SPI bus.
pub struct Apa102Strip<SPI> {
    spi: SPI,
    segment: usize,
    brightness: u8,
    pixels: Vec<RGB8>,
    encoded: Vec<u8>,
}

impl<SPI: SpiBus> Apa102Strip<SPI> {
    /// Wrap an SPI bus driving `pixel_count` LEDs.
    #[must_use]
    pub fn new(spi: SPI, segment: usize, pixel_count: usize, brightness: u8) -> Self {
        Self {
            spi,
            segment,
            brightness: brightness.min(MAX_BRIGHTNESS),
            pixels: vec![RGB8::default(); pixel_count],
            encoded: Vec::with_capacity(
                START_FRAME.len() + pixel_count * 4 + end_frame_len(pixel_count),
            ),
        }
    }

    /// Give the SPI bus back.
    #[must_use]
    pub fn into_inner(self) -> SPI {
        self.spi
    }

    fn encode(&mut self) {
        self.encoded.clear();
        self.encoded.extend_from_slice(&START_FRAME);
        let marker = LED_FRAME_MARKER | self.brightness;
        for pixel in &self.pixels {
            self.encoded.extend_from_slice(&[marker, pixel.b, pixel.g, pixel.r]);
        }
        self.encoded
            .resize(self.encoded.len() + end_frame_len(self.pixels.len()), 0xFF);
    }
}

impl<SPI: SpiBus> PixelStrip for Apa102Strip<SPI> {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn begin(&mut self) -> Result<()> {
        self.pixels.fill(RGB8::default());
        self.show()
    }

    fn set_pixel_color(&mut self, index: usize, color: RGB8) -> Result<()> {
        let pixel = self.pixels.get_mut(index).ok_or(Error::Transport {
            segment: self.segment,
            reason: "LED index past the end of the chain",
        })?;
        *pixel = color;
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.encode();
        let segment = self.segment;
        self.spi
            .write(&self.encoded)
            .and_then(|()| self.spi.flush())
            .map_err(|error| Error::Spi {
                segment,
                kind: error.kind(),
            })
    }
}

/// Hands out one [`Apa102Strip`] per segment from a fixed set of SPI buses.
///
/// Bus `n` serves segment `n`; single-chain mode uses bus 0.
pub struct Apa102Bus<SPI> {
    buses: Vec<Option<SPI>>,
    brightness: u8,
    max_clock_hz: u32,
}

impl<SPI: SpiBus> Apa102Bus<SPI> {
    /// Create a bus set at full brightness, accepting any requested clock rate.
    #[must_use]
    pub fn new(buses: impl IntoIterator<Item = SPI>) -> Self {
        Self {
            buses: buses.into_iter().map(Some).collect(),
            brightness: MAX_BRIGHTNESS,
            max_clock_hz: u32::MAX,
        }
    }

    /// Use a 5-bit global brightness for every strip (clamped to [`MAX_BRIGHTNESS`]).
    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness.min(MAX_BRIGHTNESS);
        self
    }

    /// Reject configurations asking for more than `max_clock_hz`.
    #[must_use]
    pub const fn with_max_clock_hz(mut self, max_clock_hz: u32) -> Self {
        self.max_clock_hz = max_clock_hz;
        self
    }

    /// Highest clock rate the buses were built for.
    #[must_use]
    pub const fn max_clock_hz(&self) -> u32 {
        self.max_clock_hz
    }

    /// Take the SPI buses back. Strips still checked out are not returned.
    #[must_use]
    pub fn into_inner(self) -> Vec<SPI> {
        self.buses.into_iter().flatten().collect()
    }
}

impl<SPI: SpiBus> StripBus for Apa102Bus<SPI> {
    type Strip = Apa102Strip<SPI>;

    fn configure(&mut self, segment: usize, pixel_count: usize, clock_hz: u32) -> Result<Self::Strip> {
        if clock_hz > self.max_clock_hz {
            return Err(Error::Transport {
                segment,
                reason: "requested clock rate exceeds the bus limit",
            });
        }
        let spi = self
            .buses
            .get_mut(segment)
            .and_then(Option::take)
            .ok_or(Error::Transport {
                segment,
                reason: "no free SPI bus for this segment",
            })?;
        debug!("Apa102Bus::configure: segment {segment}, {pixel_count} LEDs at {clock_hz} Hz");
        Ok(Apa102Strip::new(spi, segment, pixel_count, self.brightness))
    }

    fn release(&mut self, segment: usize, strip: Self::Strip) -> Result<()> {
        match self.buses.get_mut(segment) {
            Some(slot) => {
                *slot = Some(strip.into_inner());
                Ok(())
            }
            None => Err(Error::Transport {
                segment,
                reason: "released a strip this bus never configured",
            }),
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        let missing = self.buses.iter().filter(|slot| slot.is_none()).count();
        if missing > 0 {
            warn!("Apa102Bus::cleanup: {missing} SPI buses still checked out");
        }
        Ok(())
    }
}
