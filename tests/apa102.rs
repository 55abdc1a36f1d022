#![allow(missing_docs)]
//! Host-level tests for the APA102 (DotStar) SPI transport.

use std::cell::RefCell;
use std::rc::Rc;

use arena_envoy::sim::{Journal, recording_pins};
use arena_envoy::transport::apa102::{Apa102Bus, end_frame_len};
use arena_envoy::transport::{PixelStrip, StripBus};
use arena_envoy::{Arena, ArenaConfig, ColorName, Error, Mode};
use embedded_hal::spi::{ErrorKind, ErrorType, SpiBus};
use smart_leds::RGB8;

#[derive(Clone, Default)]
struct MockSpi {
    transmissions: Rc<RefCell<Vec<Vec<u8>>>>,
    failing: Rc<RefCell<bool>>,
}

impl ErrorType for MockSpi {
    type Error = ErrorKind;
}

impl SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if *self.failing.borrow() {
            return Err(ErrorKind::Other);
        }
        self.transmissions.borrow_mut().push(words.to_vec());
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[test]
fn frame_layout_is_start_leds_end() {
    let spi = MockSpi::default();
    let mut bus = Apa102Bus::new([spi.clone()]);
    let mut strip = bus.configure(0, 3, 2_000_000).expect("bus 0 is free");
    strip.set_pixel_color(1, RGB8::new(1, 2, 3)).expect("index in range");
    strip.show().expect("show succeeds");

    assert_eq!(
        spi.transmissions.borrow().last().map(Vec::as_slice),
        Some(
            &[
                0x00, 0x00, 0x00, 0x00, // start
                0xFF, 0x00, 0x00, 0x00, // LED 0
                0xFF, 0x03, 0x02, 0x01, // LED 1 (blue, green, red)
                0xFF, 0x00, 0x00, 0x00, // LED 2
                0xFF, // end
            ][..]
        )
    );
}

#[test]
fn end_frame_covers_every_led() {
    assert_eq!(end_frame_len(1), 1);
    assert_eq!(end_frame_len(16), 1);
    assert_eq!(end_frame_len(17), 2);
    assert_eq!(end_frame_len(256), 16);
    assert_eq!(end_frame_len(2048), 128);
}

#[test]
fn brightness_is_clamped_to_five_bits() {
    let spi = MockSpi::default();
    let mut bus = Apa102Bus::new([spi.clone()]).with_brightness(5);
    let mut strip = bus.configure(0, 1, 1).expect("bus 0 is free");
    strip.show().expect("show succeeds");
    assert_eq!(spi.transmissions.borrow()[0][4], 0xE5);

    let spi = MockSpi::default();
    let mut bus = Apa102Bus::new([spi.clone()]).with_brightness(200);
    let mut strip = bus.configure(0, 1, 1).expect("bus 0 is free");
    strip.show().expect("show succeeds");
    assert_eq!(spi.transmissions.borrow()[0][4], 0xFF);
}

#[test]
fn a_bus_serves_one_strip_at_a_time() {
    let mut bus = Apa102Bus::new([MockSpi::default()]);
    let strip = bus.configure(0, 4, 1).expect("bus 0 is free");
    assert!(matches!(bus.configure(0, 4, 1), Err(Error::Transport { segment: 0, .. })));
    assert!(matches!(bus.configure(1, 4, 1), Err(Error::Transport { segment: 1, .. })));
    bus.release(0, strip).expect("release succeeds");
    assert!(bus.configure(0, 4, 1).is_ok());
}

#[test]
fn clock_above_the_limit_is_rejected() {
    let config = ArenaConfig::default();
    let journal = Journal::new();
    let pins = recording_pins(&config, &journal);
    let bus = Apa102Bus::new([MockSpi::default()]).with_max_clock_hz(1_000_000);
    let result = Arena::new(config, bus, pins, Mode::SingleChain);
    assert!(matches!(result, Err(Error::Transport { segment: 0, .. })));
}

#[test]
fn arena_renders_one_panel_over_spi() {
    let config = ArenaConfig::default();
    let journal = Journal::new();
    let pins = recording_pins(&config, &journal);
    let spis: Vec<MockSpi> = (0..8).map(|_| MockSpi::default()).collect();
    let mut arena =
        Arena::new(config, Apa102Bus::new(spis.clone()), pins, Mode::Independent).expect("arena builds");
    // `begin` blanks every panel once.
    assert!(spis.iter().all(|spi| spi.transmissions.borrow().len() == 1));

    arena.set_pixel(63, 12, ColorName::Red);
    arena.render().expect("render succeeds");
    assert!(
        spis.iter()
            .enumerate()
            .all(|(segment, spi)| spi.transmissions.borrow().len() == if segment == 3 { 2 } else { 1 })
    );

    let frame = spis[3].transmissions.borrow()[1].clone();
    assert_eq!(frame.len(), 4 + 256 * 4 + 16);
    let led = 4 + 243 * 4;
    assert_eq!(frame[led..led + 4], [0xFF, 0, 0, 15]);
}

#[test]
fn spi_failure_is_reported_with_its_segment() {
    let config = ArenaConfig::default();
    let journal = Journal::new();
    let pins = recording_pins(&config, &journal);
    let spis: Vec<MockSpi> = (0..8).map(|_| MockSpi::default()).collect();
    let mut arena =
        Arena::new(config, Apa102Bus::new(spis.clone()), pins, Mode::Independent).expect("arena builds");

    *spis[6].failing.borrow_mut() = true;
    arena.set_pixel(100, 0, ColorName::Green);
    assert_eq!(
        arena.render(),
        Err(Error::Spi {
            segment: 6,
            kind: ErrorKind::Other
        })
    );
    assert!(arena.is_dirty(6));

    *spis[6].failing.borrow_mut() = false;
    arena.render().expect("render succeeds after the bus recovers");
    assert!(!arena.is_dirty(6));
}
