#![allow(missing_docs)]
//! Host-level tests for the diagnostic (text) mode.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use arena_envoy::sim::{Journal, RecordingBus, RecordingPin, recording_pins};
use arena_envoy::{Arena, ArenaConfig, ColorName, Mode, RenderStats};

#[derive(Clone, Default)]
struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    fn take_string(&self) -> String {
        String::from_utf8(self.0.borrow_mut().split_off(0)).expect("glyphs are ASCII")
    }
}

impl io::Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct FailingOutput;

impl io::Write for FailingOutput {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn text_arena() -> (Arena<RecordingBus, RecordingPin>, Journal, SharedOutput) {
    let config = ArenaConfig::default();
    let journal = Journal::new();
    let pins = recording_pins(&config, &journal);
    let mut arena =
        Arena::new(config, RecordingBus::new(journal.clone()), pins, Mode::Diagnostic).expect("arena builds");
    let output = SharedOutput::default();
    arena.set_text_output(output.clone());
    (arena, journal, output)
}

#[test]
fn clear_green_prints_sixteen_rows_of_g() {
    let (mut arena, journal, output) = text_arena();
    arena.clear(ColorName::Green);
    assert_eq!(arena.render(), Ok(RenderStats::default()));

    let text = output.take_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 16);
    assert!(lines.iter().all(|line| *line == "G".repeat(128)));
    assert!(journal.events().is_empty());
}

#[test]
fn each_render_prints_the_whole_arena_again() {
    let (mut arena, _, output) = text_arena();
    arena.set_pixel(2, 1, ColorName::Magenta);
    arena.render().expect("render succeeds");
    arena.render().expect("render succeeds");

    let text = output.take_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 32);
    assert_eq!(lines[1], lines[17]);
    assert_eq!(&lines[1][..4], "--M-");
}

#[test]
fn text_mode_leaves_the_shadow_alone() {
    let (mut arena, _, _) = text_arena();
    arena.set_pixel(0, 0, ColorName::Red);
    arena.render().expect("render succeeds");
    assert_eq!(arena.frame().changed(0, 0), Some(ColorName::Red));
}

#[test]
fn paint_text_works_in_hardware_modes() {
    let config = ArenaConfig::default();
    let journal = Journal::new();
    let pins = recording_pins(&config, &journal);
    let mut arena =
        Arena::new(config, RecordingBus::new(journal), pins, Mode::Duplicate).expect("arena builds");
    arena.clear(ColorName::Orange);
    arena.set_pixel(15, 15, ColorName::Cyan);

    let mut text = Vec::new();
    arena.paint_text(&mut text).expect("writing to a Vec succeeds");
    let text = String::from_utf8(text).expect("glyphs are ASCII");
    assert_eq!(text.lines().count(), 16);
    assert_eq!(text.lines().last(), Some("OOOOOOOOOOOOOOOC"));
}

#[test]
fn output_errors_are_reported() {
    let (mut arena, _, _) = text_arena();
    arena.set_text_output(FailingOutput);
    assert_eq!(
        arena.render(),
        Err(arena_envoy::Error::TextOutput {
            kind: io::ErrorKind::BrokenPipe
        })
    );
}
