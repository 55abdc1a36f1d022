#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for PNG previews of the arena.

use std::error::Error;
use std::fs::File;

use arena_envoy::frame::Framebuffer;
use arena_envoy::shapes::fill_polygon;
use arena_envoy::sim::{Journal, RecordingBus, recording_pins};
use arena_envoy::to_png::{write_frame_png, write_frames_apng};
use arena_envoy::{Arena, ArenaConfig, ColorName, Grid, Mode};
use embedded_graphics::prelude::*;

fn decode(path: &std::path::Path) -> Result<(png::OutputInfo, Vec<u8>, u32), Box<dyn Error>> {
    let decoder = png::Decoder::new(File::open(path)?);
    let mut reader = decoder.read_info()?;
    let frames = reader.info().animation_control.map_or(1, |control| control.num_frames);
    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer)?;
    Ok((info, buffer, frames))
}

#[test]
fn house_preview_fits_the_requested_size() -> Result<(), Box<dyn Error>> {
    let config = ArenaConfig::default();
    let journal = Journal::new();
    let pins = recording_pins(&config, &journal);
    let mut arena = Arena::new(config, RecordingBus::new(journal), pins, Mode::Independent)?;

    let walls = [Point::new(52, 6), Point::new(68, 6), Point::new(68, 15), Point::new(52, 15)];
    let roof = [Point::new(50, 6), Point::new(60, 0), Point::new(70, 6)];
    fill_polygon(&mut arena, &walls, ColorName::Orange)?;
    fill_polygon(&mut arena, &roof, ColorName::Red)?;
    arena.set_pixel(63, 12, ColorName::Yellow);

    let directory = tempfile::tempdir()?;
    let path = directory.path().join("previews").join("house.png");
    write_frame_png(arena.frame(), &path, 1024)?;

    let (info, buffer, frames) = decode(&path)?;
    assert_eq!(frames, 1);
    assert!(info.width <= 1024 && info.height <= 1024);
    assert!(info.width > info.height * 6);
    assert!(buffer.iter().any(|&byte| byte != 0));
    Ok(())
}

#[test]
fn apng_keeps_every_frame() -> Result<(), Box<dyn Error>> {
    let grid = Grid::new(16, 16);
    let frames: Vec<Framebuffer> = ColorName::ALL
        .iter()
        .map(|&color| Framebuffer::new(grid, color))
        .collect();

    let directory = tempfile::tempdir()?;
    let path = directory.path().join("palette.png");
    write_frames_apng(&frames, &path, 200, 250)?;

    let (info, _, count) = decode(&path)?;
    assert_eq!(count, 8);
    assert_eq!(info.width, info.height);
    Ok(())
}

#[test]
fn empty_animation_is_an_error() {
    let directory = tempfile::tempdir().expect("temp dir");
    assert!(write_frames_apng(&[], directory.path().join("empty.png"), 100, 10).is_err());
}
