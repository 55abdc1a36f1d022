//! PNG and APNG previews of the arena framebuffer (requires the `host` feature).
//!
//! Each pixel is drawn as a soft-edged LED in its [`ColorName::preview`]
//! colour, on a black background, scaled to fit a requested maximum dimension.
//!
//! [`ColorName::preview`]: crate::color::ColorName::preview
#![cfg(feature = "host")]

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::info;
use png::{BitDepth, ColorType, Encoder, ScaledFloat};

use crate::frame::Framebuffer;

const PREVIEW_INVERSE_GAMMA: f32 = 2.2;

/// Render a framebuffer into a PNG file whose longer side is at most `target_max_dimension`.
///
/// # Errors
///
/// Returns any I/O or encoding error.
///
/// # Panics
///
/// Panics if `target_max_dimension` is zero.
pub fn write_frame_png(
    frame: &Framebuffer,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let (columns, rows) = grid_size(frame)?;
    let cell_size = select_cell_size(columns, rows, target_max_dimension);
    let led_margin = (cell_size / 8).max(1);
    let (width, height, pixels) = arena_pixels(frame, cell_size, led_margin);

    create_parent(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    info!("to_png::write_frame_png: wrote {}", output_path.display());
    Ok(())
}

/// Render a sequence of framebuffers into a looping APNG file.
///
/// # Errors
///
/// Returns an error if `frames` is empty, the frames differ in size, or on any I/O or encoding error.
///
/// # Panics
///
/// Panics if `target_max_dimension` is zero.
pub fn write_frames_apng(
    frames: &[Framebuffer],
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    frame_delay_ms: u16,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let first = frames.first().ok_or("an animation needs at least one frame")?;
    if frames.iter().any(|frame| frame.grid() != first.grid()) {
        return Err("every frame must have the same dimensions".into());
    }
    let (columns, rows) = grid_size(first)?;
    let cell_size = select_cell_size(columns, rows, target_max_dimension);
    let led_margin = (cell_size / 8).max(1);
    let frame_count = u32::try_from(frames.len())?;

    create_parent(output_path)?;
    let file = File::create(output_path)?;
    let (width, height, _) = arena_pixels(first, cell_size, led_margin);
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    encoder.set_animated(frame_count, 0)?;
    let mut writer = encoder.write_header()?;
    for frame in frames {
        let (_, _, pixels) = arena_pixels(frame, cell_size, led_margin);
        writer.set_frame_delay(frame_delay_ms.max(1), 1000)?;
        writer.write_image_data(&pixels)?;
    }
    writer.finish()?;
    info!(
        "to_png::write_frames_apng: wrote {} frames to {}",
        frames.len(),
        output_path.display()
    );
    Ok(())
}

fn grid_size(frame: &Framebuffer) -> Result<(u32, u32), Box<dyn Error>> {
    let grid = frame.grid();
    Ok((u32::try_from(grid.width())?, u32::try_from(grid.height())?))
}

fn create_parent(output_path: &Path) -> std::io::Result<()> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn select_cell_size(columns: u32, rows: u32, target_max_dimension: u32) -> u32 {
    assert!(target_max_dimension > 0, "target_max_dimension must be positive");
    let mut cell_size = target_max_dimension;
    while cell_size > 4 {
        let led_margin = (cell_size / 8).max(1);
        let led_radius = cell_size.saturating_sub(led_margin * 2) / 2;
        let output_width = columns * cell_size + led_radius * 2;
        let output_height = rows * cell_size + led_radius * 2;
        if output_width.max(output_height) <= target_max_dimension {
            break;
        }
        cell_size -= 1;
    }
    cell_size
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "preview geometry is bounded by the cell size"
)]
fn arena_pixels(frame: &Framebuffer, cell_size: u32, led_margin: u32) -> (u32, u32, Vec<u8>) {
    let grid = frame.grid();
    let led_radius = (cell_size.saturating_sub(led_margin * 2) / 2).max(1);
    let fade_width = (led_radius / 3).max(1);
    let border = led_radius;
    let width = (grid.width() as u32) * cell_size + border * 2;
    let height = (grid.height() as u32) * cell_size + border * 2;
    let mut bytes = vec![0u8; (width * height * 3 * 2) as usize];
    let center = (cell_size - 1) as i32 / 2;
    let led_radius_f = led_radius as f32;
    let inner_radius_f = led_radius.saturating_sub(fade_width) as f32;
    let radius_sq = (led_radius as i32) * (led_radius as i32);

    for row_index in 0..grid.height() {
        for column_index in 0..grid.width() {
            let pixel = frame.get(column_index, row_index).preview();
            let cell_origin_x = (column_index as u32) * cell_size;
            let cell_origin_y = (row_index as u32) * cell_size;

            for local_y in 0..cell_size {
                let delta_y = local_y as i32 - center;
                for local_x in 0..cell_size {
                    let delta_x = local_x as i32 - center;
                    let distance_sq = delta_x * delta_x + delta_y * delta_y;
                    if distance_sq > radius_sq {
                        continue;
                    }
                    let distance = (distance_sq as f32).sqrt();
                    let intensity = if distance <= inner_radius_f {
                        1.0
                    } else {
                        let fade_span = led_radius_f - inner_radius_f;
                        (1.0 - (distance - inner_radius_f) / fade_span).max(0.0)
                    };
                    let x = border + cell_origin_x + local_x;
                    let y = border + cell_origin_y + local_y;
                    let start = ((y * width + x) * 3 * 2) as usize;
                    let channels = [pixel.r, pixel.g, pixel.b]
                        .map(|channel| linear_to_u16(inverse_gamma_to_linear(channel) * intensity));
                    if let Some(out) = bytes.get_mut(start..start + 6) {
                        for (pair, value) in out.chunks_exact_mut(2).zip(channels) {
                            pair.copy_from_slice(&value.to_be_bytes());
                        }
                    }
                }
            }
        }
    }

    (width, height, bytes)
}

fn inverse_gamma_to_linear(channel: u8) -> f32 {
    (f32::from(channel) / 255.0).powf(PREVIEW_INVERSE_GAMMA)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to the u16 range first"
)]
fn linear_to_u16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * 65535.0).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_size_fits_the_target() {
        let cell_size = select_cell_size(128, 16, 1024);
        let led_radius = (cell_size - 2 * (cell_size / 8).max(1)) / 2;
        assert!(128 * cell_size + 2 * led_radius <= 1024);
    }
}
