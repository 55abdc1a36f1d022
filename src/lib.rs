//! Drive a toroidal LED arena: a cylinder of serpentine-wired LED panels that
//! a test subject views from inside.
//!
//! The arena is addressed as one logical `width × height` grid whose edges
//! wrap in both directions. Drawing only updates a framebuffer;
//! [`Arena::render`] works out which panels changed since the last render and
//! sends just those pixels, one latch per touched panel.
//!
//! # Glossary
//!
//! - **Panel / segment:** one physical LED matrix, `panel_width` columns by
//!   `height` rows. In independent and duplicate modes each panel is a
//!   segment with its own transport; in single-chain mode the whole arena is
//!   one segment.
//! - **Serpentine column-major:** the wiring order inside a chain. Even
//!   columns run top to bottom, odd columns bottom to top (see [`mapping`]).
//! - **Shadow:** the copy of each pixel as it was last rendered; only pixels
//!   that differ from it are sent (see [`frame`]).
//! - **Toroidal addressing:** out-of-range coordinates wrap modulo the arena
//!   size instead of failing.
//! - **Diagnostic mode:** no hardware; renders print one glyph per pixel.
//!
//! # Modules
//!
//! - [`arena`]: the render engine and drawing surface.
//! - [`topology`]: modes and the segment layout each implies.
//! - [`transport`]: the strip seam, with an APA102 SPI implementation.
//! - [`gpio`]: serial/parallel toggle and per-panel enable lines.
//! - [`animate`] and [`scene`]: fixed-rate animations.
//! - [`sim`]: recording doubles for tests and dry runs.
//! - `to_png` (feature `host`): PNG previews.

pub mod animate;
pub mod arena;
pub mod color;
pub mod config;
mod error;
pub mod frame;
pub mod gpio;
pub mod mapping;
pub mod scene;
pub mod shapes;
pub mod sim;
#[cfg(feature = "host")]
pub mod to_png;
pub mod topology;
pub mod transport;

// Re-export the types most callers need
pub use crate::arena::{Arena, RenderStats};
pub use crate::color::{ColorName, ColorTable};
pub use crate::config::ArenaConfig;
pub use crate::error::{Error, PinRole, Result};
pub use crate::mapping::{Edges, Grid};
pub use crate::topology::{Mode, Topology};
