//! Crate-wide error type.
//!
//! Configuration and argument errors are returned to the caller immediately.
//! None of them are retried by the crate; see [`crate::animate::run`] for the
//! top-level handler that guarantees cleanup.

use derive_more::{Display, Error};
use embedded_hal::{digital, spi};

use crate::topology::Mode;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong while driving the arena.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A strict (non-toroidal) access fell outside the grid.
    #[display("({x}, {y}) is out of bounds for a {width}x{height} arena")]
    OutOfBounds {
        /// Requested column.
        x: i32,
        /// Requested row.
        y: i32,
        /// Grid width at the time of the request.
        width: usize,
        /// Grid height at the time of the request.
        height: usize,
    },
    /// The topology name is not one of the known modes.
    #[display("invalid mode {name:?} (expected text, serial, parallel or duplicate)")]
    InvalidMode {
        /// The rejected name.
        name: String,
    },
    /// The colour name is absent from the colour table.
    #[display("invalid colour {name:?}")]
    InvalidColor {
        /// The rejected name.
        name: String,
    },
    /// A render was attempted before the transports for the current mode were set up.
    #[display("render attempted in {mode} mode before its transports were configured")]
    UninitializedTransport {
        /// Mode the arena was in.
        mode: Mode,
    },
    /// Panels can only be toggled in independent and duplicate modes.
    #[display("cannot toggle panel {panel} in {mode} mode")]
    InvalidToggle {
        /// Panel that was addressed.
        panel: usize,
        /// Mode the arena was in.
        mode: Mode,
    },
    /// The panel index does not name a segment of the current topology.
    #[display("panel {panel} does not exist (segment count is {segment_count})")]
    NoSuchPanel {
        /// Panel that was addressed.
        panel: usize,
        /// Number of segments in the current topology.
        segment_count: usize,
    },
    /// The arena configuration is unusable.
    #[display("invalid arena configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
    /// An SPI write to a segment failed.
    #[display("SPI write to segment {segment} failed: {kind}")]
    Spi {
        /// Segment whose bus failed.
        segment: usize,
        /// Kind reported by the SPI implementation.
        kind: spi::ErrorKind,
    },
    /// Driving a select line failed.
    #[display("GPIO pin {pin} failed: {kind}")]
    Pin {
        /// Logical pin (the toggle line or a panel line).
        pin: PinRole,
        /// Kind reported by the pin implementation.
        kind: digital::ErrorKind,
    },
    /// A transport refused a request.
    #[display("transport for segment {segment} failed: {reason}")]
    Transport {
        /// Segment whose transport failed.
        segment: usize,
        /// Why.
        reason: &'static str,
    },
    /// Writing the diagnostic text output failed.
    #[display("text output failed: {kind}")]
    TextOutput {
        /// Kind of the underlying I/O failure.
        kind: std::io::ErrorKind,
    },
    /// The animation loop observed the stop flag.
    #[display("interrupted")]
    Interrupted,
}

/// Which select line a [`Error::Pin`] refers to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    /// The line that selects serial or parallel hardware mode.
    #[display("toggle")]
    Toggle,
    /// The enable line of one panel.
    #[display("panel {_0}")]
    Panel(usize),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::TextOutput { kind: error.kind() }
    }
}
