//! Arena dimensions, transport clock and GPIO pin assignments.
//!
//! All values are supplied when the arena is built and stay fixed until a new
//! arena is built. Defaults describe the 16×128 arena: eight 16×16 panels
//! clocked at 2 MHz, with the serial/parallel select on BCM pin 25.
//!
//! ```rust
//! use arena_envoy::config::ArenaConfig;
//!
//! let config = ArenaConfig::from_toml_str("segment_count = 4\nclock_hz = 8000000")?;
//! assert_eq!(config.segment_count, 4);
//! assert_eq!(config.height, 16);
//! # Ok::<(), arena_envoy::Error>(())
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Default rows per panel.
pub const DEFAULT_HEIGHT: usize = 16;
/// Default columns per panel.
pub const DEFAULT_PANEL_WIDTH: usize = 16;
/// Default number of panels.
pub const DEFAULT_SEGMENT_COUNT: usize = 8;
/// Default transport clock (2 MHz).
pub const DEFAULT_CLOCK_HZ: u32 = 2_000_000;
/// Default pin selecting serial (high) or parallel (low) hardware mode.
pub const DEFAULT_TOGGLE_PIN: u8 = 25;
/// Default panel enable pins, in panel order.
pub const DEFAULT_PANEL_PINS: [u8; 8] = [5, 6, 13, 19, 26, 16, 20, 21];

/// Arena configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Rows (LEDs per panel column).
    pub height: usize,
    /// Columns per panel.
    pub panel_width: usize,
    /// Number of panels.
    pub segment_count: usize,
    /// Transport clock rate in hertz.
    pub clock_hz: u32,
    /// BCM number of the serial/parallel select pin.
    pub toggle_pin: u8,
    /// BCM numbers of the panel enable pins, one per panel.
    pub panel_pins: Vec<u8>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            panel_width: DEFAULT_PANEL_WIDTH,
            segment_count: DEFAULT_SEGMENT_COUNT,
            clock_hz: DEFAULT_CLOCK_HZ,
            toggle_pin: DEFAULT_TOGGLE_PIN,
            panel_pins: DEFAULT_PANEL_PINS.to_vec(),
        }
    }
}

impl ArenaConfig {
    /// Parse a TOML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the document does not parse or fails [`Self::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|error| Error::InvalidConfig {
            reason: error.message().to_owned(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| Error::InvalidConfig {
            reason: format!("{}: {error}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that every dimension is positive and each panel has an enable pin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.height == 0 || self.panel_width == 0 || self.segment_count == 0 {
            "height, panel_width and segment_count must be positive".to_owned()
        } else if self.clock_hz == 0 {
            "clock_hz must be positive".to_owned()
        } else if self.panel_pins.len() < self.segment_count {
            format!(
                "{} panels need {} panel_pins, found {}",
                self.segment_count,
                self.segment_count,
                self.panel_pins.len()
            )
        } else if self
            .height
            .checked_mul(self.panel_width)
            .and_then(|cells| cells.checked_mul(self.segment_count))
            .is_none_or(|cells| i32::try_from(cells).is_err())
        {
            "arena is too large".to_owned()
        } else {
            return Ok(());
        };
        Err(Error::InvalidConfig { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_16x128_arena() {
        let config = ArenaConfig::default();
        assert_eq!(config.height * config.panel_width * config.segment_count, 2048);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn too_few_panel_pins_is_rejected() {
        let result = ArenaConfig::from_toml_str("panel_pins = [5, 6]");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = ArenaConfig::from_toml_str("colour_depth = 8");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn zero_height_is_rejected() {
        let config = ArenaConfig {
            height: 0,
            ..ArenaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
