//! Symbolic arena colours and the table that maps them to device colours and text glyphs.
//!
//! The arena works in a small fixed palette. Each [`ColorName`] has a device
//! colour (what is sent to the LEDs) and a single-character glyph (what the
//! diagnostic text mode prints).
//!
//! ```rust
//! use arena_envoy::color::{ColorName, ColorTable};
//!
//! let red: ColorName = "red".parse()?;
//! assert_eq!(ColorTable::ARENA.glyph(red), 'R');
//! # Ok::<(), arena_envoy::Error>(())
//! ```

use core::{fmt, str::FromStr};

use embedded_graphics::pixelcolor::PixelColor;
use serde::Deserialize;
use smart_leds::{RGB8, colors};

use crate::Error;

/// A colour from the arena palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ColorName {
    /// Off.
    #[default]
    Black,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Orange.
    Orange,
    /// Magenta.
    Magenta,
    /// Yellow.
    Yellow,
    /// Cyan.
    Cyan,
}

impl ColorName {
    /// Every palette colour, in table order.
    pub const ALL: [Self; 8] = [
        Self::Black,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Orange,
        Self::Magenta,
        Self::Yellow,
        Self::Cyan,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Magenta => "magenta",
            Self::Yellow => "yellow",
            Self::Cyan => "cyan",
        }
    }

    /// Full-brightness stand-in used for previews, where the dim device colours would read as black.
    #[must_use]
    pub const fn preview(self) -> RGB8 {
        match self {
            Self::Black => colors::BLACK,
            Self::Red => colors::RED,
            Self::Green => colors::LIME,
            Self::Blue => colors::BLUE,
            Self::Orange => colors::ORANGE,
            Self::Magenta => colors::MAGENTA,
            Self::Yellow => colors::YELLOW,
            Self::Cyan => colors::CYAN,
        }
    }

    const fn table_index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::InvalidColor {
                name: name.to_owned(),
            })
    }
}

impl TryFrom<String> for ColorName {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

// Lets the arena act as an embedded-graphics draw target in palette colours.
impl PixelColor for ColorName {
    type Raw = ();
}

/// One row of the [`ColorTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorEntry {
    /// Colour sent to the LEDs.
    pub device: RGB8,
    /// Glyph printed in diagnostic text mode.
    pub glyph: char,
}

/// Immutable mapping from [`ColorName`] to device colour and text glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorTable([ColorEntry; 8]);

impl ColorTable {
    /// The arena palette. Device values are deliberately dim; the panels are
    /// bright enough at a few percent duty cycle.
    pub const ARENA: Self = Self([
        ColorEntry {
            device: RGB8::new(0, 0, 0),
            glyph: '-',
        },
        ColorEntry {
            device: RGB8::new(15, 0, 0),
            glyph: 'R',
        },
        ColorEntry {
            device: RGB8::new(0, 1, 0),
            glyph: 'G',
        },
        ColorEntry {
            device: RGB8::new(0, 0, 1),
            glyph: 'B',
        },
        ColorEntry {
            device: RGB8::new(5, 2, 0),
            glyph: 'O',
        },
        ColorEntry {
            device: RGB8::new(5, 0, 7),
            glyph: 'M',
        },
        ColorEntry {
            device: RGB8::new(10, 10, 0),
            glyph: 'Y',
        },
        ColorEntry {
            device: RGB8::new(0, 10, 10),
            glyph: 'C',
        },
    ]);

    /// Build a table from entries given in [`ColorName::ALL`] order.
    #[must_use]
    pub const fn new(entries: [ColorEntry; 8]) -> Self {
        Self(entries)
    }

    /// Table entry for a colour.
    #[must_use]
    pub const fn entry(&self, color: ColorName) -> ColorEntry {
        self.0[color.table_index()]
    }

    /// Device colour for a palette colour.
    #[must_use]
    pub const fn device(&self, color: ColorName) -> RGB8 {
        self.entry(color).device
    }

    /// Text glyph for a palette colour.
    #[must_use]
    pub const fn glyph(&self, color: ColorName) -> char {
        self.entry(color).glyph
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::ARENA
    }
}
