//! How the logical arena grid decomposes into independently addressable output segments.
//!
//! | Mode | segments | columns per segment |
//! |---|---|---|
//! | [`Mode::SingleChain`] | 1 | all |
//! | [`Mode::Independent`] | N | `panel_width` each |
//! | [`Mode::Duplicate`] | N | all (each segment mirrors the grid) |
//! | [`Mode::Diagnostic`] | 0 | n/a |
//!
//! A [`Topology`] is only ever built whole from a [`Mode`] and an
//! [`ArenaConfig`], so width, segment count and column ranges always agree.

use core::{fmt, ops::Range, str::FromStr};

use crate::config::ArenaConfig;
use crate::mapping::Grid;
use crate::{Error, Result};

/// Output topology selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Glyphs to a text stream; no transport.
    #[default]
    Diagnostic,
    /// Every panel on one serial chain.
    SingleChain,
    /// Each panel on its own chain, addressed separately.
    Independent,
    /// Each panel on its own chain, all fed the same one-panel-wide image.
    Duplicate,
}

impl Mode {
    /// Every mode.
    pub const ALL: [Self; 4] = [
        Self::Diagnostic,
        Self::SingleChain,
        Self::Independent,
        Self::Duplicate,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diagnostic => "text",
            Self::SingleChain => "serial",
            Self::Independent => "parallel",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    /// Accepts the canonical names plus `diagnostic`, `single` and `independent`, in any case.
    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" | "diagnostic" => Ok(Self::Diagnostic),
            "serial" | "single" => Ok(Self::SingleChain),
            "parallel" | "independent" => Ok(Self::Independent),
            "duplicate" => Ok(Self::Duplicate),
            _ => Err(Error::InvalidMode {
                name: name.to_owned(),
            }),
        }
    }
}

/// A mode together with the dimensions it implies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// See [`Mode::Diagnostic`].
    Diagnostic {
        /// Rows.
        height: usize,
        /// Columns.
        width: usize,
    },
    /// See [`Mode::SingleChain`].
    SingleChain {
        /// Rows.
        height: usize,
        /// Columns, all on the one chain.
        width: usize,
    },
    /// See [`Mode::Independent`].
    Independent {
        /// Rows.
        height: usize,
        /// Columns per panel.
        panel_width: usize,
        /// Number of panels.
        segment_count: usize,
    },
    /// See [`Mode::Duplicate`].
    Duplicate {
        /// Rows.
        height: usize,
        /// Columns per panel, which is also the arena width.
        panel_width: usize,
        /// Number of mirrored panels.
        segment_count: usize,
    },
}

impl Topology {
    /// Derive every dimension for `mode` from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails [`ArenaConfig::validate`].
    pub fn new(mode: Mode, config: &ArenaConfig) -> Result<Self> {
        config.validate()?;
        let ArenaConfig {
            height,
            panel_width,
            segment_count,
            ..
        } = *config;
        let full_width = panel_width
            .checked_mul(segment_count)
            .ok_or_else(|| Error::InvalidConfig {
                reason: "panel_width * segment_count overflows".to_owned(),
            })?;
        Ok(match mode {
            Mode::Diagnostic => Self::Diagnostic {
                height,
                width: full_width,
            },
            Mode::SingleChain => Self::SingleChain {
                height,
                width: full_width,
            },
            Mode::Independent => Self::Independent {
                height,
                panel_width,
                segment_count,
            },
            Mode::Duplicate => Self::Duplicate {
                height,
                panel_width,
                segment_count,
            },
        })
    }

    /// The mode this topology was built for.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Diagnostic { .. } => Mode::Diagnostic,
            Self::SingleChain { .. } => Mode::SingleChain,
            Self::Independent { .. } => Mode::Independent,
            Self::Duplicate { .. } => Mode::Duplicate,
        }
    }

    /// Logical grid height.
    #[must_use]
    pub const fn height(&self) -> usize {
        match *self {
            Self::Diagnostic { height, .. }
            | Self::SingleChain { height, .. }
            | Self::Independent { height, .. }
            | Self::Duplicate { height, .. } => height,
        }
    }

    /// Logical grid width.
    #[must_use]
    pub const fn width(&self) -> usize {
        match *self {
            Self::Diagnostic { width, .. } | Self::SingleChain { width, .. } => width,
            Self::Independent {
                panel_width,
                segment_count,
                ..
            } => panel_width * segment_count,
            Self::Duplicate { panel_width, .. } => panel_width,
        }
    }

    /// Logical grid.
    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.width(), self.height())
    }

    /// Number of physical output segments.
    #[must_use]
    pub const fn segment_count(&self) -> usize {
        match *self {
            Self::Diagnostic { .. } => 0,
            Self::SingleChain { .. } => 1,
            Self::Independent { segment_count, .. } | Self::Duplicate { segment_count, .. } => {
                segment_count
            }
        }
    }

    /// Whether every segment shows the same columns.
    #[must_use]
    pub const fn is_mirrored(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Logical columns owned by `segment`.
    #[must_use]
    pub const fn segment_columns(&self, segment: usize) -> Range<usize> {
        match *self {
            Self::Independent { panel_width, .. } => {
                let start = segment * panel_width;
                start..start + panel_width
            }
            _ => 0..self.width(),
        }
    }

    /// Offset subtracted from a logical column to get a segment-local column.
    #[must_use]
    pub const fn column_offset(&self, segment: usize) -> usize {
        self.segment_columns(segment).start
    }

    /// LEDs on each segment's chain.
    #[must_use]
    pub const fn pixels_per_segment(&self) -> usize {
        match *self {
            Self::Diagnostic { .. } => 0,
            Self::SingleChain { height, width } => height * width,
            Self::Independent {
                height,
                panel_width,
                ..
            }
            | Self::Duplicate {
                height,
                panel_width,
                ..
            } => height * panel_width,
        }
    }

    /// Which segments an in-range column belongs to.
    #[must_use]
    pub const fn owner(&self, x: usize) -> Owner {
        match *self {
            Self::Diagnostic { .. } => Owner::Nobody,
            Self::SingleChain { .. } => Owner::Segment(0),
            Self::Independent { panel_width, .. } => Owner::Segment(x / panel_width),
            Self::Duplicate { .. } => Owner::Every,
        }
    }

    /// Segment and segment-local column for a logical column.
    ///
    /// In duplicate mode the first segment is reported; every segment shares the column.
    #[must_use]
    pub const fn locate(&self, x: usize) -> Option<(usize, usize)> {
        match self.owner(x) {
            Owner::Nobody => None,
            Owner::Every => Some((0, x)),
            Owner::Segment(segment) => Some((segment, x - self.column_offset(segment))),
        }
    }
}

/// Segments that own a logical column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// No physical segment (diagnostic mode).
    Nobody,
    /// Exactly one segment.
    Segment(usize),
    /// All segments (duplicate mode).
    Every,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_parse() {
        assert_eq!("PARALLEL".parse::<Mode>(), Ok(Mode::Independent));
        assert_eq!("single".parse::<Mode>(), Ok(Mode::SingleChain));
        assert_eq!("text".parse::<Mode>(), Ok(Mode::Diagnostic));
        assert!(matches!(
            "sideways".parse::<Mode>(),
            Err(Error::InvalidMode { .. })
        ));
    }

    #[test]
    fn every_mode_keeps_length_invariant() {
        let config = ArenaConfig::default();
        for mode in Mode::ALL {
            let topology = Topology::new(mode, &config).expect("default config is valid");
            assert_eq!(topology.mode(), mode);
            assert_eq!(topology.grid().len(), topology.height() * topology.width());
            let covered: usize = (0..topology.segment_count())
                .map(|segment| topology.segment_columns(segment).len() * topology.height())
                .sum();
            if mode == Mode::Independent || mode == Mode::SingleChain {
                assert_eq!(covered, topology.grid().len());
            }
        }
    }
}
