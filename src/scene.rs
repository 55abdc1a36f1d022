//! Behavioural-experiment animations for [`crate::animate::run`].
//!
//! - [`DotBar`]: a vertical bar and a single dot, each hidden, stationary or moving.
//! - [`OpticFlow`]: a vertical stripe pattern that rotates around the arena or
//!   streams outwards/inwards from the front.

use embedded_graphics::{
    Drawable,
    geometry::Point,
    primitives::{Line, Primitive, PrimitiveStyle},
};
use embedded_hal::digital::StatefulOutputPin;

use crate::Result;
use crate::animate::Scene;
use crate::arena::Arena;
use crate::color::ColorName;
use crate::topology::Mode;
use crate::transport::StripBus;

/// Columns in one stripe period (half foreground, half background).
pub const STRIPE_PERIOD: i32 = 8;

/// What one element of [`DotBar`] does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Motion {
    /// Not drawn.
    Hidden,
    /// Drawn in place every tick.
    Stationary,
    /// Moves one column per tick.
    #[default]
    Moving,
}

/// A bar and a dot on a solid background.
///
/// A moving bar travels towards higher `x`, a moving dot towards lower `x`;
/// each erases its previous position with the background colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotBar {
    /// What the dot does.
    pub dot: Motion,
    /// What the bar does.
    pub bar: Motion,
    /// Background colour.
    pub background: ColorName,
    /// Bar colour.
    pub bar_color: ColorName,
    /// Dot colour.
    pub dot_color: ColorName,
    /// Starting column of the dot.
    pub dot_x: i32,
    /// Row of the dot.
    pub dot_y: i32,
    /// Starting column of the bar, or the middle of the arena if `None`.
    pub bar_x: Option<i32>,
}

impl DotBar {
    /// Moving dot, stationary bar, in the colours that read well for `mode`.
    ///
    /// Text output uses a blue bar on black; the LEDs use a black bar on blue.
    #[must_use]
    pub const fn for_mode(mode: Mode) -> Self {
        let (background, bar_color) = match mode {
            Mode::Diagnostic => (ColorName::Black, ColorName::Blue),
            Mode::SingleChain | Mode::Independent | Mode::Duplicate => (ColorName::Blue, ColorName::Black),
        };
        Self {
            dot: Motion::Moving,
            bar: Motion::Stationary,
            background,
            bar_color,
            dot_color: ColorName::Green,
            dot_x: 0,
            dot_y: 6,
            bar_x: None,
        }
    }

    /// Replace both motions.
    #[must_use]
    pub const fn with_motion(mut self, dot: Motion, bar: Motion) -> Self {
        self.dot = dot;
        self.bar = bar;
        self
    }
}

impl Scene for DotBar {
    fn setup<B: StripBus, P: StatefulOutputPin>(&mut self, arena: &mut Arena<B, P>) -> Result<()> {
        arena.clear(self.background);
        Ok(())
    }

    fn draw<B: StripBus, P: StatefulOutputPin>(&mut self, tick: u64, arena: &mut Arena<B, P>) -> Result<()> {
        let width = arena.width();
        // Positions wrap, so the step only matters modulo the width.
        let step = i32::try_from(tick % width as u64).unwrap_or_default();
        let bar_x = self
            .bar_x
            .unwrap_or_else(|| i32::try_from(width / 2).unwrap_or_default());

        match self.bar {
            Motion::Hidden => {}
            Motion::Stationary => vertical_line(arena, bar_x, self.bar_color),
            Motion::Moving => {
                vertical_line(arena, bar_x + step - 1, self.background);
                vertical_line(arena, bar_x + step, self.bar_color);
            }
        }
        match self.dot {
            Motion::Hidden => {}
            Motion::Stationary => arena.set_pixel(self.dot_x, self.dot_y, self.dot_color),
            Motion::Moving => {
                arena.set_pixel(self.dot_x - step + 1, self.dot_y, self.background);
                arena.set_pixel(self.dot_x - step, self.dot_y, self.dot_color);
            }
        }
        Ok(())
    }
}

fn vertical_line<B: StripBus, P: StatefulOutputPin>(arena: &mut Arena<B, P>, x: i32, color: ColorName) {
    let bottom = i32::try_from(arena.height()).unwrap_or(i32::MAX) - 1;
    let Ok(()) = Line::new(Point::new(x, 0), Point::new(x, bottom))
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(arena);
}

/// Which way the stripes of [`OpticFlow`] move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Every panel's stripes move towards higher `x`.
    #[default]
    RotateRight,
    /// Every panel's stripes move towards lower `x`.
    RotateLeft,
    /// The two halves of the arena move in opposite directions, away from the front.
    Forward,
    /// The two halves of the arena move in opposite directions, towards the front.
    Backward,
}

/// Vertical stripes, four columns on and four off, shifted one column per tick.
///
/// Rotation draws the same pattern on every panel. Flow gives the first half
/// of the panels and the second half opposite offsets. In duplicate mode the
/// halves are sent one after the other with the other half's panels disabled;
/// in every other mode both halves are drawn into one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpticFlow {
    /// Direction of motion.
    pub flow: Flow,
    /// Stripe colour.
    pub foreground: ColorName,
    /// Gap colour.
    pub background: ColorName,
}

impl OpticFlow {
    /// Green stripes on black.
    #[must_use]
    pub const fn new(flow: Flow) -> Self {
        Self {
            flow,
            foreground: ColorName::Green,
            background: ColorName::Black,
        }
    }

    /// Use `foreground` for the stripes.
    #[must_use]
    pub const fn with_foreground(mut self, foreground: ColorName) -> Self {
        self.foreground = foreground;
        self
    }

    fn stripes<B: StripBus, P: StatefulOutputPin>(
        &self,
        arena: &mut Arena<B, P>,
        columns: core::ops::Range<i32>,
        offset: i32,
    ) {
        for x in columns {
            let color = if (x - offset).rem_euclid(STRIPE_PERIOD) < STRIPE_PERIOD / 2 {
                self.foreground
            } else {
                self.background
            };
            vertical_line(arena, x, color);
        }
    }

    fn flow_in_halves<B: StripBus, P: StatefulOutputPin>(
        &self,
        arena: &mut Arena<B, P>,
        first: i32,
        second: i32,
    ) -> Result<()> {
        let width = i32::try_from(arena.width()).unwrap_or(i32::MAX);
        let panels = arena.topology().segment_count();
        let half = panels / 2;
        for (offset, active) in [(first, 0..half), (second, half..panels)] {
            self.stripes(arena, 0..width, offset);
            for panel in 0..panels {
                arena.toggle_panel(panel, active.contains(&panel))?;
            }
            arena.render()?;
        }
        Ok(())
    }
}

impl Scene for OpticFlow {
    fn setup<B: StripBus, P: StatefulOutputPin>(&mut self, arena: &mut Arena<B, P>) -> Result<()> {
        arena.clear(self.background);
        Ok(())
    }

    fn draw<B: StripBus, P: StatefulOutputPin>(&mut self, tick: u64, arena: &mut Arena<B, P>) -> Result<()> {
        let phase = i32::try_from(tick.saturating_sub(1) % u64::from(STRIPE_PERIOD.unsigned_abs())).unwrap_or_default();
        let width = i32::try_from(arena.width()).unwrap_or(i32::MAX);
        let half = width / 2;
        let (first, second) = match self.flow {
            Flow::RotateRight => {
                self.stripes(arena, 0..width, phase);
                return Ok(());
            }
            Flow::RotateLeft => {
                self.stripes(arena, 0..width, -phase);
                return Ok(());
            }
            Flow::Forward => (phase, 4 - phase),
            Flow::Backward => (-phase, phase + 4),
        };
        if arena.mode() == Mode::Duplicate {
            return self.flow_in_halves(arena, first, second);
        }
        self.stripes(arena, 0..half, first);
        self.stripes(arena, half..width, second);
        Ok(())
    }
}
