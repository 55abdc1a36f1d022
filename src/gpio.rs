//! Panel select lines: the serial/parallel toggle and one enable line per panel.
//!
//! Pins are `embedded-hal` output pins that the caller has already configured
//! as outputs. [`PanelPins`] owns them for the life of the arena and drives
//! every line low when released.

use embedded_hal::digital::{Error as _, PinState, StatefulOutputPin};
use log::debug;

use crate::error::PinRole;
use crate::topology::Mode;
use crate::{Error, Result};

/// The toggle line plus the panel enable lines, in panel order.
pub struct PanelPins<P> {
    toggle: P,
    panels: Vec<P>,
}

impl<P: StatefulOutputPin> PanelPins<P> {
    /// Take ownership of the pins.
    #[must_use]
    pub fn new(toggle: P, panels: impl IntoIterator<Item = P>) -> Self {
        Self {
            toggle,
            panels: panels.into_iter().collect(),
        }
    }

    /// Number of panel enable lines.
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Put the lines into the resting state for `mode`.
    ///
    /// Everything starts low. Single-chain raises the toggle to select the
    /// serial hardware path; single-chain and duplicate keep every panel
    /// enabled. Independent mode raises panels only while transmitting.
    /// Diagnostic mode leaves the lines alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pin`] if a line cannot be driven.
    pub fn apply(&mut self, mode: Mode) -> Result<()> {
        if mode == Mode::Diagnostic {
            return Ok(());
        }
        debug!("PanelPins::apply: {mode}");
        self.release()?;
        if mode == Mode::SingleChain {
            drive(&mut self.toggle, PinRole::Toggle, PinState::High)?;
        }
        if matches!(mode, Mode::SingleChain | Mode::Duplicate) {
            for panel in 0..self.panels.len() {
                self.set(panel, true)?;
            }
        }
        Ok(())
    }

    /// Drive one panel's enable line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchPanel`] for an unknown panel, or [`Error::Pin`] if the line cannot be driven.
    pub fn set(&mut self, panel: usize, on: bool) -> Result<()> {
        let segment_count = self.panels.len();
        let pin = self.panels.get_mut(panel).ok_or(Error::NoSuchPanel {
            panel,
            segment_count,
        })?;
        drive(pin, PinRole::Panel(panel), PinState::from(on))
    }

    /// Read back one panel's enable line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchPanel`] for an unknown panel, or [`Error::Pin`] if the line cannot be read.
    pub fn is_enabled(&mut self, panel: usize) -> Result<bool> {
        let segment_count = self.panels.len();
        let pin = self.panels.get_mut(panel).ok_or(Error::NoSuchPanel {
            panel,
            segment_count,
        })?;
        pin.is_set_high().map_err(|error| Error::Pin {
            pin: PinRole::Panel(panel),
            kind: error.kind(),
        })
    }

    /// Read back the serial/parallel toggle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pin`] if the line cannot be read.
    pub fn is_serial(&mut self) -> Result<bool> {
        self.toggle.is_set_high().map_err(|error| Error::Pin {
            pin: PinRole::Toggle,
            kind: error.kind(),
        })
    }

    /// Drive every line low. Keeps going past failures and reports the first one.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Pin`] encountered.
    pub fn release(&mut self) -> Result<()> {
        let mut first_error = drive(&mut self.toggle, PinRole::Toggle, PinState::Low).err();
        for (panel, pin) in self.panels.iter_mut().enumerate() {
            if let Err(error) = drive(pin, PinRole::Panel(panel), PinState::Low) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Give the pins back.
    #[must_use]
    pub fn into_inner(self) -> (P, Vec<P>) {
        (self.toggle, self.panels)
    }
}

fn drive<P: StatefulOutputPin>(pin: &mut P, role: PinRole, state: PinState) -> Result<()> {
    pin.set_state(state).map_err(|error| Error::Pin {
        pin: role,
        kind: error.kind(),
    })
}
