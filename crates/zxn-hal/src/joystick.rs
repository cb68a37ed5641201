//! Joystick / gamepad driver
//!
//! Reads the two Kempston ports. Three-button MegaDrive pads report their
//! extra buttons (X, Y, Z, MODE) through next-reg 0xB2, one nibble per pad.

use crate::bus::{DrvError, IoBus};
use crate::ports::{KEMPSTON_JOY_1, KEMPSTON_JOY_2, NR_EXT_MD_PAD_BUTTONS};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const DIR_RIGHT: u8 = 0x01;
pub const DIR_LEFT: u8 = 0x02;
pub const DIR_DOWN: u8 = 0x04;
pub const DIR_UP: u8 = 0x08;

pub const BTN_B: u8 = 0x01;
pub const BTN_C: u8 = 0x02;
pub const BTN_A: u8 = 0x04;
pub const BTN_START: u8 = 0x08;
pub const BTN_MODE: u8 = 0x10;
pub const BTN_Y: u8 = 0x20;
pub const BTN_Z: u8 = 0x40;
pub const BTN_X: u8 = 0x80;

bitflags! {
    /// Pushed directions
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Directions: u8 {
        const RIGHT = DIR_RIGHT;
        const LEFT = DIR_LEFT;
        const DOWN = DIR_DOWN;
        const UP = DIR_UP;
    }
}

bitflags! {
    /// Pressed buttons
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Buttons: u8 {
        const B = BTN_B;
        const C = BTN_C;
        const A = BTN_A;
        const START = BTN_START;
        const MODE = BTN_MODE;
        const Y = BTN_Y;
        const Z = BTN_Z;
        const X = BTN_X;
    }
}

/// State of one joystick/gamepad
///
/// Index 0 is the left port, index 1 the right port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoystickState {
    pub index: u8,
    pub dir: Directions,
    pub buttons: Buttons,
    #[serde(skip)]
    scratch: u8,
}

impl JoystickState {
    /// Open a joystick. The index is checked on the first read.
    pub fn open(index: u8) -> Self {
        tracing::debug!("Opening joystick {}", index);
        Self {
            index,
            ..Self::default()
        }
    }

    /// Re-initialise an existing record
    pub fn open_in_place(&mut self, index: u8) {
        *self = Self::open(index);
    }

    /// Poll the Kempston port and the MD pad extension register
    pub fn read<B: IoBus>(&mut self, bus: &mut B) -> crate::Result<()> {
        //   Kempston: BIT7..0 = START A C B UP DN LE RI
        //   NR 0xB2:  BIT7..4 = X Z Y MODE (right), BIT3..0 = X Z Y MODE (left)
        let (port, extended) = match self.index {
            0 => (KEMPSTON_JOY_1, (bus.next_reg_read(NR_EXT_MD_PAD_BUTTONS) & 0x0F) << 4),
            1 => (KEMPSTON_JOY_2, bus.next_reg_read(NR_EXT_MD_PAD_BUTTONS) & 0xF0),
            other => {
                tracing::warn!("Joystick index {} is not connected", other);
                return Err(DrvError::out_of_range("joystick index", other));
            }
        };

        self.scratch = bus.port_in(port);
        self.dir = Directions::from_bits_truncate(self.scratch & 0x0F);
        self.buttons = Buttons::from_bits_retain(extended | (self.scratch >> 4));
        tracing::trace!(
            "joystick {}: dir={:#04x} btn={:#04x}",
            self.index,
            self.dir.bits(),
            self.buttons.bits()
        );
        Ok(())
    }

    /// Close the joystick
    pub fn close(&mut self) -> crate::Result<()> {
        tracing::debug!("Closing joystick {}", self.index);
        Ok(())
    }

    /// Check if a direction is pushed
    pub fn is_pushed(&self, dir: Directions) -> bool {
        self.dir.contains(dir)
    }

    /// Check if a button is pressed
    pub fn is_pressed(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }
}
