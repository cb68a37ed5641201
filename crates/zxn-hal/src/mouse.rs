//! Kempston mouse driver
//!
//! The hardware exposes two free-running 8-bit counters. The driver turns them
//! into an absolute position by integrating the signed difference between two
//! polls, so it relies on the mouse never moving more than 127 counts between
//! reads.

use crate::bus::IoBus;
use crate::ports::{KEMPSTON_MOUSE_BUTTONS, KEMPSTON_MOUSE_X, KEMPSTON_MOUSE_Y, NR_PERIPHERAL_5};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

const SENSITIVITY_MASK: u8 = 0x03;
/// Button swap bit of next-reg 0x0A
pub const BUTTON_SWAP_BIT: u8 = 0x08;

bitflags! {
    /// Pressed mouse buttons
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MouseButtons: u8 {
        const RIGHT = 0x01;
        const LEFT = 0x02;
        const MIDDLE = 0x04;
    }
}

/// Movement detection resolution (next-reg 0x0A bits 1:0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MouseSensitivity {
    Low = 0x00,
    #[default]
    Default = 0x01,
    Medium = 0x02,
    High = 0x03,
}

impl MouseSensitivity {
    /// Decode bits 1:0 of next-reg 0x0A
    pub fn from_bits(bits: u8) -> Self {
        match bits & SENSITIVITY_MASK {
            0x00 => MouseSensitivity::Low,
            0x01 => MouseSensitivity::Default,
            0x02 => MouseSensitivity::Medium,
            _ => MouseSensitivity::High,
        }
    }

    /// Register encoding
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Signed shortest path from `prev` to `curr` on an 8-bit wheel
pub fn mouse_delta(curr: u8, prev: u8) -> i8 {
    // (curr - prev) mod 256, upper half read as negative
    curr.wrapping_sub(prev) as i8
}

/// Counter samples used for the delta computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Samples {
    curr_x: u8,
    curr_y: u8,
    prev_x: u8,
    prev_y: u8,
    scratch: u8,
}

/// State of one mouse/trackball
///
/// `x` grows to the right and `y` grows upwards. The coordinates are
/// independent of the screen resolution and wrap at the i16 bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MouseState {
    pub index: u8,
    pub x: i16,
    pub y: i16,
    pub wheel: u8,
    pub buttons: MouseButtons,
    #[serde(skip)]
    samples: Samples,
}

impl MouseState {
    /// Open a mouse
    pub fn open(index: u8) -> Self {
        tracing::debug!("Opening mouse {}", index);
        Self {
            index,
            ..Self::default()
        }
    }

    /// Re-initialise an existing record
    pub fn open_in_place(&mut self, index: u8) {
        *self = Self::open(index);
    }

    /// Poll buttons, wheel and both position counters
    pub fn read<B: IoBus>(&mut self, bus: &mut B) -> crate::Result<()> {
        self.samples.scratch = !bus.port_in(KEMPSTON_MOUSE_BUTTONS);
        self.buttons = MouseButtons::from_bits_truncate(self.samples.scratch);
        self.wheel = self.samples.scratch >> 4;

        self.samples.curr_x = bus.port_in(KEMPSTON_MOUSE_X);
        self.samples.curr_y = bus.port_in(KEMPSTON_MOUSE_Y);
        self.x = self
            .x
            .wrapping_add(mouse_delta(self.samples.curr_x, self.samples.prev_x) as i16);
        self.y = self
            .y
            .wrapping_add(mouse_delta(self.samples.curr_y, self.samples.prev_y) as i16);
        self.samples.prev_x = self.samples.curr_x;
        self.samples.prev_y = self.samples.curr_y;

        tracing::trace!(
            "mouse {}: x={} y={} wheel={} btn={:#04x}",
            self.index,
            self.x,
            self.y,
            self.wheel,
            self.buttons.bits()
        );
        Ok(())
    }

    /// Move the accumulated position
    pub fn reset(&mut self, x: i16, y: i16) -> crate::Result<()> {
        self.x = x;
        self.y = y;
        Ok(())
    }

    /// Select left- or right-handed button layout
    pub fn set_button_swap<B: IoBus>(&mut self, bus: &mut B, swap: bool) -> crate::Result<()> {
        set_button_swap(bus, swap);
        Ok(())
    }

    /// Whether the buttons are swapped
    pub fn button_swap<B: IoBus>(&self, bus: &mut B) -> bool {
        button_swap(bus)
    }

    /// Set the movement resolution
    pub fn set_sensitivity<B: IoBus>(
        &mut self,
        bus: &mut B,
        sensitivity: MouseSensitivity,
    ) -> crate::Result<()> {
        set_sensitivity(bus, sensitivity);
        Ok(())
    }

    /// Raw variant of [`MouseState::set_sensitivity`]; only bits 1:0 are used
    pub fn set_sensitivity_raw<B: IoBus>(&mut self, bus: &mut B, bits: u8) -> crate::Result<()> {
        self.set_sensitivity(bus, MouseSensitivity::from_bits(bits & SENSITIVITY_MASK))
    }

    /// Current movement resolution
    pub fn sensitivity<B: IoBus>(&self, bus: &mut B) -> MouseSensitivity {
        sensitivity(bus)
    }

    /// Close the mouse
    pub fn close(&mut self) -> crate::Result<()> {
        tracing::debug!("Closing mouse {}", self.index);
        Ok(())
    }
}

/// Button swap is a machine-wide setting; it does not need an open mouse
pub fn set_button_swap<B: IoBus>(bus: &mut B, swap: bool) {
    bus.next_reg_modify(
        NR_PERIPHERAL_5,
        BUTTON_SWAP_BIT,
        if swap { BUTTON_SWAP_BIT } else { 0 },
    );
    tracing::debug!("Mouse button swap: {}", swap);
}

/// Read the button swap bit
pub fn button_swap<B: IoBus>(bus: &mut B) -> bool {
    bus.next_reg_read(NR_PERIPHERAL_5) & BUTTON_SWAP_BIT != 0
}

/// Sensitivity is a machine-wide setting; it does not need an open mouse
pub fn set_sensitivity<B: IoBus>(bus: &mut B, sensitivity: MouseSensitivity) {
    bus.next_reg_modify(NR_PERIPHERAL_5, SENSITIVITY_MASK, sensitivity.bits());
    tracing::debug!("Mouse sensitivity set to {:?}", sensitivity);
}

/// Read the movement resolution
pub fn sensitivity<B: IoBus>(bus: &mut B) -> MouseSensitivity {
    MouseSensitivity::from_bits(bus.next_reg_read(NR_PERIPHERAL_5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;

    fn shortest_path(curr: u8, prev: u8) -> i32 {
        let d = (curr as i32 - prev as i32).rem_euclid(256);
        if d >= 128 { d - 256 } else { d }
    }

    #[test]
    fn test_delta_examples() {
        assert_eq!(mouse_delta(10, 250), 16);
        assert_eq!(mouse_delta(250, 10), -16);
        assert_eq!(mouse_delta(0, 0), 0);
        assert_eq!(mouse_delta(127, 0), 127);
        assert_eq!(mouse_delta(128, 0), -128);
    }

    #[test]
    fn test_delta_all_pairs() {
        for curr in 0..=255u8 {
            for prev in 0..=255u8 {
                assert_eq!(
                    mouse_delta(curr, prev) as i32,
                    shortest_path(curr, prev),
                    "curr={curr} prev={prev}"
                );
            }
        }
    }

    #[test]
    fn test_read_integrates_wrapping_counters() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::open(0);

        bus.set_mouse_counters(250, 5);
        mouse.read(&mut bus).unwrap();
        assert_eq!((mouse.x, mouse.y), (-6, 5));

        // crosses 255 -> 0 going right
        bus.set_mouse_counters(10, 3);
        mouse.read(&mut bus).unwrap();
        assert_eq!((mouse.x, mouse.y), (10, 3));

        // same counters, no movement
        mouse.read(&mut bus).unwrap();
        assert_eq!((mouse.x, mouse.y), (10, 3));
    }

    #[test]
    fn test_read_buttons_and_wheel() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::open(0);

        // active low: left pressed, wheel at 5
        bus.set_port(KEMPSTON_MOUSE_BUTTONS, !(0x50 | 0x02));
        mouse.read(&mut bus).unwrap();

        assert_eq!(mouse.buttons, MouseButtons::LEFT);
        assert_eq!(mouse.wheel, 5);
        assert!(mouse.wheel <= 0x0F);
    }

    #[test]
    fn test_reset_position() {
        let mut mouse = MouseState::open(0);
        mouse.reset(160, -96).unwrap();
        assert_eq!((mouse.x, mouse.y), (160, -96));
    }

    #[test]
    fn test_position_wraps_at_i16_bounds() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::open(0);
        mouse.reset(i16::MAX, 0).unwrap();

        bus.set_mouse_counters(1, 0);
        mouse.read(&mut bus).unwrap();
        assert_eq!(mouse.x, i16::MIN);
    }

    #[test]
    fn test_sensitivity_preserves_button_swap() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::open(0);
        bus.set_next_reg(NR_PERIPHERAL_5, 0xF8);

        mouse.set_sensitivity(&mut bus, MouseSensitivity::High).unwrap();
        assert_eq!(bus.next_reg(NR_PERIPHERAL_5), 0xFB);
        assert_eq!(mouse.sensitivity(&mut bus), MouseSensitivity::High);
        assert!(mouse.button_swap(&mut bus));

        mouse.set_sensitivity(&mut bus, MouseSensitivity::Low).unwrap();
        assert_eq!(bus.next_reg(NR_PERIPHERAL_5), 0xF8);
    }

    #[test]
    fn test_sensitivity_raw_masks_high_bits() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::open(0);

        assert!(mouse.set_sensitivity_raw(&mut bus, 0x02).is_ok());
        assert_eq!(mouse.sensitivity(&mut bus), MouseSensitivity::Medium);

        assert!(mouse.set_sensitivity_raw(&mut bus, 0x05).is_ok());
        assert_eq!(bus.next_reg(NR_PERIPHERAL_5), 0x01);
        assert_eq!(mouse.sensitivity(&mut bus), MouseSensitivity::Default);
    }

    #[test]
    fn test_button_swap_toggle() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::open(0);
        bus.set_next_reg(NR_PERIPHERAL_5, 0x01);

        mouse.set_button_swap(&mut bus, true).unwrap();
        assert!(mouse.button_swap(&mut bus));
        assert_eq!(bus.next_reg(NR_PERIPHERAL_5), 0x09);

        mouse.set_button_swap(&mut bus, false).unwrap();
        assert!(!mouse.button_swap(&mut bus));
        assert_eq!(sensitivity(&mut bus), MouseSensitivity::Default);
    }
}
