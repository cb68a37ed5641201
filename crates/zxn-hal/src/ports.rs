//! Port and control register numbers
//!
//! Values follow the ZX Spectrum Next I/O map.

/// Next control register select port
pub const NEXTREG_SELECT: u16 = 0x243B;
/// Next control register data port
pub const NEXTREG_DATA: u16 = 0x253B;

/// Kempston joystick 1 (left)
pub const KEMPSTON_JOY_1: u16 = 0x1F;
/// Kempston joystick 2 (right)
pub const KEMPSTON_JOY_2: u16 = 0x37;

/// Kempston mouse X counter, wraps 255 -> 0 on a right movement
pub const KEMPSTON_MOUSE_X: u16 = 0xFBDF;
/// Kempston mouse Y counter, wraps 255 -> 0 on an upward movement
pub const KEMPSTON_MOUSE_Y: u16 = 0xFFDF;
/// Kempston mouse buttons (bits 2:0) and wheel (bits 7:4)
pub const KEMPSTON_MOUSE_BUTTONS: u16 = 0xFADF;

/// Low byte of every keyboard half-row port; the row is selected by A8..A15
pub const ULA_KEYBOARD: u8 = 0xFE;

/// AY register select, also Turbosound chip select
pub const AY_REG: u16 = 0xFFFD;
/// AY register data
pub const AY_DATA: u16 = 0xBFFD;

/// Peripheral 2: bits 1:0 audio chip mode
pub const NR_PERIPHERAL_2: u8 = 0x06;
/// Peripheral 3: bit 5 stereo ACB, bit 1 Turbosound enable
pub const NR_PERIPHERAL_3: u8 = 0x08;
/// Peripheral 4: bits 7:5 mono for AY 2..0
pub const NR_PERIPHERAL_4: u8 = 0x09;
/// Peripheral 5: bit 3 mouse button swap, bits 1:0 mouse DPI
pub const NR_PERIPHERAL_5: u8 = 0x0A;
/// Extended MD pad buttons (X Z Y MODE for both pads)
pub const NR_EXT_MD_PAD_BUTTONS: u8 = 0xB2;

/// Port address of keyboard half-row `row` (0..8)
pub const fn keyboard_row_port(row: u8) -> u16 {
    ((!(1u8 << row) as u16) << 8) | ULA_KEYBOARD as u16
}
