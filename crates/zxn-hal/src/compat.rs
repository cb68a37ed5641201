//! Status-code interface
//!
//! Flat functions over the driver records for callers that work with status
//! bytes instead of `Result`. Every function takes the record as an `Option`;
//! `None` stands for a missing record and is rejected before any bus access.
//!
//! Setters and lifecycle calls return [`EOK`](crate::EOK) or an errno. Getters return the
//! value itself, or [`STATUS_INVALID_HANDLE`] when no record was given.

use crate::IoBus;
use crate::bus::{DrvError, status};
use crate::joystick::JoystickState;
use crate::keyboard::KeyboardState;
use crate::mouse::{BUTTON_SWAP_BIT, MouseState};
use crate::period;
use crate::psg::{Channel, PsgState};
use crate::sound::{self, PsgCore, PsgMode, StereoMode};

/// Getter result for a missing record
pub const STATUS_INVALID_HANDLE: u8 = 0xFF;

fn handle<T>(state: Option<T>) -> crate::Result<T> {
    state.ok_or(DrvError::NullHandle)
}

// Joystick

pub fn joystick_open(state: Option<&mut JoystickState>, index: u8) -> u8 {
    status(handle(state).map(|s| s.open_in_place(index)))
}

pub fn joystick_read<B: IoBus>(bus: &mut B, state: Option<&mut JoystickState>) -> u8 {
    status(handle(state).and_then(|s| s.read(bus)))
}

pub fn joystick_close(state: Option<&mut JoystickState>) -> u8 {
    status(handle(state).and_then(|s| s.close()))
}

// Mouse

pub fn mouse_open(state: Option<&mut MouseState>, index: u8) -> u8 {
    status(handle(state).map(|s| s.open_in_place(index)))
}

pub fn mouse_read<B: IoBus>(bus: &mut B, state: Option<&mut MouseState>) -> u8 {
    status(handle(state).and_then(|s| s.read(bus)))
}

pub fn mouse_reset(state: Option<&mut MouseState>, x: i16, y: i16) -> u8 {
    status(handle(state).and_then(|s| s.reset(x, y)))
}

/// Any non-zero `swap` selects the swapped layout
pub fn mouse_set_buttonswap<B: IoBus>(bus: &mut B, state: Option<&mut MouseState>, swap: u8) -> u8 {
    status(handle(state).and_then(|s| s.set_button_swap(bus, swap != 0)))
}

/// The swap bit of next-reg 0x0A as read: `0x08` when swapped, `0` otherwise
pub fn mouse_get_buttonswap<B: IoBus>(bus: &mut B, state: Option<&mut MouseState>) -> u8 {
    match state {
        Some(s) if s.button_swap(bus) => BUTTON_SWAP_BIT,
        Some(_) => 0,
        None => STATUS_INVALID_HANDLE,
    }
}

/// Only bits 1:0 of `sensitivity` are used; higher bits are ignored
pub fn mouse_set_sensitivity<B: IoBus>(
    bus: &mut B,
    state: Option<&mut MouseState>,
    sensitivity: u8,
) -> u8 {
    status(handle(state).and_then(|s| s.set_sensitivity_raw(bus, sensitivity)))
}

pub fn mouse_get_sensitivity<B: IoBus>(bus: &mut B, state: Option<&mut MouseState>) -> u8 {
    match state {
        Some(s) => s.sensitivity(bus).bits(),
        None => STATUS_INVALID_HANDLE,
    }
}

pub fn mouse_close(state: Option<&mut MouseState>) -> u8 {
    status(handle(state).and_then(|s| s.close()))
}

// Keyboard

/// Clears the matrix snapshot
pub fn kbd_open(state: Option<&mut KeyboardState>, index: u8) -> u8 {
    status(handle(state).map(|s| s.open_in_place(index)))
}

pub fn kbd_read<B: IoBus>(bus: &mut B, state: Option<&mut KeyboardState>) -> u8 {
    status(handle(state).and_then(|s| s.read(bus)))
}

/// `1` when the key of `scan_code` is down, `0` when it is up
///
/// Unknown rows and a missing record give [`STATUS_INVALID_HANDLE`].
pub fn kbd_pressed(state: Option<&KeyboardState>, scan_code: u16) -> u8 {
    match state.map(|s| s.pressed_raw(scan_code)) {
        Some(Ok(pressed)) => pressed as u8,
        _ => STATUS_INVALID_HANDLE,
    }
}

pub fn kbd_close(state: Option<&mut KeyboardState>) -> u8 {
    status(handle(state).and_then(|s| s.close()))
}

// PSG, machine-wide

pub fn psg_set_core<B: IoBus>(bus: &mut B, core: u8) -> u8 {
    status(PsgCore::from_raw(core).map(|c| sound::set_core(bus, c)))
}

pub fn psg_get_core<B: IoBus>(bus: &mut B) -> u8 {
    sound::core(bus).raw()
}

pub fn psg_set_mode<B: IoBus>(bus: &mut B, mode: u8) -> u8 {
    status(PsgMode::from_raw(mode).map(|m| sound::set_mode(bus, m)))
}

pub fn psg_get_mode<B: IoBus>(bus: &mut B) -> u8 {
    sound::mode(bus).raw()
}

pub fn psg_set_stereo_mode<B: IoBus>(bus: &mut B, mode: u8) -> u8 {
    status(StereoMode::from_raw(mode).map(|m| sound::set_stereo_mode(bus, m)))
}

// PSG, per chip

/// `ERANGE` for an index above 2; the record is left untouched
pub fn psg_open(state: Option<&mut PsgState>, index: u8) -> u8 {
    status(handle(state).and_then(|s| s.open_in_place(index)))
}

pub fn psg_set_mono_mode<B: IoBus>(bus: &mut B, state: Option<&mut PsgState>, mono: u8) -> u8 {
    status(handle(state).and_then(|s| s.set_mono_mode(bus, mono != 0)))
}

pub fn psg_calc_tone_period(freq: u16) -> u16 {
    period::calc_tone_period(freq)
}

pub fn psg_set_tone_period<B: IoBus>(
    bus: &mut B,
    state: Option<&mut PsgState>,
    channel: u8,
    period: u16,
) -> u8 {
    status(handle(state).and_then(|s| {
        let channel = Channel::from_index(channel)?;
        s.set_tone_period(bus, channel, period)
    }))
}

pub fn psg_set_amplitude<B: IoBus>(
    bus: &mut B,
    state: Option<&mut PsgState>,
    channel: u8,
    amplitude: u8,
) -> u8 {
    status(handle(state).and_then(|s| {
        let channel = Channel::from_index(channel)?;
        s.set_amplitude(bus, channel, amplitude)
    }))
}

pub fn psg_calc_noise_period(freq: u16) -> u8 {
    period::calc_noise_period(freq)
}

pub fn psg_set_noise_period<B: IoBus>(bus: &mut B, state: Option<&mut PsgState>, period: u8) -> u8 {
    status(handle(state).and_then(|s| s.set_noise_period(bus, period)))
}

/// Enabled outputs as `0b00NNNTTT`
pub fn psg_get_mixer<B: IoBus>(bus: &mut B, state: Option<&mut PsgState>) -> u8 {
    match state {
        Some(s) => s.mixer(bus).bits(),
        None => STATUS_INVALID_HANDLE,
    }
}

pub fn psg_set_mixer<B: IoBus>(bus: &mut B, state: Option<&mut PsgState>, mixer: u8) -> u8 {
    status(handle(state).and_then(|s| s.set_mixer_raw(bus, mixer)))
}

pub fn psg_calc_envelope_period(freq: u16) -> u16 {
    period::calc_envelope_period(freq)
}

pub fn psg_calc_envelope_period_ms(time_ms: u16) -> u16 {
    period::calc_envelope_period_ms(time_ms)
}

pub fn psg_set_envelope_period<B: IoBus>(
    bus: &mut B,
    state: Option<&mut PsgState>,
    period: u16,
) -> u8 {
    status(handle(state).and_then(|s| s.set_envelope_period(bus, period)))
}

pub fn psg_get_envelope_shape<B: IoBus>(bus: &mut B, state: Option<&mut PsgState>) -> u8 {
    match state {
        Some(s) => s.envelope_shape(bus),
        None => STATUS_INVALID_HANDLE,
    }
}

pub fn psg_set_envelope_shape<B: IoBus>(
    bus: &mut B,
    state: Option<&mut PsgState>,
    shape: u8,
) -> u8 {
    status(handle(state).and_then(|s| s.set_envelope_shape(bus, shape)))
}

pub fn psg_close(state: Option<&mut PsgState>) -> u8 {
    status(handle(state).and_then(|s| s.close()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EINVAL, EOK, ERANGE};
    use crate::keyboard::ScanCode;
    use crate::mock::MockBus;
    use crate::ports::{KEMPSTON_JOY_1, NR_PERIPHERAL_5};

    #[test]
    fn test_missing_record_has_no_side_effects() {
        let mut bus = MockBus::new();

        assert_eq!(joystick_open(None, 0), EINVAL);
        assert_eq!(joystick_read(&mut bus, None), EINVAL);
        assert_eq!(joystick_close(None), EINVAL);
        assert_eq!(mouse_open(None, 0), EINVAL);
        assert_eq!(mouse_read(&mut bus, None), EINVAL);
        assert_eq!(mouse_reset(None, 1, 1), EINVAL);
        assert_eq!(mouse_set_buttonswap(&mut bus, None, 1), EINVAL);
        assert_eq!(mouse_get_buttonswap(&mut bus, None), STATUS_INVALID_HANDLE);
        assert_eq!(mouse_set_sensitivity(&mut bus, None, 2), EINVAL);
        assert_eq!(mouse_get_sensitivity(&mut bus, None), STATUS_INVALID_HANDLE);
        assert_eq!(mouse_close(None), EINVAL);
        assert_eq!(kbd_open(None, 0), EINVAL);
        assert_eq!(kbd_read(&mut bus, None), EINVAL);
        assert_eq!(kbd_pressed(None, ScanCode::Space.code()), STATUS_INVALID_HANDLE);
        assert_eq!(kbd_close(None), EINVAL);
        assert_eq!(psg_open(None, 0), EINVAL);
        assert_eq!(psg_set_mono_mode(&mut bus, None, 1), EINVAL);
        assert_eq!(psg_set_tone_period(&mut bus, None, 0, 100), EINVAL);
        assert_eq!(psg_set_amplitude(&mut bus, None, 0, 15), EINVAL);
        assert_eq!(psg_set_noise_period(&mut bus, None, 3), EINVAL);
        assert_eq!(psg_get_mixer(&mut bus, None), STATUS_INVALID_HANDLE);
        assert_eq!(psg_set_mixer(&mut bus, None, 0x07), EINVAL);
        assert_eq!(psg_set_envelope_period(&mut bus, None, 100), EINVAL);
        assert_eq!(psg_get_envelope_shape(&mut bus, None), STATUS_INVALID_HANDLE);
        assert_eq!(psg_set_envelope_shape(&mut bus, None, 8), EINVAL);
        assert_eq!(psg_close(None), EINVAL);

        assert!(bus.writes().is_empty());
        assert_eq!(bus.read_count(), 0);
    }

    #[test]
    fn test_joystick_lifecycle() {
        let mut bus = MockBus::new();
        bus.set_port(KEMPSTON_JOY_1, 0x18);
        let mut joy = JoystickState::default();

        assert_eq!(joystick_open(Some(&mut joy), 0), EOK);
        assert_eq!(joystick_read(&mut bus, Some(&mut joy)), EOK);
        assert_eq!(joy.dir.bits(), 0x08);
        assert_eq!(joy.buttons.bits(), 0x01);
        assert_eq!(joystick_close(Some(&mut joy)), EOK);

        assert_eq!(joystick_open(Some(&mut joy), 2), EOK);
        assert_eq!(joystick_read(&mut bus, Some(&mut joy)), ERANGE);
    }

    #[test]
    fn test_mouse_settings() {
        let mut bus = MockBus::new();
        let mut mouse = MouseState::default();
        assert_eq!(mouse_open(Some(&mut mouse), 0), EOK);

        assert_eq!(mouse_set_sensitivity(&mut bus, Some(&mut mouse), 2), EOK);
        assert_eq!(mouse_get_sensitivity(&mut bus, Some(&mut mouse)), 2);
        assert_eq!(mouse_set_sensitivity(&mut bus, Some(&mut mouse), 0x05), EOK);
        assert_eq!(bus.next_reg(NR_PERIPHERAL_5), 0x01);
        assert_eq!(mouse_get_sensitivity(&mut bus, Some(&mut mouse)), 1);

        assert_eq!(mouse_get_buttonswap(&mut bus, Some(&mut mouse)), 0);
        assert_eq!(mouse_set_buttonswap(&mut bus, Some(&mut mouse), 0x80), EOK);
        assert_eq!(mouse_get_buttonswap(&mut bus, Some(&mut mouse)), 0x08);
        assert_eq!(bus.next_reg(NR_PERIPHERAL_5), 0x09);

        assert_eq!(mouse_reset(Some(&mut mouse), -5, 7), EOK);
        assert_eq!((mouse.x, mouse.y), (-5, 7));
    }

    #[test]
    fn test_kbd_pressed() {
        let mut bus = MockBus::new();
        bus.controller().press_key(ScanCode::Enter);
        let mut kbd = KeyboardState::default();

        assert_eq!(kbd_open(Some(&mut kbd), 0), EOK);
        assert_eq!(kbd_read(&mut bus, Some(&mut kbd)), EOK);
        assert_eq!(kbd_pressed(Some(&kbd), ScanCode::Enter.code()), 1);
        assert_eq!(kbd_pressed(Some(&kbd), ScanCode::Space.code()), 0);
        assert_eq!(kbd_pressed(Some(&kbd), 0x0801), STATUS_INVALID_HANDLE);
    }

    #[test]
    fn test_psg_argument_checks() {
        let mut bus = MockBus::new();
        let mut psg = PsgState::default();

        assert_eq!(psg_open(Some(&mut psg), 3), ERANGE);
        assert_eq!(psg_open(Some(&mut psg), 1), EOK);
        assert_eq!(psg.index, 1);

        assert_eq!(psg_set_tone_period(&mut bus, Some(&mut psg), 3, 100), ERANGE);
        assert_eq!(psg_set_tone_period(&mut bus, Some(&mut psg), 0, 0x1000), ERANGE);
        assert_eq!(psg_set_amplitude(&mut bus, Some(&mut psg), 1, 0x20), EINVAL);
        assert_eq!(psg_set_noise_period(&mut bus, Some(&mut psg), 0x20), ERANGE);
        assert_eq!(psg_set_mixer(&mut bus, Some(&mut psg), 0x40), EINVAL);
        assert_eq!(psg_set_envelope_shape(&mut bus, Some(&mut psg), 0x10), EINVAL);
        assert!(bus.writes().is_empty());

        assert_eq!(psg_set_mixer(&mut bus, Some(&mut psg), 0x09), EOK);
        assert_eq!(psg_get_mixer(&mut bus, Some(&mut psg)), 0x09);
        assert_eq!(psg_set_envelope_shape(&mut bus, Some(&mut psg), 0x0E), EOK);
        assert_eq!(psg_get_envelope_shape(&mut bus, Some(&mut psg)), 0x0E);
        assert_eq!(psg_close(Some(&mut psg)), EOK);
    }

    #[test]
    fn test_global_sound_settings() {
        let mut bus = MockBus::new();

        assert_eq!(psg_set_core(&mut bus, 1), EOK);
        assert_eq!(psg_get_core(&mut bus), 1);
        assert_eq!(psg_set_core(&mut bus, 7), EINVAL);
        assert_eq!(psg_get_core(&mut bus), 1);

        assert_eq!(psg_set_mode(&mut bus, 1), EOK);
        assert_eq!(psg_get_mode(&mut bus), 1);
        assert_eq!(psg_set_stereo_mode(&mut bus, 1), EOK);
        assert_eq!(psg_set_stereo_mode(&mut bus, 2), EINVAL);
    }

    #[test]
    fn test_period_passthrough() {
        assert_eq!(psg_calc_tone_period(440), 252);
        assert_eq!(psg_calc_noise_period(0), 31);
        assert_eq!(psg_calc_envelope_period_ms(1000), psg_calc_envelope_period(1));
    }
}
