//! Scripted input for the mock bus
//!
//! Sweeps joystick 0 through its four directions, drags the mouse diagonally
//! with the left button held every few frames, walks the keyboard matrix one
//! key per frame and plays a C-major chord on PSG 0.

use anyhow::Result;
use zxn_hal::mock::MockController;
use zxn_hal::period::{FREQ_C4, FREQ_E4, FREQ_G4};
use zxn_hal::{
    Buttons, Channel, Directions, IoBus, Mixer, MouseButtons, PeriodCalculator, PsgState, ScanCode,
};

/// Mouse movement per frame
pub const MOUSE_STEP: (i8, i8) = (3, -2);

const SWEEP: [Directions; 4] = [
    Directions::UP,
    Directions::RIGHT,
    Directions::DOWN,
    Directions::LEFT,
];

/// Drive the simulated input for `frame`
pub fn script_frame(controller: &MockController, frame: u32) {
    let dir = SWEEP[(frame / 10) as usize % SWEEP.len()];
    let fire = if frame % 20 < 5 {
        Buttons::A
    } else {
        Buttons::empty()
    };
    controller.set_joystick(0, dir, fire);

    controller.move_mouse(MOUSE_STEP.0, MOUSE_STEP.1);
    controller.set_mouse_buttons(if frame % 25 < 10 {
        MouseButtons::LEFT
    } else {
        MouseButtons::empty()
    });
    if frame % 25 == 0 {
        controller.scroll(1);
    }

    let keys = ScanCode::all();
    controller.release_all_keys();
    controller.press_key(keys[frame as usize % keys.len()]);
}

/// Start a sustained C-major chord on all three channels
pub fn play_chord<B: IoBus>(
    bus: &mut B,
    psg: &mut PsgState,
    calc: &PeriodCalculator,
) -> Result<()> {
    for (channel, freq) in Channel::all().iter().zip([FREQ_C4, FREQ_E4, FREQ_G4]) {
        psg.set_tone_period(bus, *channel, calc.tone_period(freq))?;
        psg.set_amplitude(bus, *channel, 0x0C)?;
    }
    psg.set_mixer(bus, Mixer::TONE_A | Mixer::TONE_B | Mixer::TONE_C)?;
    tracing::info!("Playing C-major chord on PSG {}", psg.index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zxn_hal::mock::MockBus;
    use zxn_hal::{JoystickState, KeyboardState, MouseState};

    #[test]
    fn test_script_drives_every_device() {
        let mut bus = MockBus::new();
        let controller = bus.controller();
        let mut joy = JoystickState::open(0);
        let mut mouse = MouseState::open(0);
        let mut kbd = KeyboardState::open(0);

        for frame in 0..12 {
            script_frame(&controller, frame);
            joy.read(&mut bus).unwrap();
            mouse.read(&mut bus).unwrap();
            kbd.read(&mut bus).unwrap();
        }

        assert_eq!(joy.dir, Directions::RIGHT);
        assert!(joy.buttons.is_empty());
        assert_eq!((mouse.x, mouse.y), (36, -24));
        assert!(mouse.buttons.is_empty());
        assert_eq!(mouse.wheel, 1);
        assert_eq!(kbd.held().collect::<Vec<_>>(), vec![ScanCode::all()[11]]);
    }

    #[test]
    fn test_chord_registers() {
        let mut bus = MockBus::new();
        let mut psg = PsgState::open(0).unwrap();

        play_chord(&mut bus, &mut psg, &PeriodCalculator::default()).unwrap();

        assert_eq!(psg.tone_period(&mut bus, Channel::A), 423);
        assert_eq!(psg.tone_period(&mut bus, Channel::B), 336);
        assert_eq!(psg.tone_period(&mut bus, Channel::C), 283);
        assert_eq!(bus.ay_register(0, 7), 0x38);
    }
}
