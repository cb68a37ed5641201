//! Peripheral drivers for the ZX Spectrum Next
//!
//! Drivers for the Kempston/MD joysticks, the Kempston mouse, the ULA keyboard
//! matrix and the three Turbosound AY-3-8912 sound generators. Every driver
//! keeps its state in a caller-owned struct and performs I/O through an
//! [`IoBus`], so the same code runs against real ports or the [`mock::MockBus`].
//!
//! # Example
//!
//! ```no_run
//! use zxn_hal::mock::MockBus;
//! use zxn_hal::psg::{Channel, PsgState};
//! use zxn_hal::period::{calc_tone_period, FREQ_A4};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut bus = MockBus::new();
//!
//!     let mut psg = PsgState::open(0)?;
//!     psg.set_tone_period(&mut bus, Channel::A, calc_tone_period(FREQ_A4))?;
//!     psg.set_amplitude(&mut bus, Channel::A, 0x0F)?;
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod compat;
pub mod joystick;
pub mod keyboard;
pub mod mock;
pub mod mouse;
pub mod period;
pub mod ports;
pub mod psg;
pub mod sound;

pub use bus::{DrvError, EINVAL, EOK, ERANGE, IoBus, status};
pub use joystick::{Buttons, Directions, JoystickState};
pub use keyboard::{KeyEvent, KeyEventKind, KeyboardState, ScanCode};
pub use mouse::{MouseButtons, MouseSensitivity, MouseState};
pub use period::PeriodCalculator;
pub use psg::{Channel, EnvelopeShape, Mixer, PsgState, Readback, Register};
pub use sound::{PsgCore, PsgMode, SoundConfig, StereoMode};

/// Driver Result type
pub type Result<T> = std::result::Result<T, DrvError>;

/// Library version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn parse_component(s: &str) -> u8 {
    s.parse().unwrap_or(0)
}

/// Version of the driver library
pub fn version() -> Version {
    Version {
        major: parse_component(env!("CARGO_PKG_VERSION_MAJOR")),
        minor: parse_component(env!("CARGO_PKG_VERSION_MINOR")),
        patch: parse_component(env!("CARGO_PKG_VERSION_PATCH")),
    }
}
