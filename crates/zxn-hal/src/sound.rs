//! Machine-wide sound configuration
//!
//! Core selection, Turbosound enable and stereo layout live in the Next
//! peripheral registers and affect every PSG at once. They are modelled as a
//! plain [`SoundConfig`] value that is explicitly applied to or read from a bus.

use crate::bus::{DrvError, IoBus};
use crate::ports::{NR_PERIPHERAL_2, NR_PERIPHERAL_3};
use serde::{Deserialize, Serialize};

const CORE_MASK: u8 = 0x03;
const TURBOSOUND_BIT: u8 = 1 << 1;
const STEREO_ACB_BIT: u8 = 1 << 5;

/// Sound core emulated by the FPGA
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PsgCore {
    /// Yamaha YM2149F
    #[default]
    Ym = 0x00,
    /// General Instrument AY-3-8912
    Ay = 0x01,
    /// ZXN-8950
    Zxn8950 = 0x02,
    /// Hold all AY chips in reset
    Reset = 0x03,
}

impl PsgCore {
    /// Decode the core selector; `EINVAL` above 3
    pub fn from_raw(raw: u8) -> crate::Result<Self> {
        match raw {
            0x00 => Ok(PsgCore::Ym),
            0x01 => Ok(PsgCore::Ay),
            0x02 => Ok(PsgCore::Zxn8950),
            0x03 => Ok(PsgCore::Reset),
            _ => Err(DrvError::InvalidArgument("sound core")),
        }
    }

    /// Next-reg encoding
    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Single PSG (128K/+2/+3 compatible) or all three Turbosound chips
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PsgMode {
    #[default]
    Single = 0,
    Multiple = 1,
}

impl PsgMode {
    /// Decode 0 or 1
    pub fn from_raw(raw: u8) -> crate::Result<Self> {
        match raw {
            0 => Ok(PsgMode::Single),
            1 => Ok(PsgMode::Multiple),
            _ => Err(DrvError::InvalidArgument("psg mode")),
        }
    }

    /// Next-reg encoding
    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Channel placement: ABC = A left, B middle, C right; ACB swaps B and C
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum StereoMode {
    #[default]
    Abc = 0,
    Acb = 1,
}

impl StereoMode {
    /// Decode 0 (ABC) or 1 (ACB)
    pub fn from_raw(raw: u8) -> crate::Result<Self> {
        match raw {
            0 => Ok(StereoMode::Abc),
            1 => Ok(StereoMode::Acb),
            _ => Err(DrvError::InvalidArgument("stereo mode")),
        }
    }

    /// Next-reg encoding
    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Global sound settings shared by all PSGs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default)]
    pub core: PsgCore,
    #[serde(default)]
    pub mode: PsgMode,
    #[serde(default)]
    pub stereo: StereoMode,
}

impl SoundConfig {
    /// Read the current settings back from the peripheral registers
    pub fn read<B: IoBus>(bus: &mut B) -> Self {
        Self {
            core: core(bus),
            mode: mode(bus),
            stereo: stereo_mode(bus),
        }
    }

    /// Write all settings
    pub fn apply<B: IoBus>(&self, bus: &mut B) {
        set_core(bus, self.core);
        set_mode(bus, self.mode);
        set_stereo_mode(bus, self.stereo);
    }
}

/// Select the sound core
pub fn set_core<B: IoBus>(bus: &mut B, core: PsgCore) {
    bus.next_reg_modify(NR_PERIPHERAL_2, CORE_MASK, core.raw());
    tracing::debug!("Sound core set to {:?}", core);
}

/// Active sound core
pub fn core<B: IoBus>(bus: &mut B) -> PsgCore {
    match bus.next_reg_read(NR_PERIPHERAL_2) & CORE_MASK {
        0x00 => PsgCore::Ym,
        0x01 => PsgCore::Ay,
        0x02 => PsgCore::Zxn8950,
        _ => PsgCore::Reset,
    }
}

/// Enable or disable Turbosound
pub fn set_mode<B: IoBus>(bus: &mut B, mode: PsgMode) {
    let bits = match mode {
        PsgMode::Single => 0,
        PsgMode::Multiple => TURBOSOUND_BIT,
    };
    bus.next_reg_modify(NR_PERIPHERAL_3, TURBOSOUND_BIT, bits);
    tracing::debug!("PSG mode set to {:?}", mode);
}

/// Active Turbosound mode
pub fn mode<B: IoBus>(bus: &mut B) -> PsgMode {
    if bus.next_reg_read(NR_PERIPHERAL_3) & TURBOSOUND_BIT != 0 {
        PsgMode::Multiple
    } else {
        PsgMode::Single
    }
}

/// Select the channel layout of every PSG
pub fn set_stereo_mode<B: IoBus>(bus: &mut B, stereo: StereoMode) {
    let bits = match stereo {
        StereoMode::Abc => 0,
        StereoMode::Acb => STEREO_ACB_BIT,
    };
    bus.next_reg_modify(NR_PERIPHERAL_3, STEREO_ACB_BIT, bits);
    tracing::debug!("Stereo mode set to {:?}", stereo);
}

/// Active channel layout
pub fn stereo_mode<B: IoBus>(bus: &mut B) -> StereoMode {
    if bus.next_reg_read(NR_PERIPHERAL_3) & STEREO_ACB_BIT != 0 {
        StereoMode::Acb
    } else {
        StereoMode::Abc
    }
}
