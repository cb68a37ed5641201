//! Programmable sound generator (AY-3-8912 / Turbosound) driver
//!
//! Up to three chips share the register/data port pair; a chip is selected by
//! writing `0b1111_11cc` to 0xFFFD first.
//!
//! ```text
//! REG  FUNCTION
//! 0    Channel A fine tune                          [LLLLLLLL]
//! 1    Channel A coarse tune                        [----HHHH]
//! 2/3  Channel B fine/coarse tune
//! 4/5  Channel C fine/coarse tune
//! 6    Noise period                                 [---LLLLL]
//! 7    Enable flags, inverted (0 = on)              [--NNNTTT]
//! 8    Channel A amplitude, E = use envelope        [---EAAAA]
//! 9    Channel B amplitude                          [---EAAAA]
//! 10   Channel C amplitude                          [---EAAAA]
//! 11   Envelope period fine                         [LLLLLLLL]
//! 12   Envelope period coarse                       [HHHHHHHH]
//! 13   Envelope shape                               [----CAAH]
//! ```
//!
//! Reading registers back from the chip is unreliable on real hardware, so by
//! default every write is mirrored in the state record and getters answer
//! from that shadow copy.

use crate::bus::{DrvError, IoBus};
use crate::period::{MAX_NOISE_PERIOD, MAX_TONE_PERIOD};
use crate::ports::{AY_DATA, AY_REG, NR_PERIPHERAL_4};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of Turbosound chips
pub const MAX_PSG: u8 = 3;
/// Amplitude value that hands a channel over to the envelope generator
pub const AMPL_ENVELOPE: u8 = 0x10;
/// Largest fixed amplitude
pub const MAX_AMPLITUDE: u8 = 0x0F;
/// Largest envelope shape
pub const MAX_ENVELOPE_SHAPE: u8 = 0x0F;

const MONO_BIT_BASE: u8 = 5;

/// AY-3-8912 register numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    ToneAFine = 0,
    ToneACoarse = 1,
    ToneBFine = 2,
    ToneBCoarse = 3,
    ToneCFine = 4,
    ToneCCoarse = 5,
    NoisePeriod = 6,
    Mixer = 7,
    AmplitudeA = 8,
    AmplitudeB = 9,
    AmplitudeC = 10,
    EnvelopeFine = 11,
    EnvelopeCoarse = 12,
    EnvelopeShape = 13,
    IoPortA = 14,
    IoPortB = 15,
}

impl Register {
    /// Register number 0..=15
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Tone channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    A = 0,
    B = 1,
    C = 2,
}

impl Channel {
    /// Channels A, B and C in order
    pub fn all() -> &'static [Channel] {
        &[Channel::A, Channel::B, Channel::C]
    }

    /// Channel for 0, 1 or 2
    pub fn from_index(index: u8) -> crate::Result<Self> {
        match index {
            0 => Ok(Channel::A),
            1 => Ok(Channel::B),
            2 => Ok(Channel::C),
            other => Err(DrvError::out_of_range("psg channel", other)),
        }
    }

    fn fine_register(self) -> Register {
        match self {
            Channel::A => Register::ToneAFine,
            Channel::B => Register::ToneBFine,
            Channel::C => Register::ToneCFine,
        }
    }

    fn coarse_register(self) -> Register {
        match self {
            Channel::A => Register::ToneACoarse,
            Channel::B => Register::ToneBCoarse,
            Channel::C => Register::ToneCCoarse,
        }
    }

    fn amplitude_register(self) -> Register {
        match self {
            Channel::A => Register::AmplitudeA,
            Channel::B => Register::AmplitudeB,
            Channel::C => Register::AmplitudeC,
        }
    }
}

bitflags! {
    /// Mixer selection, active high (the chip register is active low)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Mixer: u8 {
        const TONE_A = 1 << 0;
        const TONE_B = 1 << 1;
        const TONE_C = 1 << 2;
        const NOISE_A = 1 << 3;
        const NOISE_B = 1 << 4;
        const NOISE_C = 1 << 5;
    }
}

impl Mixer {
    /// Tone enable bit of `channel`
    pub fn tone(channel: Channel) -> Self {
        Mixer::from_bits_truncate(1 << channel as u8)
    }

    /// Noise enable bit of `channel`
    pub fn noise(channel: Channel) -> Self {
        Mixer::from_bits_truncate(1 << (channel as u8 + 3))
    }
}

bitflags! {
    /// Envelope shape bits
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EnvelopeShape: u8 {
        /// One cycle, then hold the end value
        const HOLD = 1 << 0;
        /// Reverse direction after each cycle
        const ALTERNATE = 1 << 1;
        /// Count up instead of down
        const ATTACK = 1 << 2;
        /// Follow HOLD; if clear, drop to 0 after one cycle
        const CONTINUE = 1 << 3;
    }
}

/// Where register getters take their values from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readback {
    /// Shadow copy of the last written values
    #[default]
    Latch,
    /// Read the chip itself
    Hardware,
}

/// State of one PSG
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PsgState {
    pub index: u8,
    #[serde(skip)]
    scratch: u8,
    regs: [u8; 16],
    #[serde(skip)]
    readback: Readback,
}

impl PsgState {
    /// Open PSG `index` (0..=2)
    pub fn open(index: u8) -> crate::Result<Self> {
        if index >= MAX_PSG {
            tracing::warn!("PSG index {} does not exist", index);
            return Err(DrvError::out_of_range("psg index", index));
        }
        tracing::debug!("Opening PSG {}", index);
        Ok(Self {
            index,
            ..Self::default()
        })
    }

    /// Re-initialise an existing record; left untouched on error
    pub fn open_in_place(&mut self, index: u8) -> crate::Result<()> {
        *self = Self::open(index)?;
        Ok(())
    }

    /// Choose where getters read from
    pub fn with_readback(mut self, readback: Readback) -> Self {
        self.readback = readback;
        self
    }

    /// Where getters read from
    pub fn readback(&self) -> Readback {
        self.readback
    }

    /// Shadow copy of all 16 registers
    pub fn registers(&self) -> &[u8; 16] {
        &self.regs
    }

    /// Turbosound select byte: both audio sides on, chip 3 - index
    fn chip_select(&self) -> u8 {
        0xFC | (3 - (self.index & 0x03))
    }

    /// Write a chip register and mirror it in the shadow
    pub fn write_register<B: IoBus>(&mut self, bus: &mut B, reg: Register, value: u8) {
        bus.port_out(AY_REG, self.chip_select());
        bus.port_out(AY_REG, reg as u8);
        bus.port_out(AY_DATA, value);
        self.regs[reg.index()] = value;
        tracing::trace!("psg {}: r{} <- {:#04x}", self.index, reg as u8, value);
    }

    /// Read a chip register according to the readback mode
    pub fn read_register<B: IoBus>(&mut self, bus: &mut B, reg: Register) -> u8 {
        match self.readback {
            Readback::Latch => self.regs[reg.index()],
            Readback::Hardware => {
                bus.port_out(AY_REG, self.chip_select());
                bus.port_out(AY_REG, reg as u8);
                self.scratch = bus.port_in(AY_REG);
                self.scratch
            }
        }
    }

    /// Mix this chip's channels to mono (next-reg 0x09 bit 5 + index)
    pub fn set_mono_mode<B: IoBus>(&mut self, bus: &mut B, mono: bool) -> crate::Result<()> {
        let bit = 1 << (MONO_BIT_BASE + self.index);
        bus.next_reg_modify(NR_PERIPHERAL_4, bit, if mono { bit } else { 0 });
        tracing::debug!("PSG {} mono: {}", self.index, mono);
        Ok(())
    }

    /// Whether this PSG outputs mono
    pub fn mono_mode<B: IoBus>(&self, bus: &mut B) -> bool {
        bus.next_reg_read(NR_PERIPHERAL_4) & (1 << (MONO_BIT_BASE + self.index)) != 0
    }

    /// Set the 12-bit tone period of a channel
    pub fn set_tone_period<B: IoBus>(
        &mut self,
        bus: &mut B,
        channel: Channel,
        period: u16,
    ) -> crate::Result<()> {
        if period > MAX_TONE_PERIOD {
            tracing::warn!("Tone period {:#06x} exceeds 12 bits", period);
            return Err(DrvError::out_of_range("tone period", period));
        }
        self.write_register(bus, channel.fine_register(), (period & 0xFF) as u8);
        self.write_register(bus, channel.coarse_register(), (period >> 8) as u8);
        Ok(())
    }

    /// 12-bit tone period of `channel`
    pub fn tone_period<B: IoBus>(&mut self, bus: &mut B, channel: Channel) -> u16 {
        let fine = self.read_register(bus, channel.fine_register()) as u16;
        let coarse = (self.read_register(bus, channel.coarse_register()) & 0x0F) as u16;
        (coarse << 8) | fine
    }

    /// Set a fixed amplitude (0..=15) or [`AMPL_ENVELOPE`]
    pub fn set_amplitude<B: IoBus>(
        &mut self,
        bus: &mut B,
        channel: Channel,
        amplitude: u8,
    ) -> crate::Result<()> {
        if amplitude & !(AMPL_ENVELOPE | MAX_AMPLITUDE) != 0 {
            tracing::warn!("Amplitude {:#04x} is not valid", amplitude);
            return Err(DrvError::InvalidArgument("amplitude"));
        }
        self.write_register(bus, channel.amplitude_register(), amplitude);
        Ok(())
    }

    /// Amplitude of `channel`, including the envelope bit
    pub fn amplitude<B: IoBus>(&mut self, bus: &mut B, channel: Channel) -> u8 {
        self.read_register(bus, channel.amplitude_register()) & (AMPL_ENVELOPE | MAX_AMPLITUDE)
    }

    /// Set the 5-bit noise period
    pub fn set_noise_period<B: IoBus>(&mut self, bus: &mut B, period: u8) -> crate::Result<()> {
        if period > MAX_NOISE_PERIOD {
            tracing::warn!("Noise period {:#04x} exceeds 5 bits", period);
            return Err(DrvError::out_of_range("noise period", period));
        }
        self.write_register(bus, Register::NoisePeriod, period);
        Ok(())
    }

    /// 5-bit noise period
    pub fn noise_period<B: IoBus>(&mut self, bus: &mut B) -> u8 {
        self.read_register(bus, Register::NoisePeriod) & MAX_NOISE_PERIOD
    }

    /// Enable tone/noise per channel
    pub fn set_mixer<B: IoBus>(&mut self, bus: &mut B, mixer: Mixer) -> crate::Result<()> {
        // active low on the chip; I/O port direction bits stay at input
        self.write_register(bus, Register::Mixer, !mixer.bits() & Mixer::all().bits());
        Ok(())
    }

    /// Raw variant of [`PsgState::set_mixer`]: `0b00NNNTTT`
    pub fn set_mixer_raw<B: IoBus>(&mut self, bus: &mut B, mixer: u8) -> crate::Result<()> {
        let mixer = Mixer::from_bits(mixer).ok_or(DrvError::InvalidArgument("mixer"))?;
        self.set_mixer(bus, mixer)
    }

    /// Enabled tone and noise outputs
    pub fn mixer<B: IoBus>(&mut self, bus: &mut B) -> Mixer {
        Mixer::from_bits_truncate(!self.read_register(bus, Register::Mixer))
    }

    /// Set the 16-bit envelope period
    pub fn set_envelope_period<B: IoBus>(&mut self, bus: &mut B, period: u16) -> crate::Result<()> {
        self.write_register(bus, Register::EnvelopeFine, (period & 0xFF) as u8);
        self.write_register(bus, Register::EnvelopeCoarse, (period >> 8) as u8);
        Ok(())
    }

    /// 16-bit envelope period
    pub fn envelope_period<B: IoBus>(&mut self, bus: &mut B) -> u16 {
        let fine = self.read_register(bus, Register::EnvelopeFine) as u16;
        let coarse = self.read_register(bus, Register::EnvelopeCoarse) as u16;
        (coarse << 8) | fine
    }

    /// Set the envelope shape (0..=15); writing restarts the envelope
    pub fn set_envelope_shape<B: IoBus>(&mut self, bus: &mut B, shape: u8) -> crate::Result<()> {
        if shape > MAX_ENVELOPE_SHAPE {
            tracing::warn!("Envelope shape {:#04x} is not valid", shape);
            return Err(DrvError::InvalidArgument("envelope shape"));
        }
        self.write_register(bus, Register::EnvelopeShape, shape);
        Ok(())
    }

    /// 4-bit envelope shape
    pub fn envelope_shape<B: IoBus>(&mut self, bus: &mut B) -> u8 {
        self.read_register(bus, Register::EnvelopeShape) & MAX_ENVELOPE_SHAPE
    }

    /// Turn every channel off and zero the amplitudes
    pub fn silence<B: IoBus>(&mut self, bus: &mut B) -> crate::Result<()> {
        self.set_mixer(bus, Mixer::empty())?;
        for channel in Channel::all() {
            self.set_amplitude(bus, *channel, 0)?;
        }
        Ok(())
    }

    /// Close the PSG
    pub fn close(&mut self) -> crate::Result<()> {
        tracing::debug!("Closing PSG {}", self.index);
        Ok(())
    }
}
