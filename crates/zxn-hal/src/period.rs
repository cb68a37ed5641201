//! Frequency to period conversion for the AY-3-8912
//!
//! ```text
//! tone/noise period = f_clock / (16 * f)
//! envelope period   = f_clock / (256 * f)
//! ```
//!
//! All conversions round to the nearest period and clamp to the register width.

use serde::{Deserialize, Serialize};

/// PSG input clock of the 128K machines [Hz]
pub const PSG_CLOCK_HZ: u32 = 1_773_447;
/// Prescaler of the tone generators
pub const PRESCALER_TONE: u32 = 16;
/// Prescaler of the noise generator
pub const PRESCALER_NOISE: u32 = PRESCALER_TONE;
/// Prescaler of the envelope generator
pub const PRESCALER_ENVELOPE: u32 = 256;

/// Largest tone period (12 bits)
pub const MAX_TONE_PERIOD: u16 = 0x0FFF;
/// Largest noise period (5 bits)
pub const MAX_NOISE_PERIOD: u8 = 0x1F;

pub const FREQ_C4: u16 = 262;
pub const FREQ_DB4: u16 = 277;
pub const FREQ_D4: u16 = 294;
pub const FREQ_EB4: u16 = 311;
pub const FREQ_E4: u16 = 330;
pub const FREQ_F4: u16 = 349;
pub const FREQ_GB4: u16 = 370;
pub const FREQ_G4: u16 = 392;
pub const FREQ_AB4: u16 = 415;
pub const FREQ_A4: u16 = 440;
pub const FREQ_BB4: u16 = 466;
pub const FREQ_B4: u16 = 494;
pub const FREQ_C5: u16 = FREQ_C4 * 2;

fn div_round(num: u64, den: u64) -> u64 {
    (num + den / 2) / den
}

/// Period calculator bound to a PSG clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCalculator {
    pub clock_hz: u32,
}

impl Default for PeriodCalculator {
    fn default() -> Self {
        Self {
            clock_hz: PSG_CLOCK_HZ,
        }
    }
}

impl PeriodCalculator {
    /// Calculator for a PSG clocked at `clock_hz`
    pub fn new(clock_hz: u32) -> Self {
        Self { clock_hz }
    }

    /// Tone period for a frequency in Hz; 0 Hz gives the lowest tone
    pub fn tone_period(&self, freq: u16) -> u16 {
        if freq == 0 {
            return MAX_TONE_PERIOD;
        }
        let period = div_round(self.clock_hz as u64, PRESCALER_TONE as u64 * freq as u64);
        period.clamp(1, MAX_TONE_PERIOD as u64) as u16
    }

    /// Noise period for an update rate in Hz (useful range 3578..110937 Hz)
    pub fn noise_period(&self, freq: u16) -> u8 {
        if freq == 0 {
            return MAX_NOISE_PERIOD;
        }
        let period = div_round(self.clock_hz as u64, PRESCALER_NOISE as u64 * freq as u64);
        period.clamp(1, MAX_NOISE_PERIOD as u64) as u8
    }

    /// Envelope period for a repetition rate in Hz
    pub fn envelope_period(&self, freq: u16) -> u16 {
        if freq == 0 {
            return u16::MAX;
        }
        let period = div_round(self.clock_hz as u64, PRESCALER_ENVELOPE as u64 * freq as u64);
        period.clamp(1, u16::MAX as u64) as u16
    }

    /// Envelope period for a cycle time in milliseconds
    pub fn envelope_period_ms(&self, time_ms: u16) -> u16 {
        let secs = (time_ms / 1000) as u64;
        let millis = (time_ms % 1000) as u64;
        let clock = self.clock_hz as u64;

        // whole seconds and the sub-second rest share one rounding step
        let num = clock * secs * 1000 + clock * millis;
        let period = div_round(num, PRESCALER_ENVELOPE as u64 * 1000);
        period.clamp(1, u16::MAX as u64) as u16
    }
}

/// Tone period for `freq` at the default clock
pub fn calc_tone_period(freq: u16) -> u16 {
    PeriodCalculator::default().tone_period(freq)
}

/// Noise period for `freq` at the default clock
pub fn calc_noise_period(freq: u16) -> u8 {
    PeriodCalculator::default().noise_period(freq)
}

/// Envelope period for `freq` at the default clock
pub fn calc_envelope_period(freq: u16) -> u16 {
    PeriodCalculator::default().envelope_period(freq)
}

/// Envelope period for a cycle of `time_ms` at the default clock
pub fn calc_envelope_period_ms(time_ms: u16) -> u16 {
    PeriodCalculator::default().envelope_period_ms(time_ms)
}
