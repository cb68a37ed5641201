//! I/O bus access and driver errors
//!
//! Every driver talks to the machine through [`IoBus`]: 16-bit port reads and
//! writes plus the Next control registers, which are themselves reached through
//! a select/data port pair.

use crate::ports::{NEXTREG_DATA, NEXTREG_SELECT};
use thiserror::Error;

/// No error
pub const EOK: u8 = 0;
/// Invalid argument (null handle, malformed value)
pub const EINVAL: u8 = 22;
/// Index or value outside the documented bound
pub const ERANGE: u8 = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrvError {
    #[error("No device state given")]
    NullHandle,

    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: u16 },
}

impl DrvError {
    /// POSIX-style error number used by the status-code interface
    pub fn errno(&self) -> u8 {
        match self {
            DrvError::NullHandle | DrvError::InvalidArgument(_) => EINVAL,
            DrvError::OutOfRange { .. } => ERANGE,
        }
    }

    pub(crate) fn out_of_range(what: &'static str, value: impl Into<u16>) -> Self {
        DrvError::OutOfRange {
            what,
            value: value.into(),
        }
    }
}

/// Collapse a driver result into a status code (`0` = success)
pub fn status<T>(result: crate::Result<T>) -> u8 {
    match result {
        Ok(_) => EOK,
        Err(e) => e.errno(),
    }
}

/// Raw access to the machine's I/O space
pub trait IoBus {
    /// Read a byte from a 16-bit I/O port
    fn port_in(&mut self, port: u16) -> u8;

    /// Write a byte to a 16-bit I/O port
    fn port_out(&mut self, port: u16, value: u8);

    /// Read a Next control register
    fn next_reg_read(&mut self, reg: u8) -> u8 {
        self.port_out(NEXTREG_SELECT, reg);
        self.port_in(NEXTREG_DATA)
    }

    /// Write a Next control register
    fn next_reg_write(&mut self, reg: u8, value: u8) {
        self.port_out(NEXTREG_SELECT, reg);
        self.port_out(NEXTREG_DATA, value);
    }

    /// Clear `clear_mask` and then set `set_bits` in a Next control register
    fn next_reg_modify(&mut self, reg: u8, clear_mask: u8, set_bits: u8) {
        let value = (self.next_reg_read(reg) & !clear_mask) | set_bits;
        tracing::trace!("nextreg {:#04x} <- {:#04x}", reg, value);
        self.next_reg_write(reg, value);
    }
}

impl<B: IoBus + ?Sized> IoBus for &mut B {
    fn port_in(&mut self, port: u16) -> u8 {
        (**self).port_in(port)
    }

    fn port_out(&mut self, port: u16, value: u8) {
        (**self).port_out(port, value)
    }

    fn next_reg_read(&mut self, reg: u8) -> u8 {
        (**self).next_reg_read(reg)
    }

    fn next_reg_write(&mut self, reg: u8, value: u8) {
        (**self).next_reg_write(reg, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Latch {
        selected: u8,
        regs: [u8; 256],
        writes: Vec<(u16, u8)>,
    }

    impl Default for Latch {
        fn default() -> Self {
            Self {
                selected: 0,
                regs: [0; 256],
                writes: Vec::new(),
            }
        }
    }

    impl IoBus for Latch {
        fn port_in(&mut self, port: u16) -> u8 {
            if port == NEXTREG_DATA {
                self.regs[self.selected as usize]
            } else {
                0xFF
            }
        }

        fn port_out(&mut self, port: u16, value: u8) {
            self.writes.push((port, value));
            match port {
                NEXTREG_SELECT => self.selected = value,
                NEXTREG_DATA => self.regs[self.selected as usize] = value,
                _ => {}
            }
        }
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(DrvError::NullHandle.errno(), EINVAL);
        assert_eq!(DrvError::InvalidArgument("shape").errno(), EINVAL);
        assert_eq!(DrvError::out_of_range("index", 3u8).errno(), ERANGE);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(Ok::<_, DrvError>(())), EOK);
        assert_eq!(status::<()>(Err(DrvError::out_of_range("period", 0x1000u16))), ERANGE);
    }

    #[test]
    fn test_error_display() {
        let err = DrvError::out_of_range("tone period", 0x1000u16);
        assert_eq!(format!("{err}"), "tone period out of range: 4096");
    }

    #[test]
    fn test_next_reg_goes_through_select_port() {
        let mut bus = Latch::default();
        bus.next_reg_write(0x0A, 0x5A);

        assert_eq!(bus.writes, vec![(NEXTREG_SELECT, 0x0A), (NEXTREG_DATA, 0x5A)]);
        assert_eq!(bus.next_reg_read(0x0A), 0x5A);
    }

    #[test]
    fn test_next_reg_modify_preserves_other_bits() {
        let mut bus = Latch::default();
        bus.next_reg_write(0x08, 0b1101_0101);
        bus.next_reg_modify(0x08, 1 << 5, 1 << 5);
        assert_eq!(bus.next_reg_read(0x08), 0b1111_0101);

        bus.next_reg_modify(0x08, 0x03, 0x02);
        assert_eq!(bus.next_reg_read(0x08), 0b1111_0110);
    }

    #[test]
    fn test_mut_ref_forwards() {
        fn poke<B: IoBus>(mut bus: B) {
            bus.next_reg_write(0x06, 1);
        }

        let mut bus = Latch::default();
        poke(&mut bus);
        assert_eq!(bus.regs[0x06], 1);
    }
}
