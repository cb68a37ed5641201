//! Mock I/O bus for testing without a Next
//!
//! [`MockBus`] models just enough of the machine for the drivers: the next-reg
//! file, the keyboard matrix, Kempston joystick and mouse ports and three AY
//! register banks behind the Turbosound select. Input is injected through a
//! [`MockController`] that shares the bus state, so a test can keep pressing
//! keys while a driver owns `&mut MockBus`.
//!
//! # Usage
//!
//! ```
//! use zxn_hal::keyboard::{KeyboardState, ScanCode};
//! use zxn_hal::mock::MockBus;
//!
//! let mut bus = MockBus::new();
//! bus.controller().press_key(ScanCode::Space);
//!
//! let mut kbd = KeyboardState::open(0);
//! kbd.read(&mut bus).unwrap();
//! assert!(kbd.is_pressed(ScanCode::Space));
//! ```

use crate::IoBus;
use crate::joystick::{Buttons, Directions};
use crate::keyboard::{MAX_ROWS, ScanCode};
use crate::mouse::MouseButtons;
use crate::ports::{
    AY_DATA, AY_REG, KEMPSTON_JOY_1, KEMPSTON_JOY_2, KEMPSTON_MOUSE_BUTTONS, KEMPSTON_MOUSE_X,
    KEMPSTON_MOUSE_Y, NEXTREG_DATA, NEXTREG_SELECT, NR_EXT_MD_PAD_BUTTONS, ULA_KEYBOARD,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Write observed on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusWrite {
    Port { port: u16, value: u8 },
    NextReg { reg: u8, value: u8 },
}

/// Machine state behind the mock bus
#[derive(Debug)]
pub struct MockState {
    /// Fixed values that take precedence over every modelled port
    pub ports: HashMap<u16, u8>,
    /// Next control registers
    pub next_regs: [u8; 256],
    /// Currently selected next-reg
    pub next_reg_selected: u8,
    /// Register banks of the three AY chips
    pub ay: [[u8; 16]; 3],
    /// Chip picked by the last Turbosound select (None = no chip)
    pub ay_chip: Option<usize>,
    /// Register picked by the last register select
    pub ay_reg: u8,
    /// Held keys, active high, one mask per half-row
    pub keys: [u8; MAX_ROWS],
    /// Kempston joystick ports, active high
    pub joysticks: [u8; 2],
    /// Mouse counters
    pub mouse_x: u8,
    pub mouse_y: u8,
    /// Held mouse buttons
    pub mouse_buttons: MouseButtons,
    /// Wheel position 0..=15
    pub mouse_wheel: u8,
    /// Every write in order
    pub writes: Vec<BusWrite>,
    /// Number of port and next-reg reads
    pub reads: usize,
}

impl MockState {
    pub fn new() -> Self {
        Self {
            ports: HashMap::new(),
            next_regs: [0; 256],
            next_reg_selected: 0,
            ay: [[0; 16]; 3],
            ay_chip: Some(0),
            ay_reg: 0,
            keys: [0; MAX_ROWS],
            joysticks: [0; 2],
            mouse_x: 0,
            mouse_y: 0,
            mouse_buttons: MouseButtons::empty(),
            mouse_wheel: 0,
            writes: Vec::new(),
            reads: 0,
        }
    }

    fn port_in(&mut self, port: u16) -> u8 {
        self.reads += 1;
        if let Some(value) = self.ports.get(&port) {
            return *value;
        }

        match port {
            NEXTREG_DATA => self.next_regs[self.next_reg_selected as usize],
            AY_REG => self.ay_chip.map_or(0xFF, |chip| self.ay[chip][self.ay_reg as usize]),
            KEMPSTON_JOY_1 => self.joysticks[0],
            KEMPSTON_JOY_2 => self.joysticks[1],
            KEMPSTON_MOUSE_X => self.mouse_x,
            KEMPSTON_MOUSE_Y => self.mouse_y,
            KEMPSTON_MOUSE_BUTTONS => !((self.mouse_wheel << 4) | self.mouse_buttons.bits()),
            p if p & 0xFF == ULA_KEYBOARD as u16 => self.scan_keyboard((p >> 8) as u8),
            _ => 0xFF,
        }
    }

    /// Every half-row whose address line is low pulls its pressed keys to 0
    fn scan_keyboard(&self, high: u8) -> u8 {
        (0..MAX_ROWS)
            .filter(|row| high & (1 << row) == 0)
            .fold(0xFF, |acc, row| acc & !self.keys[row])
    }

    fn port_out(&mut self, port: u16, value: u8) {
        self.writes.push(BusWrite::Port { port, value });
        match port {
            NEXTREG_SELECT => self.next_reg_selected = value,
            NEXTREG_DATA => self.next_regs[self.next_reg_selected as usize] = value,
            // 0b1xx111cc selects a chip, anything else a register
            AY_REG if value & 0x9C == 0x9C => {
                self.ay_chip = match value & 0x03 {
                    3 => Some(0),
                    2 => Some(1),
                    1 => Some(2),
                    _ => None,
                };
            }
            AY_REG => self.ay_reg = value & 0x0F,
            AY_DATA => {
                if let Some(chip) = self.ay_chip {
                    self.ay[chip][self.ay_reg as usize] = value;
                }
            }
            _ => {}
        }
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock bus; clones share the same machine state
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<RwLock<MockState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::new())),
        }
    }

    /// Get shared state for manipulation in tests
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        Arc::clone(&self.state)
    }

    /// Input injector sharing this bus' state
    pub fn controller(&self) -> MockController {
        MockController::new(self.state())
    }

    /// Pin a port to a fixed value
    pub fn set_port(&self, port: u16, value: u8) {
        if let Ok(mut state) = self.state.write() {
            state.ports.insert(port, value);
        }
    }

    /// Return a pinned port to its modelled behaviour
    pub fn clear_port(&self, port: u16) {
        if let Ok(mut state) = self.state.write() {
            state.ports.remove(&port);
        }
    }

    /// Set a next-reg without recording a write
    pub fn set_next_reg(&self, reg: u8, value: u8) {
        if let Ok(mut state) = self.state.write() {
            state.next_regs[reg as usize] = value;
        }
    }

    /// Peek a next-reg without recording a read
    pub fn next_reg(&self, reg: u8) -> u8 {
        self.state
            .read()
            .map(|s| s.next_regs[reg as usize])
            .unwrap_or(0)
    }

    /// Set a register inside one of the AY chips
    pub fn set_ay_register(&self, chip: usize, reg: u8, value: u8) {
        if let Ok(mut state) = self.state.write() {
            state.ay[chip][(reg & 0x0F) as usize] = value;
        }
    }

    /// Peek a register inside one of the AY chips
    pub fn ay_register(&self, chip: usize, reg: u8) -> u8 {
        self.state
            .read()
            .map(|s| s.ay[chip][(reg & 0x0F) as usize])
            .unwrap_or(0)
    }

    /// Set both free-running mouse counters
    pub fn set_mouse_counters(&self, x: u8, y: u8) {
        if let Ok(mut state) = self.state.write() {
            state.mouse_x = x;
            state.mouse_y = y;
        }
    }

    /// Writes seen so far
    pub fn writes(&self) -> Vec<BusWrite> {
        self.state
            .read()
            .map(|s| s.writes.clone())
            .unwrap_or_default()
    }

    /// Reads seen so far
    pub fn read_count(&self) -> usize {
        self.state.read().map(|s| s.reads).unwrap_or(0)
    }

    /// Forget the recorded traffic
    pub fn clear_log(&self) {
        if let Ok(mut state) = self.state.write() {
            state.writes.clear();
            state.reads = 0;
        }
    }
}

impl IoBus for MockBus {
    fn port_in(&mut self, port: u16) -> u8 {
        self.state
            .write()
            .map(|mut s| s.port_in(port))
            .unwrap_or(0xFF)
    }

    fn port_out(&mut self, port: u16, value: u8) {
        if let Ok(mut state) = self.state.write() {
            state.port_out(port, value);
        }
    }

    fn next_reg_read(&mut self, reg: u8) -> u8 {
        self.state
            .write()
            .map(|mut s| {
                s.reads += 1;
                s.next_regs[reg as usize]
            })
            .unwrap_or(0xFF)
    }

    fn next_reg_write(&mut self, reg: u8, value: u8) {
        if let Ok(mut state) = self.state.write() {
            state.next_regs[reg as usize] = value;
            state.writes.push(BusWrite::NextReg { reg, value });
        }
    }
}

/// Simulates a user in front of the machine
#[derive(Debug, Clone)]
pub struct MockController {
    state: Arc<RwLock<MockState>>,
}

impl MockController {
    /// Controller over shared machine state
    pub fn new(state: Arc<RwLock<MockState>>) -> Self {
        Self { state }
    }

    /// Simulate pressing a key
    pub fn press_key(&self, key: ScanCode) {
        if let Ok(mut state) = self.state.write() {
            state.keys[key.row()] |= key.mask();
        }
    }

    /// Simulate releasing a key
    pub fn release_key(&self, key: ScanCode) {
        if let Ok(mut state) = self.state.write() {
            state.keys[key.row()] &= !key.mask();
        }
    }

    /// Release every key
    pub fn release_all_keys(&self) {
        if let Ok(mut state) = self.state.write() {
            state.keys = [0; MAX_ROWS];
        }
    }

    /// Simulate a joystick/pad on port `index` (0 = left, 1 = right)
    pub fn set_joystick(&self, index: usize, dir: Directions, buttons: Buttons) {
        if let Ok(mut state) = self.state.write() {
            // Kempston carries B C A START, the MD register carries MODE Y Z X
            state.joysticks[index] = dir.bits() | ((buttons.bits() & 0x0F) << 4);
            let md = buttons.bits() >> 4;
            let reg = &mut state.next_regs[NR_EXT_MD_PAD_BUTTONS as usize];
            *reg = if index == 0 {
                (*reg & 0xF0) | md
            } else {
                (*reg & 0x0F) | (md << 4)
            };
        }
    }

    /// Simulate moving the mouse; counters wrap like the hardware
    pub fn move_mouse(&self, dx: i8, dy: i8) {
        if let Ok(mut state) = self.state.write() {
            state.mouse_x = state.mouse_x.wrapping_add_signed(dx);
            state.mouse_y = state.mouse_y.wrapping_add_signed(dy);
        }
    }

    /// Simulate holding mouse buttons
    pub fn set_mouse_buttons(&self, buttons: MouseButtons) {
        if let Ok(mut state) = self.state.write() {
            state.mouse_buttons = buttons;
        }
    }

    /// Simulate turning the wheel; position wraps at 16
    pub fn scroll(&self, steps: i8) {
        if let Ok(mut state) = self.state.write() {
            state.mouse_wheel = state.mouse_wheel.wrapping_add_signed(steps) & 0x0F;
        }
    }
}
