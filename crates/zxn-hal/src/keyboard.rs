//! Keyboard matrix driver
//!
//! The 40 keys sit in 8 half-rows of 5. A row is read by driving its address
//! line (A8..A15) low on port 0xFE; pressed keys read back as 0 bits.
//!
//! ```text
//! PORT    ADDRLINE  D0   D1   D2   D3   D4
//! 0xFEFE  A8        CSH  Z    X    C    V
//! 0xFDFE  A9        A    S    D    F    G
//! 0xFBFE  A10       Q    W    E    R    T
//! 0xF7FE  A11       1    2    3    4    5
//! 0xEFFE  A12       0    9    8    7    6
//! 0xDFFE  A13       P    O    I    U    Y
//! 0xBFFE  A14       ENT  L    K    J    H
//! 0x7FFE  A15       SPC  SSH  M    N    B
//! ```

use crate::bus::{DrvError, IoBus};
use crate::ports::keyboard_row_port;
use serde::{Deserialize, Serialize};

/// Number of half-rows in the matrix
pub const MAX_ROWS: usize = 8;
/// Data lines per half-row
pub const ROW_MASK: u8 = 0x1F;

/// Key codes: high byte = row, low byte = data-line bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ScanCode {
    // Row 0
    CapsShift = 0x0001,
    Z = 0x0002,
    X = 0x0004,
    C = 0x0008,
    V = 0x0010,
    // Row 1
    A = 0x0101,
    S = 0x0102,
    D = 0x0104,
    F = 0x0108,
    G = 0x0110,
    // Row 2
    Q = 0x0201,
    W = 0x0202,
    E = 0x0204,
    R = 0x0208,
    T = 0x0210,
    // Row 3
    Key1 = 0x0301,
    Key2 = 0x0302,
    Key3 = 0x0304,
    Key4 = 0x0308,
    Key5 = 0x0310,
    // Row 4
    Key0 = 0x0401,
    Key9 = 0x0402,
    Key8 = 0x0404,
    Key7 = 0x0408,
    Key6 = 0x0410,
    // Row 5
    P = 0x0501,
    O = 0x0502,
    I = 0x0504,
    U = 0x0508,
    Y = 0x0510,
    // Row 6
    Enter = 0x0601,
    L = 0x0602,
    K = 0x0604,
    J = 0x0608,
    H = 0x0610,
    // Row 7
    Space = 0x0701,
    SymbolShift = 0x0702,
    M = 0x0704,
    N = 0x0708,
    B = 0x0710,
}

impl ScanCode {
    /// All keys in matrix order (row by row, D0 first)
    #[rustfmt::skip]
    pub fn all() -> &'static [ScanCode] {
        use ScanCode::*;
        &[
            CapsShift, Z, X, C, V,
            A, S, D, F, G,
            Q, W, E, R, T,
            Key1, Key2, Key3, Key4, Key5,
            Key0, Key9, Key8, Key7, Key6,
            P, O, I, U, Y,
            Enter, L, K, J, H,
            Space, SymbolShift, M, N, B,
        ]
    }

    /// Row in the high byte, column mask in the low byte
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Half-row index 0..=7
    pub fn row(self) -> usize {
        (self.code() >> 8) as usize
    }

    /// Column bit within the row
    pub fn mask(self) -> u8 {
        (self.code() & 0xFF) as u8
    }

    /// Key at `row`, data line `bit` (0..5)
    pub fn at(row: usize, bit: u8) -> Option<ScanCode> {
        if row >= MAX_ROWS || bit >= 5 {
            return None;
        }
        Self::all().get(row * 5 + bit as usize).copied()
    }

    /// Key for a raw scan code
    pub fn from_code(code: u16) -> Option<ScanCode> {
        Self::all().iter().copied().find(|k| k.code() == code)
    }

    /// Printable key name
    pub fn name(self) -> &'static str {
        match self {
            ScanCode::CapsShift => "caps shift",
            ScanCode::Z => "z",
            ScanCode::X => "x",
            ScanCode::C => "c",
            ScanCode::V => "v",
            ScanCode::A => "a",
            ScanCode::S => "s",
            ScanCode::D => "d",
            ScanCode::F => "f",
            ScanCode::G => "g",
            ScanCode::Q => "q",
            ScanCode::W => "w",
            ScanCode::E => "e",
            ScanCode::R => "r",
            ScanCode::T => "t",
            ScanCode::Key1 => "1",
            ScanCode::Key2 => "2",
            ScanCode::Key3 => "3",
            ScanCode::Key4 => "4",
            ScanCode::Key5 => "5",
            ScanCode::Key0 => "0",
            ScanCode::Key9 => "9",
            ScanCode::Key8 => "8",
            ScanCode::Key7 => "7",
            ScanCode::Key6 => "6",
            ScanCode::P => "p",
            ScanCode::O => "o",
            ScanCode::I => "i",
            ScanCode::U => "u",
            ScanCode::Y => "y",
            ScanCode::Enter => "enter",
            ScanCode::L => "l",
            ScanCode::K => "k",
            ScanCode::J => "j",
            ScanCode::H => "h",
            ScanCode::Space => "space",
            ScanCode::SymbolShift => "symbol shift",
            ScanCode::M => "m",
            ScanCode::N => "n",
            ScanCode::B => "b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyEventKind {
    Pressed,
    Released,
}

/// Key edge detected by the last [`KeyboardState::read`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyEvent {
    pub key: ScanCode,
    pub kind: KeyEventKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Edges {
    prev_rows: [u8; MAX_ROWS],
    pressed: [u8; MAX_ROWS],
    released: [u8; MAX_ROWS],
}

/// State of the keyboard
///
/// `rows` holds one active-high bitmask per half-row as of the last read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyboardState {
    pub index: u8,
    pub rows: [u8; MAX_ROWS],
    #[serde(skip)]
    edges: Edges,
}

impl KeyboardState {
    /// Open the keyboard (there is only one, index 0)
    pub fn open(index: u8) -> Self {
        tracing::debug!("Opening keyboard {}", index);
        Self {
            index,
            ..Self::default()
        }
    }

    /// Re-initialise an existing record
    pub fn open_in_place(&mut self, index: u8) {
        *self = Self::open(index);
    }

    /// Scan all 8 half-rows and record the edges against the previous scan
    pub fn read<B: IoBus>(&mut self, bus: &mut B) -> crate::Result<()> {
        for (row, state) in self.rows.iter_mut().enumerate() {
            *state = !bus.port_in(keyboard_row_port(row as u8)) & ROW_MASK;
        }

        for row in 0..MAX_ROWS {
            let changed = self.edges.prev_rows[row] ^ self.rows[row];
            self.edges.pressed[row] = self.rows[row] & changed;
            self.edges.released[row] = self.edges.prev_rows[row] & changed;
        }
        self.edges.prev_rows = self.rows;

        tracing::trace!("keyboard {}: rows={:02x?}", self.index, self.rows);
        Ok(())
    }

    /// Check if a key is held down
    pub fn is_pressed(&self, key: ScanCode) -> bool {
        self.rows[key.row()] & key.mask() != 0
    }

    /// Check a raw scan code (`row << 8 | bit`)
    pub fn pressed_raw(&self, code: u16) -> crate::Result<bool> {
        let row = (code >> 8) as usize;
        if row >= MAX_ROWS {
            return Err(DrvError::out_of_range("keyboard row", code >> 8));
        }
        Ok(self.rows[row] & (code & 0xFF) as u8 != 0)
    }

    /// Key went down between the last two reads
    pub fn just_pressed(&self, key: ScanCode) -> bool {
        self.edges.pressed[key.row()] & key.mask() != 0
    }

    /// Key went up between the last two reads
    pub fn just_released(&self, key: ScanCode) -> bool {
        self.edges.released[key.row()] & key.mask() != 0
    }

    /// Keys that went down during the last read, one mask per row
    pub fn pressed_edges(&self) -> [u8; MAX_ROWS] {
        self.edges.pressed
    }

    /// Keys that went up during the last read, one mask per row
    pub fn released_edges(&self) -> [u8; MAX_ROWS] {
        self.edges.released
    }

    /// All edges of the last read, presses before releases, in matrix order
    pub fn events(&self) -> impl Iterator<Item = KeyEvent> + '_ {
        let pressed = ScanCode::all()
            .iter()
            .filter(|k| self.just_pressed(**k))
            .map(|k| KeyEvent {
                key: *k,
                kind: KeyEventKind::Pressed,
            });
        let released = ScanCode::all()
            .iter()
            .filter(|k| self.just_released(**k))
            .map(|k| KeyEvent {
                key: *k,
                kind: KeyEventKind::Released,
            });
        pressed.chain(released)
    }

    /// Every key currently held down
    pub fn held(&self) -> impl Iterator<Item = ScanCode> + '_ {
        ScanCode::all().iter().copied().filter(|k| self.is_pressed(*k))
    }

    /// Close the keyboard
    pub fn close(&mut self) -> crate::Result<()> {
        tracing::debug!("Closing keyboard {}", self.index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;

    #[test]
    fn test_scan_code_layout() {
        assert_eq!(ScanCode::all().len(), 40);
        for (i, key) in ScanCode::all().iter().enumerate() {
            assert_eq!(key.row(), i / 5);
            assert_eq!(key.mask(), 1 << (i % 5));
            assert_eq!(ScanCode::at(i / 5, (i % 5) as u8), Some(*key));
            assert_eq!(ScanCode::from_code(key.code()), Some(*key));
        }
        assert_eq!(ScanCode::Space.code(), 0x0701);
        assert_eq!(ScanCode::B.code(), 0x0710);
        assert_eq!(ScanCode::at(8, 0), None);
        assert_eq!(ScanCode::at(0, 5), None);
        assert_eq!(ScanCode::from_code(0x0020), None);
    }

    #[test]
    fn test_read_idle_keyboard() {
        let mut bus = MockBus::new();
        let mut kbd = KeyboardState::open(0);
        kbd.read(&mut bus).unwrap();

        assert_eq!(kbd.rows, [0; MAX_ROWS]);
        assert_eq!(kbd.events().count(), 0);
    }

    #[test]
    fn test_read_pressed_keys() {
        let mut bus = MockBus::new();
        let controller = bus.controller();
        controller.press_key(ScanCode::Q);
        controller.press_key(ScanCode::SymbolShift);

        let mut kbd = KeyboardState::open(0);
        kbd.read(&mut bus).unwrap();

        assert!(kbd.is_pressed(ScanCode::Q));
        assert!(kbd.is_pressed(ScanCode::SymbolShift));
        assert!(!kbd.is_pressed(ScanCode::W));
        assert_eq!(kbd.rows[2], 0x01);
        assert_eq!(kbd.rows[7], 0x02);
        assert_eq!(
            kbd.held().collect::<Vec<_>>(),
            vec![ScanCode::Q, ScanCode::SymbolShift]
        );
        assert!(kbd.rows.iter().all(|r| *r <= ROW_MASK));
    }

    #[test]
    fn test_edges_between_reads() {
        let mut bus = MockBus::new();
        let controller = bus.controller();
        let mut kbd = KeyboardState::open(0);

        controller.press_key(ScanCode::Enter);
        kbd.read(&mut bus).unwrap();
        assert!(kbd.just_pressed(ScanCode::Enter));
        assert_eq!(
            kbd.events().collect::<Vec<_>>(),
            vec![KeyEvent {
                key: ScanCode::Enter,
                kind: KeyEventKind::Pressed
            }]
        );

        // held: no edge
        kbd.read(&mut bus).unwrap();
        assert!(kbd.is_pressed(ScanCode::Enter));
        assert!(!kbd.just_pressed(ScanCode::Enter));

        controller.release_key(ScanCode::Enter);
        controller.press_key(ScanCode::H);
        kbd.read(&mut bus).unwrap();
        assert!(kbd.just_released(ScanCode::Enter));
        assert!(kbd.just_pressed(ScanCode::H));
        assert_eq!(kbd.pressed_edges()[6], 0x10);
        assert_eq!(kbd.released_edges()[6], 0x01);
    }

    #[test]
    fn test_pressed_raw_range() {
        let mut bus = MockBus::new();
        bus.controller().press_key(ScanCode::Key5);
        let mut kbd = KeyboardState::open(0);
        kbd.read(&mut bus).unwrap();

        assert!(kbd.pressed_raw(0x0310).unwrap());
        assert!(!kbd.pressed_raw(0x0301).unwrap());
        assert!(kbd.pressed_raw(0x0801).is_err());
    }

    #[test]
    fn test_upper_data_bits_ignored() {
        let mut bus = MockBus::new();
        // EAR and unused lines reading 0 must not show up as keys
        bus.set_port(keyboard_row_port(0), 0x1F);
        let mut kbd = KeyboardState::open(0);
        kbd.read(&mut bus).unwrap();
        assert_eq!(kbd.rows[0], 0);
    }
}
