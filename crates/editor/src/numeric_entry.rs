// Chunk: docs/chunks/numeric_entry - Alt+keypad character entry
//!
//! Alt+numeric-keypad character entry.
//!
//! While Alt is held, digits typed on the keypad (or the main row) build up
//! a decimal number. When Alt is released the number becomes a character:
//!
//! - `Alt+65` is interpreted in the OEM codepage (`A`; `Alt+1` is `☺`)
//! - a leading zero, `Alt+0233`, selects the ANSI codepage (`é`)
//! - values above 255 are Unicode code points (`Alt+8364` is `€`)

use conline_buffer::Codepage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericMode {
    #[default]
    Oem,
    Ansi,
    Unicode,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumericEntry {
    accumulator: u32,
    mode: NumericMode,
    digits: u32,
}

impl NumericEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self) -> u32 {
        self.accumulator
    }

    pub fn mode(&self) -> NumericMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.digits > 0
    }

    /// Adds a typed digit.
    pub fn push_digit(&mut self, digit: u8) {
        if self.digits == 0 && digit == 0 {
            self.mode = NumericMode::Ansi;
        }
        self.digits += 1;
        let Some(value) = self
            .accumulator
            .checked_mul(10)
            .and_then(|v| v.checked_add(u32::from(digit)))
        else {
            return;
        };
        if value > char::MAX as u32 {
            return;
        }
        self.accumulator = value;
        if value > 0xFF {
            self.mode = NumericMode::Unicode;
        }
    }

    /// Converts the accumulated number into a character and resets. Returns
    /// `None` when nothing (or zero) was entered or the value is not a
    /// character.
    pub fn finish(&mut self) -> Option<char> {
        let value = self.accumulator;
        let mode = self.mode;
        *self = Self::default();
        if value == 0 {
            return None;
        }
        match mode {
            NumericMode::Oem => Some(Codepage::Oem437.glyph_for_byte(value as u8)),
            NumericMode::Ansi => Some(Codepage::Windows1252.decode_byte(value as u8)),
            NumericMode::Unicode => char::from_u32(value),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
