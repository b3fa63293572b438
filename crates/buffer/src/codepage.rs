// Chunk: docs/chunks/codepages - OEM, ANSI and UTF-8 decoding
//!
//! Single-byte codepage decoding.
//!
//! Two places need to turn bytes into characters using a legacy codepage:
//! Alt+keypad character entry (which interprets the typed number in the OEM
//! or ANSI codepage) and snapshots of captured process output (which are
//! decoded with the active console input encoding).
//!
//! Only the codepages a US-configured console uses are carried: OEM 437,
//! ANSI 1252 and UTF-8.

/// Text encodings understood by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codepage {
    /// OEM United States (437). Used when the host has no Unicode console.
    Oem437,
    /// ANSI Western European (1252).
    Windows1252,
    /// UTF-8, the default for process output.
    #[default]
    Utf8,
}

/// Glyphs for OEM bytes 0x00-0x1F as the console renders them.
const OEM437_LOW: [char; 32] = [
    '\u{0000}', '☺', '☻', '♥', '♦', '♣', '♠', '•', '◘', '○', '◙', '♂', '♀', '♪', '♫', '☼',
    '►', '◄', '↕', '‼', '¶', '§', '▬', '↨', '↑', '↓', '→', '←', '∟', '↔', '▲', '▼',
];

/// OEM bytes 0x80-0xFF.
const OEM437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// ANSI 1252 bytes 0x80-0x9F. Undefined positions map to the C1 control
/// with the same value, as the system conversion does.
const CP1252_C1: [char; 32] = [
    '€', '\u{0081}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{008D}', 'Ž', '\u{008F}',
    '\u{0090}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{009D}', 'ž', 'Ÿ',
];

impl Codepage {
    /// Decodes one byte of a single-byte codepage. For UTF-8 only ASCII
    /// bytes decode; anything else becomes U+FFFD.
    pub fn decode_byte(self, byte: u8) -> char {
        match self {
            Codepage::Oem437 => match byte {
                0x00..=0x7F => byte as char,
                _ => OEM437_HIGH[(byte - 0x80) as usize],
            },
            Codepage::Windows1252 => match byte {
                0x80..=0x9F => CP1252_C1[(byte - 0x80) as usize],
                _ => byte as char,
            },
            Codepage::Utf8 => {
                if byte.is_ascii() {
                    byte as char
                } else {
                    char::REPLACEMENT_CHARACTER
                }
            }
        }
    }

    /// Decodes a byte stream. Control characters are preserved so captured
    /// output keeps its line structure.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Codepage::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            _ => bytes.iter().map(|&b| self.decode_byte(b)).collect(),
        }
    }

    /// Decodes a byte typed via Alt+keypad entry. Unlike [`Codepage::decode_byte`]
    /// the OEM control range produces the glyphs printed on screen (Alt+1 is ☺).
    pub fn glyph_for_byte(self, byte: u8) -> char {
        match self {
            Codepage::Oem437 if byte < 0x20 => OEM437_LOW[byte as usize],
            Codepage::Oem437 if byte == 0x7F => '⌂',
            _ => self.decode_byte(byte),
        }
    }
}
