// Chunk: docs/chunks/console_attributes - Console colour attributes
//!
//! Console cell attributes.
//!
//! A console cell carries a foreground and a background colour drawn from
//! the 16-entry console palette, packed into one byte: the low nibble is
//! the foreground and the high nibble the background. Bit 3 of each nibble
//! is the intensity bit.
//!
//! The palette index order is the console's (blue = 1, red = 4), which is
//! not the ANSI order (red = 1, blue = 4). [`ConsoleColor::ansi_index`]
//! converts between the two when generating escape sequences.

use std::fmt;

// =============================================================================
// Palette
// =============================================================================

/// The 16 console palette entries, in console index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleColor {
    Black,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Brown,
    Gray,
    DarkGray,
    BrightBlue,
    BrightGreen,
    BrightCyan,
    BrightRed,
    BrightMagenta,
    Yellow,
    White,
}

const PALETTE: [ConsoleColor; 16] = [
    ConsoleColor::Black,
    ConsoleColor::Blue,
    ConsoleColor::Green,
    ConsoleColor::Cyan,
    ConsoleColor::Red,
    ConsoleColor::Magenta,
    ConsoleColor::Brown,
    ConsoleColor::Gray,
    ConsoleColor::DarkGray,
    ConsoleColor::BrightBlue,
    ConsoleColor::BrightGreen,
    ConsoleColor::BrightCyan,
    ConsoleColor::BrightRed,
    ConsoleColor::BrightMagenta,
    ConsoleColor::Yellow,
    ConsoleColor::White,
];

/// Legacy console palette RGB values, in console index order.
const PALETTE_RGB: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00),
    (0x00, 0x00, 0x80),
    (0x00, 0x80, 0x00),
    (0x00, 0x80, 0x80),
    (0x80, 0x00, 0x00),
    (0x80, 0x00, 0x80),
    (0x80, 0x80, 0x00),
    (0xC0, 0xC0, 0xC0),
    (0x80, 0x80, 0x80),
    (0x00, 0x00, 0xFF),
    (0x00, 0xFF, 0x00),
    (0x00, 0xFF, 0xFF),
    (0xFF, 0x00, 0x00),
    (0xFF, 0x00, 0xFF),
    (0xFF, 0xFF, 0x00),
    (0xFF, 0xFF, 0xFF),
];

impl ConsoleColor {
    /// Looks up a palette entry by console index (only the low 4 bits are used).
    pub fn from_index(index: u8) -> Self {
        PALETTE[(index & 0x0F) as usize]
    }

    /// The console palette index of this colour.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_intense(self) -> bool {
        self.index() & 0x08 != 0
    }

    /// The ANSI colour number (0-7) for this colour, ignoring intensity.
    /// Console order is BGR, ANSI order is RGB, so bits 0 and 2 swap.
    pub fn ansi_index(self) -> u8 {
        let i = self.index();
        ((i & 0x01) << 2) | (i & 0x02) | ((i & 0x04) >> 2)
    }

    /// Inverse of [`ConsoleColor::ansi_index`] plus an intensity flag.
    pub fn from_ansi(ansi: u8, intense: bool) -> Self {
        let a = ansi & 0x07;
        let console = ((a & 0x01) << 2) | (a & 0x02) | ((a & 0x04) >> 2);
        Self::from_index(console | if intense { 0x08 } else { 0 })
    }

    /// SGR parameter selecting this colour as foreground.
    pub fn sgr_foreground(self) -> u8 {
        if self.is_intense() {
            90 + self.ansi_index()
        } else {
            30 + self.ansi_index()
        }
    }

    /// SGR parameter selecting this colour as background.
    pub fn sgr_background(self) -> u8 {
        if self.is_intense() {
            100 + self.ansi_index()
        } else {
            40 + self.ansi_index()
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        PALETTE_RGB[self.index() as usize]
    }

    /// CSS hex form, e.g. `#c0c0c0`.
    pub fn html_hex(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// A packed console cell attribute (background high nibble, foreground low
/// nibble).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attr(pub u8);

impl Attr {
    /// Grey on black.
    pub const DEFAULT: Attr = Attr(0x07);
    /// Blue background with bright yellow foreground, used for selections
    /// when the console has no popup colours configured.
    pub const SELECTION_FALLBACK: Attr = Attr(0x1E);

    const FOREGROUND_INTENSITY: u8 = 0x08;

    pub fn new(fg: ConsoleColor, bg: ConsoleColor) -> Self {
        Attr((bg.index() << 4) | fg.index())
    }

    pub fn fg(self) -> ConsoleColor {
        ConsoleColor::from_index(self.0 & 0x0F)
    }

    pub fn bg(self) -> ConsoleColor {
        ConsoleColor::from_index(self.0 >> 4)
    }

    pub fn with_fg(self, fg: ConsoleColor) -> Self {
        Attr((self.0 & 0xF0) | fg.index())
    }

    pub fn with_bg(self, bg: ConsoleColor) -> Self {
        Attr((self.0 & 0x0F) | (bg.index() << 4))
    }

    /// The attribute for inline suggestions: the default background with an
    /// intensity-only (dark grey) foreground.
    pub fn suggestion(default: Attr) -> Self {
        Attr((default.0 & 0xF0) | Self::FOREGROUND_INTENSITY)
    }

    /// SGR escape sequence selecting this attribute, e.g. `ESC[0;37;40m`.
    pub fn to_sgr(self) -> String {
        format!(
            "\x1b[0;{};{}m",
            self.fg().sgr_foreground(),
            self.bg().sgr_background()
        )
    }
}

impl Default for Attr {
    fn default() -> Self {
        Attr::DEFAULT
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attr({:#04x})", self.0)
    }
}
