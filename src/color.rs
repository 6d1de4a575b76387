//! Terminal color representation
//!
//! Supports:
//! - Named 16-color palette (standard ANSI colors)
//! - 256-color indexed palette
//! - 24-bit true color (RGB)
//! - Color registers for sixel graphics

use serde::{Deserialize, Serialize};

/// Represents a terminal color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Default foreground or background color
    Default,
    /// Named color from the 16-color palette (0-15)
    Named(NamedColor),
    /// 256-color palette index (0-255)
    Indexed(u8),
    /// 24-bit RGB color
    Rgb(Rgb),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

/// Named colors from the standard 16-color ANSI palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// Convert from SGR color code (30-37 for fg, 40-47 for bg)
    pub fn from_sgr_normal(code: u8) -> Option<Self> {
        match code {
            0 => Some(NamedColor::Black),
            1 => Some(NamedColor::Red),
            2 => Some(NamedColor::Green),
            3 => Some(NamedColor::Yellow),
            4 => Some(NamedColor::Blue),
            5 => Some(NamedColor::Magenta),
            6 => Some(NamedColor::Cyan),
            7 => Some(NamedColor::White),
            _ => None,
        }
    }

    /// Convert from SGR bright color code (90-97 for fg, 100-107 for bg)
    pub fn from_sgr_bright(code: u8) -> Option<Self> {
        match code {
            0 => Some(NamedColor::BrightBlack),
            1 => Some(NamedColor::BrightRed),
            2 => Some(NamedColor::BrightGreen),
            3 => Some(NamedColor::BrightYellow),
            4 => Some(NamedColor::BrightBlue),
            5 => Some(NamedColor::BrightMagenta),
            6 => Some(NamedColor::BrightCyan),
            7 => Some(NamedColor::BrightWhite),
            _ => None,
        }
    }

    /// Get the index in the 256-color palette
    pub fn to_index(self) -> u8 {
        self as u8
    }
}

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// 32-bit RGBA color, used for sixel image backgrounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }
}

impl From<Rgb> for Rgba {
    fn from(c: Rgb) -> Self {
        Rgba::new(c.r, c.g, c.b, 0xFF)
    }
}

/// Default VT340 sixel color registers (indices 0-15)
const VT340_COLORS: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(51, 51, 204),
    Rgb::new(204, 36, 36),
    Rgb::new(51, 204, 51),
    Rgb::new(204, 51, 204),
    Rgb::new(51, 204, 204),
    Rgb::new(204, 204, 51),
    Rgb::new(135, 135, 135),
    Rgb::new(66, 66, 66),
    Rgb::new(84, 84, 153),
    Rgb::new(153, 66, 66),
    Rgb::new(84, 153, 84),
    Rgb::new(153, 84, 153),
    Rgb::new(84, 153, 153),
    Rgb::new(153, 153, 84),
    Rgb::new(204, 204, 204),
];

/// A set of color registers, shared between the sequencer and sixel parsers.
///
/// Registers 0-15 start out with the VT340 defaults; the rest are black until
/// a sixel color definition overwrites them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Create a palette with `registers` color slots
    pub fn with_registers(registers: usize) -> Self {
        let mut colors = vec![Rgb::new(0, 0, 0); registers];
        for (i, color) in VT340_COLORS.iter().enumerate().take(registers) {
            colors[i] = *color;
        }
        Palette { colors }
    }

    /// Number of color registers
    pub fn registers(&self) -> usize {
        self.colors.len()
    }

    /// Read a register; out-of-range indices read as black
    pub fn color(&self, index: usize) -> Rgb {
        self.colors.get(index).copied().unwrap_or(Rgb::new(0, 0, 0))
    }

    /// Write a register; out-of-range indices are ignored
    pub fn set_color(&mut self, index: usize, color: Rgb) {
        if let Some(slot) = self.colors.get_mut(index) {
            *slot = color;
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::with_registers(256)
    }
}
