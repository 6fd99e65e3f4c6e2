//! Cell styling
//!
//! The style value attached to cells: boolean attributes, an underline
//! variant, and the three colors (foreground, background, underline). Styles
//! are interned per page through a [`RefCountedSet`](super::refset), so the
//! type is a plain value with structural equality and a stable hash.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellContent};

/// A 24-bit RGB color.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A color as carried by a style: unset, one of the 256 palette slots, or a
/// direct RGB value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Color {
    #[default]
    None,
    Palette(u8),
    Rgb(Rgb),
}

/// Underline rendition variants.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// The style for a cell.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub underline_color: Color,

    pub bold: bool,
    pub italic: bool,
    pub faint: bool,
    pub blink: bool,
    pub inverse: bool,
    pub invisible: bool,
    pub strikethrough: bool,
    pub overline: bool,
    pub underline: UnderlineStyle,
}

impl Style {
    /// True if this is the default style, which never occupies a slot in a
    /// page's style set.
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }

    pub fn reset(&mut self) {
        *self = Style::default();
    }

    /// The background-color-only cell for this style, if it has a
    /// background. Such cells carry their color inline so they need no
    /// style-set slot.
    pub fn bg_cell(&self) -> Option<Cell> {
        match self.bg {
            Color::None => None,
            Color::Palette(idx) => Some(Cell::from_content(CellContent::BgPalette(idx))),
            Color::Rgb(rgb) => Some(Cell::from_content(CellContent::BgRgb(rgb))),
        }
    }
}

/// The 256-entry terminal palette.
pub type Palette = [Rgb; 256];

/// Build the default palette: 16 named colors, the 6x6x6 cube, and the
/// grayscale ramp.
pub fn default_palette() -> Palette {
    let mut palette = [Rgb::default(); 256];

    const NAMED: [Rgb; 16] = [
        Rgb { r: 0x1D, g: 0x1F, b: 0x21 }, // black
        Rgb { r: 0xCC, g: 0x66, b: 0x66 }, // red
        Rgb { r: 0xB5, g: 0xBD, b: 0x68 }, // green
        Rgb { r: 0xF0, g: 0xC6, b: 0x74 }, // yellow
        Rgb { r: 0x81, g: 0xA2, b: 0xBE }, // blue
        Rgb { r: 0xB2, g: 0x94, b: 0xC7 }, // magenta
        Rgb { r: 0x8C, g: 0xC3, b: 0xE9 }, // cyan
        Rgb { r: 0xC5, g: 0xC8, b: 0xC6 }, // white
        Rgb { r: 0x7C, g: 0x7C, b: 0x7C }, // bright black
        Rgb { r: 0xFF, g: 0x8F, b: 0x8F }, // bright red
        Rgb { r: 0xB5, g: 0xBD, b: 0x68 }, // bright green
        Rgb { r: 0xF0, g: 0xC6, b: 0x74 }, // bright yellow
        Rgb { r: 0x81, g: 0xA2, b: 0xBE }, // bright blue
        Rgb { r: 0xB2, g: 0x94, b: 0xC7 }, // bright magenta
        Rgb { r: 0x8C, g: 0xC3, b: 0xE9 }, // bright cyan
        Rgb { r: 0xFF, g: 0xFF, b: 0xFF }, // bright white
    ];
    palette[..16].copy_from_slice(&NAMED);

    let mut i = 16;
    for r in 0u8..6 {
        for g in 0u8..6 {
            for b in 0u8..6 {
                let level = |v: u8| if v == 0 { 0 } else { v * 40 + 55 };
                palette[i] = Rgb::new(level(r), level(g), level(b));
                i += 1;
            }
        }
    }

    for step in 0u8..24 {
        let value = step * 10 + 8;
        palette[i] = Rgb::new(value, value, value);
        i += 1;
    }
    debug_assert_eq!(i, 256);

    palette
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_default() {
        let style = Style::default();
        assert!(style.is_default());

        let mut styled = Style::default();
        styled.bold = true;
        assert!(!styled.is_default());
    }

    #[test]
    fn test_reset() {
        let mut style = Style {
            bold: true,
            fg: Color::Rgb(Rgb::new(1, 2, 3)),
            ..Default::default()
        };
        style.reset();
        assert!(style.is_default());
    }

    #[test]
    fn test_bg_cell() {
        let style = Style::default();
        assert!(style.bg_cell().is_none());

        let style = Style {
            bg: Color::Rgb(Rgb::new(10, 20, 30)),
            ..Default::default()
        };
        let cell = style.bg_cell().unwrap();
        assert_eq!(cell.content, CellContent::BgRgb(Rgb::new(10, 20, 30)));
        assert!(!cell.has_text());

        let style = Style {
            bg: Color::Palette(4),
            ..Default::default()
        };
        let cell = style.bg_cell().unwrap();
        assert_eq!(cell.content, CellContent::BgPalette(4));
    }

    #[test]
    fn test_palette_layout() {
        let palette = default_palette();
        // Cube corners
        assert_eq!(palette[16], Rgb::new(0, 0, 0));
        assert_eq!(palette[231], Rgb::new(255, 255, 255));
        // Grayscale ramp ends
        assert_eq!(palette[232], Rgb::new(8, 8, 8));
        assert_eq!(palette[255], Rgb::new(238, 238, 238));
    }

    #[test]
    fn test_equal_styles_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = Style {
            bold: true,
            underline: UnderlineStyle::Curly,
            fg: Color::Palette(3),
            ..Default::default()
        };
        let b = a;

        let hash = |s: &Style| {
            let mut h = DefaultHasher::new();
            s.hash(&mut h);
            h.finish()
        };
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
    }
}
