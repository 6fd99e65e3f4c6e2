//! Grid cell
//!
//! A single cell in the terminal grid: its content, its width
//! classification, and the id of its style within the owning page's style
//! set. Cells are constructed once with their page and mutated in place.

use serde::{Deserialize, Serialize};

use super::refset::{self, Id};
use super::style::Rgb;

/// The content of a cell.
///
/// `Codepoint(0)` is the empty cell. The background variants are an
/// optimization: a cell that carries only a background color stores it
/// inline and needs no style-set slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellContent {
    Codepoint(u32),
    BgPalette(u8),
    BgRgb(Rgb),
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Codepoint(0)
    }
}

/// Width classification for a cell.
///
/// Characters occupy one or two cells. A wide character is always adjacent
/// to a spacer: the tail fills the column after it, and a head fills the
/// final column of a soft-wrapped row when the wide character itself moved
/// to the next row. Spacers are never rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wide {
    #[default]
    Narrow,
    Wide,
    SpacerTail,
    SpacerHead,
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub content: CellContent,
    pub wide: Wide,
    /// Id into the owning page's style set; zero is the default style.
    pub style_id: Id,
}

impl Cell {
    pub fn from_content(content: CellContent) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    /// The codepoint stored in this cell, zero for empty and
    /// background-only cells.
    pub fn codepoint(&self) -> u32 {
        match self.content {
            CellContent::Codepoint(cp) => cp,
            _ => 0,
        }
    }

    /// The width in grid cells.
    pub fn width(&self) -> usize {
        match self.wide {
            Wide::Wide => 2,
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content == CellContent::Codepoint(0)
    }

    /// True if this cell has text to render. Background-only cells and
    /// empty cells do not.
    pub fn has_text(&self) -> bool {
        match self.content {
            CellContent::Codepoint(cp) => cp != 0,
            CellContent::BgPalette(_) | CellContent::BgRgb(_) => false,
        }
    }

    pub fn has_style(&self) -> bool {
        self.style_id != refset::DEFAULT_ID
    }
}

/// True if any of the cells has text.
pub fn has_text_any(cells: &[Cell]) -> bool {
    cells.iter().any(Cell::has_text)
}
