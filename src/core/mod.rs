//! Terminal core
//!
//! The platform-independent screen model:
//! - Paged cell storage with scrollback ([`page`], [`pagelist`])
//! - Cells, rows, and styles ([`cell`], [`row`], [`style`], [`refset`])
//! - The screen and its cursor ([`screen`], [`cursor`])
//! - Modes, tab stops, and coordinate frames ([`modes`], [`tabstops`],
//!   [`point`])

pub mod bitset;
pub mod cell;
pub mod cursor;
pub mod modes;
pub mod page;
pub mod pagelist;
pub mod point;
pub mod refset;
pub mod row;
pub mod screen;
pub mod style;
pub mod tabstops;

pub use bitset::BitSet;
pub use cell::{Cell, CellContent, Wide};
pub use cursor::Cursor;
pub use modes::{Mode, ModeState};
pub use page::{Capacity, Page, PageError, Size, STANDARD_CAPACITY};
pub use pagelist::{Direction, NodeId, PageIterator, PageList, Pin, PinHandle, Viewport};
pub use point::{Point, Tag};
pub use refset::RefCountedSet;
pub use row::{Row, SemanticPrompt};
pub use screen::Screen;
pub use style::{default_palette, Color, Palette, Rgb, Style, UnderlineStyle};
pub use tabstops::{Tabstops, TABSTOP_INTERVAL};
