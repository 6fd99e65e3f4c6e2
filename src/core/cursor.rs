//! Cursor state
//!
//! The cursor's position within the active area, its pending-wrap flag,
//! and its active style. The style is held both as a value and as the id
//! it was interned under on the cursor's current page; crossing a page
//! boundary re-interns it, since style ids are page-local.

use super::pagelist::PinHandle;
use super::refset::{self, Id};
use super::style::Style;

/// The cursor.
#[derive(Debug)]
pub struct Cursor {
    /// Column within the active area.
    pub x: usize,
    /// Row within the active area.
    pub y: usize,

    /// Set when a character was written into the last column: the next
    /// printable wraps first, but cursor-motion sequences clear the flag
    /// without wrapping.
    pub pending_wrap: bool,

    /// The concrete style value in effect.
    pub style: Style,

    /// The id `style` is interned under on the page the cursor is on.
    /// Zero whenever `style` is the default.
    pub style_id: Id,

    /// The tracked pin following this cursor through page mutations.
    pub pin: PinHandle,
}

impl Cursor {
    pub fn new(pin: PinHandle) -> Self {
        Self {
            x: 0,
            y: 0,
            pending_wrap: false,
            style: Style::default(),
            style_id: refset::DEFAULT_ID,
            pin,
        }
    }

    pub fn has_style(&self) -> bool {
        self.style_id != refset::DEFAULT_ID
    }
}
