//! Screen coordinates
//!
//! A bare `(x, y)` is ambiguous in a terminal with scrollback: it could be
//! relative to the viewport, the active area, the full screen, or the
//! history. A [`Point`] pairs the coordinate with the [`Tag`] that anchors
//! it.

use serde::{Deserialize, Serialize};

/// The reference frame for a point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum Tag {
    /// The visible viewport. Scrolling moves this frame.
    Viewport,

    /// The active area the running program can address. Unlike the other
    /// frames its bottom-right covers the full screen height, including
    /// rows that were never written.
    Active,

    /// Everything: from the oldest scrollback row to the last written row.
    Screen,

    /// Scrollback only: from the oldest row to the row just above the
    /// active area.
    History,
}

/// An x/y coordinate anchored to a reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub tag: Tag,
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(tag: Tag, x: usize, y: usize) -> Self {
        Self { tag, x, y }
    }

    /// Top-left of the given frame.
    pub fn origin(tag: Tag) -> Self {
        Self { tag, x: 0, y: 0 }
    }
}
