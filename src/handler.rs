//! Handler contracts
//!
//! The capability interfaces the stream driver dispatches into, grouped
//! the way the control functions group: printing, editor operations,
//! format effectors, graphic rendition, mode setting, and the string
//! sequences (OSC/DCS). A handler implements the groups it supports;
//! every method has a default that logs the sequence as unimplemented and
//! drops it, so partial handlers degrade gracefully.

use log::warn;

use crate::core::modes::Mode;
use crate::parser::actions::{DcsCommand, EdMode, ElMode};
use crate::parser::sgr::Attribute;

/// Printable output.
pub trait PrintHandler {
    /// Print one codepoint at the cursor.
    fn print(&mut self, cp: u32) {
        warn!("unimplemented print u+{cp:04x}");
    }
}

/// Cursor movement and content editing.
pub trait EditorHandler {
    /// Move the cursor left one column, stopping at the margin.
    fn backspace(&mut self) {
        warn!("unimplemented backspace");
    }

    /// Move the cursor to the left margin of the current line.
    fn carriage_return(&mut self) {
        warn!("unimplemented carriage return");
    }

    /// Move the cursor to the next line, scrolling at the bottom.
    fn line_feed(&mut self) {
        warn!("unimplemented line feed");
    }

    /// Move the cursor to a 1-indexed row, keeping the column.
    fn set_cursor_row(&mut self, row: u16) {
        warn!("unimplemented set cursor row {row}");
    }

    /// Move the cursor to a 1-indexed column, keeping the row.
    fn set_cursor_col(&mut self, col: u16) {
        warn!("unimplemented set cursor col {col}");
    }

    /// Move the cursor to a 1-indexed row and column.
    fn set_cursor_position(&mut self, row: u16, col: u16) {
        warn!("unimplemented set cursor position {row};{col}");
    }

    /// Move the cursor up; optionally carriage-return afterwards.
    fn set_cursor_up(&mut self, n: u16, carriage: bool) {
        warn!("unimplemented cursor up {n} carriage={carriage}");
    }

    /// Move the cursor down; optionally carriage-return afterwards.
    fn set_cursor_down(&mut self, n: u16, carriage: bool) {
        warn!("unimplemented cursor down {n} carriage={carriage}");
    }

    /// Move the cursor left.
    fn set_cursor_left(&mut self, n: u16) {
        warn!("unimplemented cursor left {n}");
    }

    /// Move the cursor right.
    fn set_cursor_right(&mut self, n: u16) {
        warn!("unimplemented cursor right {n}");
    }

    /// Advance to the nth following tab stop.
    fn set_cursor_tab_right(&mut self, n: u16) {
        warn!("unimplemented tab right {n}");
    }

    /// Step back to the nth preceding tab stop.
    fn set_cursor_tab_left(&mut self, n: u16) {
        warn!("unimplemented tab left {n}");
    }

    /// Insert blank cells at the cursor, shifting the rest right.
    fn insert_blanks(&mut self, n: u16) {
        warn!("unimplemented insert blanks {n}");
    }

    /// Delete cells at the cursor, shifting the rest left.
    fn delete_chars(&mut self, n: u16) {
        warn!("unimplemented delete chars {n}");
    }

    /// Insert blank lines at the cursor row.
    fn insert_lines(&mut self, n: u16) {
        warn!("unimplemented insert lines {n}");
    }

    /// Delete lines at the cursor row.
    fn delete_lines(&mut self, n: u16) {
        warn!("unimplemented delete lines {n}");
    }

    /// Erase within the cursor line.
    fn erase_in_line(&mut self, mode: ElMode) {
        warn!("unimplemented erase in line {mode:?}");
    }

    /// Erase within the display.
    fn erase_in_display(&mut self, mode: EdMode) {
        warn!("unimplemented erase in display {mode:?}");
    }

    /// DECSTBM: set the scrolling region's top and bottom margins.
    fn set_top_and_bottom_margin(&mut self, top: u16, bottom: u16) {
        warn!("unimplemented set margins {top};{bottom}");
    }
}

/// The ESC-dispatched format effectors.
pub trait FormatEffectorHandler {
    /// NEL: first column of the next line.
    fn next_line(&mut self) {
        warn!("unimplemented next line");
    }

    /// IND: down one line, scrolling at the region bottom.
    fn index(&mut self) {
        warn!("unimplemented index");
    }

    /// RI: up one line, scrolling at the region top.
    fn reverse_index(&mut self) {
        warn!("unimplemented reverse index");
    }

    /// HTS: set a tab stop at the cursor column.
    fn tab_set(&mut self) {
        warn!("unimplemented tab set");
    }

    /// RIS: reset the terminal to power-on state.
    fn full_reset(&mut self) {
        warn!("unimplemented full reset");
    }
}

/// Graphic rendition.
pub trait SgrHandler {
    fn set_graphics_rendition(&mut self, attr: &Attribute) {
        warn!("unimplemented SGR attribute {attr:?}");
    }
}

/// Mode setting (SM/RM).
pub trait ModeHandler {
    fn set_mode(&mut self, mode: Mode, enabled: bool) {
        warn!("unimplemented set mode {mode:?}={enabled}");
    }
}

/// OSC strings. Payloads arrive opaque; interpretation is the handler's
/// concern.
pub trait OscHandler {
    fn osc_dispatch(&mut self, payload: &[u8]) {
        warn!("unimplemented OSC dispatch ({} bytes)", payload.len());
    }
}

/// DCS sequences: a hook with the header, payload bytes, and an unhook.
pub trait DcsHandler {
    fn dcs_hook(&mut self, command: &DcsCommand) {
        warn!("unimplemented DCS hook {command:?}");
    }

    fn dcs_put(&mut self, byte: u8) {
        let _ = byte;
    }

    fn dcs_unhook(&mut self) {}
}

/// The full contract the stream driver drives.
pub trait Handler:
    PrintHandler
    + EditorHandler
    + FormatEffectorHandler
    + SgrHandler
    + ModeHandler
    + OscHandler
    + DcsHandler
{
}

impl<T> Handler for T where
    T: PrintHandler
        + EditorHandler
        + FormatEffectorHandler
        + SgrHandler
        + ModeHandler
        + OscHandler
        + DcsHandler
{
}
