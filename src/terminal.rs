//! Terminal state engine
//!
//! The terminal owns a screen and layers the VT semantics on top of it:
//! printing with wide-character and wrap handling, cursor addressing under
//! origin mode and the scrolling region, line and character insertion and
//! deletion, erase operations, tab stops, and modes. The stream driver
//! calls into this type through the handler traits.

use std::fmt::Write;

use log::warn;
use unicode_width::UnicodeWidthChar;

use crate::core::cell::{CellContent, Wide};
use crate::core::modes::{Mode, ModeState};
use crate::core::point::{Point, Tag};
use crate::core::row::SemanticPrompt;
use crate::core::screen::Screen;
use crate::core::tabstops::{Tabstops, TABSTOP_INTERVAL};
use crate::parser::actions::{EdMode, ElMode};
use crate::parser::sgr::Attribute;

/// The sub-area of the active viewport in which Index and Reverse Index
/// scroll instead of moving the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollingRegion {
    /// Top and bottom rows, 0-indexed, top <= bottom.
    pub top: usize,
    pub bottom: usize,
    /// Left and right columns, 0-indexed, left <= right <= cols - 1.
    pub left: usize,
    pub right: usize,
}

/// Construction options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub cols: usize,
    pub rows: usize,
    /// Initial mode state; power-on defaults when `None`.
    pub modes: Option<ModeState>,
}

/// The terminal.
#[derive(Debug)]
pub struct Terminal {
    pub screen: Screen,

    rows: usize,
    cols: usize,

    pub modes: ModeState,

    tabstops: Tabstops,
    scrolling_region: ScrollingRegion,

    /// The last printed codepoint, for repeat-previous-character.
    previous_char: Option<u32>,

    /// Working directory as reported by the running program.
    pwd: String,
}

impl Terminal {
    pub fn new(opts: Options) -> Self {
        assert!(opts.cols > 0 && opts.rows > 0, "terminal needs a nonzero size");
        Self {
            screen: Screen::new(opts.cols, opts.rows),
            rows: opts.rows,
            cols: opts.cols,
            modes: opts.modes.unwrap_or_default(),
            tabstops: Tabstops::new(opts.cols, TABSTOP_INTERVAL),
            scrolling_region: ScrollingRegion {
                top: 0,
                bottom: opts.rows - 1,
                left: 0,
                right: opts.cols - 1,
            },
            previous_char: None,
            pwd: String::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn scrolling_region(&self) -> ScrollingRegion {
        self.scrolling_region
    }

    pub fn previous_char(&self) -> Option<u32> {
        self.previous_char
    }

    // ------------------------------------------------------------------
    // Printing

    /// Print one codepoint at the cursor.
    pub fn print(&mut self, cp: u32) {
        // The right margin for this print depends on which side of the
        // scrolling region the cursor is on.
        let right_limit = if self.screen.cursor.x > self.scrolling_region.right {
            self.cols
        } else {
            self.scrolling_region.right + 1
        };

        // Byte-sized codepoints are overwhelmingly common and always
        // narrow; control characters never reach here.
        let width = if cp <= 0xFF {
            1
        } else {
            char::from_u32(cp).and_then(|ch| ch.width()).unwrap_or(1)
        };
        assert!(width <= 2);

        if width == 0 {
            // Combining marks and other zero-width content would need
            // grapheme support.
            warn!("dropping zero-width codepoint u+{cp:04x}");
            return;
        }
        self.previous_char = Some(cp);

        if self.screen.cursor.pending_wrap && self.modes.get(Mode::Wraparound) {
            self.print_wrap();
        }

        if self.modes.get(Mode::Insert) && self.screen.cursor.x + width < self.cols {
            self.insert_blanks(width);
        }

        match width {
            1 => {
                self.screen.cursor_mark_dirty();
                self.print_cell(cp, Wide::Narrow);
            }
            2 => {
                if right_limit - self.scrolling_region.left > 1 {
                    if self.screen.cursor.x == right_limit - 1 {
                        // One column remains. Without autowrap the
                        // character simply does not fit and is dropped.
                        if !self.modes.get(Mode::Wraparound) {
                            return;
                        }
                        // At the true screen edge a spacer head records
                        // that the character continued on the next row.
                        if right_limit == self.cols {
                            self.print_cell(0, Wide::SpacerHead);
                        } else {
                            self.print_cell(0, Wide::Narrow);
                        }
                        self.print_wrap();
                    }

                    self.screen.cursor_mark_dirty();
                    self.print_cell(cp, Wide::Wide);
                    self.screen.set_cursor_right(1);
                    self.print_cell(0, Wide::SpacerTail);
                } else {
                    // A one-column region cannot hold a wide character;
                    // degrade to narrow rather than corrupt the grid.
                    self.screen.cursor_mark_dirty();
                    self.print_cell(cp, Wide::Narrow);
                }
            }
            _ => unreachable!(),
        }

        // The cursor now rests on the last cell written. If that is the
        // final column of the region, wrapping becomes pending and the
        // cursor stays put.
        if self.screen.cursor.x + 1 == right_limit {
            self.screen.cursor.pending_wrap = true;
        } else {
            self.screen.set_cursor_right(1);
        }

        self.screen.assert_integrity();
    }

    /// Perform the deferred soft wrap: mark the row, move to the next
    /// line's left margin, and tag the new row as a continuation.
    fn print_wrap(&mut self) {
        // Only a wrap at the true screen edge marks the row soft-wrapped;
        // wraps forced by a right margin do not.
        let mark_wrap = self.screen.cursor.x == self.cols - 1;
        if mark_wrap {
            self.screen.cursor_row_mut().wrap = true;
        }

        // The continuation row inherits the semantic prompt class. Read it
        // before index() shuffles memory.
        let old_prompt = self.screen.cursor_row().semantic_prompt;

        self.index();
        self.screen
            .set_cursor_horizontal_abs(self.scrolling_region.left);

        if mark_wrap {
            let row = self.screen.cursor_row_mut();
            row.semantic_prompt = old_prompt;
            row.wrap_continuation = true;
        }

        self.screen.assert_integrity();
    }

    /// Write a cell at the cursor, maintaining the wide/spacer pairing and
    /// the style reference counts.
    fn print_cell(&mut self, cp: u32, wide: Wide) {
        let cursor_x = self.screen.cursor.x;
        let cursor_y = self.screen.cursor.y;
        let pin = self.screen.cursor_pin();
        let existing = *self.screen.cursor_cell();

        // Overwriting part of a wide pair must clear the other half so no
        // orphaned head, tail, or spacer survives.
        if existing.wide != wide {
            match existing.wide {
                Wide::Narrow | Wide::SpacerHead => {}
                Wide::Wide => {
                    if cursor_x < self.cols - 1 {
                        self.screen
                            .clear_cells(pin.node, pin.y, cursor_x + 1, cursor_x + 2);
                    }
                    if cursor_y > 0 && cursor_x <= 1 {
                        self.clear_previous_row_spacer_head();
                    }
                }
                Wide::SpacerTail => {
                    assert!(cursor_x > 0);
                    self.screen
                        .clear_cells(pin.node, pin.y, cursor_x - 1, cursor_x);
                    if cursor_y > 0 && cursor_x <= 1 {
                        self.clear_previous_row_spacer_head();
                    }
                }
            }
        }

        let style_id = self.screen.cursor.style_id;
        let style_changed = existing.style_id != style_id;

        if style_changed && existing.has_style() {
            debug_assert!(self.screen.cursor_row().styled);
            self.screen
                .pages
                .page_mut(pin.node)
                .styles
                .release(existing.style_id);
        }

        {
            let cell = self.screen.cursor_cell_mut();
            cell.content = CellContent::Codepoint(cp);
            cell.style_id = style_id;
            cell.wide = wide;
        }

        if style_changed && style_id != crate::core::refset::DEFAULT_ID {
            self.screen
                .pages
                .page_mut(pin.node)
                .styles
                .use_ref(style_id);
            self.screen.cursor_row_mut().styled = true;
        }
    }

    /// Demote a spacer head at the end of the previous row to narrow, for
    /// when the wide character it introduced is overwritten.
    fn clear_previous_row_spacer_head(&mut self) {
        let Some((node, x, y)) = self.screen.cursor_cell_end_of_previous() else {
            return;
        };
        let cell = self.screen.pages.page_mut(node).cell_mut(x, y);
        if cell.wide == Wide::SpacerHead {
            cell.wide = Wide::Narrow;
        }
    }

    // ------------------------------------------------------------------
    // Line movement

    /// Move the cursor back one column, stopping at the margin.
    pub fn backspace(&mut self) {
        self.set_cursor_left(1);
    }

    /// Move the cursor to the left margin of the current row.
    pub fn carriage_return(&mut self) {
        self.screen.cursor.pending_wrap = false;

        let x = if self.modes.get(Mode::Origin) {
            self.scrolling_region.left
        } else if self.screen.cursor.x >= self.scrolling_region.left {
            self.scrolling_region.left
        } else {
            0
        };
        self.screen.set_cursor_horizontal_abs(x);
    }

    /// Move the cursor to the next line; with the line-feed mode also to
    /// the left margin.
    pub fn line_feed(&mut self) {
        self.index();
        if self.modes.get(Mode::LineFeed) {
            self.carriage_return();
        }
    }

    /// Index: move the cursor down one line, scrolling when it sits on the
    /// bottom of the scrolling region. Clears pending wrap, never wraps.
    pub fn index(&mut self) {
        self.screen.cursor.pending_wrap = false;

        let cursor_y = self.screen.cursor.y;
        let region = self.scrolling_region;

        // Outside the scrolling region the cursor just moves, pinned to
        // the screen edge.
        if cursor_y < region.top || cursor_y > region.bottom {
            if cursor_y < self.rows - 1 {
                self.screen.set_cursor_down(1);
            }
            return;
        }

        if cursor_y == region.bottom
            && self.screen.cursor.x >= region.left
            && self.screen.cursor.x <= region.right
        {
            // Scrolling the full screen creates scrollback.
            if region.top == 0 && region.left == 0 && region.right == self.cols - 1 {
                self.screen.set_cursor_scroll_up();
                return;
            }

            // A partial region scrolls in place: the region's top row is
            // erased and the rows below it shift up within the region.
            let before = self.screen.cursor_pin();
            self.screen.pages.erase_rows_bounded(
                Point::new(Tag::Active, 0, region.top),
                region.bottom - region.top,
            );
            // The cursor sat on the region's bottom row, which is the
            // blank at the end of the erase window, so its pin held still.
            debug_assert_eq!(self.screen.cursor_pin(), before);

            // The erase may have pruned our style entry.
            self.screen.manual_style_update();
            return;
        }

        if cursor_y < region.bottom {
            self.screen.set_cursor_down(1);
        }
    }

    /// Reverse index: move the cursor up one line, scrolling down when it
    /// sits on the top of the scrolling region.
    pub fn reverse_index(&mut self) {
        let region = self.scrolling_region;
        if self.screen.cursor.y != region.top
            || self.screen.cursor.x < region.left
            || self.screen.cursor.x > region.right
        {
            self.set_cursor_up(1, false);
            return;
        }
        self.cursor_scroll_down(1);
    }

    /// Move to the first column of the next line.
    pub fn next_line(&mut self) {
        self.index();
        self.carriage_return();
    }

    /// Scroll the region's text down `n` rows without moving the cursor.
    fn cursor_scroll_down(&mut self, n: usize) {
        let (old_x, old_y) = (self.screen.cursor.x, self.screen.cursor.y);
        let old_wrap = self.screen.cursor.pending_wrap;

        self.screen
            .set_cursor_abs(self.scrolling_region.left, self.scrolling_region.top);
        self.insert_lines(n);

        self.screen.set_cursor_abs(old_x, old_y);
        self.screen.cursor.pending_wrap = old_wrap;
    }

    // ------------------------------------------------------------------
    // Cursor addressing

    /// Move the cursor to a 1-indexed row/column. Zero normalizes to one;
    /// out-of-range values clamp. With origin mode the coordinates are
    /// relative to the scrolling region.
    pub fn set_cursor_position(&mut self, row: u16, col: u16) {
        struct Frame {
            x_offset: usize,
            y_offset: usize,
            x_max: usize,
            y_max: usize,
        }
        let frame = if self.modes.get(Mode::Origin) {
            Frame {
                x_offset: self.scrolling_region.left,
                y_offset: self.scrolling_region.top,
                x_max: self.scrolling_region.right + 1,
                y_max: self.scrolling_region.bottom + 1,
            }
        } else {
            Frame {
                x_offset: 0,
                y_offset: 0,
                x_max: self.cols,
                y_max: self.rows,
            }
        };

        self.screen.cursor.pending_wrap = false;

        let row = usize::from(row.max(1));
        let col = usize::from(col.max(1));

        let x = (col + frame.x_offset).min(frame.x_max) - 1;
        let y = (row + frame.y_offset).min(frame.y_max) - 1;

        // Same row: cheap horizontal move.
        if y == self.screen.cursor.y {
            if x > self.screen.cursor.x {
                self.screen.set_cursor_right(x - self.screen.cursor.x);
            } else {
                self.screen.set_cursor_left(self.screen.cursor.x - x);
            }
            return;
        }

        self.screen.set_cursor_abs(x, y);
    }

    /// Move the cursor to a 1-indexed column on the current row.
    pub fn set_cursor_col(&mut self, col: u16) {
        let row = self.screen.cursor.y as u16 + 1;
        self.set_cursor_position(row, col);
    }

    /// Move the cursor to a 1-indexed row in the current column.
    pub fn set_cursor_row(&mut self, row: u16) {
        let col = self.screen.cursor.x as u16 + 1;
        self.set_cursor_position(row, col);
    }

    /// Move the cursor up, clamped by the scrolling region when inside it
    /// and by the screen edge when not. `n == 0` means one.
    pub fn set_cursor_up(&mut self, n: u16, carriage: bool) {
        self.screen.cursor.pending_wrap = false;

        let max_distance = if self.screen.cursor.y >= self.scrolling_region.top {
            self.screen.cursor.y - self.scrolling_region.top
        } else {
            self.screen.cursor.y
        };
        let count = max_distance.min(usize::from(n).max(1));
        self.screen.set_cursor_up(count);

        if carriage {
            self.carriage_return();
        }
    }

    /// Move the cursor down with the same clamping rules as
    /// [`Terminal::set_cursor_up`].
    pub fn set_cursor_down(&mut self, n: u16, carriage: bool) {
        self.screen.cursor.pending_wrap = false;

        let max_distance = if self.screen.cursor.y <= self.scrolling_region.bottom {
            self.scrolling_region.bottom - self.screen.cursor.y
        } else {
            (self.rows - 1) - self.screen.cursor.y
        };
        let count = max_distance.min(usize::from(n).max(1));
        self.screen.set_cursor_down(count);

        if carriage {
            self.carriage_return();
        }
    }

    /// Move the cursor left, clamped by the left margin when inside the
    /// region and the screen edge when not.
    pub fn set_cursor_left(&mut self, n: u16) {
        self.screen.cursor.pending_wrap = false;

        let max_distance = if self.screen.cursor.x >= self.scrolling_region.left {
            self.screen.cursor.x - self.scrolling_region.left
        } else {
            self.screen.cursor.x
        };
        let count = max_distance.min(usize::from(n).max(1));
        self.screen.set_cursor_left(count);
    }

    /// Move the cursor right, clamped by the right margin when inside the
    /// region and the screen edge when not.
    pub fn set_cursor_right(&mut self, n: u16) {
        self.screen.cursor.pending_wrap = false;

        let max_distance = if self.screen.cursor.x <= self.scrolling_region.right {
            self.scrolling_region.right - self.screen.cursor.x
        } else {
            (self.cols - 1) - self.screen.cursor.x
        };
        let count = max_distance.min(usize::from(n).max(1));
        self.screen.set_cursor_right(count);
    }

    // ------------------------------------------------------------------
    // Tabs

    /// Set a tab stop at the cursor column.
    pub fn tab_set(&mut self) {
        self.tabstops.set(self.screen.cursor.x);
    }

    /// Clear the tab stop at the cursor column.
    pub fn tab_clear(&mut self) {
        self.tabstops.unset(self.screen.cursor.x);
    }

    /// Clear every tab stop.
    pub fn tab_clear_all(&mut self) {
        self.tabstops.reset(0);
    }

    /// Advance to the `n`th next tab stop, or the right edge.
    pub fn set_cursor_tab_right(&mut self, n: u16) {
        for _ in 0..n.max(1) {
            while self.screen.cursor.x + 1 < self.cols {
                self.screen.set_cursor_right(1);
                if self.tabstops.get(self.screen.cursor.x) {
                    break;
                }
            }
        }
    }

    /// Step back to the `n`th previous tab stop, or the left edge.
    pub fn set_cursor_tab_left(&mut self, n: u16) {
        let left_limit = if self.modes.get(Mode::Origin) {
            self.scrolling_region.left
        } else {
            0
        };
        for _ in 0..n.max(1) {
            while self.screen.cursor.x > left_limit {
                self.screen.set_cursor_left(1);
                if self.tabstops.get(self.screen.cursor.x) {
                    break;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Insert/delete

    /// Insert `n` blank cells at the cursor, shifting existing cells right
    /// within the region. The cursor does not move.
    pub fn insert_blanks(&mut self, n: usize) {
        let cursor = &self.screen.cursor;
        // Pending wrap resets even when the margins make this a no-op.
        let x = cursor.x;
        self.screen.cursor.pending_wrap = false;

        if x < self.scrolling_region.left || x > self.scrolling_region.right {
            return;
        }

        let pin = self.screen.cursor_pin();

        // Do not split the wide pair the cursor sits in the middle of.
        if self.screen.cursor_cell().wide == Wide::SpacerTail {
            assert!(x > 0);
            self.screen.clear_cells(pin.node, pin.y, x - 1, x + 1);
        }

        // Cells from the cursor through the right margin.
        let rem = self.scrolling_region.right + 1 - x;
        let count = n.min(rem);
        let amount = rem - count;

        if amount > 0 {
            self.screen.pages.page_mut(pin.node).pause_integrity_checks(true);

            // The rightmost shifted cell must not be the head of a pair
            // that the shift would split.
            let shift_end = x + amount - 1;
            if self.screen.pages.page(pin.node).cell(shift_end, pin.y).wide == Wide::Wide {
                let clear_to = (shift_end + 2).min(self.cols);
                self.screen.clear_cells(pin.node, pin.y, shift_end, clear_to);
            }

            let page = self.screen.pages.page_mut(pin.node);
            let mut sx = shift_end;
            loop {
                page.swap_cells(pin.y, sx, sx + count);
                if sx == x {
                    break;
                }
                sx -= 1;
            }

            self.screen.pages.page_mut(pin.node).pause_integrity_checks(false);
        }

        self.screen.clear_cells(pin.node, pin.y, x, x + count);
        self.screen.cursor_mark_dirty();
    }

    /// Delete `n` cells at the cursor, shifting the remainder of the
    /// region left and clearing the tail. The cursor does not move.
    pub fn delete_chars(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let x = self.screen.cursor.x;
        self.screen.cursor.pending_wrap = false;

        if x < self.scrolling_region.left || x > self.scrolling_region.right {
            return;
        }

        let rem = self.scrolling_region.right + 1 - x;
        let count = n.min(rem);
        let amount = rem - count;

        self.screen.split_cell_boundary(x);
        self.screen.split_cell_boundary(x + count);
        self.screen.split_cell_boundary(self.scrolling_region.right + 1);

        let pin = self.screen.cursor_pin();
        if amount > 0 {
            self.screen.pages.page_mut(pin.node).pause_integrity_checks(true);
            let page = self.screen.pages.page_mut(pin.node);
            for i in 0..amount {
                page.swap_cells(pin.y, x + i, x + i + count);
            }
            self.screen.pages.page_mut(pin.node).pause_integrity_checks(false);
        }

        self.screen
            .clear_cells(pin.node, pin.y, x + amount, self.scrolling_region.right + 1);
        self.screen.cursor_mark_dirty();
    }

    /// Insert `n` blank lines at the cursor row, shifting the rows below
    /// down within the scrolling region. No-op outside the region.
    pub fn insert_lines(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let region = self.scrolling_region;
        let cursor_y = self.screen.cursor.y;
        if cursor_y < region.top
            || cursor_y > region.bottom
            || self.screen.cursor.x < region.left
            || self.screen.cursor.x > region.right
        {
            return;
        }

        let left_right = region.left > 0 || region.right < self.cols - 1;
        // Rows from the cursor through the region bottom.
        let rem = region.bottom - cursor_y + 1;
        let count = n.min(rem);

        // Walk from the region bottom upward with a tracked pin so page
        // pruning cannot strand us.
        let bottom_pin = self
            .screen
            .pages
            .pin_down(self.screen.cursor_pin(), rem - 1)
            .expect("scrolling region fits the active area");
        let walker = self.screen.pages.track_pin(bottom_pin);

        for offset in (0..rem).rev() {
            let current = self.screen.pages.tracked(walker);
            self.screen.pages.page_mut(current.node).mark_row_dirty(current.y);

            if offset >= count {
                // This row receives the content from `count` rows above.
                let src = self
                    .screen
                    .pages
                    .pin_up(current, count)
                    .expect("shift source inside the region");
                self.shift_row(src, current, left_right);
            } else {
                // One of the freshly inserted blank rows.
                self.screen
                    .clear_cells(current.node, current.y, region.left, region.right + 1);
            }

            if offset > 0 {
                let up = self
                    .screen
                    .pages
                    .pin_up(current, 1)
                    .expect("walking within the region");
                self.screen.pages.set_tracked(walker, up);
            }
        }

        self.screen.pages.untrack_pin(walker);

        // The cursor row is restored; column is left alone.
        let x = self.screen.cursor.x;
        self.screen.set_cursor_abs(x, cursor_y);
        self.screen.cursor.pending_wrap = false;
    }

    /// Delete `n` lines at the cursor row, shifting the rows below up
    /// within the scrolling region. No-op outside the region.
    pub fn delete_lines(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let region = self.scrolling_region;
        let cursor_y = self.screen.cursor.y;
        if cursor_y < region.top
            || cursor_y > region.bottom
            || self.screen.cursor.x < region.left
            || self.screen.cursor.x > region.right
        {
            return;
        }

        let left_right = region.left > 0 || region.right < self.cols - 1;
        let rem = region.bottom - cursor_y + 1;
        let count = n.min(rem);

        let walker = self.screen.pages.track_pin(self.screen.cursor_pin());

        for offset in 0..rem {
            let current = self.screen.pages.tracked(walker);
            self.screen.pages.page_mut(current.node).mark_row_dirty(current.y);

            if offset < rem - count {
                // This row receives the content from `count` rows below.
                let src = self
                    .screen
                    .pages
                    .pin_down(current, count)
                    .expect("shift source inside the region");
                self.shift_row(src, current, left_right);
            } else {
                // The vacated rows at the bottom of the region.
                self.screen
                    .clear_cells(current.node, current.y, region.left, region.right + 1);
            }

            if offset + 1 < rem {
                let down = self
                    .screen
                    .pages
                    .pin_down(current, 1)
                    .expect("walking within the region");
                self.screen.pages.set_tracked(walker, down);
            }
        }

        self.screen.pages.untrack_pin(walker);

        let x = self.screen.cursor.x;
        self.screen.set_cursor_abs(x, cursor_y);
        self.screen.cursor.pending_wrap = false;
    }

    /// Move one row's region-width content from `src` into `dst` as part
    /// of a line shift.
    fn shift_row(&mut self, src: crate::core::pagelist::Pin, dst: crate::core::pagelist::Pin, left_right: bool) {
        let region = self.scrolling_region;
        if src.node != dst.node {
            // Cross-page shifts copy and re-intern styles.
            self.screen.pages.clone_partial_row_between(
                dst.node,
                dst.y,
                src.node,
                src.y,
                region.left,
                region.right + 1,
            );
        } else if !left_right {
            // Full-width shifts swap whole rows: cells and flags together.
            self.screen.pages.page_mut(src.node).swap_rows(src.y, dst.y);
        } else {
            // Margin-bounded shifts move only the cells inside the region.
            self.screen.pages.page_mut(src.node).move_cells(
                src.y,
                region.left,
                dst.y,
                region.left,
                region.right - region.left + 1,
            );
        }
    }

    // ------------------------------------------------------------------
    // Erase

    /// Erase within the cursor row.
    pub fn erase_in_line(&mut self, mode: ElMode) {
        let x = self.screen.cursor.x;
        let (start, end) = match mode {
            ElMode::Right => {
                let mut start = x;
                // Never split the wide pair under the cursor.
                if start > 0 && self.screen.cursor_cell().wide == Wide::SpacerTail {
                    start -= 1;
                }
                (start, self.cols)
            }
            ElMode::Left => {
                let mut end = x + 1;
                if self.screen.cursor_cell().wide == Wide::Wide {
                    end += 1;
                }
                (0, end.min(self.cols))
            }
            ElMode::All => (0, self.cols),
        };
        assert!(end > start);

        self.screen.cursor.pending_wrap = false;
        self.screen.cursor_mark_dirty();

        let pin = self.screen.cursor_pin();
        self.screen.clear_cells(pin.node, pin.y, start, end);
    }

    /// Erase within the display.
    pub fn erase_in_display(&mut self, mode: EdMode) {
        match mode {
            EdMode::Complete => {
                self.screen.clear_rows(Point::origin(Tag::Active), None);
                self.screen.cursor.pending_wrap = false;
            }
            EdMode::Below => {
                // The cursor row from the cursor right, then everything
                // below.
                self.erase_in_line(ElMode::Right);
                if self.screen.cursor.y < self.rows - 1 {
                    let below = Point::new(Tag::Active, 0, self.screen.cursor.y + 1);
                    self.screen.clear_rows(below, None);
                }
                debug_assert!(!self.screen.cursor.pending_wrap);
            }
            EdMode::Above => {
                self.erase_in_line(ElMode::Left);
                if self.screen.cursor.y > 0 {
                    let top = Point::origin(Tag::Active);
                    let above = Point::new(Tag::Active, 0, self.screen.cursor.y - 1);
                    self.screen.clear_rows(top, Some(above));
                }
                debug_assert!(!self.screen.cursor.pending_wrap);
            }
            EdMode::Scrollback => {
                warn!("erase scrollback is not supported");
            }
        }
    }

    // ------------------------------------------------------------------
    // Modes, attributes, state

    pub fn set_mode(&mut self, mode: Mode, enabled: bool) {
        self.modes.set(mode, enabled);
    }

    /// DECSTBM: set the top and bottom margins of the scrolling region,
    /// 1-indexed. Zero selects the default edge. Ignored unless the top
    /// ends up strictly above the bottom. The cursor homes.
    pub fn set_top_and_bottom_margin(&mut self, top: u16, bottom: u16) {
        let top_idx = usize::from(top.max(1)) - 1;
        let bottom_idx = if bottom == 0 {
            self.rows - 1
        } else {
            (usize::from(bottom) - 1).min(self.rows - 1)
        };
        if top_idx >= bottom_idx {
            return;
        }
        self.scrolling_region.top = top_idx;
        self.scrolling_region.bottom = bottom_idx;
        self.set_cursor_position(1, 1);
    }

    /// Apply one SGR attribute to the active style.
    pub fn set_attribute(&mut self, attr: &Attribute) {
        self.screen.set_graphics_rendition(attr);
    }

    /// Reset to power-on state, keeping the geometry.
    pub fn full_reset(&mut self) {
        self.screen.reset();
        self.modes.reset();
        self.tabstops = Tabstops::new(self.cols, TABSTOP_INTERVAL);
        self.scrolling_region = ScrollingRegion {
            top: 0,
            bottom: self.rows - 1,
            left: 0,
            right: self.cols - 1,
        };
        self.previous_char = None;
        self.pwd.clear();
    }

    /// Resize the terminal. Column changes rebuild the tab stops at the
    /// default interval. Content reflows only when autowrap is enabled;
    /// otherwise rows and columns truncate.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        assert!(cols > 0 && rows > 0);
        if cols == self.cols && rows == self.rows {
            return;
        }

        if cols != self.cols {
            self.tabstops = Tabstops::new(cols, TABSTOP_INTERVAL);
        }

        if self.modes.get(Mode::Wraparound) {
            self.screen.resize_with_reflow(cols, rows);
        } else {
            self.screen.resize_without_reflow(cols, rows);
        }

        self.cols = cols;
        self.rows = rows;
        self.scrolling_region = ScrollingRegion {
            top: 0,
            bottom: rows - 1,
            left: 0,
            right: cols - 1,
        };
    }

    /// Record the semantic class of the cursor row, as reported by shell
    /// integration.
    pub fn mark_semantic_prompt(&mut self, prompt: SemanticPrompt) {
        match prompt {
            SemanticPrompt::Prompt
            | SemanticPrompt::Continuation
            | SemanticPrompt::Input
            | SemanticPrompt::Output => {
                self.screen.cursor_row_mut().semantic_prompt = prompt;
            }
            SemanticPrompt::Unknown => {}
        }
    }

    /// True if the cursor currently sits in a prompt or input region.
    /// Scans upward from the cursor; requires shell integration to have
    /// marked rows, otherwise always false.
    pub fn cursor_is_at_prompt(&self) -> bool {
        let mut pin = self.screen.cursor_pin();
        for _ in 0..=self.screen.cursor.y {
            match self.screen.pages.page(pin.node).row(pin.y).semantic_prompt {
                SemanticPrompt::Prompt
                | SemanticPrompt::Continuation
                | SemanticPrompt::Input => return true,
                SemanticPrompt::Output => return false,
                SemanticPrompt::Unknown => {}
            }
            match self.screen.pages.pin_up(pin, 1) {
                Some(up) => pin = up,
                None => break,
            }
        }
        false
    }

    pub fn set_pwd(&mut self, pwd: &str) {
        self.pwd = pwd.to_string();
    }

    pub fn pwd(&self) -> &str {
        &self.pwd
    }

    /// The viewport contents as plain text, newlines between rows, no
    /// styling.
    pub fn plain_string(&self) -> String {
        let mut out = String::new();
        if self.dump_string(&mut out, Tag::Viewport).is_err() {
            return String::new();
        }
        out
    }

    /// Dump the region selected by `tag` as UTF-8.
    pub fn dump_string<W: Write>(&self, writer: &mut W, tag: Tag) -> std::fmt::Result {
        self.screen.dump_string(writer, tag)
    }

    /// Whether the cell at a point is flagged dirty. Testing helper.
    pub fn is_dirty(&self, point: Point) -> bool {
        match self.screen.pages.pin(point) {
            Some(pin) => self.screen.pages.page(pin.node).is_row_dirty(pin.y),
            None => false,
        }
    }

    /// Clear all dirty bits. Testing helper.
    pub fn clear_dirty(&mut self) {
        self.screen.pages.clear_dirty();
    }
}
