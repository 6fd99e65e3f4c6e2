//! Screen
//!
//! The screen owns the page list and the cursor, and provides the
//! primitive operations the terminal layer composes: cursor motion,
//! scrolling, cell clearing, and style application. The motion primitives
//! are deliberately unchecked beyond assertions; the terminal layer is
//! responsible for clamping against modes and scrolling regions.

use std::fmt::{self, Write};

use log::error;

use crate::parser::sgr::Attribute;

use super::cell::{Cell, Wide};
use super::cursor::Cursor;
use super::pagelist::{Chunk, Direction, NodeId, PageList, Pin};
use super::point::{Point, Tag};
use super::refset;
use super::row::Row;
use super::style::{Color, Style};

/// The terminal screen: page storage plus cursor.
#[derive(Debug)]
pub struct Screen {
    pub pages: PageList,
    pub cursor: Cursor,

    rows: usize,
    cols: usize,

    /// Disable scrollback entirely: scrolling at the bottom shifts rows up
    /// in place instead of growing history.
    pub no_scrollback: bool,
}

impl Screen {
    pub fn new(cols: usize, rows: usize) -> Self {
        let mut pages = PageList::new(cols, rows);
        let first = pages.first();
        let pin = pages.track_pin(Pin::new(first, 0, 0));

        Self {
            pages,
            cursor: Cursor::new(pin),
            rows,
            cols,
            no_scrollback: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Check the screen-level invariants. Page-level invariants are
    /// checked by the pages themselves.
    pub fn assert_integrity(&self) {
        assert!(self.cursor.x < self.cols, "cursor x out of bounds");
        assert!(self.cursor.y < self.rows, "cursor y out of bounds");
    }

    // ------------------------------------------------------------------
    // Cursor plumbing

    /// The cursor's current pin.
    pub fn cursor_pin(&self) -> Pin {
        self.pages.tracked(self.cursor.pin)
    }

    pub fn cursor_mark_dirty(&mut self) {
        let pin = self.cursor_pin();
        self.pages.page_mut(pin.node).mark_row_dirty(pin.y);
    }

    /// The row under the cursor.
    pub fn cursor_row(&self) -> &Row {
        let pin = self.cursor_pin();
        self.pages.page(pin.node).row(pin.y)
    }

    pub fn cursor_row_mut(&mut self) -> &mut Row {
        let pin = self.cursor_pin();
        self.pages.page_mut(pin.node).row_mut(pin.y)
    }

    /// The cell under the cursor.
    pub fn cursor_cell(&self) -> &Cell {
        let pin = self.cursor_pin();
        self.pages.page(pin.node).cell(pin.x, pin.y)
    }

    pub fn cursor_cell_mut(&mut self) -> &mut Cell {
        let pin = self.cursor_pin();
        self.pages.page_mut(pin.node).cell_mut(pin.x, pin.y)
    }

    /// The cell `n` columns right of the cursor, which must exist.
    pub fn cursor_cell_right(&self, n: usize) -> &Cell {
        assert!(self.cursor.x + n < self.cols);
        let pin = self.cursor_pin();
        self.pages.page(pin.node).cell(pin.x + n, pin.y)
    }

    /// The cell `n` columns left of the cursor, which must exist.
    pub fn cursor_cell_left(&self, n: usize) -> &Cell {
        assert!(self.cursor.x >= n);
        let pin = self.cursor_pin();
        self.pages.page(pin.node).cell(pin.x - n, pin.y)
    }

    /// The last cell of the row above the cursor, if that row exists.
    pub fn cursor_cell_end_of_previous(&self) -> Option<(NodeId, usize, usize)> {
        let pin = self.pages.pin_up(self.cursor_pin(), 1)?;
        Some((pin.node, self.pages.cols - 1, pin.y))
    }

    /// Point the cursor's pin somewhere else. This is the only way the
    /// cursor may change pages: when it does, the active style is released
    /// on the old page and re-interned on the new one, since style ids are
    /// page-local.
    pub fn cursor_change_pin(&mut self, new_pin: Pin) {
        let old_pin = self.cursor_pin();

        // Moving the cursor splits text runs for shaping, so both the old
        // and new rows need a redraw.
        if old_pin != new_pin {
            self.pages.page_mut(old_pin.node).mark_row_dirty(old_pin.y);
            self.pages.page_mut(new_pin.node).mark_row_dirty(new_pin.y);
        }

        if old_pin.node == new_pin.node {
            self.pages.set_tracked(self.cursor.pin, new_pin);
            return;
        }

        let saved_style = self.cursor.has_style().then_some(self.cursor.style);
        if saved_style.is_some() {
            // Release on the old page before the pin moves.
            self.cursor.style = Style::default();
            self.manual_style_update();
        }

        self.pages.set_tracked(self.cursor.pin, new_pin);

        if let Some(style) = saved_style {
            self.cursor.style = style;
            self.manual_style_update();
        }
    }

    // ------------------------------------------------------------------
    // Cursor motion primitives
    //
    // These are fast paths: the caller has already verified there is room
    // to move, so no wrapping or clamping happens here.

    pub fn set_cursor_right(&mut self, n: usize) {
        assert!(self.cursor.x + n < self.cols);
        let mut pin = self.cursor_pin();
        pin.x += n;
        self.pages.set_tracked(self.cursor.pin, pin);
        self.cursor.x += n;
        self.assert_integrity();
    }

    pub fn set_cursor_left(&mut self, n: usize) {
        assert!(self.cursor.x >= n);
        let mut pin = self.cursor_pin();
        pin.x -= n;
        self.pages.set_tracked(self.cursor.pin, pin);
        self.cursor.x -= n;
        self.assert_integrity();
    }

    pub fn set_cursor_up(&mut self, n: usize) {
        assert!(self.cursor.y >= n);
        self.cursor.y -= n;
        let pin = self
            .pages
            .pin_up(self.cursor_pin(), n)
            .expect("cursor cannot move above the screen");
        self.cursor_change_pin(pin);
        self.assert_integrity();
    }

    pub fn set_cursor_down(&mut self, n: usize) {
        assert!(self.cursor.y + n < self.rows);
        self.cursor.y += n;
        let pin = self
            .pages
            .pin_down(self.cursor_pin(), n)
            .expect("cursor cannot move below the screen");
        self.cursor_change_pin(pin);
        self.assert_integrity();
    }

    pub fn set_cursor_abs(&mut self, x: usize, y: usize) {
        assert!(x < self.cols && y < self.rows);
        let current = self.cursor_pin();
        let mut pin = match y.cmp(&self.cursor.y) {
            std::cmp::Ordering::Less => self
                .pages
                .pin_up(current, self.cursor.y - y)
                .expect("cursor target above the screen"),
            std::cmp::Ordering::Greater => self
                .pages
                .pin_down(current, y - self.cursor.y)
                .expect("cursor target below the screen"),
            std::cmp::Ordering::Equal => current,
        };
        pin.x = x;
        self.cursor.x = x;
        self.cursor.y = y;
        self.cursor_change_pin(pin);
        self.assert_integrity();
    }

    pub fn set_cursor_horizontal_abs(&mut self, x: usize) {
        assert!(x < self.cols);
        let mut pin = self.cursor_pin();
        pin.x = x;
        self.pages.set_tracked(self.cursor.pin, pin);
        self.cursor.x = x;
        self.assert_integrity();
    }

    pub fn set_cursor_vertical_abs(&mut self, y: usize) {
        assert!(y < self.rows);
        self.set_cursor_abs(self.cursor.x, y);
    }

    /// Move the cursor down one row, scrolling if it is already on the
    /// bottom row.
    pub fn set_cursor_down_or_scroll(&mut self) {
        if self.cursor.y < self.rows - 1 {
            self.set_cursor_down(1);
        } else {
            self.set_cursor_down_scroll();
        }
    }

    // ------------------------------------------------------------------
    // Scrolling

    /// Scroll the active area at and above the cursor up by one row,
    /// leaving the cursor's row blank and the rows below it in place.
    ///
    /// Rather than shifting the whole scrollback up, a row is added at the
    /// bottom and everything below the cursor moves down by one, which has
    /// the same visible effect at a fraction of the cost.
    pub fn set_cursor_scroll_up(&mut self) {
        // The cursor always changes page rows here, which re-splits text
        // runs, so its row is unconditionally dirty.
        self.cursor_mark_dirty();

        if self.cursor.y == self.rows - 1 {
            self.set_cursor_down_scroll();
            return;
        }
        assert!(self.cursor.y < self.rows - 1);

        let grew = match self.pages.grow() {
            Ok(grew) => grew,
            Err(err) => {
                error!("grow failed during scroll: {err}");
                return;
            }
        };

        if grew.is_some() {
            self.scroll_above_rotate();
        } else {
            let pin = self.cursor_pin();
            if pin.node == self.pages.last() {
                // Everything that moves lives in one page: shift the pin
                // down one and rotate the rows below it back around.
                let new_pin = self
                    .pages
                    .pin_down(pin, 1)
                    .expect("grow added a row below the cursor");
                self.pages.set_tracked(self.cursor.pin, new_pin);

                let size_rows = self.pages.page(new_pin.node).size.rows;
                let page = self.pages.page_mut(new_pin.node);
                page.rotate_rows_down(new_pin.y, size_rows);
                page.dirty_mut().set_range(new_pin.y, size_rows);

                self.clear_cells(new_pin.node, new_pin.y, 0, self.cols);
            } else {
                self.scroll_above_rotate();
            }
        }

        self.assert_integrity();
    }

    /// Shift every row at and below the cursor down one, page by page from
    /// the tail back to the cursor's page, and blank the cursor's row.
    fn scroll_above_rotate(&mut self) {
        let pin = self
            .pages
            .pin_down(self.cursor_pin(), 1)
            .expect("grow added a row below the cursor");
        self.cursor_change_pin(pin);
        let cursor_pin = self.cursor_pin();

        let mut current = self.pages.last();
        while current != cursor_pin.node {
            let prev = self
                .pages
                .prev_node(current)
                .expect("cursor page precedes the tail");

            let size_rows = self.pages.page(current).size.rows;
            {
                let page = self.pages.page_mut(current);
                page.rotate_rows_down(0, size_rows);
                page.dirty_mut().set_range(0, size_rows);
            }
            let src_y = self.pages.page(prev).size.rows - 1;
            self.pages.clone_row_between(current, 0, prev, src_y);

            current = prev;
        }

        let size_rows = self.pages.page(cursor_pin.node).size.rows;
        {
            let page = self.pages.page_mut(cursor_pin.node);
            page.rotate_rows_down(cursor_pin.y, size_rows);
            page.dirty_mut().set_range(cursor_pin.y, size_rows);
        }
        self.clear_cells(cursor_pin.node, cursor_pin.y, 0, self.cols);
    }

    /// Scroll by one row while the cursor sits on the bottom row: the
    /// newline path of every shell loop, so it stays specialized.
    pub fn set_cursor_down_scroll(&mut self) {
        assert_eq!(self.cursor.y, self.rows - 1, "cursor is not on the bottom row");

        if self.no_scrollback {
            if self.rows == 1 {
                let pin = self.cursor_pin();
                self.clear_cells(pin.node, pin.y, 0, self.cols);
                self.pages.page_mut(pin.node).mark_row_dirty(pin.y);
            } else {
                // Shift the whole active area up one row in place.
                self.pages.erase_row(Point::origin(Tag::Active));

                // The erase pulled the cursor pin up with its row; put it
                // back on the bottom row.
                let pin = self
                    .pages
                    .pin_down(self.cursor_pin(), 1)
                    .expect("active area has a bottom row");
                self.cursor_change_pin(pin);

                // The erase may have released our style entry.
                self.manual_style_update();
            }
        } else {
            let before = self.cursor_pin();
            if let Err(err) = self.pages.grow() {
                error!("grow failed during scroll: {err}");
                return;
            }
            let after = self.cursor_pin();

            let new_pin = if after == before {
                self.pages
                    .pin_down(after, 1)
                    .expect("grow added a row below the cursor")
            } else {
                // The cursor's page was pruned and the pin rewritten to the
                // new head's top-left; only the column needs fixing.
                Pin {
                    x: self.cursor.x,
                    ..after
                }
            };
            self.cursor_change_pin(new_pin);
            self.cursor_mark_dirty();

            // The fresh row takes the background color.
            if self.cursor.style.bg != Color::None {
                let pin = self.cursor_pin();
                self.clear_cells(pin.node, pin.y, 0, self.cols);
            }
        }

        self.assert_integrity();
    }

    // ------------------------------------------------------------------
    // Clearing

    /// Clean up the cell boundary at column `x` of the cursor row before
    /// an operation that would split a wide character there: a wide cell
    /// ending at the boundary is cleared together with its spacer tail.
    ///
    /// `x` may be `cols`, meaning the boundary to the right of the final
    /// cell. Row wrap state is not modified.
    pub fn split_cell_boundary(&mut self, x: usize) {
        assert!(x <= self.cols);
        if x == self.cols {
            // Nothing to do unless the row wraps; a spacer head there
            // belongs to the wrapped wide char and is handled on rewrite.
            return;
        }
        if x == 0 {
            return;
        }

        let pin = self.cursor_pin();
        let left = *self.pages.page(pin.node).cell(x - 1, pin.y);
        if left.wide == Wide::Wide {
            self.clear_cells(pin.node, pin.y, x - 1, x + 1);
        }
    }

    /// The cell used to fill cleared space: all-zero normally, or the
    /// background-only cell when the active style has a background color.
    pub fn blank_cell(&self) -> Cell {
        if !self.cursor.has_style() {
            return Cell::default();
        }
        self.cursor.style.bg_cell().unwrap_or_default()
    }

    /// Clear the cells `[from, to)` of a row, painting with the active
    /// background and releasing any style references held by the cells.
    pub fn clear_cells(&mut self, node: NodeId, y: usize, from: usize, to: usize) {
        let blank = self.blank_cell();
        self.pages
            .page_mut(node)
            .clear_cells_with(y, from, to, blank);
    }

    /// Clear whole rows from `top_left` down to `bottom_right` inclusive,
    /// or to the bottom of the active area when `bottom_right` is `None`.
    /// Cleared rows are painted with the active background.
    pub fn clear_rows(&mut self, top_left: Point, bottom_right: Option<Point>) {
        let Some(tl_pin) = self.pages.pin(top_left) else {
            error!("clear_rows: top-left out of bounds");
            return;
        };
        let br_pin = match bottom_right {
            Some(point) => self.pages.pin(point),
            None => self.pages.bottom_right(Tag::Active),
        };

        let chunks: Vec<Chunk> = self
            .pages
            .page_iterator(tl_pin, Direction::RightDown, br_pin)
            .collect();
        for chunk in chunks {
            for y in chunk.start_y..chunk.end_y {
                self.clear_cells(chunk.node, y, 0, self.cols);
                let page = self.pages.page_mut(chunk.node);
                page.row_mut(y).reset_flags();
                page.mark_row_dirty(y);
            }
        }
    }

    /// Reset to a fresh screen: new pages, cursor at the top left with a
    /// default style.
    pub fn reset(&mut self) {
        self.pages.reset();
        let pin_handle = self.cursor.pin;
        debug_assert_eq!(
            self.pages.tracked(pin_handle),
            Pin::new(self.pages.first(), 0, 0)
        );
        self.cursor = Cursor::new(pin_handle);
    }

    // ------------------------------------------------------------------
    // Styles

    /// Apply one SGR attribute to the cursor style.
    pub fn set_graphics_rendition(&mut self, attr: &Attribute) {
        match attr {
            Attribute::Unset => self.cursor.style.reset(),
            Attribute::Bold => self.cursor.style.bold = true,
            Attribute::ResetBold => {
                // Code 22 resets both weight changes.
                self.cursor.style.bold = false;
                self.cursor.style.faint = false;
            }
            Attribute::Faint => self.cursor.style.faint = true,
            Attribute::Italic => self.cursor.style.italic = true,
            Attribute::ResetItalic => self.cursor.style.italic = false,
            Attribute::Underline(style) => self.cursor.style.underline = *style,
            Attribute::ResetUnderline => {
                self.cursor.style.underline = super::style::UnderlineStyle::None
            }
            Attribute::UnderlineColor(rgb) => {
                self.cursor.style.underline_color = Color::Rgb(*rgb)
            }
            Attribute::ResetUnderlineColor => {
                self.cursor.style.underline_color = Color::None
            }
            Attribute::Overline => self.cursor.style.overline = true,
            Attribute::ResetOverline => self.cursor.style.overline = false,
            Attribute::Blink => self.cursor.style.blink = true,
            Attribute::ResetBlink => self.cursor.style.blink = false,
            Attribute::Inverse => self.cursor.style.inverse = true,
            Attribute::ResetInverse => self.cursor.style.inverse = false,
            Attribute::Invisible => self.cursor.style.invisible = true,
            Attribute::ResetInvisible => self.cursor.style.invisible = false,
            Attribute::Strikethrough => self.cursor.style.strikethrough = true,
            Attribute::ResetStrikethrough => self.cursor.style.strikethrough = false,
            Attribute::DirectColorFg(rgb) => self.cursor.style.fg = Color::Rgb(*rgb),
            Attribute::DirectColorBg(rgb) => self.cursor.style.bg = Color::Rgb(*rgb),
            Attribute::ResetFg => self.cursor.style.fg = Color::None,
            Attribute::ResetBg => self.cursor.style.bg = Color::None,
            // Unknown attributes change nothing.
            Attribute::Unknown { .. } => return,
        }
        self.manual_style_update();
    }

    /// Re-intern the cursor style after it changed: release the old id on
    /// the cursor's page and insert the new value, keeping `style_id`
    /// valid for the page the cursor is on.
    pub fn manual_style_update(&mut self) {
        let pin = self.cursor_pin();
        let page = self.pages.page_mut(pin.node);

        if self.cursor.style_id != refset::DEFAULT_ID {
            page.styles.release(self.cursor.style_id);
        }

        if self.cursor.style.is_default() {
            self.cursor.style_id = refset::DEFAULT_ID;
            return;
        }

        // Clear the id first so a failure below cannot leave a stale
        // reference behind.
        self.cursor.style_id = refset::DEFAULT_ID;
        self.cursor.style_id = page.styles.add(self.cursor.style);
        self.assert_integrity();
    }

    // ------------------------------------------------------------------
    // Dumping

    /// Write the region selected by `tag` as UTF-8. Purely visual: soft
    /// wraps are emitted as line breaks and styling is dropped.
    pub fn dump_string<W: Write>(&self, writer: &mut W, tag: Tag) -> fmt::Result {
        let top_left = self.pages.top_left(tag);
        let Some(bottom_right) = self.pages.bottom_right(tag) else {
            // An empty history dumps as nothing.
            return Ok(());
        };
        self.pages
            .encode_utf8(writer, false, top_left, Some(bottom_right))
    }

    // ------------------------------------------------------------------
    // Resize

    /// Resize without reflow: rows and columns are truncated as they
    /// shrink and padded blank as they grow. Trailing blank rows are
    /// dropped first, so shrinking a mostly-empty screen keeps its
    /// content; only when written rows exceed the new height does the
    /// top of the content give way.
    pub fn resize_without_reflow(&mut self, cols: usize, rows: usize) {
        assert!(cols > 0 && rows > 0);

        let copy_cols = cols.min(self.cols);

        // Rows that actually matter: through the last written row or the
        // cursor row, whichever is lower.
        let active_top = self.pages.top_left(Tag::Active);
        let mut last_used = self.cursor.y;
        for i in 0..self.rows {
            let pin = self
                .pages
                .pin_down(active_top, i)
                .expect("active area shorter than its row count");
            let cells = self.pages.page(pin.node).row_cells(pin.y);
            if crate::core::cell::has_text_any(cells) {
                last_used = last_used.max(i);
            }
        }
        let content_rows = last_used + 1;

        let copy_rows = content_rows.min(rows);
        let skip = content_rows - copy_rows;

        // Lift the surviving region out with resolved style values, since
        // the new pages have fresh style sets.
        let mut saved: Vec<(Vec<(Cell, Option<Style>)>, Row)> = Vec::with_capacity(copy_rows);
        let src_top = self
            .pages
            .pin_down(self.pages.top_left(Tag::Active), skip)
            .expect("active area shorter than its row count");
        for i in 0..copy_rows {
            let pin = self
                .pages
                .pin_down(src_top, i)
                .expect("copy region within the active area");
            let page = self.pages.page(pin.node);
            let mut row_cells = Vec::with_capacity(copy_cols);
            for x in 0..copy_cols {
                let cell = *page.cell(x, pin.y);
                // A wide char whose tail falls off the right edge is
                // dropped rather than split.
                if cell.wide == Wide::Wide && x + 1 >= copy_cols {
                    row_cells.push((Cell::default(), None));
                    continue;
                }
                let style = cell
                    .has_style()
                    .then(|| *page.styles.get(cell.style_id).expect("live cell style"));
                row_cells.push((cell, style));
            }
            saved.push((row_cells, *page.row(pin.y)));
        }

        self.pages.rebuild(cols, rows);
        self.cols = cols;
        self.rows = rows;

        for (i, (row_cells, row_flags)) in saved.into_iter().enumerate() {
            let pin = self
                .pages
                .pin_down(self.pages.top_left(Tag::Active), i)
                .expect("rebuilt active area has all rows");
            let page = self.pages.page_mut(pin.node);
            let mut any_styled = false;
            for (x, (mut cell, style)) in row_cells.into_iter().enumerate() {
                if let Some(style) = style {
                    cell.style_id = page.styles.add(style);
                    any_styled = true;
                }
                *page.cell_mut(x, pin.y) = cell;
            }
            let row = page.row_mut(pin.y);
            row.wrap = row_flags.wrap && copy_cols == cols;
            row.wrap_continuation = row_flags.wrap_continuation;
            row.semantic_prompt = row_flags.semantic_prompt;
            row.styled = any_styled;
            page.mark_row_dirty(pin.y);
        }

        // Re-home the cursor within the new bounds and re-intern its
        // style on whichever page it lands on.
        let x = self.cursor.x.min(cols - 1);
        let y = self.cursor.y.saturating_sub(skip).min(rows - 1);
        let pin = self
            .pages
            .pin(Point::new(Tag::Active, x, y))
            .expect("clamped cursor position resolves");
        self.pages.set_tracked(self.cursor.pin, pin);
        self.cursor.x = x;
        self.cursor.y = y;
        self.cursor.pending_wrap = false;
        self.cursor.style_id = refset::DEFAULT_ID;
        self.manual_style_update();

        self.assert_integrity();
    }

    /// Resize with reflow. Reflowing soft-wrapped text on column change is
    /// not implemented; this truncates like
    /// [`Screen::resize_without_reflow`].
    pub fn resize_with_reflow(&mut self, cols: usize, rows: usize) {
        log::debug!("resize reflow not implemented; truncating");
        self.resize_without_reflow(cols, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::CellContent;
    use crate::core::style::Rgb;
    use unicode_width::UnicodeWidthChar;

    /// Write a string the way the terminal would, minus modes and regions.
    /// Newlines force a new row.
    fn write_string(screen: &mut Screen, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                screen.cursor.pending_wrap = false;
                screen.set_cursor_down_or_scroll();
                screen.set_cursor_horizontal_abs(0);
                screen.cursor_row_mut().wrap = false;
                continue;
            }
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }

            if screen.cursor.pending_wrap {
                assert_eq!(screen.cursor.x, screen.cols() - 1);
                screen.cursor.pending_wrap = false;
                screen.cursor_row_mut().wrap = true;
                screen.set_cursor_down_or_scroll();
                screen.set_cursor_horizontal_abs(0);
                screen.cursor_row_mut().wrap_continuation = true;
            }

            match width {
                1 => {
                    let style_id = screen.cursor.style_id;
                    {
                        let cell = screen.cursor_cell_mut();
                        cell.content = CellContent::Codepoint(ch as u32);
                        cell.style_id = style_id;
                    }
                    if screen.cursor.has_style() {
                        let pin = screen.cursor_pin();
                        screen.pages.page_mut(pin.node).styles.use_ref(style_id);
                        screen.cursor_row_mut().styled = true;
                    }
                }
                2 => {
                    if screen.cursor.x == screen.cols() - 1 {
                        {
                            let cell = screen.cursor_cell_mut();
                            cell.content = CellContent::Codepoint(0);
                            cell.wide = Wide::SpacerHead;
                        }
                        screen.cursor_row_mut().wrap = true;
                        screen.set_cursor_down(1);
                        screen.set_cursor_horizontal_abs(0);
                        screen.cursor_row_mut().wrap_continuation = true;
                    }
                    {
                        let cell = screen.cursor_cell_mut();
                        cell.content = CellContent::Codepoint(ch as u32);
                        cell.wide = Wide::Wide;
                    }
                    screen.set_cursor_right(1);
                    {
                        let cell = screen.cursor_cell_mut();
                        cell.content = CellContent::Codepoint(0);
                        cell.wide = Wide::SpacerTail;
                    }
                }
                other => panic!("unexpected width {}", other),
            }

            if screen.cursor.x + 1 < screen.cols() {
                screen.set_cursor_right(1);
            } else {
                screen.cursor.pending_wrap = true;
            }
        }
    }

    fn dump(screen: &Screen, tag: Tag) -> String {
        let mut out = String::new();
        screen.dump_string(&mut out, tag).unwrap();
        out
    }

    #[test]
    fn test_new_screen() {
        let screen = Screen::new(80, 24);
        assert_eq!(screen.cursor.x, 0);
        assert_eq!(screen.cursor.y, 0);
        assert!(!screen.cursor.has_style());
        screen.assert_integrity();
    }

    #[test]
    fn test_write_and_dump() {
        let mut screen = Screen::new(80, 24);
        write_string(&mut screen, "hello\nworld");
        assert_eq!(dump(&screen, Tag::Screen), "hello\nworld");
        assert_eq!(screen.cursor.y, 1);
        assert_eq!(screen.cursor.x, 5);
    }

    #[test]
    fn test_cursor_motion() {
        let mut screen = Screen::new(80, 24);
        screen.set_cursor_abs(10, 5);
        assert_eq!((screen.cursor.x, screen.cursor.y), (10, 5));

        screen.set_cursor_right(3);
        assert_eq!(screen.cursor.x, 13);
        screen.set_cursor_left(13);
        assert_eq!(screen.cursor.x, 0);
        screen.set_cursor_down(2);
        assert_eq!(screen.cursor.y, 7);
        screen.set_cursor_up(7);
        assert_eq!(screen.cursor.y, 0);
    }

    #[test]
    fn test_scroll_up_at_bottom_creates_history() {
        let mut screen = Screen::new(10, 3);
        write_string(&mut screen, "a\nb\nc");
        assert_eq!(screen.cursor.y, 2);

        screen.set_cursor_down_scroll();

        // Active area slid down; "a" is history now.
        assert_eq!(dump(&screen, Tag::Screen), "a\nb\nc");
        let top = screen.pages.top_left(Tag::Active);
        assert_eq!(top.y, 1);
        assert_eq!(screen.cursor.y, 2);
    }

    #[test]
    fn test_scroll_up_mid_screen_preserves_rows_below() {
        let mut screen = Screen::new(10, 4);
        write_string(&mut screen, "a\nb\nc\nd");
        // Cursor to row 1 ("b").
        screen.set_cursor_abs(0, 1);

        screen.set_cursor_scroll_up();

        // Rows at and above the cursor scrolled; c and d stayed.
        let mut out = String::new();
        let tl = screen.pages.top_left(Tag::Active);
        let br = screen.pages.bottom_right(Tag::Active);
        screen.pages.encode_utf8(&mut out, false, tl, br).unwrap();
        assert_eq!(out, "b\n\nc\nd");
        // History holds the scrolled-out "a".
        assert_eq!(dump(&screen, Tag::History), "a");
    }

    #[test]
    fn test_no_scrollback_single_row() {
        let mut screen = Screen::new(10, 1);
        screen.no_scrollback = true;
        write_string(&mut screen, "x");
        screen.set_cursor_down_scroll();
        assert_eq!(dump(&screen, Tag::Screen), "");
        assert_eq!(screen.pages.total_rows(), 1);
    }

    #[test]
    fn test_no_scrollback_shifts_in_place() {
        let mut screen = Screen::new(10, 3);
        screen.no_scrollback = true;
        write_string(&mut screen, "a\nb\nc");
        screen.set_cursor_down_scroll();

        assert_eq!(dump(&screen, Tag::Screen), "b\nc");
        assert_eq!(screen.pages.total_rows(), 3);
        assert_eq!(screen.cursor.y, 2);
    }

    #[test]
    fn test_style_interning_via_sgr() {
        let mut screen = Screen::new(20, 5);
        screen.set_graphics_rendition(&Attribute::Bold);
        assert!(screen.cursor.has_style());
        let pin = screen.cursor_pin();
        assert_eq!(screen.pages.page(pin.node).styles.count(), 1);

        write_string(&mut screen, "a");

        // ResetBold returns the cursor to the default style; the cell keeps
        // the only remaining reference.
        screen.set_graphics_rendition(&Attribute::ResetBold);
        assert!(!screen.cursor.has_style());
        assert_eq!(screen.pages.page(pin.node).styles.count(), 1);

        // Clearing the cell releases the last reference.
        screen.clear_cells(pin.node, pin.y, 0, 20);
        assert_eq!(screen.pages.page(pin.node).styles.count(), 0);
    }

    #[test]
    fn test_blank_cell_uses_background() {
        let mut screen = Screen::new(20, 5);
        assert_eq!(screen.blank_cell(), Cell::default());

        screen.set_graphics_rendition(&Attribute::DirectColorBg(Rgb::new(9, 9, 9)));
        let blank = screen.blank_cell();
        assert_eq!(blank.content, CellContent::BgRgb(Rgb::new(9, 9, 9)));
        assert!(!blank.has_style());
    }

    #[test]
    fn test_clear_rows_to_bottom() {
        let mut screen = Screen::new(10, 4);
        write_string(&mut screen, "a\nb\nc\nd");
        screen.clear_rows(Point::new(Tag::Active, 0, 1), None);
        assert_eq!(dump(&screen, Tag::Screen), "a");
    }

    #[test]
    fn test_clear_rows_range() {
        let mut screen = Screen::new(10, 4);
        write_string(&mut screen, "a\nb\nc\nd");
        screen.clear_rows(
            Point::new(Tag::Active, 0, 1),
            Some(Point::new(Tag::Active, 0, 2)),
        );
        assert_eq!(dump(&screen, Tag::Screen), "a\n\n\nd");
    }

    #[test]
    fn test_reset() {
        let mut screen = Screen::new(10, 4);
        write_string(&mut screen, "a\nb\nc\nd\ne\nf");
        screen.set_graphics_rendition(&Attribute::Bold);
        screen.reset();

        assert_eq!(dump(&screen, Tag::Screen), "");
        assert_eq!((screen.cursor.x, screen.cursor.y), (0, 0));
        assert!(!screen.cursor.has_style());
        assert_eq!(screen.pages.total_rows(), 4);
    }

    #[test]
    fn test_split_cell_boundary_clears_wide_pair() {
        let mut screen = Screen::new(10, 2);
        write_string(&mut screen, "\u{4E2D}x");
        assert_eq!(screen.cursor_cell_left(1).codepoint(), 'x' as u32);

        // Splitting at column 1 lands between the wide head and its tail.
        screen.split_cell_boundary(1);
        let pin = screen.cursor_pin();
        assert!(screen.pages.page(pin.node).cell(0, pin.y).is_empty());
        assert!(screen.pages.page(pin.node).cell(1, pin.y).is_empty());
        assert_eq!(screen.pages.page(pin.node).cell(2, pin.y).codepoint(), 'x' as u32);
    }

    #[test]
    fn test_resize_truncates_columns() {
        let mut screen = Screen::new(10, 3);
        write_string(&mut screen, "abcdefghij\nkl");
        screen.resize_without_reflow(5, 3);
        assert_eq!(screen.cols(), 5);
        assert_eq!(dump(&screen, Tag::Screen), "abcde\nkl");
    }

    #[test]
    fn test_resize_keeps_bottom_rows() {
        let mut screen = Screen::new(10, 4);
        write_string(&mut screen, "a\nb\nc\nd");
        screen.resize_without_reflow(10, 2);
        assert_eq!(dump(&screen, Tag::Screen), "c\nd");
        assert!(screen.cursor.y < 2);
    }

    #[test]
    fn test_resize_grows_blank() {
        let mut screen = Screen::new(5, 2);
        write_string(&mut screen, "ab");
        screen.resize_without_reflow(8, 4);
        assert_eq!(dump(&screen, Tag::Screen), "ab");
        assert_eq!(screen.rows(), 4);
        assert_eq!(screen.pages.total_rows(), 4);
    }

    #[test]
    fn test_resize_preserves_styles() {
        let mut screen = Screen::new(10, 2);
        screen.set_graphics_rendition(&Attribute::Bold);
        write_string(&mut screen, "a");
        screen.resize_without_reflow(8, 2);

        let pin = screen.pages.pin(Point::new(Tag::Active, 0, 0)).unwrap();
        let page = screen.pages.page(pin.node);
        let cell = page.cell(0, pin.y);
        assert!(cell.has_style());
        assert!(page.styles.get(cell.style_id).unwrap().bold);
    }

    #[test]
    fn test_cursor_style_follows_page_change() {
        let mut screen = Screen::new(10, 3);
        screen.set_graphics_rendition(&Attribute::Bold);
        let old_pin = screen.cursor_pin();
        assert_eq!(screen.pages.page(old_pin.node).styles.count(), 1);

        // Force the cursor onto a new page.
        let capacity_rows = screen.pages.page(screen.pages.first()).capacity.rows;
        screen.pages.grow_rows(capacity_rows - 3 + 1).unwrap();
        let new_pin = screen.pages.pin(Point::new(Tag::Active, 0, 2)).unwrap();
        assert_ne!(new_pin.node, old_pin.node);
        screen.cursor.y = 2;
        screen.cursor_change_pin(new_pin);

        // The style moved with the cursor: released on the old page,
        // interned on the new one.
        assert_eq!(screen.pages.page(old_pin.node).styles.count(), 0);
        assert_eq!(screen.pages.page(new_pin.node).styles.count(), 1);
        assert!(screen
            .pages
            .page(new_pin.node)
            .styles
            .get(screen.cursor.style_id)
            .unwrap()
            .bold);
    }
}
