//! Page
//!
//! A page is a fixed-capacity section of the screen: a contiguous cell
//! array, a row array mapping display order onto that array, a ref-counted
//! style set, and one dirty bit per row. Pages are fully self-contained so
//! the page list can shuffle, recycle, and encode them independently.
//!
//! Rows reference their cells by offset into the cell array. Rotating the
//! row array therefore moves whole rows in O(rows), never touching cell
//! data, which is what makes scrolling cheap.

use std::fmt::{self, Write};

use thiserror::Error;

use super::bitset::BitSet;
use super::cell::{has_text_any, Cell, CellContent};
use super::refset::RefCountedSet;
use super::row::Row;
use super::style::Style;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    /// A capacity adjustment or page allocation could not satisfy the
    /// requested geometry.
    #[error("page out of memory")]
    OutOfMemory,
}

/// The active size of a page, always within its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: usize,
    pub rows: usize,
}

/// The allocation geometry of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub cols: usize,
    pub rows: usize,
    /// Maximum number of unique styles in the page's style set.
    pub styles: usize,
}

/// The standard page geometry. Large enough that ordinary terminals fit
/// many rows per page; adjusted down in rows when columns grow.
pub const STANDARD_CAPACITY: Capacity = Capacity {
    cols: 215,
    rows: 215,
    styles: 128,
};

impl Capacity {
    /// Adjust the column count while preserving the total cell budget.
    /// Rows shrink to compensate; if they would reach zero the requested
    /// geometry is unsatisfiable.
    pub fn adjust_cols(&mut self, cols: usize) -> Result<(), PageError> {
        if cols == 0 || cols == self.cols {
            return Ok(());
        }
        let total_cells = self.cols * self.rows;
        let new_rows = total_cells / cols;
        if new_rows == 0 {
            return Err(PageError::OutOfMemory);
        }
        self.rows = new_rows;
        self.cols = cols;
        Ok(())
    }
}

/// Options for encoding page contents as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeUtf8Options {
    pub start_y: usize,
    /// Exclusive end row; `None` encodes through the last row.
    pub end_y: Option<usize>,
    /// Unwrap soft-wrapped rows instead of emitting the visual newline.
    pub unwrap: bool,
    /// Accumulated blank state from the preceding page.
    pub preceding: TrailingUtf8State,
}

/// Blank rows/cells seen but not yet emitted. Threaded across pages so
/// trailing blanks never produce output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrailingUtf8State {
    pub rows: usize,
    pub cells: usize,
}

/// A fixed-capacity grid chunk.
#[derive(Debug)]
pub struct Page {
    rows: Vec<Row>,
    cells: Vec<Cell>,
    pub styles: RefCountedSet<Style>,
    dirty: BitSet,
    pub size: Size,
    pub capacity: Capacity,
    /// Reentrant pause counter for integrity checking.
    pause_integrity: u32,
}

impl Page {
    pub fn new(capacity: Capacity) -> Self {
        let cells = vec![Cell::default(); capacity.cols * capacity.rows];
        let rows = (0..capacity.rows)
            .map(|y| Row {
                cells_offset: y * capacity.cols,
                ..Default::default()
            })
            .collect();

        Self {
            rows,
            cells,
            styles: RefCountedSet::new(Some(capacity.styles)),
            dirty: BitSet::new(capacity.rows),
            size: Size {
                cols: capacity.cols,
                rows: capacity.rows,
            },
            capacity,
            pause_integrity: 0,
        }
    }

    /// Temporarily pause integrity checks while a multi-step mutation
    /// passes through inconsistent intermediate states. Reentrant: `true`
    /// increments the pause counter, `false` decrements it.
    pub fn pause_integrity_checks(&mut self, pause: bool) {
        if pause {
            self.pause_integrity += 1;
        } else {
            assert!(self.pause_integrity > 0, "unbalanced integrity unpause");
            self.pause_integrity -= 1;
        }
    }

    /// Assert the page invariants. A no-op while paused; the expensive
    /// scans only run with debug assertions enabled.
    pub fn assert_integrity(&self) {
        if self.pause_integrity > 0 {
            return;
        }
        assert!(self.size.rows > 0, "page has zero rows");
        assert!(self.size.cols > 0, "page has zero cols");

        #[cfg(debug_assertions)]
        {
            assert!(self.dirty.count() <= self.capacity.rows);
            for y in 0..self.size.rows {
                let row = &self.rows[y];
                let cells = &self.cells[row.cells_offset..row.cells_offset + self.size.cols];
                for (x, cell) in cells.iter().enumerate() {
                    if cell.wide == super::cell::Wide::Wide && x + 1 < self.size.cols {
                        assert_eq!(
                            cells[x + 1].wide,
                            super::cell::Wide::SpacerTail,
                            "wide cell at ({}, {}) lacks its spacer tail",
                            x,
                            y
                        );
                    }
                    if cell.has_style() {
                        assert!(
                            self.styles.ref_count(cell.style_id) > 0,
                            "cell at ({}, {}) references a released style",
                            x,
                            y
                        );
                    }
                }
            }
        }
    }

    pub fn row(&self, y: usize) -> &Row {
        assert!(y < self.size.rows, "row index out of bounds");
        &self.rows[y]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut Row {
        assert!(y < self.size.rows, "row index out of bounds");
        &mut self.rows[y]
    }

    /// The cells of row `y`, in column order.
    pub fn row_cells(&self, y: usize) -> &[Cell] {
        let row = self.row(y);
        &self.cells[row.cells_offset..row.cells_offset + self.size.cols]
    }

    pub fn row_cells_mut(&mut self, y: usize) -> &mut [Cell] {
        assert!(y < self.size.rows, "row index out of bounds");
        let offset = self.rows[y].cells_offset;
        &mut self.cells[offset..offset + self.size.cols]
    }

    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        assert!(x < self.size.cols, "column index out of bounds");
        let row = self.row(y);
        &self.cells[row.cells_offset + x]
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        assert!(x < self.size.cols, "column index out of bounds");
        assert!(y < self.size.rows, "row index out of bounds");
        let offset = self.rows[y].cells_offset;
        &mut self.cells[offset + x]
    }

    pub fn dirty(&self) -> &BitSet {
        &self.dirty
    }

    pub fn dirty_mut(&mut self) -> &mut BitSet {
        &mut self.dirty
    }

    pub fn is_row_dirty(&self, y: usize) -> bool {
        self.dirty.is_set(y)
    }

    pub fn mark_row_dirty(&mut self, y: usize) {
        self.dirty.set(y);
    }

    /// Rotate the rows `[start, end)` up by one: the row at `start` moves
    /// to `end - 1` and everything else shifts toward `start`.
    pub fn rotate_rows_up(&mut self, start: usize, end: usize) {
        self.rows[start..end].rotate_left(1);
    }

    /// Rotate the rows `[start, end)` down by one: the row at `end - 1`
    /// moves to `start`.
    pub fn rotate_rows_down(&mut self, start: usize, end: usize) {
        self.rows[start..end].rotate_right(1);
    }

    /// Swap two whole rows, cells and flags together.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        assert!(a < self.size.rows && b < self.size.rows);
        self.rows.swap(a, b);
    }

    /// Swap two cells in place. Style references travel with the cells so
    /// no refcount bookkeeping is needed.
    pub fn swap_cells(&mut self, y: usize, a: usize, b: usize) {
        let offset = self.rows[y].cells_offset;
        self.cells.swap(offset + a, offset + b);
    }

    /// Clear the cells `[from, to)` of row `y` to the zero cell.
    pub fn clear_cells(&mut self, y: usize, from: usize, to: usize) {
        self.clear_cells_with(y, from, to, Cell::default());
    }

    /// Clear the cells `[from, to)` of row `y`, releasing any style
    /// references they hold, and fill them with `blank`. Clearing the full
    /// row width also drops the row's styled flag.
    pub fn clear_cells_with(&mut self, y: usize, from: usize, to: usize, blank: Cell) {
        assert!(from <= to && to <= self.size.cols, "clear range out of bounds");
        assert!(
            !blank.has_style(),
            "blank cells must not carry a style reference"
        );

        let offset = self.rows[y].cells_offset;
        if self.rows[y].styled {
            for cell in &self.cells[offset + from..offset + to] {
                if cell.has_style() {
                    self.styles.release(cell.style_id);
                }
            }
            if to - from == self.size.cols {
                self.rows[y].styled = false;
            }
        }

        // No integrity scan here: callers clear one half of a wide pair
        // and patch the other immediately after.
        self.cells[offset + from..offset + to].fill(blank);
    }

    /// Deep-copy a full row from another page, translating style ids into
    /// this page's style set.
    pub fn clone_row_from(&mut self, src: &Page, dst_y: usize, src_y: usize) {
        self.clone_partial_row_from(src, dst_y, src_y, 0, self.size.cols);
        let src_row = src.row(src_y);
        let dst_row = self.row_mut(dst_y);
        dst_row.wrap = src_row.wrap;
        dst_row.wrap_continuation = src_row.wrap_continuation;
        dst_row.semantic_prompt = src_row.semantic_prompt;
    }

    /// Deep-copy the cells `[left, right)` of a row from another page.
    /// Existing style references in the destination range are released and
    /// source styles re-interned here.
    pub fn clone_partial_row_from(
        &mut self,
        src: &Page,
        dst_y: usize,
        src_y: usize,
        left: usize,
        right: usize,
    ) {
        assert!(left <= right && right <= self.size.cols);
        self.clear_cells(dst_y, left, right);

        let dst_offset = self.rows[dst_y].cells_offset;
        let mut any_styled = false;
        for x in left..right {
            let mut cell = *src.cell(x, src_y);
            if cell.has_style() {
                let style = *src
                    .styles
                    .get(cell.style_id)
                    .expect("source cell references a released style");
                cell.style_id = self.styles.add(style);
                any_styled = true;
            }
            self.cells[dst_offset + x] = cell;
        }
        if any_styled {
            self.rows[dst_y].styled = true;
        }
    }

    /// Move `count` cells within this page from one row span to another by
    /// swapping, as used by scrolling inside left/right margins. Style
    /// references travel with the cells.
    pub fn move_cells(
        &mut self,
        src_y: usize,
        src_left: usize,
        dst_y: usize,
        dst_left: usize,
        count: usize,
    ) {
        assert!(src_left + count <= self.size.cols);
        assert!(dst_left + count <= self.size.cols);
        let src_offset = self.rows[src_y].cells_offset;
        let dst_offset = self.rows[dst_y].cells_offset;
        for i in 0..count {
            self.cells.swap(src_offset + src_left + i, dst_offset + dst_left + i);
        }
        if self.rows[src_y].styled {
            self.rows[dst_y].styled = true;
        }
    }

    /// Encode the rows selected by `opts` as UTF-8.
    ///
    /// Blank cells and blank rows are accumulated rather than emitted, and
    /// flushed only when later content forces them to be visible. Returns
    /// the accumulator so a caller iterating multiple pages can thread it
    /// through.
    pub fn encode_utf8<W: Write>(
        &self,
        writer: &mut W,
        opts: EncodeUtf8Options,
    ) -> Result<TrailingUtf8State, fmt::Error> {
        let mut blank_rows = opts.preceding.rows;
        let mut blank_cells = opts.preceding.cells;
        let end_y = opts.end_y.unwrap_or(self.size.rows);

        for y in opts.start_y..end_y {
            let row = self.row(y);
            let cells = self.row_cells(y);

            if !has_text_any(cells) {
                blank_rows += 1;
                continue;
            }

            for _ in 0..blank_rows {
                writer.write_char('\n')?;
            }
            blank_rows = 0;

            // A row that does not soft-wrap ends with a visual newline,
            // which we defer in case nothing follows it.
            if !row.wrap || !opts.unwrap {
                blank_rows += 1;
            }

            // A fresh visual line resets the pending blank run.
            if !row.wrap_continuation || !opts.unwrap {
                blank_cells = 0;
            }

            for cell in cells {
                match cell.wide {
                    super::cell::Wide::SpacerHead | super::cell::Wide::SpacerTail => continue,
                    super::cell::Wide::Narrow | super::cell::Wide::Wide => {}
                }

                if !cell.has_text() {
                    blank_cells += 1;
                    continue;
                }

                for _ in 0..blank_cells {
                    writer.write_char(' ')?;
                }
                blank_cells = 0;

                if let CellContent::Codepoint(cp) = cell.content {
                    writer.write_char(char::from_u32(cp).unwrap_or('\u{FFFD}'))?;
                }
            }
        }

        Ok(TrailingUtf8State {
            rows: blank_rows,
            cells: blank_cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Wide;

    fn small_page() -> Page {
        Page::new(Capacity {
            cols: 10,
            rows: 5,
            styles: 16,
        })
    }

    #[test]
    fn test_new_page_geometry() {
        let page = small_page();
        assert_eq!(page.size.cols, 10);
        assert_eq!(page.size.rows, 5);
        assert!(page.cell(9, 4).is_empty());
        page.assert_integrity();
    }

    #[test]
    fn test_capacity_adjust_preserves_cell_budget() {
        let mut capacity = STANDARD_CAPACITY;
        capacity.adjust_cols(430).unwrap();
        assert_eq!(capacity.cols, 430);
        assert_eq!(capacity.rows, 215 * 215 / 430);

        let mut capacity = STANDARD_CAPACITY;
        capacity.adjust_cols(1).unwrap();
        assert_eq!(capacity.rows, 215 * 215);
    }

    #[test]
    fn test_capacity_adjust_out_of_memory() {
        let mut capacity = Capacity {
            cols: 4,
            rows: 4,
            styles: 8,
        };
        assert_eq!(capacity.adjust_cols(100), Err(PageError::OutOfMemory));
    }

    #[test]
    fn test_clear_cells_releases_styles() {
        let mut page = small_page();
        let style = Style {
            bold: true,
            ..Default::default()
        };
        let id = page.styles.add(style);
        {
            let cell = page.cell_mut(2, 0);
            cell.content = CellContent::Codepoint('x' as u32);
            cell.style_id = id;
        }
        page.row_mut(0).styled = true;
        assert_eq!(page.styles.count(), 1);

        page.clear_cells(0, 0, 10);
        assert_eq!(page.styles.count(), 0);
        assert!(!page.row(0).styled);
        assert!(page.cell(2, 0).is_empty());
    }

    #[test]
    fn test_clear_cells_partial_keeps_styled_flag() {
        let mut page = small_page();
        page.row_mut(0).styled = true;
        page.clear_cells(0, 0, 5);
        assert!(page.row(0).styled);
    }

    #[test]
    fn test_rotate_rows_carries_cells() {
        let mut page = small_page();
        page.cell_mut(0, 0).content = CellContent::Codepoint('a' as u32);
        page.cell_mut(0, 1).content = CellContent::Codepoint('b' as u32);
        page.cell_mut(0, 2).content = CellContent::Codepoint('c' as u32);

        page.rotate_rows_up(0, 3);
        assert_eq!(page.cell(0, 0).codepoint(), 'b' as u32);
        assert_eq!(page.cell(0, 1).codepoint(), 'c' as u32);
        assert_eq!(page.cell(0, 2).codepoint(), 'a' as u32);

        page.rotate_rows_down(0, 3);
        assert_eq!(page.cell(0, 0).codepoint(), 'a' as u32);
    }

    #[test]
    fn test_clone_row_translates_styles() {
        let mut src = small_page();
        let style = Style {
            italic: true,
            ..Default::default()
        };
        let src_id = src.styles.add(style);
        {
            let cell = src.cell_mut(1, 0);
            cell.content = CellContent::Codepoint('q' as u32);
            cell.style_id = src_id;
        }
        src.row_mut(0).styled = true;
        src.row_mut(0).wrap = true;

        let mut dst = small_page();
        // Occupy an id in the destination so translation is observable.
        dst.styles.add(Style {
            faint: true,
            ..Default::default()
        });

        dst.clone_row_from(&src, 3, 0);
        let cell = page_cell(&dst, 1, 3);
        assert_eq!(cell.codepoint(), 'q' as u32);
        assert!(cell.has_style());
        assert_eq!(dst.styles.get(cell.style_id), Some(&style));
        assert!(dst.row(3).styled);
        assert!(dst.row(3).wrap);
    }

    fn page_cell(page: &Page, x: usize, y: usize) -> Cell {
        *page.cell(x, y)
    }

    #[test]
    fn test_move_cells_swaps_content() {
        let mut page = small_page();
        page.cell_mut(2, 0).content = CellContent::Codepoint('m' as u32);
        page.move_cells(0, 2, 3, 2, 3);
        assert_eq!(page.cell(2, 3).codepoint(), 'm' as u32);
        assert!(page.cell(2, 0).is_empty());
    }

    #[test]
    fn test_encode_utf8_basic() {
        let mut page = small_page();
        for (x, ch) in "hi".chars().enumerate() {
            page.cell_mut(x, 0).content = CellContent::Codepoint(ch as u32);
        }
        page.cell_mut(0, 2).content = CellContent::Codepoint('y' as u32);

        let mut out = String::new();
        page.encode_utf8(&mut out, EncodeUtf8Options::default())
            .unwrap();
        assert_eq!(out, "hi\n\ny");
    }

    #[test]
    fn test_encode_utf8_interior_blanks() {
        let mut page = small_page();
        page.cell_mut(0, 0).content = CellContent::Codepoint('a' as u32);
        page.cell_mut(4, 0).content = CellContent::Codepoint('b' as u32);

        let mut out = String::new();
        page.encode_utf8(&mut out, EncodeUtf8Options::default())
            .unwrap();
        assert_eq!(out, "a   b");
    }

    #[test]
    fn test_encode_utf8_skips_spacers() {
        let mut page = small_page();
        {
            let cell = page.cell_mut(0, 0);
            cell.content = CellContent::Codepoint(0x4E2D);
            cell.wide = Wide::Wide;
        }
        page.cell_mut(1, 0).wide = Wide::SpacerTail;
        page.cell_mut(2, 0).content = CellContent::Codepoint('!' as u32);

        let mut out = String::new();
        page.encode_utf8(&mut out, EncodeUtf8Options::default())
            .unwrap();
        assert_eq!(out, "\u{4E2D}!");
    }

    #[test]
    fn test_pause_integrity_reentrant() {
        let mut page = small_page();
        page.pause_integrity_checks(true);
        page.pause_integrity_checks(true);
        page.pause_integrity_checks(false);
        // Still paused after one decrement.
        page.pause_integrity_checks(false);
        page.assert_integrity();
    }
}
