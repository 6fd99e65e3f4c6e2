//! Page list
//!
//! A doubly-linked list of pages holding the active area plus scrollback.
//! Nodes live in an arena and link to each other by id; a node is never
//! deallocated (pruning recycles it in place), so node ids held by pins
//! stay valid for the life of the list.
//!
//! Pins are stable `(node, x, y)` coordinates. A pin registered through
//! [`PageList::track_pin`] is rewritten by every structural mutation that
//! shifts rows, so its logical position survives scrolling, pruning, and
//! row erasure. Untracked pins are invalidated by any such operation.

use log::debug;

use super::page::{
    EncodeUtf8Options, Page, PageError, TrailingUtf8State, STANDARD_CAPACITY,
};
use super::point::{Point, Tag};

/// Default scrollback budget, in pages.
pub const DEFAULT_MAX_PAGES: usize = 16;

/// Identifies a page node within the list's arena. Stable for the life of
/// the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A stable coordinate into the page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub node: NodeId,
    pub x: usize,
    pub y: usize,
}

impl Pin {
    pub fn new(node: NodeId, x: usize, y: usize) -> Self {
        Self { node, x, y }
    }
}

/// Handle to a tracked pin slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinHandle(usize);

/// Where the viewport is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    /// Pinned to the active area. A marker rather than a row offset so
    /// that scrolling costs no writes.
    #[default]
    Active,
    /// Pinned to the top of the scrollback.
    Top,
    /// Pinned to the dedicated viewport pin.
    Pin,
}

#[derive(Debug)]
struct PageNode {
    page: Page,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// The linked list of pages.
#[derive(Debug)]
pub struct PageList {
    nodes: Vec<PageNode>,
    first: NodeId,
    last: NodeId,

    /// Desired screen geometry. Individual pages may differ; the invariant
    /// is only that the tail pages can hold `rows` rows.
    pub cols: usize,
    pub rows: usize,

    /// Pages currently linked into the list.
    page_count: usize,
    /// Budget in pages; exceeding it makes `grow` prune scrollback.
    max_pages: usize,

    pub viewport: Viewport,
    viewport_pin: PinHandle,

    /// Registered pins, rewritten on every structural mutation.
    tracked: Vec<Option<Pin>>,
}

impl PageList {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self::with_max_pages(cols, rows, DEFAULT_MAX_PAGES)
    }

    pub fn with_max_pages(cols: usize, rows: usize, max_pages: usize) -> Self {
        assert!(cols > 0 && rows > 0, "page list needs a nonzero geometry");

        let mut capacity = STANDARD_CAPACITY;
        capacity
            .adjust_cols(cols)
            .expect("standard capacity cannot satisfy the column count");

        let mut list = Self {
            nodes: Vec::new(),
            first: NodeId(0),
            last: NodeId(0),
            cols,
            rows,
            page_count: 0,
            max_pages,
            viewport: Viewport::Active,
            viewport_pin: PinHandle(0),
            tracked: Vec::new(),
        };

        // Pages as needed to cover the initial active area.
        let mut remaining = rows;
        let mut prev: Option<NodeId> = None;
        while remaining > 0 {
            let mut page = Page::new(capacity);
            page.size.rows = remaining.min(capacity.rows);
            remaining -= page.size.rows;

            let id = NodeId(list.nodes.len());
            list.nodes.push(PageNode {
                page,
                prev,
                next: None,
            });
            if let Some(prev_id) = prev {
                list.nodes[prev_id.0].next = Some(id);
            } else {
                list.first = id;
            }
            list.last = id;
            list.page_count += 1;
            prev = Some(id);
        }

        // Slot 0 is the viewport pin, pre-allocated so scrolling can never
        // hit a failable allocation.
        let first = list.first;
        list.tracked.push(Some(Pin::new(first, 0, 0)));
        list.viewport_pin = PinHandle(0);

        list
    }

    pub fn first(&self) -> NodeId {
        self.first
    }

    pub fn last(&self) -> NodeId {
        self.last
    }

    pub fn next_node(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    pub fn prev_node(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev
    }

    pub fn page(&self, id: NodeId) -> &Page {
        &self.nodes[id.0].page
    }

    pub fn page_mut(&mut self, id: NodeId) -> &mut Page {
        &mut self.nodes[id.0].page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Deep-copy a row between two pages of this list, translating style
    /// ids into the destination page's style set.
    pub fn clone_row_between(
        &mut self,
        dst: NodeId,
        dst_y: usize,
        src: NodeId,
        src_y: usize,
    ) {
        let (dst_page, src_page) = self.two_pages_mut(dst, src);
        dst_page.clone_row_from(src_page, dst_y, src_y);
    }

    /// Like [`PageList::clone_row_between`] but copying only the columns
    /// `[left, right)`.
    pub fn clone_partial_row_between(
        &mut self,
        dst: NodeId,
        dst_y: usize,
        src: NodeId,
        src_y: usize,
        left: usize,
        right: usize,
    ) {
        let (dst_page, src_page) = self.two_pages_mut(dst, src);
        dst_page.clone_partial_row_from(src_page, dst_y, src_y, left, right);
    }

    /// Mutable access to two distinct pages at once, destination first.
    fn two_pages_mut(&mut self, dst: NodeId, src: NodeId) -> (&mut Page, &Page) {
        assert_ne!(dst.0, src.0, "pages must be distinct");
        if dst.0 < src.0 {
            let (low, high) = self.nodes.split_at_mut(src.0);
            (&mut low[dst.0].page, &high[0].page)
        } else {
            let (low, high) = self.nodes.split_at_mut(dst.0);
            (&mut high[0].page, &low[src.0].page)
        }
    }

    // ------------------------------------------------------------------
    // Tracked pins

    /// Register a pin so structural mutations keep it coherent.
    pub fn track_pin(&mut self, pin: Pin) -> PinHandle {
        for (i, slot) in self.tracked.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(pin);
                return PinHandle(i);
            }
        }
        self.tracked.push(Some(pin));
        PinHandle(self.tracked.len() - 1)
    }

    /// Deregister a tracked pin. The viewport pin must stay registered.
    pub fn untrack_pin(&mut self, handle: PinHandle) {
        assert_ne!(handle, self.viewport_pin, "cannot untrack the viewport pin");
        self.tracked[handle.0] = None;
    }

    pub fn tracked(&self, handle: PinHandle) -> Pin {
        self.tracked[handle.0].expect("tracked pin slot is empty")
    }

    pub fn set_tracked(&mut self, handle: PinHandle, pin: Pin) {
        let slot = self.tracked[handle.0].as_mut().expect("tracked pin slot is empty");
        *slot = pin;
    }

    pub fn viewport_pin_handle(&self) -> PinHandle {
        self.viewport_pin
    }

    /// Run `f` over every registered pin.
    fn update_tracked_pins(&mut self, mut f: impl FnMut(&mut Pin)) {
        for slot in self.tracked.iter_mut().flatten() {
            f(slot);
        }
    }

    // ------------------------------------------------------------------
    // Pin navigation

    /// Move a pin down `n` rows, or `None` past the end of the list.
    pub fn pin_down(&self, pin: Pin, n: usize) -> Option<Pin> {
        let page = self.page(pin.node);
        let avail = page.size.rows - (pin.y + 1);
        if n <= avail {
            return Some(Pin::new(pin.node, pin.x, pin.y + n));
        }

        let mut rem = n - avail;
        let mut node = self.next_node(pin.node)?;
        while rem > self.page(node).size.rows {
            rem -= self.page(node).size.rows;
            node = self.next_node(node)?;
        }
        Some(Pin::new(node, pin.x, rem - 1))
    }

    /// Move a pin up `n` rows, or `None` past the start of the list.
    pub fn pin_up(&self, pin: Pin, n: usize) -> Option<Pin> {
        if n <= pin.y {
            return Some(Pin::new(pin.node, pin.x, pin.y - n));
        }

        let mut rem = n - pin.y;
        let mut node = self.prev_node(pin.node)?;
        while rem > self.page(node).size.rows {
            rem -= self.page(node).size.rows;
            node = self.prev_node(node)?;
        }
        Some(Pin::new(node, pin.x, self.page(node).size.rows - rem))
    }

    /// True if `a` is strictly before `b` in list order. Traverses links,
    /// so avoid in hot paths.
    pub fn pin_before(&self, a: Pin, b: Pin) -> bool {
        if a.node == b.node {
            return a.y < b.y || (a.y == b.y && a.x < b.x);
        }
        let mut node = self.next_node(a.node);
        while let Some(id) = node {
            if id == b.node {
                return true;
            }
            node = self.next_node(id);
        }
        false
    }

    // ------------------------------------------------------------------
    // Point resolution

    /// Top-left pin for a reference frame.
    pub fn top_left(&self, tag: Tag) -> Pin {
        match tag {
            // The full screen and the history both start at the first page.
            Tag::Screen | Tag::History => Pin::new(self.first, 0, 0),
            Tag::Viewport => match self.viewport {
                Viewport::Active => self.top_left(Tag::Active),
                Viewport::Top => self.top_left(Tag::Screen),
                Viewport::Pin => self.tracked(self.viewport_pin),
            },
            // The active area is found backwards from the last page. This
            // makes resolving it slower but keeps scrolling free of
            // top-left bookkeeping writes.
            Tag::Active => {
                let mut rem = self.rows;
                let mut node = Some(self.last);
                while let Some(id) = node {
                    let size_rows = self.page(id).size.rows;
                    if rem <= size_rows {
                        return Pin::new(id, 0, size_rows - rem);
                    }
                    rem -= size_rows;
                    node = self.prev_node(id);
                }
                unreachable!("active area does not fit in the page list");
            }
        }
    }

    /// Bottom-right pin for a reference frame. `None` for an empty history.
    pub fn bottom_right(&self, tag: Tag) -> Option<Pin> {
        match tag {
            Tag::Screen | Tag::Active => {
                let page = self.page(self.last);
                Some(Pin::new(
                    self.last,
                    page.size.cols - 1,
                    page.size.rows - 1,
                ))
            }
            Tag::Viewport => {
                let top_left = self.top_left(Tag::Viewport);
                self.pin_down(top_left, self.rows - 1)
            }
            Tag::History => {
                let active_top = self.top_left(Tag::Active);
                if active_top.y > 0 {
                    let page = self.page(active_top.node);
                    Some(Pin::new(active_top.node, page.size.cols - 1, active_top.y - 1))
                } else {
                    let node = self.prev_node(active_top.node)?;
                    let page = self.page(node);
                    Some(Pin::new(node, page.size.cols - 1, page.size.rows - 1))
                }
            }
        }
    }

    /// Resolve a tagged point to a pin. `None` when the point lies outside
    /// the list. The pin is untracked and valid only until the next
    /// structural mutation.
    pub fn pin(&self, point: Point) -> Option<Pin> {
        if point.x >= self.cols {
            return None;
        }
        let mut pin = self.pin_down(self.top_left(point.tag), point.y)?;
        pin.x = point.x;
        Some(pin)
    }

    // ------------------------------------------------------------------
    // Growth and pruning

    /// Grow the active area by exactly one row.
    ///
    /// Fast path: bump the tail page's row count. Otherwise a new page is
    /// appended, unless that would exceed the page budget while the active
    /// area still fits without the head page, in which case the head page
    /// is recycled as the new tail and any pins into it are rewritten to
    /// the new head's top-left.
    ///
    /// Returns the node that was appended or recycled, if any.
    pub fn grow(&mut self) -> Result<Option<NodeId>, PageError> {
        let last = self.last;
        if self.page(last).size.rows < self.page(last).capacity.rows {
            let page = self.page_mut(last);
            page.size.rows += 1;
            page.assert_integrity();
            return Ok(None);
        }

        let mut capacity = STANDARD_CAPACITY;
        capacity.adjust_cols(self.cols)?;

        if self.first != self.last
            && self.page_count + 1 > self.max_pages
            && self.active_fits_after_head()
        {
            // Recycle the head page as the new tail.
            let head = self.first;
            let new_first = self.nodes[head.0].next.expect("list has at least two pages");
            self.nodes[new_first.0].prev = None;
            self.first = new_first;

            let mut page = Page::new(capacity);
            page.size.rows = 1;
            self.nodes[head.0].page = page;
            self.nodes[head.0].prev = Some(last);
            self.nodes[head.0].next = None;
            self.nodes[last.0].next = Some(head);
            self.last = head;

            // Pins into the pruned page move to the new head's top-left.
            self.update_tracked_pins(|pin| {
                if pin.node == head {
                    *pin = Pin::new(new_first, 0, 0);
                }
            });

            debug!("pruned scrollback page; pages={}", self.page_count);
            self.page(head).assert_integrity();
            return Ok(Some(head));
        }

        // Allocate a fresh page.
        let mut page = Page::new(capacity);
        page.size.rows = 1;
        let id = NodeId(self.nodes.len());
        self.nodes.push(PageNode {
            page,
            prev: Some(last),
            next: None,
        });
        self.nodes[last.0].next = Some(id);
        self.last = id;
        self.page_count += 1;

        self.page(id).assert_integrity();
        Ok(Some(id))
    }

    /// True if the active area fits entirely in pages after the head, which
    /// is what makes the head prunable.
    fn active_fits_after_head(&self) -> bool {
        let mut rows = 0;
        let mut node = Some(self.last);
        while let Some(id) = node {
            if id == self.first {
                return false;
            }
            rows += self.page(id).size.rows;
            if rows >= self.rows {
                return true;
            }
            node = self.prev_node(id);
        }
        false
    }

    // ------------------------------------------------------------------
    // Row erasure

    /// Erase exactly one row. The row is removed, not merely cleared: all
    /// following rows shift up by one and the final row of the last page
    /// becomes blank. Page sizes do not change.
    pub fn erase_row(&mut self, point: Point) {
        let pin = self.pin(point).expect("erase_row point out of bounds");
        let mut node = pin.node;

        {
            let size_rows = self.page(node).size.rows;
            let page = self.page_mut(node);
            page.rotate_rows_up(pin.y, size_rows);
            page.dirty_mut().set_range(pin.y, size_rows);
        }
        self.update_tracked_pins(|p| {
            if p.node == node && p.y >= pin.y {
                p.y = p.y.saturating_sub(1);
            }
        });

        // Pull the first row of every following page up into the page
        // before it.
        while let Some(next) = self.next_node(node) {
            let dst_y = self.page(node).size.rows - 1;
            let (dst, src) = self.two_pages_mut(node, next);
            dst.clone_row_from(src, dst_y, 0);

            let prev = node;
            let prev_last = dst_y;
            node = next;

            let size_rows = self.page(node).size.rows;
            let page = self.page_mut(node);
            page.rotate_rows_up(0, size_rows);
            page.dirty_mut().set_range(0, size_rows);

            self.update_tracked_pins(|p| {
                if p.node != node {
                    return;
                }
                if p.y == 0 {
                    // This pin's row moved to the previous page.
                    p.node = prev;
                    p.y = prev_last;
                } else {
                    p.y -= 1;
                }
            });
        }

        let last_y = self.page(node).size.rows - 1;
        let cols = self.page(node).size.cols;
        self.page_mut(node).clear_cells(last_y, 0, cols);
        self.page_mut(node).row_mut(last_y).reset_flags();
    }

    /// Erase the row at `point`, shifting only the `limit` rows below it
    /// into the gap and leaving a blank row at the bottom of that window.
    pub fn erase_rows_bounded(&mut self, point: Point, limit: usize) {
        let pin = self.pin(point).expect("erase_rows_bounded point out of bounds");

        let mut node = pin.node;
        let mut start = pin.y;
        // Participating rows: the erased row plus `limit` rows below it.
        let mut remaining = limit + 1;
        let mut first_page = true;

        // The erased row becomes the blank that bubbles to the window end.
        let cols = self.page(node).size.cols;
        self.page_mut(node).clear_cells(start, 0, cols);
        self.page_mut(node).row_mut(start).reset_flags();

        loop {
            let size_rows = self.page(node).size.rows;
            let span = remaining.min(size_rows - start);
            let window_ends_here = span == remaining;

            {
                let page = self.page_mut(node);
                page.rotate_rows_up(start, start + span);
                page.dirty_mut().set_range(start, start + span);
            }

            // Shift pins inside the rotated span. When the window ends in
            // this page its final row holds the blank, and a pin there
            // (the cursor during a region scroll) must not move.
            let shift_end = if window_ends_here {
                start + span - 1
            } else {
                start + span
            };
            // On continuation pages a pin in row 0 follows its row into the
            // previous page; on the first page row 0 has nowhere to go.
            let cross_page = (!first_page).then(|| {
                let prev = self.prev_node(node).expect("continuation page has a prev");
                (prev, self.page(prev).size.rows - 1)
            });
            self.update_tracked_pins(|p| {
                if p.node != node || p.y < start || p.y >= shift_end {
                    return;
                }
                if p.y == 0 {
                    match cross_page {
                        Some((prev_node, last_y)) => {
                            p.node = prev_node;
                            p.y = last_y;
                        }
                        None => p.x = 0,
                    }
                } else {
                    p.y -= 1;
                }
            });

            if window_ends_here {
                return;
            }
            remaining -= span;

            // Carry the blank across the page boundary: copy the next
            // page's first row down here, then continue the rotation there.
            let Some(next) = self.next_node(node) else {
                // The list ended before the window did; the blank stays at
                // the bottom.
                return;
            };
            let dst_y = self.page(node).size.rows - 1;
            let (dst, src) = self.two_pages_mut(node, next);
            dst.clone_row_from(src, dst_y, 0);

            node = next;
            start = 0;
            first_page = false;
            let cols = self.page(node).size.cols;
            self.page_mut(node).clear_cells(0, 0, cols);
            self.page_mut(node).row_mut(0).reset_flags();
        }
    }

    // ------------------------------------------------------------------
    // Misc

    /// Clear the dirty bits of every page. Traverses the whole list, so
    /// this is for tests and debugging.
    pub fn clear_dirty(&mut self) {
        let mut node = Some(self.first);
        while let Some(id) = node {
            self.nodes[id.0].page.dirty_mut().clear();
            node = self.nodes[id.0].next;
        }
    }

    /// Rebuild the list as a fresh screen of the current geometry. Tracked
    /// pins all move to the new top-left.
    pub fn reset(&mut self) {
        self.rebuild(self.cols, self.rows);
    }

    /// Rebuild the list as a fresh, empty screen of a new geometry.
    /// Existing page content is dropped; tracked pins all move to the new
    /// top-left.
    pub fn rebuild(&mut self, cols: usize, rows: usize) {
        let tracked = std::mem::take(&mut self.tracked);
        let fresh = PageList::with_max_pages(cols, rows, self.max_pages);

        self.nodes = fresh.nodes;
        self.first = fresh.first;
        self.last = fresh.last;
        self.page_count = fresh.page_count;
        self.cols = cols;
        self.rows = rows;
        self.viewport = Viewport::Active;

        let first = self.first;
        self.tracked = tracked;
        for slot in self.tracked.iter_mut().flatten() {
            *slot = Pin::new(first, 0, 0);
        }
    }

    /// Total rows across all pages. Walks the list; testing only.
    pub fn total_rows(&self) -> usize {
        let mut rows = 0;
        let mut node = Some(self.first);
        while let Some(id) = node {
            rows += self.page(id).size.rows;
            node = self.next_node(id);
        }
        rows
    }

    /// Encode the rows between two pins as UTF-8, threading the blank
    /// accumulator across page boundaries.
    pub fn encode_utf8<W: std::fmt::Write>(
        &self,
        writer: &mut W,
        unwrap: bool,
        top_left: Pin,
        bottom_right: Option<Pin>,
    ) -> std::fmt::Result {
        let mut state = TrailingUtf8State::default();
        for chunk in self.page_iterator(top_left, Direction::RightDown, bottom_right) {
            let page = self.page(chunk.node);
            state = page.encode_utf8(
                writer,
                EncodeUtf8Options {
                    start_y: chunk.start_y,
                    end_y: Some(chunk.end_y),
                    unwrap,
                    preceding: state,
                },
            )?;
        }
        Ok(())
    }

    /// Iterate page-sized chunks of rows starting at `start`.
    pub fn page_iterator(
        &self,
        start: Pin,
        direction: Direction,
        limit_row: Option<Pin>,
    ) -> PageIterator<'_> {
        if let Some(limit) = limit_row {
            match direction {
                Direction::LeftUp => {
                    assert!(
                        start == limit || self.pin_before(limit, start),
                        "iterator limit is after its start"
                    );
                }
                Direction::RightDown => {
                    assert!(
                        start == limit || self.pin_before(start, limit),
                        "iterator limit is before its start"
                    );
                }
            }
        }
        PageIterator {
            list: self,
            row: Some(start),
            limit: match limit_row {
                Some(pin) => IterLimit::Row(pin),
                None => IterLimit::None,
            },
            direction,
        }
    }

    /// Like [`PageList::page_iterator`] but bounded by a row count.
    pub fn page_iterator_counted(
        &self,
        start: Pin,
        direction: Direction,
        count: usize,
    ) -> PageIterator<'_> {
        assert!(count > 0, "iterator count must be positive");
        PageIterator {
            list: self,
            row: Some(start),
            limit: IterLimit::Count(count),
            direction,
        }
    }

    /// Grow the total row count by `n`, for building test scenarios.
    #[doc(hidden)]
    pub fn grow_rows(&mut self, n: usize) -> Result<(), PageError> {
        let mut remaining = n;
        {
            let last = self.last;
            let page = self.page_mut(last);
            if page.size.rows < page.capacity.rows {
                let add = remaining.min(page.capacity.rows - page.size.rows);
                page.size.rows += add;
                remaining -= add;
            }
        }
        while remaining > 0 {
            self.grow()?;
            remaining -= 1;
        }
        Ok(())
    }
}

/// Direction a page iterator travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftUp,
    RightDown,
}

#[derive(Debug, Clone, Copy)]
enum IterLimit {
    None,
    Count(usize),
    Row(Pin),
}

/// A half-open row range within a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub node: NodeId,
    pub start_y: usize,
    pub end_y: usize,
}

/// Iterates row ranges page by page.
#[derive(Debug)]
pub struct PageIterator<'a> {
    list: &'a PageList,
    row: Option<Pin>,
    limit: IterLimit,
    direction: Direction,
}

impl Iterator for PageIterator<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        match self.direction {
            Direction::RightDown => self.next_down(),
            Direction::LeftUp => self.next_up(),
        }
    }
}

impl PageIterator<'_> {
    fn next_down(&mut self) -> Option<Chunk> {
        let row = self.row?;
        let size_rows = self.list.page(row.node).size.rows;
        match self.limit {
            IterLimit::None => {
                // Consume the rest of this page; the next chunk starts at
                // the following page if there is one.
                self.row = self
                    .list
                    .next_node(row.node)
                    .map(|node| Pin::new(node, 0, 0));
                Some(Chunk {
                    node: row.node,
                    start_y: row.y,
                    end_y: size_rows,
                })
            }
            IterLimit::Count(count) => {
                let rem = count.min(size_rows - row.y);
                if rem < count {
                    self.row = self.list.pin_down(row, rem);
                    self.limit = IterLimit::Count(count - rem);
                } else {
                    self.row = None;
                }
                Some(Chunk {
                    node: row.node,
                    start_y: row.y,
                    end_y: row.y + rem,
                })
            }
            IterLimit::Row(limit) => {
                if limit.node != row.node {
                    self.row = self
                        .list
                        .next_node(row.node)
                        .map(|node| Pin::new(node, 0, 0));
                    return Some(Chunk {
                        node: row.node,
                        start_y: row.y,
                        end_y: size_rows,
                    });
                }
                self.row = None;
                if row.y > limit.y {
                    return None;
                }
                Some(Chunk {
                    node: row.node,
                    start_y: row.y,
                    end_y: limit.y + 1,
                })
            }
        }
    }

    fn next_up(&mut self) -> Option<Chunk> {
        let row = self.row?;
        match self.limit {
            IterLimit::None => {
                self.row = self.list.prev_node(row.node).map(|node| {
                    Pin::new(node, 0, self.list.page(node).size.rows - 1)
                });
                Some(Chunk {
                    node: row.node,
                    start_y: 0,
                    end_y: row.y + 1,
                })
            }
            IterLimit::Count(count) => {
                let rem = count.min(row.y + 1);
                if rem < count {
                    self.row = self.list.prev_node(row.node).map(|node| {
                        Pin::new(node, 0, self.list.page(node).size.rows - 1)
                    });
                    self.limit = IterLimit::Count(count - rem);
                } else {
                    self.row = None;
                }
                Some(Chunk {
                    node: row.node,
                    start_y: row.y + 1 - rem,
                    end_y: row.y + 1,
                })
            }
            IterLimit::Row(limit) => {
                if limit.node != row.node {
                    self.row = self.list.prev_node(row.node).map(|node| {
                        Pin::new(node, 0, self.list.page(node).size.rows - 1)
                    });
                    return Some(Chunk {
                        node: row.node,
                        start_y: 0,
                        end_y: row.y + 1,
                    });
                }
                self.row = None;
                if row.y < limit.y {
                    return None;
                }
                Some(Chunk {
                    node: row.node,
                    start_y: limit.y,
                    end_y: row.y + 1,
                })
            }
        }
    }
}
