//! End-to-end terminal tests
//!
//! These drive the public `TerminalIo` surface with raw byte streams and
//! assert on the resulting screen state, the way a host embedding the
//! library would observe it.

use mochi_vt::core::cell::Wide;
use mochi_vt::core::refset;
use mochi_vt::{Options, Point, Tag, TerminalIo};

fn termio(cols: usize, rows: usize) -> TerminalIo {
    TerminalIo::new(Options {
        cols,
        rows,
        modes: None,
    })
}

#[test]
fn test_basic_print() {
    let mut io = termio(40, 40);
    io.process_output(b"hello").unwrap();

    let cursor = &io.terminal().screen.cursor;
    assert_eq!((cursor.x, cursor.y), (5, 0));
    assert_eq!(io.dump_string(), "hello");
    assert!(io.terminal().is_dirty(Point::new(Tag::Screen, 0, 0)));
}

#[test]
fn test_soft_wrap() {
    let mut io = termio(5, 40);
    io.process_output(b"helloworldabc12").unwrap();

    let cursor = &io.terminal().screen.cursor;
    assert_eq!((cursor.x, cursor.y), (4, 2));
    assert!(cursor.pending_wrap);
    assert_eq!(io.dump_string(), "hello\nworld\nabc12");

    // The wrapped rows carry their flags.
    let term = io.terminal();
    let pages = &term.screen.pages;
    let row0 = pages.pin(Point::new(Tag::Active, 0, 0)).unwrap();
    assert!(pages.page(row0.node).row(row0.y).wrap);
    let row1 = pages.pin(Point::new(Tag::Active, 0, 1)).unwrap();
    assert!(pages.page(row1.node).row(row1.y).wrap_continuation);
}

#[test]
fn test_scrollback_on_one_column_terminal() {
    let mut io = termio(1, 5);
    io.process_output(b"abcdef").unwrap();

    let cursor = &io.terminal().screen.cursor;
    assert_eq!((cursor.x, cursor.y), (0, 4));
    // The viewport shows the active area; "a" scrolled into history.
    assert_eq!(io.dump_string(), "b\nc\nd\ne\nf");

    let mut history = String::new();
    io.terminal()
        .dump_string(&mut history, Tag::History)
        .unwrap();
    assert_eq!(history, "a");
}

#[test]
fn test_sgr_style_round_trip() {
    let mut io = termio(40, 10);
    io.process_output(b"\x1b[1ma").unwrap();

    // One style interned: referenced by the cursor and the written cell.
    {
        let term = io.terminal();
        let pin = term.screen.pages.pin(Point::new(Tag::Active, 0, 0)).unwrap();
        let page = term.screen.pages.page(pin.node);
        assert_eq!(page.styles.count(), 1);
        let cell = page.cell(0, pin.y);
        assert!(page.styles.get(cell.style_id).unwrap().bold);
    }

    io.process_output(b"\x1b[22m").unwrap();

    // The cursor dropped back to the default style; the cell keeps the
    // entry alive until it is cleared.
    let term = io.terminal();
    assert_eq!(term.screen.cursor.style_id, refset::DEFAULT_ID);
    let pin = term.screen.pages.pin(Point::new(Tag::Active, 0, 0)).unwrap();
    assert_eq!(term.screen.pages.page(pin.node).styles.count(), 1);
}

#[test]
fn test_sgr_style_fully_released() {
    let mut io = termio(40, 10);
    io.process_output(b"\x1b[1ma\x1b[22m").unwrap();
    // Erasing the styled cell releases the last reference.
    io.process_output(b"\x1b[2J").unwrap();

    let term = io.terminal();
    let pin = term.screen.pages.pin(Point::new(Tag::Active, 0, 0)).unwrap();
    assert_eq!(term.screen.pages.page(pin.node).styles.count(), 0);
}

#[test]
fn test_wide_char_at_last_column() {
    let mut io = termio(5, 5);
    io.process_output("abcd\u{4E2D}".as_bytes()).unwrap();

    let term = io.terminal();
    let pages = &term.screen.pages;

    // Column 4 of row 0 holds the spacer head and the row soft-wrapped.
    let row0 = pages.pin(Point::new(Tag::Active, 0, 0)).unwrap();
    let page = pages.page(row0.node);
    assert_eq!(page.cell(4, row0.y).wide, Wide::SpacerHead);
    assert!(page.row(row0.y).wrap);

    // The wide pair landed on row 1.
    let row1 = pages.pin(Point::new(Tag::Active, 0, 1)).unwrap();
    let page = pages.page(row1.node);
    assert_eq!(page.cell(0, row1.y).wide, Wide::Wide);
    assert_eq!(page.cell(0, row1.y).codepoint(), 0x4E2D);
    assert_eq!(page.cell(1, row1.y).wide, Wide::SpacerTail);
}

#[test]
fn test_erase_row_shifts_content_up() {
    let mut io = termio(80, 3);
    io.process_output(b"l1\r\nl2\r\nl3").unwrap();

    io.terminal_mut()
        .screen
        .pages
        .erase_row(Point::new(Tag::Active, 0, 0));

    assert_eq!(io.dump_string(), "l2\nl3");
}

#[test]
fn test_cursor_addressing_sequences() {
    let mut io = termio(20, 10);
    io.process_output(b"\x1b[5;10Hx").unwrap();
    let cursor = &io.terminal().screen.cursor;
    // 1-indexed 5;10 is 0-indexed (9, 4), plus one for the printed x.
    assert_eq!((cursor.x, cursor.y), (10, 4));

    io.process_output(b"\x1b[H").unwrap();
    let cursor = &io.terminal().screen.cursor;
    assert_eq!((cursor.x, cursor.y), (0, 0));
}

#[test]
fn test_cursor_relative_movement() {
    let mut io = termio(20, 10);
    io.process_output(b"\x1b[3B\x1b[2C").unwrap();
    let cursor = &io.terminal().screen.cursor;
    assert_eq!((cursor.x, cursor.y), (2, 3));

    io.process_output(b"\x1b[A\x1b[D").unwrap();
    let cursor = &io.terminal().screen.cursor;
    assert_eq!((cursor.x, cursor.y), (1, 2));
}

#[test]
fn test_erase_sequences() {
    let mut io = termio(10, 5);
    io.process_output(b"abcdef\x1b[1;3H\x1b[K").unwrap();
    assert_eq!(io.dump_string(), "ab");

    io.process_output(b"\x1b[2J").unwrap();
    assert_eq!(io.dump_string(), "");
}

#[test]
fn test_insert_delete_sequences() {
    let mut io = termio(20, 5);
    io.process_output(b"abcde\x1b[1;2H\x1b[2@").unwrap();
    assert_eq!(io.dump_string(), "a  bcde");

    io.process_output(b"\x1b[2P").unwrap();
    assert_eq!(io.dump_string(), "abcde");
}

#[test]
fn test_insert_zero_blanks_is_noop() {
    let mut io = termio(20, 5);
    // An explicit zero parameter requests zero blanks, not one.
    io.process_output(b"abcde\x1b[1;2H\x1b[0@").unwrap();
    assert_eq!(io.dump_string(), "abcde");
    assert_eq!(io.terminal().screen.cursor.x, 1);
}

#[test]
fn test_insert_delete_line_sequences() {
    let mut io = termio(20, 5);
    io.process_output(b"a\r\nb\r\nc\x1b[1;1H\x1b[L").unwrap();
    assert_eq!(io.dump_string(), "\na\nb\nc");

    io.process_output(b"\x1b[M").unwrap();
    assert_eq!(io.dump_string(), "a\nb\nc");
}

#[test]
fn test_scrolling_region_sequences() {
    let mut io = termio(20, 6);
    io.process_output(b"a\r\nb\r\nc\r\nd\r\ne\r\nf").unwrap();
    // Region rows 2-4, then index at the region bottom.
    io.process_output(b"\x1b[2;4r\x1b[4;1H\x1bD").unwrap();

    // b scrolled out of the region; e and f held still.
    assert_eq!(io.dump_string(), "a\nc\nd\n\ne\nf");
}

#[test]
fn test_reverse_index_at_top() {
    let mut io = termio(20, 3);
    io.process_output(b"a\r\nb\r\nc\x1b[H\x1bM").unwrap();
    assert_eq!(io.dump_string(), "\na\nb");
}

#[test]
fn test_tab_characters() {
    let mut io = termio(40, 5);
    io.process_output(b"a\tb").unwrap();
    let cursor = &io.terminal().screen.cursor;
    assert_eq!(cursor.x, 9);
    assert_eq!(io.dump_string(), "a       b");
}

#[test]
fn test_wraparound_disabled_truncates() {
    let mut io = termio(5, 3);
    io.process_output(b"\x1b[?7labcdefgh").unwrap();
    // Characters past the margin overwrite the final column.
    assert_eq!(io.dump_string(), "abcdh");
    assert_eq!(io.terminal().screen.cursor.y, 0);
}

#[test]
fn test_origin_mode_sequences() {
    let mut io = termio(20, 6);
    io.process_output(b"\x1b[2;4r\x1b[?6h\x1b[1;1Hx").unwrap();
    // With origin mode, 1;1 addresses the region's top-left: row index 1.
    let mut screen = String::new();
    io.terminal().dump_string(&mut screen, Tag::Screen).unwrap();
    assert_eq!(screen, "\nx");
}

#[test]
fn test_insert_mode() {
    let mut io = termio(20, 3);
    io.process_output(b"abc\x1b[1;1H\x1b[4hX").unwrap();
    assert_eq!(io.dump_string(), "Xabc");

    io.process_output(b"\x1b[4lY").unwrap();
    assert_eq!(io.dump_string(), "XYbc");
}

#[test]
fn test_single_row_terminal() {
    let mut io = termio(10, 1);
    io.process_output(b"hello\r\nworld").unwrap();
    assert_eq!(io.dump_string(), "world");
}

#[test]
fn test_single_column_wide_char_degrades() {
    let mut io = termio(1, 3);
    io.process_output("\u{4E2D}".as_bytes()).unwrap();
    // A 1-column terminal cannot hold a wide character; it degrades to a
    // narrow write rather than corrupting the grid.
    assert_eq!(io.dump_string(), "\u{4E2D}");
}

#[test]
fn test_invalid_utf8_becomes_replacement() {
    let mut io = termio(10, 3);
    io.process_output(b"a\xFF\xFEb").unwrap();
    assert_eq!(io.dump_string(), "a\u{FFFD}\u{FFFD}b");
}

#[test]
fn test_split_escape_sequences_across_writes() {
    let mut io = termio(20, 5);
    io.process_output(b"\x1b[1").unwrap();
    io.process_output(b";31m").unwrap();
    io.process_output(b"red").unwrap();
    assert_eq!(io.dump_string(), "red");
    // 31 is an indexed color this core does not model, but bold applied.
    assert!(io.terminal().screen.cursor.style.bold);
}

#[test]
fn test_scrollback_pruning_keeps_active_area() {
    let mut io = termio(10, 4);
    // Far more lines than the page budget holds, so the oldest pages get
    // recycled.
    for i in 0..80_000 {
        io.process_output(format!("line{i}\r\n").as_bytes()).unwrap();
    }
    io.process_output(b"done").unwrap();

    // The tail of the stream is intact in the active area.
    assert_eq!(io.dump_string(), "line79997\nline79998\nline79999\ndone");

    // The page list stayed within budget and the invariant held.
    let pages = &io.terminal().screen.pages;
    assert!(pages.page_count() <= 16);
    assert!(pages.total_rows() >= 4);
}

#[test]
fn test_osc_does_not_disturb_screen() {
    let mut io = termio(20, 3);
    io.process_output(b"a\x1b]0;title\x07").unwrap();
    io.process_output(b"\x1b]0;title2\x1b\\b").unwrap();
    assert_eq!(io.dump_string(), "ab");
}

#[test]
fn test_bel_inside_osc_terminates() {
    // BEL is the xterm-style OSC terminator; it must not ring through to
    // the screen. (This core routes OSC termination through the parser's
    // C0 handling.)
    let mut io = termio(20, 3);
    io.process_output(b"\x1b]2;t\x07x").unwrap();
    assert_eq!(io.dump_string(), "x");
}

#[test]
fn test_full_reset_clears_everything() {
    let mut io = termio(20, 5);
    io.process_output(b"\x1b[1mstyled\x1b[2;4r\x1b[4h\x1bc").unwrap();
    let term = io.terminal();
    assert_eq!(io.dump_string(), "");
    assert!(!term.screen.cursor.has_style());
    assert_eq!(term.scrolling_region().top, 0);
    assert_eq!(term.scrolling_region().bottom, 4);
}

#[test]
fn test_resize_truncation() {
    let mut io = termio(10, 4);
    io.process_output(b"abcdefghij\r\nklm").unwrap();
    io.resize(5, 4);
    assert_eq!(io.dump_string(), "abcde\nklm");

    io.resize(5, 2);
    assert_eq!(io.terminal().rows(), 2);
}

#[test]
fn test_pending_wrap_cleared_by_cursor_motion() {
    let mut io = termio(5, 3);
    io.process_output(b"abcde").unwrap();
    assert!(io.terminal().screen.cursor.pending_wrap);

    // CR clears the pending wrap without wrapping.
    io.process_output(b"\rX").unwrap();
    assert_eq!(io.dump_string(), "Xbcde");
    assert_eq!(io.terminal().screen.cursor.y, 0);
}

#[test]
fn test_dump_screen_includes_history() {
    let mut io = termio(5, 2);
    io.process_output(b"a\r\nb\r\nc\r\nd").unwrap();
    assert_eq!(io.dump_string(), "c\nd");

    let mut screen = String::new();
    io.terminal().dump_string(&mut screen, Tag::Screen).unwrap();
    assert_eq!(screen, "a\nb\nc\nd");
}
