//! Terminal I/O surface
//!
//! The outermost API of the library: construct a [`TerminalIo`] with a
//! geometry, push the child process's bytes at it, and read back the
//! screen state. The [`StreamHandler`] in between implements the handler
//! contracts by delegating to the terminal, and is the natural place for
//! a host to hook OSC handling.

use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{error, warn};
use thiserror::Error;

use crate::core::modes::{Mode, ModeState};
use crate::handler::{
    DcsHandler, EditorHandler, FormatEffectorHandler, ModeHandler, OscHandler, PrintHandler,
    SgrHandler,
};
use crate::parser::actions::{DcsCommand, EdMode, ElMode};
use crate::parser::sgr::Attribute;
use crate::stream::Stream;
use crate::terminal::{Options as TerminalOptions, Terminal};

#[derive(Debug, Error)]
pub enum Error {
    /// A programming-error panic was trapped while processing output. The
    /// terminal state may be inconsistent; the byte dispatch that caused
    /// it was abandoned.
    #[error("internal error while processing terminal output")]
    Internal,
}

/// Construction options for [`TerminalIo`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub cols: usize,
    pub rows: usize,
    /// Initial mode state; power-on defaults when `None`.
    pub modes: Option<ModeState>,
}

/// Adapts the [`Terminal`] to the stream driver's handler contracts.
#[derive(Debug)]
pub struct StreamHandler {
    terminal: Terminal,
}

impl StreamHandler {
    pub fn new(terminal: Terminal) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }
}

impl PrintHandler for StreamHandler {
    fn print(&mut self, cp: u32) {
        self.terminal.print(cp);
    }
}

impl EditorHandler for StreamHandler {
    fn backspace(&mut self) {
        self.terminal.backspace();
    }

    fn carriage_return(&mut self) {
        self.terminal.carriage_return();
    }

    fn line_feed(&mut self) {
        self.terminal.line_feed();
    }

    fn set_cursor_row(&mut self, row: u16) {
        self.terminal.set_cursor_row(row);
    }

    fn set_cursor_col(&mut self, col: u16) {
        self.terminal.set_cursor_col(col);
    }

    fn set_cursor_position(&mut self, row: u16, col: u16) {
        self.terminal.set_cursor_position(row, col);
    }

    fn set_cursor_up(&mut self, n: u16, carriage: bool) {
        self.terminal.set_cursor_up(n, carriage);
    }

    fn set_cursor_down(&mut self, n: u16, carriage: bool) {
        self.terminal.set_cursor_down(n, carriage);
    }

    fn set_cursor_left(&mut self, n: u16) {
        self.terminal.set_cursor_left(n);
    }

    fn set_cursor_right(&mut self, n: u16) {
        self.terminal.set_cursor_right(n);
    }

    fn set_cursor_tab_right(&mut self, n: u16) {
        self.terminal.set_cursor_tab_right(n);
    }

    fn set_cursor_tab_left(&mut self, n: u16) {
        self.terminal.set_cursor_tab_left(n);
    }

    fn insert_blanks(&mut self, n: u16) {
        self.terminal.insert_blanks(usize::from(n));
    }

    fn delete_chars(&mut self, n: u16) {
        self.terminal.delete_chars(usize::from(n));
    }

    fn insert_lines(&mut self, n: u16) {
        self.terminal.insert_lines(usize::from(n));
    }

    fn delete_lines(&mut self, n: u16) {
        self.terminal.delete_lines(usize::from(n));
    }

    fn erase_in_line(&mut self, mode: ElMode) {
        self.terminal.erase_in_line(mode);
    }

    fn erase_in_display(&mut self, mode: EdMode) {
        self.terminal.erase_in_display(mode);
    }

    fn set_top_and_bottom_margin(&mut self, top: u16, bottom: u16) {
        self.terminal.set_top_and_bottom_margin(top, bottom);
    }
}

impl FormatEffectorHandler for StreamHandler {
    fn next_line(&mut self) {
        self.terminal.next_line();
    }

    fn index(&mut self) {
        self.terminal.index();
    }

    fn reverse_index(&mut self) {
        self.terminal.reverse_index();
    }

    fn tab_set(&mut self) {
        self.terminal.tab_set();
    }

    fn full_reset(&mut self) {
        self.terminal.full_reset();
    }
}

impl SgrHandler for StreamHandler {
    fn set_graphics_rendition(&mut self, attr: &Attribute) {
        match attr {
            Attribute::Unknown { partial, .. } => {
                warn!("ignoring unknown SGR attribute {partial:?}");
            }
            _ => self.terminal.set_attribute(attr),
        }
    }
}

impl ModeHandler for StreamHandler {
    fn set_mode(&mut self, mode: Mode, enabled: bool) {
        self.terminal.set_mode(mode, enabled);
    }
}

impl OscHandler for StreamHandler {
    fn osc_dispatch(&mut self, payload: &[u8]) {
        // OSC payloads are opaque to the core. OSC 7 carries the working
        // directory, which the terminal tracks; everything else is the
        // host's concern.
        if let Some(rest) = payload.strip_prefix(b"7;") {
            if let Ok(pwd) = std::str::from_utf8(rest) {
                self.terminal.set_pwd(pwd);
                return;
            }
        }
        warn!("ignoring OSC dispatch ({} bytes)", payload.len());
    }
}

impl DcsHandler for StreamHandler {
    fn dcs_hook(&mut self, command: &DcsCommand) {
        warn!("ignoring DCS hook {command:?}");
    }

    fn dcs_put(&mut self, _byte: u8) {}

    fn dcs_unhook(&mut self) {}
}

/// A complete headless terminal: state engine plus stream parsing.
#[derive(Debug)]
pub struct TerminalIo {
    stream: Stream<StreamHandler>,
}

impl TerminalIo {
    pub fn new(opts: Options) -> Self {
        let terminal = Terminal::new(TerminalOptions {
            cols: opts.cols,
            rows: opts.rows,
            modes: opts.modes,
        });
        Self {
            stream: Stream::new(StreamHandler::new(terminal)),
        }
    }

    /// Push bytes produced by the child process. The whole buffer is
    /// consumed before returning; all state changes are visible after.
    ///
    /// Programming-error panics inside the core are trapped and surfaced
    /// as [`Error::Internal`] so a malformed stream cannot take down the
    /// host.
    pub fn process_output(&mut self, buf: &[u8]) -> Result<(), Error> {
        let result = catch_unwind(AssertUnwindSafe(|| self.stream.next_slice(buf)));
        result.map_err(|cause| {
            error!("panic while processing terminal output: {cause:?}");
            Error::Internal
        })
    }

    /// Push a single byte. Scalar path, useful when debugging a stream;
    /// prefer [`TerminalIo::process_output`].
    pub fn process(&mut self, byte: u8) {
        self.stream.next(byte);
    }

    /// Alias of [`TerminalIo::process_output`] returning the byte count,
    /// for use as a writer sink.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.process_output(buf)?;
        Ok(buf.len())
    }

    /// Resize the terminal grid.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.stream.handler_mut().terminal_mut().resize(cols, rows);
    }

    /// The current viewport as plain UTF-8, rows separated by newlines.
    pub fn dump_string(&self) -> String {
        self.stream.handler().terminal().plain_string()
    }

    /// Tear down the terminal. Nothing needs releasing today; this is the
    /// seam where a host closes attached resources.
    pub fn close(self) {}

    pub fn terminal(&self) -> &Terminal {
        self.stream.handler().terminal()
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal {
        self.stream.handler_mut().terminal_mut()
    }
}
