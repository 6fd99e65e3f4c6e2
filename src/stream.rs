//! Stream driver
//!
//! Glues the UTF-8 decoder and the VT parser to a handler. Bytes flow in
//! through [`Stream::next_slice`]; printable codepoints, control
//! executions, and completed sequences flow out as handler calls.
//!
//! The bulk path decodes runs of UTF-8 up to the next ESC in one go and
//! only drops to byte-at-a-time processing inside escape sequences and
//! around partial UTF-8 tails.

use log::warn;

use crate::core::modes::Mode;
use crate::handler::Handler;
use crate::parser::actions::{Action, CsiCommand, EdMode, ElMode, EscCommand};
use crate::parser::sgr::SgrParser;
use crate::parser::state::{Parser, State};
use crate::parser::utf8::Utf8Decoder;

/// The C0 control bytes this terminal handles.
pub mod c0 {
    pub const NUL: u8 = 0x00;
    pub const EOT: u8 = 0x04;
    pub const ENQ: u8 = 0x05;
    pub const BEL: u8 = 0x07;
    pub const BS: u8 = 0x08;
    pub const HT: u8 = 0x09;
    pub const LF: u8 = 0x0A;
    pub const VT: u8 = 0x0B;
    pub const FF: u8 = 0x0C;
    pub const CR: u8 = 0x0D;
    pub const SO: u8 = 0x0E;
    pub const SI: u8 = 0x0F;
    pub const ESC: u8 = 0x1B;
}

/// Codepoints decoded per bulk-decode round.
const MAX_CODEPOINTS: usize = 4096;

/// Drives a handler from a byte stream.
#[derive(Debug)]
pub struct Stream<H> {
    handler: H,
    parser: Parser,
    utf8: Utf8Decoder,
    /// Reused bulk-decode buffer.
    cp_buf: Vec<u32>,
}

impl<H: Handler> Stream<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            parser: Parser::new(),
            utf8: Utf8Decoder::new(),
            cp_buf: vec![0; MAX_CODEPOINTS],
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Process a slice of input. Sequences may span calls.
    pub fn next_slice(&mut self, input: &[u8]) {
        let mut offset = 0;

        // Finish a UTF-8 sequence left hanging by the previous call.
        while !self.utf8.is_accept() && offset < input.len() {
            self.next_utf8(input[offset]);
            offset += 1;
        }
        if offset >= input.len() {
            return;
        }

        // Likewise a control sequence in flight.
        offset += self.consume_until_ground(&input[offset..]);
        if offset >= input.len() {
            return;
        }

        // In ground state, everything up to the next ESC is UTF-8.
        while self.parser.state == State::Ground && offset < input.len() {
            let mut cp_buf = std::mem::take(&mut self.cp_buf);
            let (decoded, consumed) = self
                .utf8
                .decode_until_control_seq(&input[offset..], &mut cp_buf);
            for &cp in &cp_buf[..decoded] {
                if cp <= u32::from(c0::SI) {
                    self.execute(cp as u8);
                } else {
                    self.print(cp);
                }
            }
            self.cp_buf = cp_buf;
            offset += consumed;

            if offset >= input.len() {
                return;
            }

            if input[offset] == c0::ESC {
                offset += self.consume_all_escapes(&input[offset..]);
            } else {
                // Partial UTF-8 tail or a full buffer: take one byte the
                // scalar way and try the bulk path again.
                self.next_utf8(input[offset]);
                offset += 1;
            }
        }

        // The parser left ground state mid-slice (e.g. a C1 introducer);
        // finish out byte by byte.
        if offset < input.len() {
            offset += self.consume_until_ground(&input[offset..]);
            if offset < input.len() {
                self.next_slice(&input[offset..]);
            }
        }
    }

    /// Process a single byte. Scalar fallback; prefer
    /// [`Stream::next_slice`].
    pub fn next(&mut self, byte: u8) {
        match self.parser.state {
            State::Ground => self.next_utf8(byte),
            _ => self.next_non_utf8(byte),
        }
    }

    /// Feed one byte through the UTF-8 decoder, dispatching whatever
    /// codepoint completes.
    fn next_utf8(&mut self, byte: u8) {
        debug_assert_eq!(self.parser.state, State::Ground);

        let (cp, generated, consumed) = self.utf8.next(byte);
        if generated {
            self.handle_codepoint(cp);
        }
        if !consumed {
            // The decoder rejected a sequence on this byte; feed it again.
            let (cp, generated, consumed) = self.utf8.next(byte);
            debug_assert!(consumed, "decoder cannot refuse a byte twice");
            if generated {
                self.handle_codepoint(cp);
            }
        }
    }

    /// Dispatch one decoded codepoint: controls execute, ESC enters the
    /// parser, everything else prints.
    fn handle_codepoint(&mut self, cp: u32) {
        if cp <= u32::from(c0::SI) {
            self.execute(cp as u8);
            return;
        }
        if cp == u32::from(c0::ESC) {
            self.next_non_utf8(c0::ESC);
            return;
        }
        self.print(cp);
    }

    /// Feed one byte to the VT parser and dispatch its actions.
    fn next_non_utf8(&mut self, byte: u8) {
        debug_assert!(self.parser.state != State::Ground || byte == c0::ESC);

        let actions = self.parser.next(byte);
        for action in actions.into_iter().flatten() {
            match action {
                Action::Print(byte) => self.handler.print(u32::from(byte)),
                Action::Execute(byte) => self.execute(byte),
                Action::CsiDispatch(command) => self.csi_dispatch(&command),
                Action::EscDispatch(command) => self.esc_dispatch(&command),
                Action::OscDispatch(payload) => self.handler.osc_dispatch(&payload),
                Action::DcsHook(command) => self.handler.dcs_hook(&command),
                Action::DcsPut(byte) => self.handler.dcs_put(byte),
                Action::DcsUnhook => self.handler.dcs_unhook(),
            }
        }
    }

    /// Run a C0 control function.
    fn execute(&mut self, byte: u8) {
        match byte {
            c0::BS => self.handler.backspace(),
            c0::HT => self.handler.set_cursor_tab_right(1),
            c0::LF | c0::VT | c0::FF => self.handler.line_feed(),
            c0::CR => self.handler.carriage_return(),
            c0::NUL | c0::ENQ | c0::BEL | c0::SO | c0::SI => {
                warn!("ignoring unimplemented C0 0x{byte:02x}");
            }
            _ => warn!("ignoring invalid C0 0x{byte:02x}"),
        }
    }

    fn print(&mut self, cp: u32) {
        self.handler.print(cp);
    }

    /// Feed bytes until the parser returns to ground, or the input ends.
    /// Returns the bytes consumed.
    fn consume_until_ground(&mut self, input: &[u8]) -> usize {
        let mut offset = 0;
        while self.parser.state != State::Ground {
            if offset >= input.len() {
                return input.len();
            }
            self.next_non_utf8(input[offset]);
            offset += 1;
        }
        offset
    }

    /// Consume a run of back-to-back escape sequences. The input must
    /// start with ESC. Returns the bytes consumed.
    fn consume_all_escapes(&mut self, input: &[u8]) -> usize {
        let mut offset = 0;
        while offset < input.len() && input[offset] == c0::ESC {
            self.parser.state = State::Escape;
            self.parser.clear();
            offset += 1;
            offset += self.consume_until_ground(&input[offset..]);
        }
        offset
    }

    // ------------------------------------------------------------------
    // CSI routing

    /// The single optional parameter most CSI sequences take, defaulting
    /// to 1. `None` means the parameter count is invalid.
    fn single_param(command: &CsiCommand) -> Option<u16> {
        match command.params.len() {
            0 => Some(1),
            1 => Some(command.params[0]),
            _ => None,
        }
    }

    fn csi_dispatch(&mut self, command: &CsiCommand) {
        // Only SM/RM accept an intermediate, and only `?`.
        let private = matches!(command.intermediates.as_slice(), [b'?']);
        if !command.intermediates.is_empty()
            && !(private && matches!(command.final_byte, b'h' | b'l'))
        {
            warn!(
                "dropping CSI {:?} with intermediates {:?}",
                command.final_byte as char, command.intermediates
            );
            return;
        }

        match command.final_byte {
            // CUU - cursor up
            b'A' | b'k' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_up(n, false),
                None => warn!("invalid CUU parameters"),
            },
            // CUD - cursor down
            b'B' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_down(n, false),
                None => warn!("invalid CUD parameters"),
            },
            // CUF - cursor forward
            b'C' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_right(n),
                None => warn!("invalid CUF parameters"),
            },
            // CUB - cursor backward
            b'D' | b'j' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_left(n),
                None => warn!("invalid CUB parameters"),
            },
            // CNL - cursor next line
            b'E' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_down(n, true),
                None => warn!("invalid CNL parameters"),
            },
            // CPL - cursor preceding line
            b'F' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_up(n, true),
                None => warn!("invalid CPL parameters"),
            },
            // HPA - horizontal position absolute
            b'G' | b'`' => match Self::single_param(command) {
                Some(col) => self.handler.set_cursor_col(col),
                None => warn!("invalid HPA parameters"),
            },
            // CUP/HVP - cursor position
            b'H' | b'f' => match command.params.len() {
                0 => self.handler.set_cursor_position(1, 1),
                1 => self.handler.set_cursor_position(command.params[0], 1),
                2 => self
                    .handler
                    .set_cursor_position(command.params[0], command.params[1]),
                _ => warn!("invalid CUP parameters"),
            },
            // CHT - cursor horizontal tabulation
            b'I' => match Self::single_param(command) {
                Some(n) => self.handler.set_cursor_tab_right(n),
                None => warn!("invalid CHT parameters"),
            },
            // ED - erase in display
            b'J' => {
                let param = match command.params.len() {
                    0 => 0,
                    1 => command.params[0],
                    _ => {
                        warn!("invalid ED parameters");
                        return;
                    }
                };
                match EdMode::from_param(param) {
                    Some(mode) => self.handler.erase_in_display(mode),
                    None => warn!("invalid ED mode {param}"),
                }
            }
            // EL - erase in line
            b'K' => {
                let param = match command.params.len() {
                    0 => 0,
                    1 => command.params[0],
                    _ => {
                        warn!("invalid EL parameters");
                        return;
                    }
                };
                match ElMode::from_param(param) {
                    Some(mode) => self.handler.erase_in_line(mode),
                    None => warn!("invalid EL mode {param}"),
                }
            }
            // IL - insert lines
            b'L' => match Self::single_param(command) {
                Some(n) => self.handler.insert_lines(n),
                None => warn!("invalid IL parameters"),
            },
            // DL - delete lines
            b'M' => match Self::single_param(command) {
                Some(n) => self.handler.delete_lines(n),
                None => warn!("invalid DL parameters"),
            },
            // DCH - delete characters
            b'P' => match Self::single_param(command) {
                Some(n) => self.handler.delete_chars(n),
                None => warn!("invalid DCH parameters"),
            },
            // ICH - insert blanks
            b'@' => match Self::single_param(command) {
                Some(n) => self.handler.insert_blanks(n),
                None => warn!("invalid ICH parameters"),
            },
            // SGR - select graphic rendition
            b'm' => {
                let attrs: Vec<_> =
                    SgrParser::new(&command.params, &command.params_sep).collect();
                for attr in attrs {
                    self.handler.set_graphics_rendition(&attr);
                }
            }
            // SM/RM - set/reset mode
            b'h' | b'l' => {
                let enabled = command.final_byte == b'h';
                let ansi = !private;
                for &param in &command.params {
                    match Mode::from_code(param, ansi) {
                        Some(mode) => self.handler.set_mode(mode, enabled),
                        None => warn!("ignoring unknown mode {param} (ansi={ansi})"),
                    }
                }
            }
            // DECSTBM - set scrolling region margins
            b'r' => match command.params.len() {
                0 => self.handler.set_top_and_bottom_margin(0, 0),
                1 => self.handler.set_top_and_bottom_margin(command.params[0], 0),
                2 => self
                    .handler
                    .set_top_and_bottom_margin(command.params[0], command.params[1]),
                _ => warn!("invalid DECSTBM parameters"),
            },
            other => {
                warn!("ignoring unimplemented CSI {:?}", other as char);
            }
        }
    }

    // ------------------------------------------------------------------
    // ESC routing

    fn esc_dispatch(&mut self, command: &EscCommand) {
        if !command.intermediates.is_empty() {
            warn!(
                "ignoring ESC {:?} with intermediates {:?}",
                command.final_byte as char, command.intermediates
            );
            return;
        }
        match command.final_byte {
            // IND - index
            b'D' => self.handler.index(),
            // NEL - next line
            b'E' => self.handler.next_line(),
            // HTS - tab set
            b'H' => self.handler.tab_set(),
            // RI - reverse index
            b'M' => self.handler.reverse_index(),
            // RIS - full reset
            b'c' => self.handler.full_reset(),
            // ST - string terminator, nothing to do
            b'\\' => {}
            other => {
                warn!("ignoring unimplemented ESC {:?}", other as char);
            }
        }
    }
}
