//! VT parser transition table
//!
//! The `(state, byte)` transition table for the state machine described at
//! <https://vt100.net/emu/dec_ansi_parser>. Built once at parser
//! construction; unlisted combinations fall back to `(Ground, None)`.

use super::state::State;

pub(super) const STATE_COUNT: usize = 14;

/// What the parser does while taking a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TableAction {
    None,
    Ignore,
    Print,
    Execute,
    Collect,
    Param,
    EscDispatch,
    CsiDispatch,
    DcsPut,
    OscPut,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Transition {
    pub state: State,
    pub action: TableAction,
}

pub(super) type Table = Box<[[Transition; STATE_COUNT]; 256]>;

struct Builder {
    table: Table,
}

impl Builder {
    fn new() -> Self {
        Self {
            table: Box::new(
                [[Transition {
                    state: State::Ground,
                    action: TableAction::None,
                }; STATE_COUNT]; 256],
            ),
        }
    }

    fn single(&mut self, byte: u8, from: State, to: State, action: TableAction) {
        self.table[byte as usize][from as usize] = Transition { state: to, action };
    }

    fn range(&mut self, from_byte: u8, to_byte: u8, from: State, to: State, action: TableAction) {
        for byte in from_byte..=to_byte {
            self.single(byte, from, to, action);
        }
    }
}

pub(super) fn build_table() -> Table {
    use State::*;
    use TableAction::*;

    let mut b = Builder::new();

    // Transitions that apply from (nearly) anywhere.
    const ANYWHERE: [State; 12] = [
        Ground,
        CsiEntry,
        CsiParam,
        CsiIntermediate,
        CsiIgnore,
        DcsEntry,
        DcsParam,
        DcsIntermediate,
        DcsPassthrough,
        DcsIgnore,
        OscString,
        SosPmApcString,
    ];
    for source in ANYWHERE {
        // => ground
        b.single(0x18, source, Ground, Execute);
        b.single(0x1A, source, Ground, Execute);
        b.range(0x80, 0x8F, source, Ground, Execute);
        b.range(0x91, 0x97, source, Ground, Execute);
        b.single(0x99, source, Ground, Execute);
        b.single(0x9A, source, Ground, Execute);
        b.single(0x9C, source, Ground, None);

        // => sosPmApcString
        b.single(0x98, source, SosPmApcString, None);
        b.single(0x9E, source, SosPmApcString, None);
        b.single(0x9F, source, SosPmApcString, None);

        // => escape
        b.single(0x1B, source, Escape, None);

        // => dcsEntry
        b.single(0x90, source, DcsEntry, None);

        // => oscString
        b.single(0x9D, source, OscString, None);

        // => csiEntry
        b.single(0x9B, source, CsiEntry, None);
    }

    // ground
    {
        let s = Ground;
        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.range(0x20, 0x7F, s, s, Print);
    }

    // escape
    {
        let s = Escape;
        // => ground
        b.range(0x30, 0x4F, s, Ground, EscDispatch);
        b.range(0x51, 0x57, s, Ground, EscDispatch);
        b.single(0x59, s, Ground, EscDispatch);
        b.single(0x5A, s, Ground, EscDispatch);
        b.single(0x5C, s, Ground, EscDispatch);
        b.range(0x60, 0x7E, s, Ground, EscDispatch);

        // => escapeIntermediate
        b.range(0x20, 0x2F, s, EscapeIntermediate, Collect);

        // => sosPmApcString
        b.single(0x58, s, SosPmApcString, None);
        b.single(0x5E, s, SosPmApcString, None);
        b.single(0x5F, s, SosPmApcString, None);

        // => dcsEntry
        b.single(0x50, s, DcsEntry, None);

        // => oscString
        b.single(0x5D, s, OscString, None);

        // => csiEntry
        b.single(0x5B, s, CsiEntry, None);

        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.single(0x7F, s, s, Ignore);
    }

    // escapeIntermediate
    {
        let s = EscapeIntermediate;
        b.range(0x30, 0x7E, s, Ground, EscDispatch);

        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.range(0x20, 0x2F, s, s, Collect);
        b.single(0x7F, s, s, Ignore);
    }

    // csiEntry
    {
        let s = CsiEntry;
        b.range(0x40, 0x7E, s, Ground, CsiDispatch);

        // => csiParam. The colon is a param byte here, diverging from the
        // reference machine, so sub-parameter separators reach the param
        // accumulator.
        b.range(0x30, 0x39, s, CsiParam, Param);
        b.single(0x3A, s, CsiParam, Param);
        b.single(0x3B, s, CsiParam, Param);
        b.range(0x3C, 0x3F, s, CsiParam, Collect);

        // => csiIntermediate
        b.range(0x20, 0x2F, s, CsiIntermediate, Collect);

        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.single(0x7F, s, s, Ignore);
    }

    // csiParam
    {
        let s = CsiParam;
        b.range(0x40, 0x7E, s, Ground, CsiDispatch);

        // => csiIgnore
        b.range(0x3C, 0x3F, s, CsiIgnore, None);

        // => csiIntermediate
        b.range(0x20, 0x2F, s, CsiIntermediate, Collect);

        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.range(0x30, 0x39, s, s, Param);
        b.single(0x3A, s, s, Param);
        b.single(0x3B, s, s, Param);
        b.single(0x7F, s, s, Ignore);
    }

    // csiIntermediate
    {
        let s = CsiIntermediate;
        b.range(0x40, 0x7E, s, Ground, CsiDispatch);

        // => csiIgnore
        b.range(0x30, 0x3F, s, CsiIgnore, None);

        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.range(0x20, 0x2F, s, s, Collect);
        b.single(0x7F, s, s, Ignore);
    }

    // csiIgnore
    {
        let s = CsiIgnore;
        b.range(0x40, 0x7E, s, Ground, None);

        b.range(0x00, 0x17, s, s, Execute);
        b.single(0x19, s, s, Execute);
        b.range(0x1C, 0x1F, s, s, Execute);
        b.range(0x20, 0x3F, s, s, Ignore);
        b.single(0x7F, s, s, Ignore);
    }

    // dcsEntry
    {
        let s = DcsEntry;
        // => dcsIntermediate
        b.range(0x20, 0x2F, s, DcsIntermediate, Collect);

        // => dcsIgnore
        b.single(0x3A, s, DcsIgnore, None);

        // => dcsParam
        b.range(0x30, 0x39, s, DcsParam, Param);
        b.single(0x3B, s, DcsParam, Param);
        b.range(0x3C, 0x3F, s, DcsParam, Collect);

        // => dcsPassthrough
        b.range(0x40, 0x7E, s, DcsPassthrough, None);

        b.range(0x00, 0x17, s, s, Ignore);
        b.single(0x19, s, s, Ignore);
        b.range(0x1C, 0x1F, s, s, Ignore);
        b.single(0x7F, s, s, Ignore);
    }

    // dcsParam
    {
        let s = DcsParam;
        // => dcsIntermediate
        b.range(0x20, 0x2F, s, DcsIntermediate, Collect);

        // => dcsIgnore
        b.single(0x3A, s, DcsIgnore, None);
        b.range(0x3C, 0x3F, s, DcsIgnore, None);

        // => dcsPassthrough
        b.range(0x40, 0x7E, s, DcsPassthrough, None);

        b.range(0x00, 0x17, s, s, Ignore);
        b.single(0x19, s, s, Ignore);
        b.range(0x1C, 0x1F, s, s, Ignore);
        b.range(0x30, 0x39, s, s, Param);
        b.single(0x3B, s, s, Param);
        b.single(0x7F, s, s, Ignore);
    }

    // dcsIntermediate
    {
        let s = DcsIntermediate;
        // => dcsIgnore
        b.range(0x30, 0x3F, s, DcsIgnore, None);

        // => dcsPassthrough
        b.range(0x40, 0x7E, s, DcsPassthrough, None);

        b.range(0x00, 0x17, s, s, Ignore);
        b.single(0x19, s, s, Ignore);
        b.range(0x1C, 0x1F, s, s, Ignore);
        b.range(0x20, 0x2F, s, s, Collect);
        b.single(0x7F, s, s, Ignore);
    }

    // dcsPassthrough
    {
        let s = DcsPassthrough;
        b.single(0x9C, s, Ground, None);

        b.range(0x00, 0x17, s, s, DcsPut);
        b.single(0x19, s, s, DcsPut);
        b.range(0x1C, 0x1F, s, s, DcsPut);
        b.range(0x20, 0x7E, s, s, DcsPut);
        b.single(0x7F, s, s, Ignore);
    }

    // dcsIgnore
    {
        let s = DcsIgnore;
        b.single(0x9C, s, Ground, None);

        b.range(0x00, 0x17, s, s, Ignore);
        b.single(0x19, s, s, Ignore);
        b.range(0x1C, 0x1F, s, s, Ignore);
        b.range(0x20, 0x7F, s, s, Ignore);
    }

    // oscString
    {
        let s = OscString;
        b.single(0x9C, s, Ground, None);

        b.range(0x00, 0x17, s, s, Ignore);
        b.single(0x19, s, s, Ignore);
        b.range(0x1C, 0x1F, s, s, Ignore);
        b.range(0x20, 0x7F, s, s, OscPut);

        // BEL terminates OSC strings, an xterm extension the reference
        // machine lacks. Must come after the ignore range.
        b.single(0x07, s, Ground, None);
    }

    // sosPmApcString
    {
        let s = SosPmApcString;
        b.single(0x9C, s, Ground, None);

        b.range(0x00, 0x17, s, s, Ignore);
        b.single(0x19, s, s, Ignore);
        b.range(0x1C, 0x1F, s, s, Ignore);
        b.range(0x20, 0x7F, s, s, Ignore);
    }

    b.table
}
