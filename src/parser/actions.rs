//! Parser actions
//!
//! The dispatch values the VT parser hands to its caller: print/execute for
//! single bytes, and command payloads for completed CSI, ESC, OSC, and DCS
//! sequences.

use crate::core::bitset::BitSet;

/// A completed CSI sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiCommand {
    pub intermediates: Vec<u8>,
    pub params: Vec<u16>,
    /// Bit `i` is set when param `i` was terminated by `:` rather than `;`.
    pub params_sep: BitSet,
    pub final_byte: u8,
}

/// A completed ESC sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscCommand {
    pub intermediates: Vec<u8>,
    pub final_byte: u8,
}

/// The header of a DCS sequence, delivered at hook time. The payload
/// follows byte by byte through [`Action::DcsPut`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcsCommand {
    pub intermediates: Vec<u8>,
    pub params: Vec<u16>,
    pub final_byte: u8,
}

/// An action for the caller to take in response to an input byte. Up to
/// three actions can result from a single byte (exit, transition, entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Draw a printable byte.
    Print(u8),
    /// Run a C0/C1 control function.
    Execute(u8),
    CsiDispatch(CsiCommand),
    EscDispatch(EscCommand),
    /// A complete OSC payload, forwarded opaquely.
    OscDispatch(Vec<u8>),
    /// A DCS sequence began.
    DcsHook(DcsCommand),
    /// One byte of DCS passthrough payload.
    DcsPut(u8),
    /// The DCS sequence ended.
    DcsUnhook,
}

/// Erase-in-display argument (`CSI J`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdMode {
    Below,
    Above,
    Complete,
    Scrollback,
}

impl EdMode {
    pub fn from_param(param: u16) -> Option<Self> {
        match param {
            0 => Some(EdMode::Below),
            1 => Some(EdMode::Above),
            2 => Some(EdMode::Complete),
            3 => Some(EdMode::Scrollback),
            _ => None,
        }
    }
}

/// Erase-in-line argument (`CSI K`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElMode {
    Right,
    Left,
    All,
}

impl ElMode {
    pub fn from_param(param: u16) -> Option<Self> {
        match param {
            0 => Some(ElMode::Right),
            1 => Some(ElMode::Left),
            2 => Some(ElMode::All),
            _ => None,
        }
    }
}
