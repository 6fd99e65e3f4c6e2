//! Byte stream parsing
//!
//! Everything that turns raw bytes into dispatchable terminal actions:
//!
//! - [`utf8`]: a streaming UTF-8 decoder with replacement-character
//!   handling for ill-formed input.
//! - [`state`]/[`table`]: the VT escape/control sequence state machine,
//!   after the DEC VT500-series parser model.
//! - [`actions`]: the dispatch values the state machine produces.
//! - [`sgr`]: the `CSI ... m` parameter grammar.
//!
//! The parser is incremental: sequences may be split across arbitrary
//! chunk boundaries.

pub mod actions;
pub mod sgr;
pub mod state;
mod table;
pub mod utf8;

pub use actions::{Action, CsiCommand, DcsCommand, EdMode, ElMode, EscCommand};
pub use sgr::{Attribute, SgrParser};
pub use state::{Parser, State, MAX_INTERMEDIATES, MAX_PARAMS};
pub use utf8::Utf8Decoder;
