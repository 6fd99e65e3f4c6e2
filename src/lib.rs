//! Mochi VT
//!
//! A headless VT-series terminal emulator core. Bytes from a child
//! process go in; a character-cell screen model comes out: a paged grid
//! with scrollback, a cursor, modes, tab stops, and a scrolling region.
//! No rendering, no PTY, no I/O; those are the host's collaborators.
//!
//! # Architecture
//!
//! Data flows one way: bytes -> UTF-8 decoder + VT parser -> dispatch
//! actions -> terminal operations -> page mutations.
//!
//! - `core`: the screen model (pages, cells, styles, cursor, modes)
//! - `parser`: UTF-8 decoding, the VT state machine, SGR parsing
//! - `stream`: glues decoder and parser to a handler
//! - `handler`: the capability contracts a handler implements
//! - `terminal`: the state engine satisfying those contracts
//! - `io`: the outermost `TerminalIo` surface
//!
//! # Example
//!
//! ```
//! use mochi_vt::{Options, TerminalIo};
//!
//! let mut term = TerminalIo::new(Options {
//!     cols: 80,
//!     rows: 24,
//!     modes: None,
//! });
//! term.process_output(b"hello, \x1b[1mworld\x1b[0m").unwrap();
//! assert_eq!(term.dump_string(), "hello, world");
//! ```

pub mod core;
pub mod handler;
pub mod io;
pub mod parser;
pub mod stream;
pub mod terminal;

pub use crate::core::{Mode, ModeState, Point, Tag};
pub use crate::io::{Error, Options, StreamHandler, TerminalIo};
pub use crate::stream::Stream;
pub use crate::terminal::{ScrollingRegion, Terminal};
