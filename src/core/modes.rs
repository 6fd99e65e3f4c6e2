//! Terminal mode flags
//!
//! The settable ANSI and DEC private modes this core understands, plus the
//! state container that tracks their current and default values.

use serde::{Deserialize, Serialize};

/// A settable mode, identified on the wire by its number and whether it was
/// set through the ANSI (`CSI h`) or DEC private (`CSI ? h`) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// KAM - keyboard action mode (ANSI 2).
    KeyboardDisable,
    /// IRM - insert/replace mode (ANSI 4). Printing shifts existing cells
    /// right instead of overwriting.
    Insert,
    /// SRM - send/receive mode (ANSI 12). Controls local echo.
    SendReceive,
    /// LNM - line feed/new line mode (ANSI 20). LF implies CR.
    LineFeed,
    /// DECOM - origin mode (DEC 6). Cursor addressing is relative to the
    /// scrolling region.
    Origin,
    /// DECAWM - autowrap mode (DEC 7).
    Wraparound,
}

impl Mode {
    /// Resolve a mode number from a set/reset-mode sequence. `ansi` is true
    /// for the plain `CSI h`/`CSI l` form, false for the `?`-prefixed DEC
    /// private form.
    pub fn from_code(code: u16, ansi: bool) -> Option<Mode> {
        match (code, ansi) {
            (2, true) => Some(Mode::KeyboardDisable),
            (4, true) => Some(Mode::Insert),
            (12, true) => Some(Mode::SendReceive),
            (20, true) => Some(Mode::LineFeed),
            (6, false) => Some(Mode::Origin),
            (7, false) => Some(Mode::Wraparound),
            _ => None,
        }
    }

    /// The mode number used on the wire.
    pub fn code(self) -> u16 {
        match self {
            Mode::KeyboardDisable => 2,
            Mode::Insert => 4,
            Mode::SendReceive => 12,
            Mode::LineFeed => 20,
            Mode::Origin => 6,
            Mode::Wraparound => 7,
        }
    }

    /// True if this is an ANSI mode rather than a DEC private mode.
    pub fn is_ansi(self) -> bool {
        matches!(
            self,
            Mode::KeyboardDisable | Mode::Insert | Mode::SendReceive | Mode::LineFeed
        )
    }

    /// The power-on default for this mode.
    pub fn default_value(self) -> bool {
        matches!(self, Mode::SendReceive | Mode::Wraparound)
    }
}

/// The current values of all settable modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    keyboard_disable: bool,
    insert: bool,
    send_receive: bool,
    line_feed: bool,
    origin: bool,
    wraparound: bool,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            keyboard_disable: Mode::KeyboardDisable.default_value(),
            insert: Mode::Insert.default_value(),
            send_receive: Mode::SendReceive.default_value(),
            line_feed: Mode::LineFeed.default_value(),
            origin: Mode::Origin.default_value(),
            wraparound: Mode::Wraparound.default_value(),
        }
    }
}

impl ModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: Mode) -> bool {
        match mode {
            Mode::KeyboardDisable => self.keyboard_disable,
            Mode::Insert => self.insert,
            Mode::SendReceive => self.send_receive,
            Mode::LineFeed => self.line_feed,
            Mode::Origin => self.origin,
            Mode::Wraparound => self.wraparound,
        }
    }

    pub fn set(&mut self, mode: Mode, value: bool) {
        match mode {
            Mode::KeyboardDisable => self.keyboard_disable = value,
            Mode::Insert => self.insert = value,
            Mode::SendReceive => self.send_receive = value,
            Mode::LineFeed => self.line_feed = value,
            Mode::Origin => self.origin = value,
            Mode::Wraparound => self.wraparound = value,
        }
    }

    /// Revert every mode to its power-on default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let modes = ModeState::new();
        assert!(modes.get(Mode::Wraparound));
        assert!(modes.get(Mode::SendReceive));
        assert!(!modes.get(Mode::Insert));
        assert!(!modes.get(Mode::Origin));
        assert!(!modes.get(Mode::LineFeed));
    }

    #[test]
    fn test_set_reset() {
        let mut modes = ModeState::new();
        modes.set(Mode::Insert, true);
        modes.set(Mode::Wraparound, false);
        assert!(modes.get(Mode::Insert));
        assert!(!modes.get(Mode::Wraparound));

        modes.reset();
        assert!(!modes.get(Mode::Insert));
        assert!(modes.get(Mode::Wraparound));
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Mode::from_code(4, true), Some(Mode::Insert));
        assert_eq!(Mode::from_code(7, false), Some(Mode::Wraparound));
        assert_eq!(Mode::from_code(6, false), Some(Mode::Origin));
        // DEC numbers are not valid as ANSI modes and vice versa.
        assert_eq!(Mode::from_code(7, true), None);
        assert_eq!(Mode::from_code(4, false), None);
        assert_eq!(Mode::from_code(9999, true), None);
    }

    #[test]
    fn test_round_trip() {
        for mode in [
            Mode::KeyboardDisable,
            Mode::Insert,
            Mode::SendReceive,
            Mode::LineFeed,
            Mode::Origin,
            Mode::Wraparound,
        ] {
            assert_eq!(Mode::from_code(mode.code(), mode.is_ansi()), Some(mode));
        }
    }
}
