//! Tab stop tracking
//!
//! One bit per column. The first 512 columns live in a fixed inline array
//! so that ordinary terminal widths never allocate; wider terminals spill
//! into a dynamic tail.

/// Default interval between tab stops.
pub const TABSTOP_INTERVAL: usize = 8;

const UNIT_BITS: usize = 8;
const PREALLOC_COLS: usize = 512;
const PREALLOC_COUNT: usize = PREALLOC_COLS / UNIT_BITS;

fn entry(col: usize) -> usize {
    col / UNIT_BITS
}

fn mask(col: usize) -> u8 {
    1 << (col % UNIT_BITS)
}

/// Tab stop positions for a terminal of a given width.
#[derive(Debug, Clone)]
pub struct Tabstops {
    cols: usize,
    prealloc: [u8; PREALLOC_COUNT],
    dynamic: Vec<u8>,
}

impl Tabstops {
    /// Create tab stops for `cols` columns with a stop every `interval`
    /// columns. `interval == 0` leaves every column unset.
    pub fn new(cols: usize, interval: usize) -> Self {
        let mut tabstops = Self {
            cols,
            prealloc: [0; PREALLOC_COUNT],
            dynamic: Vec::new(),
        };
        tabstops.resize(cols);
        tabstops.reset(interval);
        tabstops
    }

    /// Set a tab stop at `col` (0-indexed).
    pub fn set(&mut self, col: usize) {
        let i = entry(col);
        if i < PREALLOC_COUNT {
            self.prealloc[i] |= mask(col);
            return;
        }
        let dyn_i = i - PREALLOC_COUNT;
        if dyn_i < self.dynamic.len() {
            self.dynamic[dyn_i] |= mask(col);
        }
    }

    /// Unset the tab stop at `col`.
    pub fn unset(&mut self, col: usize) {
        let i = entry(col);
        if i < PREALLOC_COUNT {
            self.prealloc[i] &= !mask(col);
            return;
        }
        let dyn_i = i - PREALLOC_COUNT;
        if dyn_i < self.dynamic.len() {
            self.dynamic[dyn_i] &= !mask(col);
        }
    }

    /// True if a tab stop is set at `col`.
    pub fn get(&self, col: usize) -> bool {
        let i = entry(col);
        let unit = if i < PREALLOC_COUNT {
            self.prealloc[i]
        } else {
            let dyn_i = i - PREALLOC_COUNT;
            match self.dynamic.get(dyn_i) {
                Some(unit) => *unit,
                None => return false,
            }
        };
        unit & mask(col) != 0
    }

    /// Ensure storage for up to `cols` columns.
    pub fn resize(&mut self, cols: usize) {
        self.cols = cols;
        if cols <= PREALLOC_COLS {
            return;
        }
        let needed = (cols - PREALLOC_COLS).div_ceil(UNIT_BITS);
        if needed > self.dynamic.len() {
            self.dynamic.resize(needed, 0);
        }
    }

    /// The number of columns this can currently track.
    pub fn capacity(&self) -> usize {
        (PREALLOC_COUNT + self.dynamic.len()) * UNIT_BITS
    }

    /// Unset everything and re-seed stops at `interval`.
    pub fn reset(&mut self, interval: usize) {
        self.prealloc.fill(0);
        self.dynamic.fill(0);
        if interval > 0 {
            let mut col = interval;
            while col + 1 < self.cols {
                self.set(col);
                col += interval;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        let tabstops = Tabstops::new(80, TABSTOP_INTERVAL);
        assert!(!tabstops.get(0));
        assert!(tabstops.get(8));
        assert!(tabstops.get(16));
        assert!(!tabstops.get(9));
        assert!(tabstops.get(72));
    }

    #[test]
    fn test_set_unset() {
        let mut tabstops = Tabstops::new(80, 0);
        assert!(!tabstops.get(12));
        tabstops.set(12);
        assert!(tabstops.get(12));
        tabstops.unset(12);
        assert!(!tabstops.get(12));
    }

    #[test]
    fn test_narrow_terminal() {
        // cols < 512: everything stays in the inline prefix.
        let tabstops = Tabstops::new(100, TABSTOP_INTERVAL);
        assert!(tabstops.get(96));
        assert_eq!(tabstops.capacity(), PREALLOC_COLS);
    }

    #[test]
    fn test_wide_terminal() {
        // cols > 512: the tail vector takes over past the prefix.
        let mut tabstops = Tabstops::new(1000, TABSTOP_INTERVAL);
        assert!(tabstops.get(512));
        assert!(tabstops.get(992));
        assert!(!tabstops.get(993));
        tabstops.set(700);
        assert!(tabstops.get(700));
        tabstops.unset(700);
        assert!(!tabstops.get(700));
        assert!(tabstops.capacity() >= 1000);
    }

    #[test]
    fn test_reset_clears_custom_stops() {
        let mut tabstops = Tabstops::new(80, TABSTOP_INTERVAL);
        tabstops.set(3);
        tabstops.reset(TABSTOP_INTERVAL);
        assert!(!tabstops.get(3));
        assert!(tabstops.get(8));
    }
}
