//! Grid row
//!
//! Per-row flags. A row's cells live in the owning page's contiguous cell
//! array; the row records the offset of its first cell so that rotating the
//! row array carries the cell storage along with it.

use serde::{Deserialize, Serialize};

/// The semantic prompt classification of a row, set by the running program
/// through shell integration. Rows default to `Unknown`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum SemanticPrompt {
    #[default]
    Unknown,
    Prompt,
    Continuation,
    Input,
    Output,
}

impl SemanticPrompt {
    /// True for the prompt-side classifications (prompt, continuation,
    /// input).
    pub fn prompt_or_input(self) -> bool {
        matches!(
            self,
            SemanticPrompt::Prompt | SemanticPrompt::Continuation | SemanticPrompt::Input
        )
    }
}

/// One row of a page.
#[derive(Debug, Clone, Copy, Default)]
pub struct Row {
    /// Index of this row's first cell in the page's cell array.
    pub(crate) cells_offset: usize,

    /// This row soft-wraps into the next row.
    pub wrap: bool,

    /// This row is the continuation of a soft-wrapped row.
    pub wrap_continuation: bool,

    /// True if any cell in this row ever acquired a ref-counted style.
    /// Sticky: it is not cleared when the styles are released, only when
    /// the full row is cleared. False positives are allowed, false
    /// negatives are not; erase operations skip the style-release walk for
    /// rows that were never styled.
    pub styled: bool,

    pub semantic_prompt: SemanticPrompt,
}

impl Row {
    /// Clear the flags without touching the cell offset.
    pub(crate) fn reset_flags(&mut self) {
        self.wrap = false;
        self.wrap_continuation = false;
        self.styled = false;
        self.semantic_prompt = SemanticPrompt::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_or_input() {
        assert!(SemanticPrompt::Prompt.prompt_or_input());
        assert!(SemanticPrompt::Continuation.prompt_or_input());
        assert!(SemanticPrompt::Input.prompt_or_input());
        assert!(!SemanticPrompt::Output.prompt_or_input());
        assert!(!SemanticPrompt::Unknown.prompt_or_input());
    }

    #[test]
    fn test_reset_flags_keeps_offset() {
        let mut row = Row {
            cells_offset: 430,
            wrap: true,
            wrap_continuation: true,
            styled: true,
            semantic_prompt: SemanticPrompt::Output,
        };
        row.reset_flags();
        assert_eq!(row.cells_offset, 430);
        assert!(!row.wrap);
        assert!(!row.styled);
        assert_eq!(row.semantic_prompt, SemanticPrompt::Unknown);
    }
}
