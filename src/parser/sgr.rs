//! SGR attribute parsing
//!
//! Consumes the parameter vector of a `CSI ... m` command and yields the
//! graphic rendition attributes it encodes. Parameters may be separated by
//! semicolons or colons; the separator bitset from the VT parser
//! distinguishes the two, which matters for underline styles (`4:3`) and
//! direct colors (`38:2:r:g:b`).
//!
//! Reference: <https://vt100.net/docs/vt510-rm/SGR.html> and the Wikipedia
//! ANSI code table for the extended codes.

use crate::core::bitset::BitSet;
use crate::core::style::{Rgb, UnderlineStyle};

/// One parsed SGR attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// Reset everything (SGR 0 or an empty parameter list).
    Unset,
    Bold,
    /// Resets faint as well; they share code 22.
    ResetBold,
    Faint,
    Italic,
    ResetItalic,
    Underline(UnderlineStyle),
    ResetUnderline,
    UnderlineColor(Rgb),
    ResetUnderlineColor,
    Overline,
    ResetOverline,
    Blink,
    ResetBlink,
    Inverse,
    ResetInverse,
    Invisible,
    ResetInvisible,
    Strikethrough,
    ResetStrikethrough,
    DirectColorFg(Rgb),
    DirectColorBg(Rgb),
    ResetFg,
    ResetBg,
    /// Anything this terminal does not understand.
    Unknown {
        full: Vec<u16>,
        partial: Vec<u16>,
    },
}

/// Iterator over the attributes in one SGR parameter vector.
#[derive(Debug)]
pub struct SgrParser<'a> {
    params: &'a [u16],
    seps: &'a BitSet,
    idx: usize,
    /// Whether the empty-vector implicit reset was already yielded.
    yielded_empty: bool,
}

impl<'a> SgrParser<'a> {
    pub fn new(params: &'a [u16], seps: &'a BitSet) -> Self {
        Self {
            params,
            seps,
            idx: 0,
            yielded_empty: false,
        }
    }

    /// True if the parameter at `idx` is followed by a colon separator.
    /// The final parameter has no separator at all.
    fn is_colon(&self, idx: usize) -> bool {
        idx + 1 < self.params.len() && idx < self.seps.size() && self.seps.is_set(idx)
    }

    /// The length of the colon-joined run starting at `idx`: the number of
    /// consecutive colon separators.
    fn colon_run(&self, idx: usize) -> usize {
        let mut count = 0;
        while self.is_colon(idx + count) {
            count += 1;
        }
        count
    }

    /// Skip the rest of a colon-joined run starting at the current index.
    fn consume_colon_run(&mut self) {
        self.idx += self.colon_run(self.idx) + 1;
    }

    /// Parse an `r, g, b` direct color for codes 38/48/58. `slice` starts
    /// at the selector code; `colon` says whether the run is colon-joined.
    /// Advances the index past everything consumed. `None` means the
    /// encoding was ill-formed and has been skipped.
    fn parse_direct_color(&mut self, slice: &[u16], colon: bool) -> Option<Rgb> {
        debug_assert_eq!(slice.get(1), Some(&2));

        let clamp = |v: u16| v.min(255) as u8;

        if !colon {
            // Semicolon form: 38;2;r;g;b.
            if slice.len() < 5 {
                self.idx = self.params.len();
                return None;
            }
            self.idx += 4;
            return Some(Rgb::new(clamp(slice[2]), clamp(slice[3]), clamp(slice[4])));
        }

        // Colon form: either 38:2:r:g:b or 38:2:colorspace:r:g:b.
        match self.colon_run(self.idx) {
            3 if slice.len() >= 5 => {
                self.idx += 4;
                Some(Rgb::new(clamp(slice[2]), clamp(slice[3]), clamp(slice[4])))
            }
            4 if slice.len() >= 6 => {
                self.idx += 5;
                Some(Rgb::new(clamp(slice[3]), clamp(slice[4]), clamp(slice[5])))
            }
            _ => {
                self.consume_colon_run();
                None
            }
        }
    }
}

impl Iterator for SgrParser<'_> {
    type Item = Attribute;

    fn next(&mut self) -> Option<Attribute> {
        // An empty parameter vector means reset.
        if self.params.is_empty() {
            if self.yielded_empty {
                return None;
            }
            self.yielded_empty = true;
            return Some(Attribute::Unset);
        }

        loop {
            if self.idx >= self.params.len() {
                return None;
            }

            let start = self.idx;
            let slice = &self.params[start..];
            let colon = self.is_colon(start);
            self.idx += 1;

            if colon {
                match slice[0] {
                    // These understand colon sub-parameters.
                    4 | 38 | 48 | 58 => {}
                    _ => {
                        // An unknown colon-joined run is reported whole and
                        // skipped whole.
                        let run = self.colon_run(start);
                        self.idx = start + run + 1;
                        return Some(Attribute::Unknown {
                            full: self.params.to_vec(),
                            partial: slice[..run + 1].to_vec(),
                        });
                    }
                }
            }

            return Some(match slice[0] {
                0 => Attribute::Unset,
                1 => Attribute::Bold,
                2 => Attribute::Faint,
                3 => Attribute::Italic,
                4 => {
                    if colon {
                        // 4:x selects an underline style. Deeper nesting is
                        // not understood; skip the whole run.
                        if self.is_colon(self.idx) {
                            self.consume_colon_run();
                            continue;
                        }
                        let style = slice[1];
                        self.idx += 1;
                        match style {
                            0 => Attribute::ResetUnderline,
                            1 => Attribute::Underline(UnderlineStyle::Single),
                            2 => Attribute::Underline(UnderlineStyle::Double),
                            3 => Attribute::Underline(UnderlineStyle::Curly),
                            4 => Attribute::Underline(UnderlineStyle::Dotted),
                            5 => Attribute::Underline(UnderlineStyle::Dashed),
                            _ => Attribute::Underline(UnderlineStyle::Single),
                        }
                    } else {
                        Attribute::Underline(UnderlineStyle::Single)
                    }
                }
                5 | 6 => Attribute::Blink,
                7 => Attribute::Inverse,
                8 => Attribute::Invisible,
                9 => Attribute::Strikethrough,
                21 => Attribute::Underline(UnderlineStyle::Double),
                22 => Attribute::ResetBold,
                23 => Attribute::ResetItalic,
                24 => Attribute::ResetUnderline,
                25 => Attribute::ResetBlink,
                27 => Attribute::ResetInverse,
                28 => Attribute::ResetInvisible,
                29 => Attribute::ResetStrikethrough,
                38 if slice.get(1) == Some(&2) => match self.parse_direct_color(slice, colon) {
                    Some(rgb) => Attribute::DirectColorFg(rgb),
                    None => continue,
                },
                48 if slice.get(1) == Some(&2) => match self.parse_direct_color(slice, colon) {
                    Some(rgb) => Attribute::DirectColorBg(rgb),
                    None => continue,
                },
                58 if slice.get(1) == Some(&2) => match self.parse_direct_color(slice, colon) {
                    Some(rgb) => Attribute::UnderlineColor(rgb),
                    None => continue,
                },
                39 => Attribute::ResetFg,
                49 => Attribute::ResetBg,
                53 => Attribute::Overline,
                55 => Attribute::ResetOverline,
                59 => Attribute::ResetUnderlineColor,
                _ => {
                    // Indexed-color selectors (38;5;n and friends) land
                    // here too; consume their arguments so they are not
                    // misread as attributes.
                    if matches!(slice[0], 38 | 48 | 58) {
                        if colon {
                            self.consume_colon_run();
                        } else if slice.get(1) == Some(&5) {
                            self.idx = (self.idx + 2).min(self.params.len());
                        }
                    }
                    Attribute::Unknown {
                        full: self.params.to_vec(),
                        partial: slice.to_vec(),
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(params: &[u16]) -> Vec<Attribute> {
        let seps = BitSet::new(crate::parser::MAX_PARAMS);
        SgrParser::new(params, &seps).collect()
    }

    fn parse_with_colons(params: &[u16], colon_at: &[usize]) -> Vec<Attribute> {
        let mut seps = BitSet::new(crate::parser::MAX_PARAMS);
        for &idx in colon_at {
            seps.set(idx);
        }
        SgrParser::new(params, &seps).collect()
    }

    #[test]
    fn test_empty_is_reset() {
        assert_eq!(parse(&[]), vec![Attribute::Unset]);
    }

    #[test]
    fn test_zero_is_reset() {
        assert_eq!(parse(&[0]), vec![Attribute::Unset]);
    }

    #[test]
    fn test_basic_attributes() {
        assert_eq!(parse(&[1]), vec![Attribute::Bold]);
        assert_eq!(parse(&[2]), vec![Attribute::Faint]);
        assert_eq!(parse(&[3]), vec![Attribute::Italic]);
        assert_eq!(parse(&[7]), vec![Attribute::Inverse]);
        assert_eq!(parse(&[9]), vec![Attribute::Strikethrough]);
        assert_eq!(parse(&[22]), vec![Attribute::ResetBold]);
        assert_eq!(parse(&[53]), vec![Attribute::Overline]);
    }

    #[test]
    fn test_multiple_attributes() {
        assert_eq!(
            parse(&[1, 3, 7]),
            vec![Attribute::Bold, Attribute::Italic, Attribute::Inverse]
        );
    }

    #[test]
    fn test_underline_plain() {
        assert_eq!(
            parse(&[4]),
            vec![Attribute::Underline(UnderlineStyle::Single)]
        );
        assert_eq!(
            parse(&[21]),
            vec![Attribute::Underline(UnderlineStyle::Double)]
        );
        assert_eq!(parse(&[24]), vec![Attribute::ResetUnderline]);
    }

    #[test]
    fn test_underline_styles_colon() {
        assert_eq!(
            parse_with_colons(&[4, 3], &[0]),
            vec![Attribute::Underline(UnderlineStyle::Curly)]
        );
        assert_eq!(
            parse_with_colons(&[4, 0], &[0]),
            vec![Attribute::ResetUnderline]
        );
        assert_eq!(
            parse_with_colons(&[4, 5], &[0]),
            vec![Attribute::Underline(UnderlineStyle::Dashed)]
        );
        // Unknown style falls back to single.
        assert_eq!(
            parse_with_colons(&[4, 9], &[0]),
            vec![Attribute::Underline(UnderlineStyle::Single)]
        );
    }

    #[test]
    fn test_direct_color_fg_semicolon() {
        assert_eq!(
            parse(&[38, 2, 40, 44, 52]),
            vec![Attribute::DirectColorFg(Rgb::new(40, 44, 52))]
        );
    }

    #[test]
    fn test_direct_color_bg_colon_three_subparams() {
        assert_eq!(
            parse_with_colons(&[48, 2, 10, 20, 30], &[0, 1, 2, 3]),
            vec![Attribute::DirectColorBg(Rgb::new(10, 20, 30))]
        );
    }

    #[test]
    fn test_direct_color_colon_with_colorspace() {
        // 38:2:cs:r:g:b carries a color-space id before the components.
        assert_eq!(
            parse_with_colons(&[38, 2, 0, 10, 20, 30], &[0, 1, 2, 3, 4]),
            vec![Attribute::DirectColorFg(Rgb::new(10, 20, 30))]
        );
    }

    #[test]
    fn test_underline_color() {
        assert_eq!(
            parse(&[58, 2, 1, 2, 3]),
            vec![Attribute::UnderlineColor(Rgb::new(1, 2, 3))]
        );
        assert_eq!(parse(&[59]), vec![Attribute::ResetUnderlineColor]);
    }

    #[test]
    fn test_component_truncation() {
        // Components above 255 clamp rather than wrap.
        assert_eq!(
            parse(&[38, 2, 300, 256, 255]),
            vec![Attribute::DirectColorFg(Rgb::new(255, 255, 255))]
        );
    }

    #[test]
    fn test_direct_color_followed_by_attribute() {
        assert_eq!(
            parse(&[38, 2, 1, 2, 3, 1]),
            vec![
                Attribute::DirectColorFg(Rgb::new(1, 2, 3)),
                Attribute::Bold
            ]
        );
    }

    #[test]
    fn test_unknown_code() {
        match &parse(&[99])[0] {
            Attribute::Unknown { partial, .. } => assert_eq!(partial, &vec![99]),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_colon_run_consumed_whole() {
        // A colon run on a code that takes no sub-parameters is reported
        // once and fully skipped.
        let attrs = parse_with_colons(&[12, 34, 1], &[0]);
        assert_eq!(attrs.len(), 2);
        match &attrs[0] {
            Attribute::Unknown { partial, .. } => assert_eq!(partial, &vec![12, 34]),
            other => panic!("expected Unknown, got {:?}", other),
        }
        assert_eq!(attrs[1], Attribute::Bold);
    }

    #[test]
    fn test_indexed_color_is_unknown() {
        // 256-color palette selection is out of scope; it must consume its
        // argument so the index is not misread as an attribute.
        let attrs = parse(&[38, 5, 196, 1]);
        assert_eq!(attrs.len(), 2);
        assert!(matches!(attrs[0], Attribute::Unknown { .. }));
        assert_eq!(attrs[1], Attribute::Bold);
    }

    #[test]
    fn test_blink_variants() {
        assert_eq!(parse(&[5]), vec![Attribute::Blink]);
        assert_eq!(parse(&[6]), vec![Attribute::Blink]);
        assert_eq!(parse(&[25]), vec![Attribute::ResetBlink]);
    }
}
