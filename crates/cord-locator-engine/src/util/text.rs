//! String helpers that count in UTF-16 code units.
//!
//! DOM offsets (`Range.startOffset`, `selectionStart`, ...) are UTF-16 based,
//! and stored configs carry those offsets, so all slicing of page text goes
//! through these functions instead of byte or char indexing.

/// Length in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// `String.prototype.slice(start, end)` for non-negative indices: both ends
/// are clamped to the text, and an inverted range yields an empty string
pub fn slice_utf16(text: &str, start: usize, end: usize) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = end.min(units.len());
    let start = start.min(end);
    String::from_utf16_lossy(&units[start..end])
}

/// Grow `start..end` outwards so neither end splits a surrogate pair.
/// Both ends are clamped to the text first.
pub fn widen_to_char_boundaries(text: &str, start: usize, end: usize) -> (usize, usize) {
    let units: Vec<u16> = text.encode_utf16().collect();
    let is_low_surrogate = |index: usize| {
        units
            .get(index)
            .is_some_and(|unit| (0xDC00..=0xDFFF).contains(unit))
    };
    let end = end.min(units.len());
    let start = start.min(end);
    let start = if is_low_surrogate(start) { start.saturating_sub(1) } else { start };
    let end = if is_low_surrogate(end) { end + 1 } else { end };
    (start, end)
}

/// `String.prototype.indexOf`, returning a UTF-16 offset
pub fn find_utf16(haystack: &str, needle: &str) -> Option<usize> {
    let byte_index = haystack.find(needle)?;
    Some(utf16_len(&haystack[..byte_index]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hello", 5)]
    #[case("", 0)]
    #[case("héllo", 5)]
    #[case("a😀b", 4)]
    fn test_utf16_len(#[case] text: &str, #[case] expected: usize) {
        assert_eq!(utf16_len(text), expected);
    }

    #[rstest]
    #[case("hello world", 0, 5, "hello")]
    #[case("hello world", 6, 100, "world")]
    #[case("hello", 4, 2, "")]
    #[case("a😀b", 3, 4, "b")]
    fn test_slice_utf16(
        #[case] text: &str,
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(slice_utf16(text, start, end), expected);
    }

    #[rstest]
    #[case("hello", 1, 3, (1, 3))]
    #[case("hello", 2, 9, (2, 5))]
    #[case("😀abc", 1, 4, (0, 4))]
    #[case("ab😀", 0, 3, (0, 4))]
    #[case("a😀b😀", 2, 5, (1, 6))]
    fn test_widen_to_char_boundaries(
        #[case] text: &str,
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected: (usize, usize),
    ) {
        assert_eq!(widen_to_char_boundaries(text, start, end), expected);
    }

    #[test]
    fn test_find_utf16_counts_surrogate_pairs() {
        assert_eq!(find_utf16("😀 fox", "fox"), Some(3));
        assert_eq!(find_utf16("the fox", "dog"), None);
    }
}
