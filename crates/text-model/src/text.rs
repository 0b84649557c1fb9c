/// Lengths of the longest common prefix and, before it is consumed, the longest common suffix.
///
/// The suffix never overlaps the prefix in either slice.
pub(crate) fn common_affixes(old: &[char], new: &[char]) -> (usize, usize) {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    (prefix, suffix)
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Sub-slice of `text` between two character offsets.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |chars: usize| {
        text.char_indices()
            .nth(chars)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len())
    };
    &text[byte_at(start)..byte_at(end)]
}
