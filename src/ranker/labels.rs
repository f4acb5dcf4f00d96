//! Label alphabet and defensive parsing of oracle output.
//!
//! The judge model is asked to answer with a single passage label. It is an
//! unreliable free-text oracle, so instead of demanding an exact match we
//! scan its (uppercased) output for the first character that belongs to the
//! group's active alphabet prefix. The result is a tagged value, not an
//! error: callers branch on [`ParsedLabel::Unrecognized`] and apply their
//! own fallback policy.

/// Single-character labels assigned to documents within one comparison
/// group. 23 symbols, so a group can never exceed 23 documents.
pub const LABELS: [char; 23] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W',
];

/// Outcome of parsing one oracle response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLabel {
    /// Within-group index of the first recognized label character.
    Ok(usize),
    /// No character of the active alphabet prefix appeared in the output.
    Unrecognized,
}

/// Find the first recognized label in `output`, restricted to the first
/// `group_size` symbols of the alphabet.
///
/// The scan is case-insensitive and ignores surrounding noise, so outputs
/// like `"b."` or `" B\n"` both resolve to index 1. Note that the scan sees
/// every character: prose such as `"Passage B"` resolves to the `'a'` in
/// "Passage" first, which is why prompts must instruct the judge to emit the
/// bare label.
pub fn parse_winner(output: &str, group_size: usize) -> ParsedLabel {
    let active = &LABELS[..group_size.min(LABELS.len())];
    for ch in output.chars().flat_map(char::to_uppercase) {
        if let Some(idx) = active.iter().position(|&label| label == ch) {
            return ParsedLabel::Ok(idx);
        }
    }
    ParsedLabel::Unrecognized
}
