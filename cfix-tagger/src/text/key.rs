//! Canonical lookup keys
//!
//! A key is the identity of an artist in the lookup table: two display
//! names refer to the same artist iff their keys are equal.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters dropped from keys in addition to combining marks
const STRIPPED: &[char] = &['-', '\'', '.', ',', '/', ' '];

/// Convert a display string into its canonical lookup key
///
/// Decomposes to NFD, drops combining marks, strips `- ' . , /` and spaces,
/// then lower-cases what is left. Empty input yields an empty key.
pub fn make_key(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !STRIPPED.contains(c))
        .collect::<String>()
        .to_lowercase()
}
