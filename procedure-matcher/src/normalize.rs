//! Case and accent folding shared by similarity and relevance scoring.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lowercase `text` and strip diacritics.
///
/// Decomposes to NFD, drops combining marks, then lowercases, so
/// `"Ressonância"` and `"RESSONANCIA"` both become `"ressonancia"`.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split normalized text into alphanumeric words.
pub(crate) fn words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}
