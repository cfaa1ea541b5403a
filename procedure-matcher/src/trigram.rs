//! Trigram similarity in the style of PostgreSQL's `pg_trgm`.
//!
//! Each word is padded with two leading blanks and one trailing blank before
//! its three-character windows are taken, so short words and word starts
//! still contribute. Similarity is `shared / (|a| + |b| - shared)`.

use crate::normalize::{normalize, words};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrigramSet {
    trigrams: HashSet<[char; 3]>,
}

impl TrigramSet {
    /// Build from text that is already normalized.
    pub fn from_normalized(normalized: &str) -> Self {
        let mut trigrams = HashSet::new();
        for word in words(normalized) {
            let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
            for window in padded.windows(3) {
                if let [a, b, c] = window {
                    trigrams.insert([*a, *b, *c]);
                }
            }
        }
        Self { trigrams }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_normalized(&normalize(text))
    }

    pub fn len(&self) -> usize {
        self.trigrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trigrams.is_empty()
    }

    /// Overlap coefficient in `[0, 1]`. Symmetric; empty sets score 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn similarity(&self, other: &Self) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let shared = self.trigrams.intersection(&other.trigrams).count();
        let union = self.len() + other.len() - shared;
        shared as f64 / union as f64
    }
}

/// Trigram similarity of two raw strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    TrigramSet::from_text(a).similarity(&TrigramSet::from_text(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_padding_matches_pg_trgm() {
        // pg_trgm: show_trgm('cat') = {"  c"," ca","at ","cat"}
        let set = TrigramSet::from_text("cat");
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_identical_text_scores_one() {
        assert!((similarity("Joelho", "joelho") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unrelated_text_scores_zero() {
        assert_eq!(similarity("joelho", "xyz"), 0.0);
        assert_eq!(similarity("", "joelho"), 0.0);
        assert_eq!(similarity("   ", "   "), 0.0);
    }

    #[test]
    fn test_partial_overlap_is_symmetric_and_bounded() {
        let a = "ressonancia do joelho";
        let b = "Ressonância Magnética do Joelho";
        let ab = similarity(a, b);
        let ba = similarity(b, a);
        assert!((ab - ba).abs() < f64::EPSILON);
        assert!(ab > 0.3 && ab < 1.0, "unexpected similarity {ab}");
    }

    #[test]
    fn test_word_order_does_not_matter() {
        let forward = similarity("joelho direito", "direito joelho");
        assert!((forward - 1.0).abs() < f64::EPSILON);
    }
}
