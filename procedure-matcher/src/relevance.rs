//! Weighted full-text relevance for the in-memory catalog.
//!
//! Mirrors a weighted text search vector: every record contributes its terms
//! tagged with the tier of the field they came from, and a query ranks by how
//! strongly each of its terms is represented.

use crate::catalog::{CatalogField, CatalogRecord};
use crate::normalize::{normalize, words};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "a", "o", "as", "os", "ao", "aos", "de", "da", "do", "das", "dos", "e", "em", "no", "na",
    "nos", "nas", "um", "uma", "uns", "umas", "para", "por", "pela", "pelo", "pelas", "pelos",
    "com", "sem", "ou", "que", "se",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
}

impl Tier {
    fn slot(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }
}

/// Per-tier weights. Defaults follow `ts_rank`: `{1.0, 0.4, 0.2, 0.1}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.4,
            c: 0.2,
            d: 0.1,
        }
    }
}

impl TierWeights {
    pub fn weight(&self, tier: Tier) -> f64 {
        match tier {
            Tier::A => self.a,
            Tier::B => self.b,
            Tier::C => self.c,
            Tier::D => self.d,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

/// Relevance of one query against one record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextRelevance {
    /// Every query term occurs somewhere in the record.
    pub matches: bool,
    /// Mean best-tier weight over the query terms, in `[0, 1]`.
    pub rank: f64,
}

/// Search terms for `text`: normalized words without stop-words, with a
/// light plural fold, deduplicated in first-seen order.
pub fn terms(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let mut seen = Vec::new();
    for word in words(&normalized) {
        if STOP_WORDS.contains(&word) {
            continue;
        }
        let term = fold_plural(word);
        if !seen.contains(&term) {
            seen.push(term);
        }
    }
    seen
}

fn fold_plural(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{stem}ao");
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// A record's terms, each with the tiers it appears in.
#[derive(Debug, Clone, Default)]
pub struct WeightedDocument {
    terms: HashMap<String, [bool; 4]>,
}

impl WeightedDocument {
    pub fn from_record(record: &CatalogRecord) -> Self {
        let mut document = Self::default();
        for field in CatalogField::ALL {
            if let Some(text) = record.field(field) {
                document.add(text, field.tier());
            }
        }
        document
    }

    pub fn add(&mut self, text: &str, tier: Tier) {
        for term in terms(text) {
            let tiers = self.terms.entry(term).or_insert([false; 4]);
            if let Some(present) = tiers.get_mut(tier.slot()) {
                *present = true;
            }
        }
    }

    /// Rank `query_terms` (as produced by [`terms`]) against this document.
    #[allow(clippy::cast_precision_loss)]
    pub fn rank(&self, query_terms: &[String], weights: &TierWeights) -> TextRelevance {
        if query_terms.is_empty() {
            return TextRelevance::default();
        }

        let tier_weights = weights.as_array();
        let mut total = 0.0;
        let mut all_present = true;
        for term in query_terms {
            let best = self.terms.get(term).map_or(0.0, |tiers| {
                tiers
                    .iter()
                    .zip(tier_weights.iter())
                    .filter(|(present, _)| **present)
                    .map(|(_, weight)| *weight)
                    .fold(0.0, f64::max)
            });
            if best <= 0.0 {
                all_present = false;
            }
            total += best;
        }

        TextRelevance {
            matches: all_present,
            rank: (total / query_terms.len() as f64).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knee_mri() -> CatalogRecord {
        CatalogRecord::new("40808130")
            .with_procedure_name("Ressonância Magnética do Joelho")
            .with_subgroup("Ressonância magnética")
            .with_group("Diagnóstico por imagem")
            .with_chapter("Procedimentos diagnósticos e terapêuticos")
    }

    #[test]
    fn test_terms_drop_stop_words_and_fold_plurals() {
        assert_eq!(terms("Ressonância do Joelho"), vec!["ressonancia", "joelho"]);
        assert_eq!(terms("exames de lesões"), vec!["exame", "lesao"]);
        assert!(terms("de do da").is_empty());
    }

    #[test]
    fn test_full_match_in_top_tier_ranks_one() {
        let doc = WeightedDocument::from_record(&knee_mri());
        let rel = doc.rank(&terms("ressonancia joelho"), &TierWeights::default());
        assert!(rel.matches);
        assert!((rel.rank - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lower_tier_terms_rank_lower() {
        let doc = WeightedDocument::from_record(&knee_mri());
        let rel = doc.rank(&terms("diagnostico imagem"), &TierWeights::default());
        assert!(rel.matches);
        assert!((rel.rank - 0.2).abs() < 1e-9, "got {}", rel.rank);
    }

    #[test]
    fn test_missing_term_is_partial_not_match() {
        let doc = WeightedDocument::from_record(&knee_mri());
        let rel = doc.rank(&terms("joelho tornozelo"), &TierWeights::default());
        assert!(!rel.matches);
        assert!((rel.rank - 0.5).abs() < 1e-9);
    }
}
