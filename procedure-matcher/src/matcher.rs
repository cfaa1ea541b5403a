use crate::catalog::{CatalogField, CatalogRecord, ProcedureCatalog, TextRank};
use crate::config::MatcherConfig;
use crate::error::MatcherResult;
use crate::trigram::TrigramSet;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One gated (record, field, fragment) candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHit {
    pub code: String,
    pub field: CatalogField,
    pub text: String,
    pub score: f64,
    pub similarity: f64,
    pub audit_lead_days: Option<String>,
    /// Position of the fragment among the non-blank fragments of the query.
    pub fragment_index: usize,
    pub record_index: usize,
}

/// The winning candidate of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched_text: String,
    pub score: f64,
    pub audit_lead_days: Option<String>,
    pub code: String,
    pub field: CatalogField,
}

impl From<FieldHit> for MatchResult {
    fn from(hit: FieldHit) -> Self {
        Self {
            matched_text: hit.text,
            score: hit.score,
            audit_lead_days: hit.audit_lead_days,
            code: hit.code,
            field: hit.field,
        }
    }
}

/// Trim fragments and drop the blank ones.
pub fn clean_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Higher score first. Ties go to the earlier fragment, then the earlier
/// record, then the higher-tier field, so results are deterministic.
fn best_first(a: &FieldHit, b: &FieldHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.fragment_index.cmp(&b.fragment_index))
        .then(a.record_index.cmp(&b.record_index))
        .then(a.field.cmp(&b.field))
}

pub struct ProcedureMatcher {
    catalog: Arc<dyn ProcedureCatalog>,
    config: MatcherConfig,
}

impl ProcedureMatcher {
    pub fn new(catalog: Arc<dyn ProcedureCatalog>, config: MatcherConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Best catalog entry over all fragments, or `None` when no candidate
    /// passes the gate (including when every fragment is blank).
    pub async fn best_match<S: AsRef<str>>(
        &self,
        fragments: &[S],
    ) -> MatcherResult<Option<MatchResult>> {
        let cleaned = clean_fragments(fragments);
        if cleaned.is_empty() {
            debug!("No usable fragments, skipping catalog lookup");
            return Ok(None);
        }

        let records = self.catalog.records().await?;
        let mut candidates = Vec::new();
        for (index, fragment) in cleaned.iter().enumerate() {
            let ranks = self.catalog.text_search(fragment).await?;
            candidates.extend(self.score_fragment(&records, index, fragment, &ranks));
        }

        let total = candidates.len();
        let best = candidates.into_iter().min_by(best_first);
        debug!(
            fragments = cleaned.len(),
            candidates = total,
            score = best.as_ref().map_or(0.0, |b| b.score),
            "Procedure match finished"
        );
        Ok(best.map(MatchResult::from))
    }

    /// Ranked hits for a single fragment, best first, ties by column name.
    pub async fn search(&self, fragment: &str, limit: usize) -> MatcherResult<Vec<FieldHit>> {
        let fragment = fragment.trim();
        if fragment.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let records = self.catalog.records().await?;
        let ranks = self.catalog.text_search(fragment).await?;
        Ok(self
            .score_fragment(&records, 0, fragment, &ranks)
            .into_iter()
            .sorted_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then(a.field.column().cmp(b.field.column()))
                    .then(a.record_index.cmp(&b.record_index))
            })
            .take(limit)
            .collect())
    }

    fn score_fragment(
        &self,
        records: &[CatalogRecord],
        fragment_index: usize,
        fragment: &str,
        ranks: &[TextRank],
    ) -> Vec<FieldHit> {
        let query = TrigramSet::from_text(fragment);
        let ranks: HashMap<&str, &TextRank> =
            ranks.iter().map(|r| (r.code.as_str(), r)).collect();
        let config = &self.config;

        records
            .par_iter()
            .enumerate()
            .flat_map_iter(|(record_index, record)| {
                let relevance = ranks.get(record.code.as_str()).copied();
                let query = &query;
                CatalogField::ALL.into_iter().filter_map(move |field| {
                    score_field(config, record, field, query, relevance).map(|(score, similarity, text)| {
                        FieldHit {
                            code: record.code.clone(),
                            field,
                            text: text.to_string(),
                            score,
                            similarity,
                            audit_lead_days: record.audit_lead_days.clone(),
                            fragment_index,
                            record_index,
                        }
                    })
                })
            })
            .collect()
    }
}

/// `(score, similarity, text)` for a field that passes the gate.
fn score_field<'a>(
    config: &MatcherConfig,
    record: &'a CatalogRecord,
    field: CatalogField,
    query: &TrigramSet,
    relevance: Option<&TextRank>,
) -> Option<(f64, f64, &'a str)> {
    let text = record.field(field)?;
    let similarity = TrigramSet::from_text(text).similarity(query);
    let similar_enough = similarity >= config.similarity_threshold;

    if field.is_hybrid() {
        let (rank, matches) = relevance.map_or((0.0, false), |r| (r.rank, r.matches));
        let score = similarity.max(config.relevance_weight * rank);
        (similar_enough || matches).then_some((score, similarity, text))
    } else {
        similar_enough.then_some((similarity, similarity, text))
    }
}
