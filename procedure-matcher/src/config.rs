use crate::error::{MatcherError, MatcherResult};
use crate::relevance::TierWeights;
use serde::{Deserialize, Serialize};

/// Matcher tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Scale applied to full-text relevance before it competes with similarity.
    #[serde(default = "default_relevance_weight")]
    pub relevance_weight: f64,

    /// Minimum trigram similarity for a field to be considered.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Default size of [`ProcedureMatcher::search`](crate::ProcedureMatcher::search) results.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default)]
    pub tier_weights: TierWeights,
}

fn default_relevance_weight() -> f64 {
    0.2
}

fn default_similarity_threshold() -> f64 {
    0.3
}

fn default_search_limit() -> usize {
    20
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            relevance_weight: default_relevance_weight(),
            similarity_threshold: default_similarity_threshold(),
            search_limit: default_search_limit(),
            tier_weights: TierWeights::default(),
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> MatcherResult<()> {
        if !(0.0..=1.0).contains(&self.relevance_weight) {
            return Err(MatcherError::InvalidConfig(format!(
                "relevance_weight must be within [0, 1], got {}",
                self.relevance_weight
            )));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(MatcherError::InvalidConfig(format!(
                "similarity_threshold must be within (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.search_limit == 0 {
            return Err(MatcherError::InvalidConfig(
                "search_limit must be positive".to_string(),
            ));
        }
        if self
            .tier_weights
            .as_array()
            .iter()
            .any(|w| !(0.0..=1.0).contains(w))
        {
            return Err(MatcherError::InvalidConfig(
                "tier weights must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
