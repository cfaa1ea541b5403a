use crate::error::MatcherResult;
use crate::relevance::{terms, Tier, TierWeights, WeightedDocument};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// A billable procedure with its hierarchical descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub code: String,
    #[serde(default)]
    pub procedure_name: Option<String>,
    #[serde(default)]
    pub terminology_label: Option<String>,
    #[serde(default)]
    pub subgroup: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    /// Kept as text; interpretation belongs to the caller.
    #[serde(default)]
    pub audit_lead_days: Option<String>,
}

impl CatalogRecord {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            procedure_name: None,
            terminology_label: None,
            subgroup: None,
            group: None,
            chapter: None,
            audit_lead_days: None,
        }
    }

    pub fn with_procedure_name(mut self, value: impl Into<String>) -> Self {
        self.procedure_name = Some(value.into());
        self
    }

    pub fn with_terminology_label(mut self, value: impl Into<String>) -> Self {
        self.terminology_label = Some(value.into());
        self
    }

    pub fn with_subgroup(mut self, value: impl Into<String>) -> Self {
        self.subgroup = Some(value.into());
        self
    }

    pub fn with_group(mut self, value: impl Into<String>) -> Self {
        self.group = Some(value.into());
        self
    }

    pub fn with_chapter(mut self, value: impl Into<String>) -> Self {
        self.chapter = Some(value.into());
        self
    }

    pub fn with_audit_lead_days(mut self, value: impl Into<String>) -> Self {
        self.audit_lead_days = Some(value.into());
        self
    }

    /// Text of `field`, or `None` when it is missing or blank.
    pub fn field(&self, field: CatalogField) -> Option<&str> {
        let value = match field {
            CatalogField::ProcedureName => self.procedure_name.as_deref(),
            CatalogField::TerminologyLabel => self.terminology_label.as_deref(),
            CatalogField::Subgroup => self.subgroup.as_deref(),
            CatalogField::Group => self.group.as_deref(),
            CatalogField::Chapter => self.chapter.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Descriptive fields a fragment is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    ProcedureName,
    TerminologyLabel,
    Subgroup,
    Group,
    Chapter,
}

impl CatalogField {
    pub const ALL: [Self; 5] = [
        Self::ProcedureName,
        Self::TerminologyLabel,
        Self::Subgroup,
        Self::Group,
        Self::Chapter,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::ProcedureName => "procedure_name",
            Self::TerminologyLabel => "terminology_label",
            Self::Subgroup => "subgroup",
            Self::Group => "group",
            Self::Chapter => "chapter",
        }
    }

    /// Whether full-text relevance may lift this field's score.
    pub fn is_hybrid(&self) -> bool {
        matches!(self, Self::ProcedureName | Self::TerminologyLabel)
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::ProcedureName | Self::TerminologyLabel => Tier::A,
            Self::Subgroup => Tier::B,
            Self::Group => Tier::C,
            Self::Chapter => Tier::D,
        }
    }
}

/// Full-text relevance of one record for one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRank {
    pub code: String,
    pub rank: f64,
    /// The fragment is a full-text match for the record.
    pub matches: bool,
}

/// Read side of the procedure catalog.
///
/// `text_search` must fold case and accents the same way
/// [`normalize`](crate::normalize) does, and may omit records with no
/// relevance at all.
#[async_trait]
pub trait ProcedureCatalog: Send + Sync {
    async fn records(&self) -> MatcherResult<Arc<[CatalogRecord]>>;

    async fn text_search(&self, fragment: &str) -> MatcherResult<Vec<TextRank>>;
}

/// Catalog held in memory, with a precomputed weighted document per record.
pub struct InMemoryProcedureCatalog {
    records: Arc<[CatalogRecord]>,
    documents: Vec<WeightedDocument>,
    weights: TierWeights,
}

impl InMemoryProcedureCatalog {
    pub fn new(records: Vec<CatalogRecord>, weights: TierWeights) -> Self {
        let documents = records.iter().map(WeightedDocument::from_record).collect();
        Self {
            records: records.into(),
            documents,
            weights,
        }
    }

    /// Load a JSON array of records.
    pub fn from_json_reader<R: Read>(reader: R, weights: TierWeights) -> MatcherResult<Self> {
        let records: Vec<CatalogRecord> = serde_json::from_reader(reader)?;
        Ok(Self::new(records, weights))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ProcedureCatalog for InMemoryProcedureCatalog {
    async fn records(&self) -> MatcherResult<Arc<[CatalogRecord]>> {
        Ok(Arc::clone(&self.records))
    }

    async fn text_search(&self, fragment: &str) -> MatcherResult<Vec<TextRank>> {
        let query = terms(fragment);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .records
            .iter()
            .zip(&self.documents)
            .filter_map(|(record, document)| {
                let relevance = document.rank(&query, &self.weights);
                (relevance.rank > 0.0).then(|| TextRank {
                    code: record.code.clone(),
                    rank: relevance.rank,
                    matches: relevance.matches,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_treated_as_missing() {
        let record = CatalogRecord::new("1")
            .with_procedure_name("   ")
            .with_group("Imagem");
        assert_eq!(record.field(CatalogField::ProcedureName), None);
        assert_eq!(record.field(CatalogField::Group), Some("Imagem"));
        assert_eq!(record.field(CatalogField::Chapter), None);
    }

    #[test]
    fn test_json_loading_accepts_missing_fields() {
        let json = r#"[{"code": "1", "procedure_name": "Hemograma", "audit_lead_days": "0"}]"#;
        let catalog =
            InMemoryProcedureCatalog::from_json_reader(json.as_bytes(), TierWeights::default())
                .unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_text_search_is_accent_insensitive() {
        let catalog = InMemoryProcedureCatalog::new(
            vec![CatalogRecord::new("1").with_procedure_name("Tomografia de crânio")],
            TierWeights::default(),
        );
        let ranks = catalog.text_search("TOMOGRAFIA CRANIO").await.unwrap();
        assert_eq!(ranks.len(), 1);
        assert!(ranks[0].matches);
        assert!(catalog.text_search("de").await.unwrap().is_empty());
    }
}
