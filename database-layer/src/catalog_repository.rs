use crate::connection::DatabasePool;
use crate::error::DatabaseResult;
use async_trait::async_trait;
use procedure_matcher::{CatalogRecord, MatcherResult, ProcedureCatalog, TextRank};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Procedure catalog stored in `procedure_catalog`.
///
/// Records are cached after the first read and reloaded after an upsert;
/// full-text ranking runs in the database against the weighted `search_vector`.
pub struct PostgresProcedureCatalog {
    pool: PgPool,
    records: RwLock<Option<Arc<[CatalogRecord]>>>,
}

impl PostgresProcedureCatalog {
    pub fn new(pool: &DatabasePool) -> Self {
        Self {
            pool: pool.pool().clone(),
            records: RwLock::new(None),
        }
    }

    async fn load_records(&self) -> DatabaseResult<Arc<[CatalogRecord]>> {
        let rows = sqlx::query(
            r#"
            SELECT code, procedure_name, terminology_label, subgroup, group_name, chapter,
                   audit_lead_days
            FROM procedure_catalog
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(CatalogRecord {
                    code: row.try_get("code")?,
                    procedure_name: row.try_get("procedure_name")?,
                    terminology_label: row.try_get("terminology_label")?,
                    subgroup: row.try_get("subgroup")?,
                    group: row.try_get("group_name")?,
                    chapter: row.try_get("chapter")?,
                    audit_lead_days: row.try_get("audit_lead_days")?,
                })
            })
            .collect::<DatabaseResult<Vec<_>>>()?;

        info!(records = records.len(), "Procedure catalog loaded");
        Ok(records.into())
    }

    /// Insert or replace a catalog record.
    pub async fn upsert(&self, record: &CatalogRecord) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO procedure_catalog (
                code, procedure_name, terminology_label, subgroup, group_name, chapter,
                audit_lead_days
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO UPDATE SET
                procedure_name = EXCLUDED.procedure_name,
                terminology_label = EXCLUDED.terminology_label,
                subgroup = EXCLUDED.subgroup,
                group_name = EXCLUDED.group_name,
                chapter = EXCLUDED.chapter,
                audit_lead_days = EXCLUDED.audit_lead_days
            "#,
        )
        .bind(&record.code)
        .bind(&record.procedure_name)
        .bind(&record.terminology_label)
        .bind(&record.subgroup)
        .bind(&record.group)
        .bind(&record.chapter)
        .bind(&record.audit_lead_days)
        .execute(&self.pool)
        .await?;

        *self.records.write().await = None;
        debug!(code = %record.code, "Catalog record upserted, cache cleared");
        Ok(())
    }
}

#[async_trait]
impl ProcedureCatalog for PostgresProcedureCatalog {
    async fn records(&self) -> MatcherResult<Arc<[CatalogRecord]>> {
        if let Some(records) = self.records.read().await.as_ref() {
            return Ok(records.clone());
        }

        let mut cached = self.records.write().await;
        if let Some(records) = cached.as_ref() {
            return Ok(records.clone());
        }
        let records = self.load_records().await?;
        *cached = Some(records.clone());
        Ok(records)
    }

    async fn text_search(&self, fragment: &str) -> MatcherResult<Vec<TextRank>> {
        let rows = sqlx::query(
            r#"
            WITH q AS (SELECT websearch_to_tsquery('portuguese', $1) AS tsq)
            SELECT p.code, ts_rank(p.search_vector, q.tsq)::float8 AS rank
            FROM procedure_catalog p, q
            WHERE p.search_vector @@ q.tsq
            "#,
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DatabaseError::from)?;

        let ranks = rows
            .iter()
            .map(|row| {
                Ok(TextRank {
                    code: row.try_get("code")?,
                    rank: row.try_get("rank")?,
                    matches: true,
                })
            })
            .collect::<DatabaseResult<Vec<_>>>()?;
        debug!(hits = ranks.len(), "Full-text catalog search");
        Ok(ranks)
    }
}
