use crate::document::DocumentExtractor;
use crate::error::InsuranceResult;
use crate::models::{AuditRequirement, AuthorizationOutcome};
use chrono::NaiveDate;
use error_common::{report_error, Categorized, ErrorCategory, ErrorCode, ErrorContext};
use logger_redacted::redacted_debug;
use procedure_matcher::{MatchResult, ProcedureMatcher};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
#[error("no catalog procedure matched the referral")]
struct NoProcedure;

impl Categorized for NoProcedure {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::NoMatch
    }

    fn code(&self) -> ErrorCode {
        ErrorCode::NO_PROCEDURE
    }
}

/// Prior-authorization lookup for a referral.
pub struct AuthorizationService {
    matcher: Arc<ProcedureMatcher>,
    extractor: Arc<dyn DocumentExtractor>,
}

impl AuthorizationService {
    pub fn new(matcher: Arc<ProcedureMatcher>, extractor: Arc<dyn DocumentExtractor>) -> Self {
        Self { matcher, extractor }
    }

    /// Extract the document's text and look up the procedure it asks for.
    pub async fn check_document(
        &self,
        document: &[u8],
        today: NaiveDate,
    ) -> InsuranceResult<AuthorizationOutcome> {
        let lines = self.extractor.extract_text(document).await?;
        self.check_lines(&lines, today).await
    }

    /// Look up the procedure named by already-extracted lines.
    pub async fn check_lines<S: AsRef<str> + Sync>(
        &self,
        lines: &[S],
        today: NaiveDate,
    ) -> InsuranceResult<AuthorizationOutcome> {
        redacted_debug!(
            "Matching referral text: {}",
            lines.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(" | ")
        );
        let best = self.matcher.best_match(lines).await?;
        let outcome = interpret(best, today);
        match &outcome {
            AuthorizationOutcome::Identified { procedure, audit } => info!(
                code = %procedure.code,
                score = procedure.score,
                audit = ?audit,
                "Procedure identified"
            ),
            AuthorizationOutcome::NotIdentified => report_error(
                &ErrorContext::new("check_lines").add_context("lines", lines.len().to_string()),
                &NoProcedure,
            ),
        }
        Ok(outcome)
    }
}

/// The caller-facing reading of a match.
pub fn interpret(best: Option<MatchResult>, today: NaiveDate) -> AuthorizationOutcome {
    match best {
        Some(procedure) => {
            let audit = AuditRequirement::from_lead_days(procedure.audit_lead_days.as_deref(), today);
            AuthorizationOutcome::Identified { procedure, audit }
        }
        None => AuthorizationOutcome::NotIdentified,
    }
}
