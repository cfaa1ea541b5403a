use chrono::{Days, NaiveDate};
use procedure_matcher::MatchResult;
use serde::{Deserialize, Serialize};

pub const NO_PROCEDURE_MESSAGE: &str =
    "I could not identify any procedure in this document. Please send a clearer copy of \
     the referral, or paste the procedure name exactly as your doctor wrote it.";

/// What the catalog's audit lead time means for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditRequirement {
    /// Already approved, nothing to wait for.
    NotRequired,
    Pending {
        lead_days: u32,
        response_date: NaiveDate,
    },
    /// The lead time on file is not a usable number.
    Unknown,
}

impl AuditRequirement {
    /// Interpret a catalog `audit_lead_days` value.
    ///
    /// Missing, blank or zero means no audit; a positive count is added to
    /// `today` in calendar days.
    pub fn from_lead_days(lead_days: Option<&str>, today: NaiveDate) -> Self {
        let raw = match lead_days.map(str::trim) {
            None | Some("") => return Self::NotRequired,
            Some(raw) => raw,
        };
        match raw.parse::<u32>() {
            Ok(0) => Self::NotRequired,
            Ok(days) => today
                .checked_add_days(Days::new(u64::from(days)))
                .map_or(Self::Unknown, |response_date| Self::Pending {
                    lead_days: days,
                    response_date,
                }),
            Err(_) => Self::Unknown,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::NotRequired => "No audit required: this procedure is already approved.".to_string(),
            Self::Pending {
                lead_days,
                response_date,
            } => format!(
                "This procedure requires {lead_days} {} of audit. Expected response by {}.",
                if *lead_days == 1 { "day" } else { "days" },
                response_date.format("%A, %B %-d, %Y")
            ),
            Self::Unknown => "The audit period for this procedure is not on file.".to_string(),
        }
    }
}

/// Result of checking one referral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuthorizationOutcome {
    Identified {
        procedure: MatchResult,
        audit: AuditRequirement,
    },
    NotIdentified,
}

impl AuthorizationOutcome {
    pub fn is_identified(&self) -> bool {
        matches!(self, Self::Identified { .. })
    }

    pub fn render(&self) -> String {
        match self {
            Self::Identified { procedure, audit } => format!(
                "Procedure identified: {} (code {}).\n{}",
                procedure.matched_text,
                procedure.code,
                audit.render()
            ),
            Self::NotIdentified => NO_PROCEDURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procedure_matcher::CatalogField;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_lead_days_interpretation() {
        assert_eq!(
            AuditRequirement::from_lead_days(None, today()),
            AuditRequirement::NotRequired
        );
        assert_eq!(
            AuditRequirement::from_lead_days(Some(" "), today()),
            AuditRequirement::NotRequired
        );
        assert_eq!(
            AuditRequirement::from_lead_days(Some("0"), today()),
            AuditRequirement::NotRequired
        );
        assert_eq!(
            AuditRequirement::from_lead_days(Some("10"), today()),
            AuditRequirement::Pending {
                lead_days: 10,
                response_date: NaiveDate::from_ymd_opt(2026, 10, 29).unwrap(),
            }
        );
        assert_eq!(
            AuditRequirement::from_lead_days(Some("-3"), today()),
            AuditRequirement::Unknown
        );
        assert_eq!(
            AuditRequirement::from_lead_days(Some("ten"), today()),
            AuditRequirement::Unknown
        );
    }

    #[test]
    fn test_pending_render_uses_long_date() {
        let audit = AuditRequirement::from_lead_days(Some("10"), today());
        assert_eq!(
            audit.render(),
            "This procedure requires 10 days of audit. Expected response by Thursday, October 29, 2026."
        );
        let single = AuditRequirement::from_lead_days(Some("1"), today());
        assert!(single.render().contains("requires 1 day of audit"));
    }

    #[test]
    fn test_outcome_render() {
        let outcome = AuthorizationOutcome::Identified {
            procedure: MatchResult {
                matched_text: "Hemograma com contagem de plaquetas".into(),
                score: 0.8,
                audit_lead_days: Some("0".into()),
                code: "40304361".into(),
                field: CatalogField::ProcedureName,
            },
            audit: AuditRequirement::NotRequired,
        };
        assert_eq!(
            outcome.render(),
            "Procedure identified: Hemograma com contagem de plaquetas (code 40304361).\n\
             No audit required: this procedure is already approved."
        );
        assert!(AuthorizationOutcome::NotIdentified
            .render()
            .starts_with("I could not identify any procedure"));
    }
}
