#![allow(clippy::expect_used)]

use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern");
    static ref CPF_REGEX: Regex =
        Regex::new(r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b").expect("cpf pattern");
    // Optional country code, optional (area code), 4-5 digit prefix, 4 digit suffix.
    static ref PHONE_REGEX: Regex = Regex::new(
        r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,3}\)|\b\d{2,3})[\s.-]?\d{4,5}[\s.-]?\d{4}\b"
    )
    .expect("phone pattern");
    static ref GLOBAL_REDACTOR: PiiRedactor = PiiRedactor::new(RedactionConfig::default());
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_cpf: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_cpf: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// PII redactor for log messages
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&EMAIL_REGEX, &result, "EMAIL", "***@***");
        }

        // CPF runs before phones so an 11 digit document is not read as a phone.
        if self.config.redact_cpf {
            result = self.replace(&CPF_REGEX, &result, "CPF", "***.***.***-**");
        }

        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", "(**) *****-****");
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Stable, non-reversible reference for a caller id.
    pub fn fingerprint(&self, value: &str) -> String {
        hash_value(value)
    }

    fn replace(&self, pattern: &Regex, text: &str, label: &str, mask: &str) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("{label}[{}]", hash_value(matched))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

/// Process-wide redactor used by the `redacted_*!` macros.
pub fn global_redactor() -> &'static PiiRedactor {
    &GLOBAL_REDACTOR
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let prefix: Vec<u8> = digest.iter().take(8).copied().collect();
    general_purpose::STANDARD_NO_PAD.encode(prefix)
}
