use crate::error::DialogResult;
use crate::session::Turn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Answers free-form questions while the caller is in the Q&A step.
///
/// `prior_turns` holds only conversation content, oldest first, and never
/// includes the question being asked.
#[async_trait]
pub trait FreeTextResponder: Send + Sync {
    async fn respond(&self, text: &str, prior_turns: &[Turn]) -> DialogResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Accent-free lowercase keywords; any one of them selects the entry.
    pub keywords: Vec<String>,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(keywords: &[&str], answer: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            answer: answer.into(),
        }
    }
}

/// Canned answers picked by keyword, for deployments without a language model.
#[derive(Debug, Clone)]
pub struct KeywordFaqResponder {
    entries: Vec<FaqEntry>,
    fallback: String,
}

impl KeywordFaqResponder {
    pub fn new(entries: Vec<FaqEntry>, fallback: impl Into<String>) -> Self {
        Self {
            entries,
            fallback: fallback.into(),
        }
    }

    pub fn with_default_entries() -> Self {
        Self::new(
            vec![
                FaqEntry::new(
                    &["hour", "open", "horario", "funciona"],
                    "We are open Monday to Friday from 7am to 7pm and on Saturdays from 7am to 1pm.",
                ),
                FaqEntry::new(
                    &["phone", "call", "telefone", "whatsapp"],
                    "You can reach our front desk by phone or WhatsApp during opening hours.",
                ),
                FaqEntry::new(
                    &["address", "where", "endereco", "location"],
                    "Our main unit is downtown, next to the central station. Other units are listed on our website.",
                ),
                FaqEntry::new(
                    &["unit", "clinic", "clinica", "unidade"],
                    "We have units downtown and in the north and south districts, all with imaging and lab services.",
                ),
                FaqEntry::new(
                    &["insurance", "plan", "convenio", "plano"],
                    "We accept the major health plans. Bring your plan card and an ID document to every visit.",
                ),
                FaqEntry::new(
                    &["exam", "test", "exame", "preparation", "preparo"],
                    "Most exams need a medical referral. Preparation instructions are sent after booking.",
                ),
                FaqEntry::new(
                    &["authoriz", "autoriza", "audit", "auditoria"],
                    "To check a procedure's authorization, return to the main menu and choose option 3.",
                ),
            ],
            "I could not find an answer to that. Please contact our front desk during opening hours for help.",
        )
    }
}

#[async_trait]
impl FreeTextResponder for KeywordFaqResponder {
    async fn respond(&self, text: &str, _prior_turns: &[Turn]) -> DialogResult<String> {
        let folded = fold(text);
        let answer = self
            .entries
            .iter()
            .find(|entry| entry.keywords.iter().any(|k| folded.contains(k.as_str())))
            .map_or_else(|| self.fallback.clone(), |entry| entry.answer.clone());
        Ok(answer)
    }
}

fn fold(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' | 'Ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
