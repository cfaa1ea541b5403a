use crate::error::InsuranceResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns an uploaded document into candidate text lines for the matcher.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, document: &[u8]) -> InsuranceResult<Vec<String>>;
}

/// Reads the bytes as UTF-8 text, replacing invalid sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract_text(&self, document: &[u8]) -> InsuranceResult<Vec<String>> {
        Ok(split_lines(&String::from_utf8_lossy(document)))
    }
}

/// Trimmed, non-blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Embedded text first, OCR when the embedded layer is too thin.
pub struct LayeredExtractor {
    embedded: Arc<dyn DocumentExtractor>,
    ocr: Option<Arc<dyn DocumentExtractor>>,
    min_embedded_chars: usize,
}

impl LayeredExtractor {
    pub const DEFAULT_MIN_EMBEDDED_CHARS: usize = 20;

    pub fn new(embedded: Arc<dyn DocumentExtractor>, ocr: Option<Arc<dyn DocumentExtractor>>) -> Self {
        Self {
            embedded,
            ocr,
            min_embedded_chars: Self::DEFAULT_MIN_EMBEDDED_CHARS,
        }
    }

    pub fn with_min_embedded_chars(mut self, min_embedded_chars: usize) -> Self {
        self.min_embedded_chars = min_embedded_chars;
        self
    }
}

#[async_trait]
impl DocumentExtractor for LayeredExtractor {
    async fn extract_text(&self, document: &[u8]) -> InsuranceResult<Vec<String>> {
        let embedded = match self.embedded.extract_text(document).await {
            Ok(lines) => lines,
            Err(err) if self.ocr.is_some() => {
                warn!(error = %err, "Embedded text extraction failed, trying OCR");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let visible: usize = embedded
            .iter()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        if visible >= self.min_embedded_chars {
            debug!(lines = embedded.len(), visible, "Using embedded document text");
            return Ok(embedded);
        }

        match &self.ocr {
            Some(ocr) => {
                let lines = ocr.extract_text(document).await?;
                debug!(lines = lines.len(), "Using OCR document text");
                Ok(lines)
            }
            None => Ok(embedded),
        }
    }
}
