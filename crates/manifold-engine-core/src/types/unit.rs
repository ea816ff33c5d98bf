//! Embedded text units and their source locations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a unit came from in the source document.
///
/// Any of the positional fields may be absent depending on the ingestion
/// path (a CSV row has no page; an API-spec fragment may have neither page
/// nor paragraph). `char_span` is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based page number, when the source format has pages
    pub page: Option<u32>,
    /// 0-based paragraph index within the document
    pub paragraph_index: Option<usize>,
    /// Character span `[start, end)` in the extracted text
    pub char_span: (usize, usize),
}

impl SourceLocation {
    /// True when neither page nor paragraph is known.
    pub fn is_unanchored(&self) -> bool {
        self.page.is_none() && self.paragraph_index.is_none()
    }

    /// Render as `page:paragraph:start-end` with `-` for absent fields.
    pub fn render(&self) -> String {
        let page = self
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        let para = self
            .paragraph_index
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        format!("{page}:{para}:{}-{}", self.char_span.0, self.char_span.1)
    }
}

/// Which extraction granularity produced the units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitGranularity {
    /// Sentence-level units; locations may need parent-paragraph fallback
    #[default]
    Sentences,
    /// Paragraph-level units; locations are authoritative
    Paragraphs,
}

/// One embedded text unit: the engine's sole input record.
///
/// Immutable once produced. Owned by the caller; the engine borrows it
/// read-only for the duration of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedUnit {
    /// Stable unit identifier
    pub id: Uuid,
    /// Embedding vector; dimensionality is free but must be consistent
    /// within one request
    pub vector: Vec<f32>,
    /// Source position of the unit's text
    pub location: SourceLocation,
    /// Short reference text (the sentence/paragraph itself or a hash key)
    pub text_ref: String,
}

impl EmbeddedUnit {
    /// Construct a unit with a fresh id.
    pub fn new(vector: Vec<f32>, location: SourceLocation, text_ref: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vector,
            location,
            text_ref: text_ref.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_render_handles_missing_fields() {
        let loc = SourceLocation {
            page: Some(3),
            paragraph_index: None,
            char_span: (10, 42),
        };
        assert_eq!(loc.render(), "3:-:10-42");

        let loc = SourceLocation {
            page: None,
            paragraph_index: None,
            char_span: (0, 5),
        };
        assert!(loc.is_unanchored());
        assert_eq!(loc.render(), "-:-:0-5");
    }
}
