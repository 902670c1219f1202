//! Upstream extraction types and transient candidate values
//!
//! [`ExtractionResult`] is what the document-understanding provider hands
//! over; [`CandidateValue`] is the engine's internal proposal for one
//! canonical key before it meets the validator.

use crate::schema::CanonicalKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entity recognized by the upstream provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub value: String,
    /// Provider confidence; entities sent without one are taken at face value
    #[serde(default = "default_entity_confidence")]
    pub confidence: f64,
}

fn default_entity_confidence() -> f64 {
    1.0
}

/// Output of one document-understanding call. Read-only input to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub form_fields: HashMap<String, String>,
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub text_content: String,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.insert(name.into(), value.into());
        self
    }

    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        value: impl Into<String>,
        confidence: f64,
    ) -> Self {
        self.entities.push(ExtractedEntity {
            entity_type: entity_type.into(),
            value: value.into(),
            confidence,
        });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    /// No form fields, no entities and blank page text
    pub fn is_empty(&self) -> bool {
        self.form_fields.is_empty()
            && self.entities.is_empty()
            && self.text_content.trim().is_empty()
    }

    /// Form fields as raw pairs, sorted by field name for deterministic passes
    pub fn field_pairs(&self) -> Vec<RawFieldPair> {
        let mut pairs: Vec<RawFieldPair> = self
            .form_fields
            .iter()
            .map(|(name, value)| RawFieldPair {
                field_name: name.clone(),
                field_value: value.clone(),
            })
            .collect();
        pairs.sort_by(|a, b| a.field_name.cmp(&b.field_name));
        pairs
    }
}

/// One upstream key/value observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFieldPair {
    pub field_name: String,
    pub field_value: String,
}

/// Where a candidate value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Direct rule-table mapping of a form field
    Mapping,
    /// Sub-value of a composite form field
    Composite,
    /// Recognized entity whose type mapped through the rule table
    Entity,
    /// Pattern scan of the raw page text
    TextFallback,
}

/// How a field name matched its rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Contains,
    Fuzzy,
}

/// Proposed value for a canonical key, not yet validated
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateValue {
    pub canonical_key: CanonicalKey,
    pub value: String,
    pub source: CandidateSource,
    pub raw_source_field: Option<String>,
    pub match_type: Option<MatchType>,
}

impl CandidateValue {
    pub fn new(canonical_key: CanonicalKey, value: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            canonical_key,
            value: value.into(),
            source,
            raw_source_field: None,
            match_type: None,
        }
    }

    pub fn from_field(mut self, field: impl Into<String>) -> Self {
        self.raw_source_field = Some(field.into());
        self
    }

    pub fn matched(mut self, match_type: MatchType) -> Self {
        self.match_type = Some(match_type);
        self
    }
}
