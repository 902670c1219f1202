//! Confidence scoring and record merging
//!
//! The confidence score is a document-level heuristic over what the provider
//! returned, not over what the engine managed to map. Merging follows two
//! rules: scalar keys keep the previously stored value, list keys take the
//! order-preserving union.

use crate::config::ConfidenceConfig;
use crate::error::{CanonError, Result};
use crate::schema::{CanonicalRecord, CanonicalValue};
use crate::types::ExtractionResult;
use serde::{Deserialize, Serialize};

/// Counts the confidence heuristic looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSignals {
    /// Page text length in chars, surrounding whitespace excluded
    pub text_length: usize,
    pub form_field_count: usize,
    pub entity_count: usize,
}

impl ExtractionSignals {
    pub fn from_extraction(extraction: &ExtractionResult) -> Self {
        Self {
            text_length: extraction.text_content.trim().chars().count(),
            form_field_count: extraction.form_fields.len(),
            entity_count: extraction.entities.len(),
        }
    }
}

/// Additive confidence heuristic, capped at 1.0
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceModel {
    config: ConfidenceConfig,
}

impl ConfidenceModel {
    pub fn new(config: &ConfidenceConfig) -> Result<Self> {
        let params = [
            ("confidence.base", config.base),
            ("confidence.text_bonus", config.text_bonus),
            ("confidence.fields_bonus", config.fields_bonus),
            ("confidence.entities_bonus", config.entities_bonus),
        ];
        for (name, value) in params {
            if !(0.0..=1.0).contains(&value) {
                return Err(CanonError::InvalidConfidence { name, value });
            }
        }
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn score(&self, signals: &ExtractionSignals) -> f64 {
        let mut score = self.config.base;
        if signals.text_length > self.config.text_length_threshold {
            score += self.config.text_bonus;
        }
        if signals.form_field_count > 0 {
            score += self.config.fields_bonus;
        }
        if signals.entity_count > 0 {
            score += self.config.entities_bonus;
        }
        score.min(1.0)
    }
}

/// Merge a fresh record into a previously stored one.
///
/// Scalar keys: the previous value stays, the fresh value only fills gaps.
/// List keys: union in first-seen order, previous items first.
/// Merging a record with itself returns it unchanged.
pub fn merge_records(previous: &CanonicalRecord, fresh: &CanonicalRecord) -> CanonicalRecord {
    let mut merged = previous.clone();
    for (key, fresh_value) in fresh.iter() {
        let combined = match (previous.get(*key), fresh_value) {
            (None, _) => fresh_value.clone(),
            (Some(CanonicalValue::List(old)), CanonicalValue::List(new)) => {
                CanonicalValue::List(union_preserving_order(old, new))
            }
            (Some(old), _) => old.clone(),
        };
        merged.insert(*key, combined);
    }
    merged
}

/// `a` followed by every item of `b` not already present, first-seen order
pub fn union_preserving_order(a: &[String], b: &[String]) -> Vec<String> {
    let mut out: Vec<String> = a.to_vec();
    for item in b {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Final step of a canonicalization pass
#[derive(Debug, Clone)]
pub struct MergeResolver {
    confidence: ConfidenceModel,
}

impl MergeResolver {
    pub fn new(config: &ConfidenceConfig) -> Result<Self> {
        Ok(Self {
            confidence: ConfidenceModel::new(config)?,
        })
    }

    pub fn confidence_model(&self) -> &ConfidenceModel {
        &self.confidence
    }

    /// Score the pass and fold the fresh record into `previous`, if any
    pub fn resolve(
        &self,
        signals: &ExtractionSignals,
        record: CanonicalRecord,
        previous: Option<&CanonicalRecord>,
    ) -> (CanonicalRecord, f64) {
        let confidence = self.confidence.score(signals);
        let record = match previous {
            Some(previous) => merge_records(previous, &record),
            None => record,
        };
        (record, confidence)
    }
}
