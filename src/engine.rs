//! Canonicalization pipeline
//!
//! ```text
//! ExtractionResult
//!   -> normalize each form field
//!   -> map (exact / contains / fuzzy) or decompose composite fields
//!   -> entity candidates
//!   -> validate, first accepted candidate per key wins
//!   -> page-text fallback for keys still unset
//!   -> confidence + merge with the previous record
//! ```
//!
//! The engine holds only immutable, pre-compiled tables and is safe to share
//! across threads behind an `Arc`.

use crate::config::EngineConfig;
use crate::decompose::{CompositeInput, RecipeTable};
use crate::error::Result;
use crate::fallback::FallbackTable;
use crate::normalize::normalize;
use crate::resolve::{ExtractionSignals, MergeResolver};
use crate::rules::{map_field, MappingOutcome, RuleTable};
use crate::schema::{CanonicalKey, CanonicalRecord};
use crate::types::{CandidateSource, CandidateValue, ExtractionResult, MatchType};
use crate::validate::{RejectReason, SemanticValidator};
use crate::vocab::Vocabulary;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// REPORT TYPES
// =============================================================================

/// Where an accepted value came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub source: CandidateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_source_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
}

/// A candidate the validator refused
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub key: CanonicalKey,
    pub value: String,
    pub source: CandidateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_source_field: Option<String>,
    pub reason: RejectReason,
}

/// Result of one canonicalization pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Canonicalization {
    pub record: CanonicalRecord,
    /// Document-level confidence in [0, 1]
    pub confidence: f64,
    /// Origin of every value produced by this pass (merged-in values excluded)
    pub provenance: BTreeMap<CanonicalKey, Provenance>,
    /// Raw form-field names no rule matched
    pub unmapped_fields: Vec<String>,
    /// Rejections for keys that stayed unset after fallback
    pub unresolved: Vec<Rejection>,
    /// Provider returned no fields, entities or text
    pub upstream_empty: bool,
}

// =============================================================================
// ENGINE
// =============================================================================

pub struct CanonicalizationEngine {
    rules: RuleTable,
    recipes: RecipeTable,
    validator: SemanticValidator,
    fallback: FallbackTable,
    resolver: MergeResolver,
    min_entity_confidence: f64,
}

impl CanonicalizationEngine {
    /// Compile and validate every table. The only fallible step.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let vocab = Arc::new(Vocabulary::from_config(
            &config.vocabularies,
            &config.boilerplate,
        )?);
        let rules = RuleTable::from_config(config)?;
        let recipes = RecipeTable::from_config(config, vocab.clone())?;
        let fallback = FallbackTable::from_config(config)?;
        let resolver = MergeResolver::new(&config.confidence)?;

        let current_year = config
            .validation
            .current_year
            .unwrap_or_else(|| chrono::Utc::now().year());
        let validator = SemanticValidator::new(vocab, current_year);

        info!(
            version = %config.version,
            rules = rules.len(),
            recipes = config.composites.len(),
            fallback_keys = config.fallback.len(),
            current_year,
            "Canonicalization engine ready"
        );

        Ok(Self {
            rules,
            recipes,
            validator,
            fallback,
            resolver,
            min_entity_confidence: config.mapper.min_entity_confidence,
        })
    }

    /// Engine over the bundled tables
    pub fn from_default_config() -> Result<Self> {
        Self::new(&EngineConfig::default_config()?)
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn validator(&self) -> &SemanticValidator {
        &self.validator
    }

    pub fn canonicalize(&self, extraction: &ExtractionResult) -> Canonicalization {
        self.canonicalize_with_previous(extraction, None)
    }

    /// Canonicalize and merge into a previously stored record
    pub fn canonicalize_with_previous(
        &self,
        extraction: &ExtractionResult,
        previous: Option<&CanonicalRecord>,
    ) -> Canonicalization {
        let upstream_empty = extraction.is_empty();
        if upstream_empty {
            info!("Provider returned an empty extraction");
        }

        let mut unmapped_fields = Vec::new();
        let mut candidates = self.field_candidates(extraction, &mut unmapped_fields);
        // Stable: exact before contains before fuzzy, field order kept within a tier
        candidates.sort_by_key(|c| c.match_type);
        candidates.extend(self.entity_candidates(extraction));

        let mut record = CanonicalRecord::new();
        let mut provenance = BTreeMap::new();
        let mut rejections = Vec::new();

        for candidate in candidates {
            let key = candidate.canonical_key;
            if record.contains_key(key) {
                debug!(
                    key = %key,
                    field = candidate.raw_source_field.as_deref().unwrap_or(""),
                    "Candidate shadowed by an earlier accepted value"
                );
                continue;
            }
            match self.validator.check(key, &candidate.value) {
                Ok(value) => {
                    record.insert_new(key, value);
                    provenance.insert(
                        key,
                        Provenance {
                            source: candidate.source,
                            raw_source_field: candidate.raw_source_field,
                            match_type: candidate.match_type,
                        },
                    );
                }
                Err(reason) => {
                    info!(
                        key = %key,
                        value = %candidate.value,
                        %reason,
                        "Candidate rejected by validator"
                    );
                    rejections.push(Rejection {
                        key,
                        value: candidate.value,
                        source: candidate.source,
                        raw_source_field: candidate.raw_source_field,
                        reason,
                    });
                }
            }
        }

        let text = extraction.text_content.as_str();
        let open_keys: Vec<CanonicalKey> = self
            .fallback
            .keys()
            .filter(|key| !record.contains_key(*key))
            .collect();
        for key in open_keys {
            if let Some(value) = self.fallback.extract_from_text(key, text, &self.validator) {
                record.insert_new(key, value);
                provenance.insert(
                    key,
                    Provenance {
                        source: CandidateSource::TextFallback,
                        raw_source_field: None,
                        match_type: None,
                    },
                );
            }
        }

        let unresolved: Vec<Rejection> = rejections
            .into_iter()
            .filter(|r| !record.contains_key(r.key))
            .collect();

        let signals = ExtractionSignals::from_extraction(extraction);
        let fresh_keys = record.len();
        let (record, confidence) = self.resolver.resolve(&signals, record, previous);

        debug!(
            form_fields = signals.form_field_count,
            entities = signals.entity_count,
            accepted = fresh_keys,
            merged = record.len(),
            unmapped = unmapped_fields.len(),
            unresolved = unresolved.len(),
            confidence,
            "Canonicalization pass complete"
        );

        Canonicalization {
            record,
            confidence,
            provenance,
            unmapped_fields,
            unresolved,
            upstream_empty,
        }
    }

    fn field_candidates(
        &self,
        extraction: &ExtractionResult,
        unmapped: &mut Vec<String>,
    ) -> Vec<CandidateValue> {
        let mut out = Vec::new();

        for pair in extraction.field_pairs() {
            let field = normalize(&pair.field_name, &pair.field_value);
            if field.name.is_empty() || field.value.is_empty() {
                debug!(field = %pair.field_name, "Skipping blank form field");
                continue;
            }

            let Some(mapping) = map_field(&field.name, &field.value, &self.rules) else {
                info!(field = %pair.field_name, "No mapping rule for field");
                unmapped.push(pair.field_name.clone());
                continue;
            };

            match mapping.outcome {
                MappingOutcome::Candidate(mut candidate) => {
                    // List values keep their line breaks as item separators
                    if candidate.canonical_key.is_list() {
                        candidate.value = pair.field_value.clone();
                    }
                    out.push(candidate.from_field(pair.field_name.as_str()));
                }
                MappingOutcome::Decompose { kind, label } => {
                    let input = CompositeInput::new(&pair.field_name, &field.value, &pair.field_value)
                        .with_label(label.as_deref());
                    out.extend(
                        self.recipes
                            .decompose(kind, &input)
                            .into_iter()
                            .map(|c| c.matched(mapping.match_type)),
                    );
                }
            }
        }
        out
    }

    fn entity_candidates(&self, extraction: &ExtractionResult) -> Vec<CandidateValue> {
        let mut out = Vec::new();
        for entity in &extraction.entities {
            if entity.confidence < self.min_entity_confidence {
                continue;
            }
            let field = normalize(&entity.entity_type, &entity.value);
            if field.value.is_empty() {
                continue;
            }
            match map_field(&field.name, &field.value, &self.rules).map(|m| m.outcome) {
                Some(MappingOutcome::Candidate(mut candidate)) => {
                    candidate.source = CandidateSource::Entity;
                    out.push(candidate.from_field(entity.entity_type.as_str()));
                }
                Some(MappingOutcome::Decompose { kind, .. }) => {
                    debug!(entity = %entity.entity_type, recipe = %kind, "Composite entity ignored");
                }
                None => {}
            }
        }
        out
    }
}
