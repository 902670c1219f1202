//! Exact / containment / fuzzy field mapper
//!
//! Lookup order mirrors a command registry: an exact hit anywhere in the
//! table wins over any containment hit, containment wins over similarity.
//! Within a pass the first rule in declaration order wins.

use super::{MappingRule, RuleKind, RuleTable};
use crate::decompose::CompositeKind;
use crate::types::{CandidateSource, CandidateValue, MatchType};

/// What to do with a matched field
#[derive(Debug, Clone, PartialEq)]
pub enum MappingOutcome {
    /// A direct candidate for one canonical key
    Candidate(CandidateValue),
    /// Hand the value to a composite recipe
    Decompose {
        kind: CompositeKind,
        /// Literal or prefix text of the matching rule
        label: Option<String>,
    },
}

/// Result of a successful rule match
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub rule_index: usize,
    pub match_type: MatchType,
    pub outcome: MappingOutcome,
}

/// Map one normalized (name, value) pair through the rule table.
///
/// Returns `None` when no rule matches; that is not an error.
pub fn map_field(norm_name: &str, norm_value: &str, table: &RuleTable) -> Option<FieldMapping> {
    let (rule_index, match_type) = table.find_rule(norm_name)?;
    let rule = &table.rules()[rule_index];

    let outcome = match (rule.kind, rule.composite) {
        (RuleKind::Composite, Some(kind)) => MappingOutcome::Decompose {
            kind,
            label: rule.pattern.label().map(str::to_string),
        },
        _ => MappingOutcome::Candidate(
            CandidateValue::new(rule.key, transformed(rule, norm_value), CandidateSource::Mapping)
                .matched(match_type),
        ),
    };

    Some(FieldMapping {
        rule_index,
        match_type,
        outcome,
    })
}

fn transformed(rule: &MappingRule, value: &str) -> String {
    match rule.effective_transform() {
        Some(transform) => transform.apply(value),
        None => value.to_string(),
    }
}

impl RuleTable {
    /// Find the winning rule index for a normalized field name
    pub fn find_rule(&self, norm_name: &str) -> Option<(usize, MatchType)> {
        if norm_name.is_empty() {
            return None;
        }

        // Pass (a): exact literal anywhere in the table
        if let Some(index) = self
            .rules()
            .iter()
            .position(|rule| rule.pattern.matches_exact(norm_name))
        {
            return Some((index, MatchType::Exact));
        }

        // Pass (b): containment / predicates, declaration order
        if let Some(index) = self
            .rules()
            .iter()
            .position(|rule| rule.pattern.matches_contained(norm_name, self.min_reverse_len()))
        {
            return Some((index, MatchType::Contains));
        }

        // Pass (c): best Jaro-Winkler similarity against literals
        if norm_name.chars().count() < self.min_reverse_len() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (index, rule) in self.rules().iter().enumerate() {
            let Some(literal) = rule.pattern.literal() else {
                continue;
            };
            let score = strsim::jaro_winkler(norm_name, literal);
            if score >= self.fuzzy_threshold() && best.map_or(true, |(_, s)| score > s) {
                best = Some((index, score));
            }
        }

        best.map(|(index, score)| {
            tracing::debug!(
                field = norm_name,
                rule = %self.rules()[index].pattern,
                score,
                "Fuzzy field-name match"
            );
            (index, MatchType::Fuzzy)
        })
    }
}
