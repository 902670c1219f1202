//! Declarative field-mapping rule table
//!
//! Every upstream label the engine understands is one [`MappingRule`] built
//! from the `rules:` section of the YAML config. The table is compiled and
//! validated once; malformed rules fail engine construction.

pub mod mapper;

pub use mapper::{map_field, FieldMapping, MappingOutcome};

use crate::config::{EngineConfig, PatternDef, RuleDef};
use crate::decompose::CompositeKind;
use crate::error::{CanonError, Result};
use crate::normalize::normalize_name;
use crate::schema::{CanonicalKey, FieldClass};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// =============================================================================
// RULE KINDS & TRANSFORMS
// =============================================================================

/// What a matched rule does with the field value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Value maps straight to the key
    #[default]
    Direct,
    /// Value is handed to a named decomposition recipe
    Composite,
    /// Value is reduced to its first number before validation
    Numeric,
    /// Value maps unconditionally; vocabulary membership is checked later
    Enum,
}

/// Named value rewrite applied before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTransform {
    Uppercase,
    Lowercase,
    /// Strip surrounding punctuation
    TrimPunct,
    DigitsOnly,
    /// First integer or decimal in the value ("45.6 m" -> "45.6")
    FirstNumber,
    /// Drop a leading "No."/"Number:"/"#" label
    StripPrefixLabel,
    CollapseSpaces,
}

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:[.,]\d+)?").expect("Invalid first-number regex")
});

static PREFIX_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:no|nr|num|number)\b\.?|#)\s*[:#.\-]?\s*")
        .expect("Invalid prefix-label regex")
});

impl ValueTransform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            ValueTransform::Uppercase => value.to_uppercase(),
            ValueTransform::Lowercase => value.to_lowercase(),
            ValueTransform::TrimPunct => value
                .trim_matches(|c: char| c.is_whitespace() || ".,;:-'\"()[]".contains(c))
                .to_string(),
            ValueTransform::DigitsOnly => value.chars().filter(|c| c.is_ascii_digit()).collect(),
            ValueTransform::FirstNumber => FIRST_NUMBER
                .find(value)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| value.to_string()),
            ValueTransform::StripPrefixLabel => PREFIX_LABEL.replace(value, "").trim().to_string(),
            ValueTransform::CollapseSpaces => value.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

// =============================================================================
// PATTERNS
// =============================================================================

/// Compiled field-name pattern
#[derive(Debug, Clone)]
pub enum FieldPattern {
    /// Normalized literal, eligible for exact and containment matching
    Literal(String),
    /// Name starts with the label followed by more words
    Prefix(String),
    /// Arbitrary predicate over the normalized name
    Regex(Regex),
}

impl FieldPattern {
    fn compile(def: &PatternDef, index: usize) -> Result<Self> {
        let invalid = |message: &str| CanonError::InvalidRule {
            index,
            pattern: def.to_string(),
            message: message.to_string(),
        };
        match def {
            PatternDef::Literal(s) => {
                let s = normalize_name(s);
                if s.is_empty() {
                    return Err(invalid("empty pattern"));
                }
                Ok(FieldPattern::Literal(s))
            }
            PatternDef::Prefix { prefix } => {
                let s = normalize_name(prefix);
                if s.is_empty() {
                    return Err(invalid("empty prefix"));
                }
                Ok(FieldPattern::Prefix(s))
            }
            PatternDef::Regex { regex } => {
                if regex.trim().is_empty() {
                    return Err(invalid("empty regex"));
                }
                let compiled = Regex::new(regex)
                    .map_err(|e| CanonError::regex(format!("rule #{}", index), e))?;
                Ok(FieldPattern::Regex(compiled))
            }
        }
    }

    /// Pass (a): only literals take part
    pub fn matches_exact(&self, name: &str) -> bool {
        matches!(self, FieldPattern::Literal(s) if s == name)
    }

    /// Pass (b): bidirectional containment for literals, predicates otherwise
    pub fn matches_contained(&self, name: &str, min_reverse_len: usize) -> bool {
        match self {
            FieldPattern::Literal(s) => {
                name.contains(s.as_str())
                    || (name.chars().count() >= min_reverse_len && s.contains(name))
            }
            FieldPattern::Prefix(p) => name
                .strip_prefix(p.as_str())
                .map(|rest| rest.starts_with(' ') && !rest.trim().is_empty())
                .unwrap_or(false),
            FieldPattern::Regex(re) => re.is_match(name),
        }
    }

    pub fn literal(&self) -> Option<&str> {
        match self {
            FieldPattern::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable label text (literal or prefix), if any
    pub fn label(&self) -> Option<&str> {
        match self {
            FieldPattern::Literal(s) | FieldPattern::Prefix(s) => Some(s),
            FieldPattern::Regex(_) => None,
        }
    }
}

impl fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPattern::Literal(s) => write!(f, "\"{}\"", s),
            FieldPattern::Prefix(s) => write!(f, "prefix \"{}\"", s),
            FieldPattern::Regex(re) => write!(f, "regex /{}/", re.as_str()),
        }
    }
}

// =============================================================================
// RULES
// =============================================================================

#[derive(Debug, Clone)]
pub struct MappingRule {
    pub pattern: FieldPattern,
    pub key: CanonicalKey,
    pub kind: RuleKind,
    pub transform: Option<ValueTransform>,
    pub composite: Option<CompositeKind>,
}

impl MappingRule {
    /// Configured transform, or `first_number` for numeric rules
    pub fn effective_transform(&self) -> Option<ValueTransform> {
        match (self.transform, self.kind) {
            (Some(t), _) => Some(t),
            (None, RuleKind::Numeric) => Some(ValueTransform::FirstNumber),
            (None, _) => None,
        }
    }

    fn compile(def: &RuleDef, index: usize, config: &EngineConfig) -> Result<Self> {
        let pattern = FieldPattern::compile(&def.pattern, index)?;
        let invalid = |message: String| CanonError::InvalidRule {
            index,
            pattern: def.pattern.to_string(),
            message,
        };

        match (def.kind, def.composite) {
            (RuleKind::Composite, None) => {
                return Err(invalid("composite rule without a recipe".to_string()));
            }
            (RuleKind::Composite, Some(kind)) if !config.composites.contains_key(&kind) => {
                return Err(invalid(format!("unknown composite recipe '{}'", kind)));
            }
            (RuleKind::Composite, Some(_)) => {}
            (_, Some(kind)) => {
                return Err(invalid(format!(
                    "recipe '{}' given on a non-composite rule",
                    kind
                )));
            }
            (_, None) => {}
        }

        if def.kind == RuleKind::Enum {
            if def.key.class() != FieldClass::Enum {
                return Err(invalid(format!("'{}' is not an enum key", def.key)));
            }
            if !config.vocabularies.enums.contains_key(&def.key) {
                return Err(invalid(format!("no vocabulary for enum key '{}'", def.key)));
            }
        }

        Ok(Self {
            pattern,
            key: def.key,
            kind: def.kind,
            transform: def.transform,
            composite: def.composite,
        })
    }
}

// =============================================================================
// RULE TABLE
// =============================================================================

/// Ordered, immutable rule collection plus the mapper thresholds
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<MappingRule>,
    fuzzy_threshold: f64,
    min_reverse_len: usize,
}

impl RuleTable {
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(index, def)| MappingRule::compile(def, index, config))
            .collect::<Result<Vec<_>>>()?;

        let threshold = config.mapper.fuzzy_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CanonError::InvalidConfidence {
                name: "mapper.fuzzy_threshold",
                value: threshold,
            });
        }

        Ok(Self {
            rules,
            fuzzy_threshold: threshold,
            min_reverse_len: config.mapper.min_reverse_len,
        })
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }

    pub fn min_reverse_len(&self) -> usize {
        self.min_reverse_len
    }
}
