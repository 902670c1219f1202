//! Engine YAML configuration types
//!
//! Defines the serde schema for `config/vessel_canon.yaml`. The bundled file
//! is compiled into the crate and used whenever no override is supplied.

use crate::decompose::{BuiltinExtractor, CompositeKind};
use crate::error::{CanonError, Result};
use crate::rules::{RuleKind, ValueTransform};
use crate::schema::CanonicalKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Environment variable naming an override config file
pub const CONFIG_ENV_VAR: &str = "VESSEL_CANON_CONFIG";

/// Bundled default tables
pub const DEFAULT_YAML: &str = include_str!("../config/vessel_canon.yaml");

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub version: String,

    #[serde(default)]
    pub mapper: MapperConfig,

    /// Ordered mapping rules. Declaration order is match order within a pass.
    pub rules: Vec<RuleDef>,

    /// Composite decomposition recipes
    #[serde(default)]
    pub composites: BTreeMap<CompositeKind, Vec<StepDef>>,

    #[serde(default)]
    pub vocabularies: VocabularyConfig,

    #[serde(default)]
    pub boilerplate: BoilerplateConfig,

    /// Page-text patterns per canonical key, most specific first
    #[serde(default)]
    pub fallback: BTreeMap<CanonicalKey, Vec<String>>,

    #[serde(default)]
    pub confidence: ConfidenceConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Field-mapper thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Minimum Jaro-Winkler similarity for the fuzzy pass (default: 0.92)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Shortest field name allowed to match inside a longer pattern
    #[serde(default = "default_min_reverse_len")]
    pub min_reverse_len: usize,

    /// Entities below this confidence are ignored
    #[serde(default = "default_min_entity_confidence")]
    pub min_entity_confidence: f64,
}

fn default_fuzzy_threshold() -> f64 {
    0.92
}

fn default_min_reverse_len() -> usize {
    3
}

fn default_min_entity_confidence() -> f64 {
    0.5
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            min_reverse_len: default_min_reverse_len(),
            min_entity_confidence: default_min_entity_confidence(),
        }
    }
}

/// One mapping rule as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub pattern: PatternDef,

    pub key: CanonicalKey,

    /// direct | composite | numeric | enum (default: direct)
    #[serde(default)]
    pub kind: RuleKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<ValueTransform>,

    /// Recipe name, required when `kind` is composite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeKind>,
}

/// Field-name pattern: a plain string is an exact literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternDef {
    Literal(String),
    Prefix { prefix: String },
    Regex { regex: String },
}

impl fmt::Display for PatternDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternDef::Literal(s) => write!(f, "\"{}\"", s),
            PatternDef::Prefix { prefix } => write!(f, "prefix \"{}\"", prefix),
            PatternDef::Regex { regex } => write!(f, "regex /{}/", regex),
        }
    }
}

/// One step of a composite recipe: a regex with one capture group, or a
/// built-in extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDef {
    pub target: CanonicalKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<BuiltinExtractor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub flag_states: Vec<String>,

    /// Port of registry -> implied flag state
    #[serde(default)]
    pub ports: BTreeMap<String, String>,

    #[serde(default)]
    pub enums: BTreeMap<CanonicalKey, EnumDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumDef {
    pub values: Vec<String>,

    /// Alternate spelling -> canonical value
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoilerplateConfig {
    /// Multi-word phrases, matched on word boundaries
    #[serde(default)]
    pub phrases: Vec<String>,

    /// Single words, also matched with a trailing "of"/"no"
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Document-level confidence heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_base")]
    pub base: f64,

    /// Page text must be longer than this (in chars) to earn the text bonus
    #[serde(default = "default_text_length_threshold")]
    pub text_length_threshold: usize,

    #[serde(default = "default_text_bonus")]
    pub text_bonus: f64,

    #[serde(default = "default_fields_bonus")]
    pub fields_bonus: f64,

    #[serde(default = "default_entities_bonus")]
    pub entities_bonus: f64,
}

fn default_base() -> f64 {
    0.5
}

fn default_text_length_threshold() -> usize {
    100
}

fn default_text_bonus() -> f64 {
    0.2
}

fn default_fields_bonus() -> f64 {
    0.2
}

fn default_entities_bonus() -> f64 {
    0.1
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            text_length_threshold: default_text_length_threshold(),
            text_bonus: default_text_bonus(),
            fields_bonus: default_fields_bonus(),
            entities_bonus: default_entities_bonus(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Pin the year used for `year_built` bounds. Defaults to the clock.
    #[serde(default)]
    pub current_year: Option<i32>,
}

impl EngineConfig {
    /// The bundled tables
    pub fn default_config() -> Result<Self> {
        Self::load_from_str(DEFAULT_YAML)
    }

    /// Load configuration from a YAML string
    pub fn load_from_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CanonError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&content)
    }

    /// Load from `VESSEL_CANON_CONFIG` if set, otherwise the bundled tables
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!(path = %path, "Loading canonicalization config from file");
                Self::load_from_file(path.trim())
            }
            _ => Self::default_config(),
        }
    }
}
