//! Composite field decomposition
//!
//! Some upstream fields carry several facts at once ("2025 AZIMUT BENETTI
//! SPA, VIAREGGIO", "VALLETTA\nMALTA"). A recipe is an ordered list of steps,
//! each targeting one canonical key; every target keeps its first successful
//! extraction and later steps for that target are skipped.

use crate::config::{EngineConfig, StepDef};
use crate::error::{CanonError, Result};
use crate::normalize::{name_tokens, normalize_value, value_lines};
use crate::schema::CanonicalKey;
use crate::types::{CandidateSource, CandidateValue};
use crate::vocab::Vocabulary;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Regex extractions shorter than this are treated as noise
const MIN_EXTRACT_LEN: usize = 4;

/// Longest value accepted as a one-token name suffix ("M", "II", "X")
const MAX_SUFFIX_LEN: usize = 3;

/// Named decomposition recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeKind {
    BuilderAndYear,
    CombinedPortAndFlag,
    NamePlusSuffix,
}

impl CompositeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeKind::BuilderAndYear => "builder_and_year",
            CompositeKind::CombinedPortAndFlag => "combined_port_and_flag",
            CompositeKind::NamePlusSuffix => "name_plus_suffix",
        }
    }
}

impl fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction steps that need vocabulary or field-name context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinExtractor {
    /// Leftmost known port of registry in the value
    KnownPort,
    /// Flag state implied by the leftmost known port
    PortFlag,
    /// Last line written entirely in capitals
    LastCapsLine,
    /// Vessel name split between the field label and its value
    NameSuffix,
}

#[derive(Debug, Clone)]
enum StepAction {
    Capture(Regex),
    Builtin(BuiltinExtractor),
}

#[derive(Debug, Clone)]
struct RecipeStep {
    target: CanonicalKey,
    action: StepAction,
}

impl RecipeStep {
    fn compile(kind: CompositeKind, index: usize, def: &StepDef) -> Result<Self> {
        let invalid = |message: String| CanonError::InvalidRecipe {
            kind: kind.to_string(),
            message,
        };

        let action = match (&def.regex, def.extract) {
            (Some(pattern), None) => {
                let regex = Regex::new(pattern)
                    .map_err(|e| CanonError::regex(format!("recipe {} step {}", kind, index), e))?;
                if regex.captures_len() != 2 {
                    return Err(invalid(format!(
                        "step {} must have exactly one capture group",
                        index
                    )));
                }
                StepAction::Capture(regex)
            }
            (None, Some(extractor)) => StepAction::Builtin(extractor),
            (Some(_), Some(_)) => {
                return Err(invalid(format!("step {} has both regex and extract", index)));
            }
            (None, None) => {
                return Err(invalid(format!("step {} has neither regex nor extract", index)));
            }
        };

        Ok(Self {
            target: def.target,
            action,
        })
    }
}

/// Everything a recipe may look at for one composite field
#[derive(Debug, Clone)]
pub struct CompositeInput<'a> {
    /// Raw upstream field name, original case
    pub field_name: &'a str,
    /// Normalized single-line value
    pub value: &'a str,
    /// Raw value split into trimmed non-blank lines
    pub lines: Vec<String>,
    /// Normalized label of the rule that routed here
    pub label: Option<&'a str>,
}

impl<'a> CompositeInput<'a> {
    pub fn new(field_name: &'a str, value: &'a str, raw_value: &str) -> Self {
        Self {
            field_name,
            value,
            lines: value_lines(raw_value),
            label: None,
        }
    }

    pub fn with_label(mut self, label: Option<&'a str>) -> Self {
        self.label = label;
        self
    }
}

/// All compiled recipes, keyed by kind
#[derive(Debug, Clone)]
pub struct RecipeTable {
    recipes: BTreeMap<CompositeKind, Vec<RecipeStep>>,
    vocab: Arc<Vocabulary>,
}

impl RecipeTable {
    pub fn from_config(config: &EngineConfig, vocab: Arc<Vocabulary>) -> Result<Self> {
        let mut recipes = BTreeMap::new();
        for (kind, defs) in &config.composites {
            if defs.is_empty() {
                return Err(CanonError::InvalidRecipe {
                    kind: kind.to_string(),
                    message: "recipe has no steps".to_string(),
                });
            }
            let steps = defs
                .iter()
                .enumerate()
                .map(|(index, def)| RecipeStep::compile(*kind, index, def))
                .collect::<Result<Vec<_>>>()?;
            recipes.insert(*kind, steps);
        }
        Ok(Self { recipes, vocab })
    }

    pub fn contains(&self, kind: CompositeKind) -> bool {
        self.recipes.contains_key(&kind)
    }

    /// Run a recipe. Targets that no step could fill are simply absent.
    pub fn decompose(&self, kind: CompositeKind, input: &CompositeInput<'_>) -> Vec<CandidateValue> {
        let Some(steps) = self.recipes.get(&kind) else {
            return Vec::new();
        };

        let mut filled: HashSet<CanonicalKey> = HashSet::new();
        let mut out = Vec::new();

        for step in steps {
            if filled.contains(&step.target) {
                continue;
            }
            let extracted = match &step.action {
                StepAction::Capture(regex) => capture(regex, input.value),
                StepAction::Builtin(extractor) => self.run_builtin(*extractor, input),
            };
            if let Some(value) = extracted {
                filled.insert(step.target);
                out.push(
                    CandidateValue::new(step.target, value, CandidateSource::Composite)
                        .from_field(input.field_name),
                );
            }
        }

        if out.is_empty() {
            tracing::info!(
                recipe = %kind,
                field = input.field_name,
                "Composite field yielded no values"
            );
        }
        out
    }

    fn run_builtin(&self, extractor: BuiltinExtractor, input: &CompositeInput<'_>) -> Option<String> {
        match extractor {
            BuiltinExtractor::KnownPort => self.vocab.find_port(input.value).map(|m| m.port),
            BuiltinExtractor::PortFlag => self.vocab.find_port(input.value).map(|m| m.flag_state),
            BuiltinExtractor::LastCapsLine => last_caps_line(&input.lines),
            BuiltinExtractor::NameSuffix => name_with_suffix(input),
        }
    }
}

fn capture(regex: &Regex, value: &str) -> Option<String> {
    let caps = regex.captures(value)?;
    let text = caps.get(1)?.as_str().trim();
    if text.chars().count() < MIN_EXTRACT_LEN {
        return None;
    }
    Some(text.to_string())
}

fn last_caps_line(lines: &[String]) -> Option<String> {
    lines.iter().rev().find_map(|line| {
        let line = line.trim_matches(|c: char| !c.is_alphanumeric());
        let has_letter = line.chars().any(|c| c.is_alphabetic());
        let all_caps = !line.chars().any(|c| c.is_lowercase());
        (has_letter && all_caps).then(|| line.to_string())
    })
}

fn name_with_suffix(input: &CompositeInput<'_>) -> Option<String> {
    let label_words = input.label.map(|l| l.split_whitespace().count()).unwrap_or(0);
    let base = name_tokens(input.field_name)
        .into_iter()
        .skip(label_words)
        .collect::<Vec<_>>()
        .join(" ");
    let base = if is_name_fragment(&base) { base } else { String::new() };
    let value = normalize_value(input.value);

    let is_suffix = !value.is_empty()
        && !value.contains(' ')
        && value.chars().count() <= MAX_SUFFIX_LEN
        && value.chars().all(|c| c.is_alphanumeric());

    match (base.is_empty(), is_suffix) {
        (true, _) if value.is_empty() => None,
        (true, _) => Some(value),
        (false, true) => Some(format!("{} {}", base, value)),
        (false, false) => Some(base),
    }
}

/// Leftover label text that can stand as part of a vessel name, not a note
/// such as "(in full)" or "/ Yacht"
fn is_name_fragment(s: &str) -> bool {
    let starts_well = s
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
    starts_well
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '\'')
}
