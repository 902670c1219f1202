//! Known-value vocabularies
//!
//! Flag states, ports of registry with their implied flag, enum value lists
//! with aliases, and the boilerplate phrase list. Built once from config and
//! shared read-only by the decomposer and the validator.

use crate::config::{BoilerplateConfig, VocabularyConfig};
use crate::error::{CanonError, Result};
use crate::schema::{CanonicalKey, FieldClass};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Allowed values (and aliases) for one enum-class canonical key
#[derive(Debug, Clone, Default)]
pub struct EnumVocabulary {
    values: BTreeSet<String>,
    aliases: HashMap<String, String>,
}

impl EnumVocabulary {
    /// Resolve a raw value to its canonical vocabulary entry
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        let key = vocab_key(raw);
        if let Some(value) = self.values.get(&key) {
            return Some(value.as_str());
        }
        self.aliases
            .get(&key)
            .and_then(|target| self.values.get(target))
            .map(|v| v.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.as_str())
    }
}

/// A port found inside a free-form value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMatch {
    pub port: String,
    pub flag_state: String,
}

/// All vocabularies used by the engine
#[derive(Debug, Clone)]
pub struct Vocabulary {
    flag_states: BTreeSet<String>,
    port_flags: BTreeMap<String, String>,
    port_pattern: Option<Regex>,
    enums: HashMap<CanonicalKey, EnumVocabulary>,
    boilerplate: Boilerplate,
}

impl Vocabulary {
    pub fn from_config(vocab: &VocabularyConfig, boilerplate: &BoilerplateConfig) -> Result<Self> {
        let flag_states: BTreeSet<String> = vocab.flag_states.iter().map(|s| vocab_key(s)).collect();

        let mut port_flags = BTreeMap::new();
        for (port, flag) in &vocab.ports {
            let flag = vocab_key(flag);
            if !flag_states.contains(&flag) {
                return Err(CanonError::InvalidVocabulary {
                    name: "ports".to_string(),
                    message: format!("port '{}' implies unknown flag state '{}'", port, flag),
                });
            }
            port_flags.insert(vocab_key(port), flag);
        }

        let port_pattern = if port_flags.is_empty() {
            None
        } else {
            // Longest names first so "ST PETER PORT" wins over a shorter overlap
            let mut names: Vec<&String> = port_flags.keys().collect();
            names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            let alternation = names
                .iter()
                .map(|name| regex::escape(name).replace(' ', r"\s+"))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{})\b", alternation);
            Some(Regex::new(&pattern).map_err(|e| CanonError::regex("port vocabulary", e))?)
        };

        let mut enums = HashMap::new();
        for (key, def) in &vocab.enums {
            if key.class() != FieldClass::Enum {
                return Err(CanonError::InvalidVocabulary {
                    name: key.to_string(),
                    message: "vocabulary declared for a non-enum key".to_string(),
                });
            }
            let values: BTreeSet<String> = def.values.iter().map(|v| vocab_key(v)).collect();
            let mut aliases = HashMap::new();
            for (alias, target) in &def.aliases {
                let target = vocab_key(target);
                if !values.contains(&target) {
                    return Err(CanonError::InvalidVocabulary {
                        name: key.to_string(),
                        message: format!("alias '{}' points at unknown value '{}'", alias, target),
                    });
                }
                aliases.insert(vocab_key(alias), target);
            }
            enums.insert(*key, EnumVocabulary { values, aliases });
        }

        for key in CanonicalKey::ALL {
            if key.class() == FieldClass::Enum && !enums.contains_key(&key) {
                return Err(CanonError::InvalidVocabulary {
                    name: key.to_string(),
                    message: "enum key has no vocabulary".to_string(),
                });
            }
        }

        Ok(Self {
            flag_states,
            port_flags,
            port_pattern,
            enums,
            boilerplate: Boilerplate::from_config(boilerplate)?,
        })
    }

    /// Canonical flag-state spelling if the value is a known flag state
    pub fn flag_state(&self, raw: &str) -> Option<&str> {
        self.flag_states.get(&vocab_key(raw)).map(|s| s.as_str())
    }

    /// Canonical port spelling if the value is a known port of registry
    pub fn port(&self, raw: &str) -> Option<&str> {
        self.port_flags
            .get_key_value(&vocab_key(raw))
            .map(|(port, _)| port.as_str())
    }

    /// Leftmost known port mentioned anywhere in `text`
    pub fn find_port(&self, text: &str) -> Option<PortMatch> {
        let pattern = self.port_pattern.as_ref()?;
        let found = pattern.find(text)?;
        let port = vocab_key(found.as_str());
        let flag_state = self.port_flags.get(&port)?.clone();
        Some(PortMatch { port, flag_state })
    }

    pub fn enum_vocabulary(&self, key: CanonicalKey) -> Option<&EnumVocabulary> {
        self.enums.get(&key)
    }

    pub fn boilerplate(&self) -> &Boilerplate {
        &self.boilerplate
    }
}

/// Certificate/legal language that must never become a field value
#[derive(Debug, Clone)]
pub struct Boilerplate {
    pattern: Option<Regex>,
}

impl Boilerplate {
    pub fn from_config(config: &BoilerplateConfig) -> Result<Self> {
        let mut alternatives: Vec<String> = Vec::new();
        for phrase in &config.phrases {
            let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
            if !words.is_empty() {
                alternatives.push(words.join(r"\s+"));
            }
        }
        // Bare tokens also cover "<token> of" / "<token> no" combinations
        for token in &config.tokens {
            let token = token.trim();
            if !token.is_empty() {
                alternatives.push(format!(r"{}(?:\s+(?:of|no\.?))?", regex::escape(token)));
            }
        }

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
        let pattern = Regex::new(&pattern).map_err(|e| CanonError::regex("boilerplate", e))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_boilerplate(&self, value: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|p| p.is_match(value))
            .unwrap_or(false)
    }
}

/// Uppercase, whitespace-collapsed lookup key
pub(crate) fn vocab_key(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
