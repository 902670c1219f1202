//! Raw page-text fallback extraction
//!
//! For keys that mapping and decomposition left unset, scan the provider's
//! full page text with per-key patterns. Patterns are ordered most specific
//! first and every match of a pattern is tried before the next pattern; the
//! first capture that passes the validator wins.

use crate::config::EngineConfig;
use crate::error::{CanonError, Result};
use crate::schema::{CanonicalKey, CanonicalValue};
use crate::validate::SemanticValidator;
use regex::Regex;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct FallbackTable {
    patterns: BTreeMap<CanonicalKey, Vec<Regex>>,
}

impl FallbackTable {
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut patterns = BTreeMap::new();
        for (key, sources) in &config.fallback {
            let mut compiled = Vec::with_capacity(sources.len());
            for (index, source) in sources.iter().enumerate() {
                let regex = Regex::new(source)
                    .map_err(|e| CanonError::regex(format!("fallback {} #{}", key, index), e))?;
                if regex.captures_len() != 2 {
                    return Err(CanonError::InvalidFallback {
                        key: key.to_string(),
                        message: format!(
                            "pattern #{} has {} capture groups, expected exactly one",
                            index,
                            regex.captures_len() - 1
                        ),
                    });
                }
                compiled.push(regex);
            }
            patterns.insert(*key, compiled);
        }
        Ok(Self { patterns })
    }

    /// Keys that have at least one text pattern
    pub fn keys(&self) -> impl Iterator<Item = CanonicalKey> + '_ {
        self.patterns
            .iter()
            .filter(|(_, p)| !p.is_empty())
            .map(|(k, _)| *k)
    }

    /// First validated capture for `key` in `text`
    pub fn extract_from_text(
        &self,
        key: CanonicalKey,
        text: &str,
        validator: &SemanticValidator,
    ) -> Option<CanonicalValue> {
        if text.trim().is_empty() {
            return None;
        }
        let patterns = self.patterns.get(&key)?;

        for (index, regex) in patterns.iter().enumerate() {
            for caps in regex.captures_iter(text) {
                let Some(found) = caps.get(1) else {
                    continue;
                };
                match validator.check(key, found.as_str()) {
                    Ok(value) => {
                        tracing::debug!(key = %key, pattern = index, "Text fallback hit");
                        return Some(value);
                    }
                    Err(reason) => {
                        tracing::debug!(
                            key = %key,
                            pattern = index,
                            candidate = found.as_str(),
                            %reason,
                            "Text fallback candidate rejected"
                        );
                    }
                }
            }
        }
        None
    }
}
