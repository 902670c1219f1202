//! Semantic validation of candidate values
//!
//! Every value that lands in a [`CanonicalRecord`](crate::schema::CanonicalRecord)
//! goes through [`SemanticValidator::check`], which both decides plausibility
//! and produces the typed [`CanonicalValue`]. A rejection is data, never an
//! error: the key simply stays open for the text fallback.

use crate::normalize::normalize_value;
use crate::resolve::union_preserving_order;
use crate::schema::{CanonicalKey, CanonicalValue, FieldClass, IdentifierShape};
use crate::vocab::Vocabulary;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Earliest plausible build year
pub const MIN_YEAR_BUILT: i64 = 1800;

/// Build years may run this far past the current year (vessels under construction)
pub const YEAR_BUILT_LOOKAHEAD: i64 = 2;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)?$").unwrap());

static REGISTRY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9 /.\-]{2,30}$").unwrap());

/// Accepted input layouts for date fields, tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
];

/// Why a candidate value was discarded
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("value is empty")]
    Empty,

    #[error("not a number")]
    NotANumber,

    #[error("not a whole number")]
    NotWholeNumber,

    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("length {len} is outside [{min}, {max}]")]
    Length { len: usize, min: usize, max: usize },

    #[error("does not look like a {expected}")]
    Shape { expected: &'static str },

    #[error("contains no letters")]
    NoLetter,

    #[error("does not start with an uppercase letter")]
    NotCapitalized,

    #[error("certificate or legal boilerplate")]
    Boilerplate,

    #[error("not a known {key} value")]
    NotInVocabulary { key: CanonicalKey },

    #[error("unrecognized date format")]
    BadDate,
}

/// Per-key plausibility predicates
#[derive(Debug, Clone)]
pub struct SemanticValidator {
    vocab: Arc<Vocabulary>,
    current_year: i32,
}

impl SemanticValidator {
    pub fn new(vocab: Arc<Vocabulary>, current_year: i32) -> Self {
        Self {
            vocab,
            current_year,
        }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Plausibility predicate
    pub fn validate(&self, key: CanonicalKey, value: &str) -> bool {
        self.check(key, value).is_ok()
    }

    /// Validate and convert to the typed value stored in the record
    pub fn check(&self, key: CanonicalKey, value: &str) -> Result<CanonicalValue, RejectReason> {
        let class = key.class();

        if class == FieldClass::List {
            return list_items(value);
        }

        let value = normalize_value(value);
        if value.is_empty() {
            return Err(RejectReason::Empty);
        }

        match class {
            FieldClass::Decimal { min, max } => {
                let n = parse_number(&value)?;
                in_range(n, min, max)?;
                Ok(CanonicalValue::Number(n))
            }
            FieldClass::Integer { min, max } => {
                let n = parse_whole(&value)?;
                in_range(n as f64, min as f64, max as f64)?;
                Ok(CanonicalValue::Integer(n))
            }
            FieldClass::Year => {
                let n = parse_whole(&value)?;
                let max = self.current_year as i64 + YEAR_BUILT_LOOKAHEAD;
                in_range(n as f64, MIN_YEAR_BUILT as f64, max as f64)?;
                Ok(CanonicalValue::Integer(n))
            }
            FieldClass::Identifier(shape) => self.identifier(shape, &value),
            FieldClass::FreeText { max_len } => self.free_text(key, &value, max_len),
            FieldClass::Code => code(&value),
            FieldClass::Enum => self
                .vocab
                .enum_vocabulary(key)
                .and_then(|vocab| vocab.resolve(&value))
                .map(|v| CanonicalValue::Text(v.to_string()))
                .ok_or(RejectReason::NotInVocabulary { key }),
            FieldClass::Date => parse_date(&value),
            FieldClass::List => list_items(&value),
        }
    }

    fn identifier(&self, shape: IdentifierShape, value: &str) -> Result<CanonicalValue, RejectReason> {
        match shape {
            IdentifierShape::CallSign => {
                let compact: String = value
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_uppercase();
                let len = compact.chars().count();
                if !(3..=8).contains(&len) || !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(RejectReason::Shape {
                        expected: "call sign",
                    });
                }
                Ok(CanonicalValue::Text(compact))
            }
            IdentifierShape::Imo => {
                let upper = value.to_uppercase();
                let digits: String = upper
                    .trim_start_matches("IMO")
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let len = digits.len();
                if !(7..=10).contains(&len) || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(RejectReason::Shape {
                        expected: "IMO number",
                    });
                }
                Ok(CanonicalValue::Text(digits))
            }
            IdentifierShape::Mmsi => {
                let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                if digits.len() != 9 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(RejectReason::Shape { expected: "MMSI" });
                }
                Ok(CanonicalValue::Text(digits))
            }
            IdentifierShape::Registry => {
                if self.vocab.boilerplate().is_boilerplate(value) {
                    return Err(RejectReason::Boilerplate);
                }
                let upper = value.to_uppercase();
                if !REGISTRY_ID.is_match(&upper) || !upper.chars().any(|c| c.is_ascii_digit()) {
                    return Err(RejectReason::Shape {
                        expected: "registry number",
                    });
                }
                Ok(CanonicalValue::Text(upper))
            }
        }
    }

    fn free_text(&self, key: CanonicalKey, value: &str, max_len: usize) -> Result<CanonicalValue, RejectReason> {
        // Known vocabulary members are accepted as-is, in canonical spelling
        let known = match key {
            CanonicalKey::FlagState => self.vocab.flag_state(value),
            CanonicalKey::HomePort => self.vocab.port(value),
            _ => None,
        };
        if let Some(canonical) = known {
            return Ok(CanonicalValue::Text(canonical.to_string()));
        }

        if self.vocab.boilerplate().is_boilerplate(value) {
            return Err(RejectReason::Boilerplate);
        }

        let len = value.chars().count();
        if !(2..=max_len).contains(&len) {
            return Err(RejectReason::Length {
                len,
                min: 2,
                max: max_len,
            });
        }
        if !value.chars().any(|c| c.is_alphabetic()) {
            return Err(RejectReason::NoLetter);
        }
        if !value.chars().next().is_some_and(|c| c.is_uppercase()) {
            return Err(RejectReason::NotCapitalized);
        }
        Ok(CanonicalValue::Text(value.to_string()))
    }
}

fn parse_number(value: &str) -> Result<f64, RejectReason> {
    if !NUMBER.is_match(value) {
        return Err(RejectReason::NotANumber);
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| RejectReason::NotANumber)
}

fn parse_whole(value: &str) -> Result<i64, RejectReason> {
    let n = parse_number(value)?;
    if n.fract() != 0.0 {
        return Err(RejectReason::NotWholeNumber);
    }
    Ok(n as i64)
}

fn in_range(n: f64, min: f64, max: f64) -> Result<(), RejectReason> {
    if n < min || n > max {
        return Err(RejectReason::OutOfRange { value: n, min, max });
    }
    Ok(())
}

fn code(value: &str) -> Result<CanonicalValue, RejectReason> {
    let len = value.chars().count();
    if !(2..=40).contains(&len) {
        return Err(RejectReason::Length { len, min: 2, max: 40 });
    }
    let charset_ok = value
        .chars()
        .all(|c| c.is_alphanumeric() || " -/.".contains(c));
    if !charset_ok || !value.chars().any(|c| c.is_alphanumeric()) {
        return Err(RejectReason::Shape { expected: "model code" });
    }
    Ok(CanonicalValue::Text(value.to_string()))
}

fn parse_date(value: &str) -> Result<CanonicalValue, RejectReason> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(|date| CanonicalValue::Text(date.format("%Y-%m-%d").to_string()))
        .ok_or(RejectReason::BadDate)
}

fn list_items(value: &str) -> Result<CanonicalValue, RejectReason> {
    let items: Vec<String> = value
        .split([',', ';', '\n'])
        .map(normalize_value)
        .filter(|item| !item.is_empty())
        .collect();
    let items = union_preserving_order(&[], &items);
    if items.is_empty() {
        return Err(RejectReason::Empty);
    }
    Ok(CanonicalValue::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn validator() -> SemanticValidator {
        let config = EngineConfig::default_config().unwrap();
        let vocab = Vocabulary::from_config(&config.vocabularies, &config.boilerplate).unwrap();
        SemanticValidator::new(Arc::new(vocab), 2026)
    }

    #[test]
    fn test_numeric_ranges() {
        let v = validator();
        assert_eq!(v.check(CanonicalKey::LengthOverallM, "45.6"), Ok(CanonicalValue::Number(45.6)));
        assert_eq!(v.check(CanonicalKey::BeamM, "7,5"), Ok(CanonicalValue::Number(7.5)));
        assert!(matches!(
            v.check(CanonicalKey::LengthOverallM, "1500"),
            Err(RejectReason::OutOfRange { .. })
        ));
        assert_eq!(v.check(CanonicalKey::MaxSpeedKnots, "fast"), Err(RejectReason::NotANumber));
        assert!(!v.validate(CanonicalKey::GrossTonnage, "-5"));
    }

    #[test]
    fn test_integer_and_year() {
        let v = validator();
        assert_eq!(v.check(CanonicalKey::YearBuilt, "2025"), Ok(CanonicalValue::Integer(2025)));
        assert_eq!(v.check(CanonicalKey::YearBuilt, "2028"), Ok(CanonicalValue::Integer(2028)));
        assert!(!v.validate(CanonicalKey::YearBuilt, "2029"));
        assert!(!v.validate(CanonicalKey::YearBuilt, "1799"));
        assert_eq!(v.check(CanonicalKey::EngineCount, "2"), Ok(CanonicalValue::Integer(2)));
        assert_eq!(v.check(CanonicalKey::EngineCount, "2.5"), Err(RejectReason::NotWholeNumber));
        assert!(!v.validate(CanonicalKey::EngineCount, "0"));
    }

    #[test]
    fn test_identifiers() {
        let v = validator();
        assert_eq!(
            v.check(CanonicalKey::CallSign, "9hA 123"),
            Ok(CanonicalValue::Text("9HA123".into()))
        );
        assert!(!v.validate(CanonicalKey::CallSign, "9H"));
        assert!(!v.validate(CanonicalKey::CallSign, "9HA-123"));

        assert_eq!(
            v.check(CanonicalKey::ImoNumber, "IMO 9876543"),
            Ok(CanonicalValue::Text("9876543".into()))
        );
        assert!(!v.validate(CanonicalKey::ImoNumber, "12345"));

        assert!(v.validate(CanonicalKey::Mmsi, "215 123 456"));
        assert!(!v.validate(CanonicalKey::Mmsi, "21512345"));

        assert_eq!(
            v.check(CanonicalKey::OfficialNumber, "mt-0042"),
            Ok(CanonicalValue::Text("MT-0042".into()))
        );
        assert!(!v.validate(CanonicalKey::OfficialNumber, "NONE"));
    }

    #[test]
    fn test_boilerplate_rejected() {
        let v = validator();
        assert_eq!(
            v.check(CanonicalKey::CertificateNumber, "This certificate issued in terms of Article 12"),
            Err(RejectReason::Boilerplate)
        );
        assert_eq!(
            v.check(CanonicalKey::YachtName, "Pursuant to Regulation 4"),
            Err(RejectReason::Boilerplate)
        );
        assert_eq!(v.check(CanonicalKey::Builder, "Act of 1894"), Err(RejectReason::Boilerplate));
    }

    #[test]
    fn test_free_text_shape() {
        let v = validator();
        assert_eq!(v.check(CanonicalKey::YachtName, "STARK"), Ok(CanonicalValue::Text("STARK".into())));
        assert_eq!(v.check(CanonicalKey::YachtName, "12345"), Err(RejectReason::NoLetter));
        assert_eq!(v.check(CanonicalKey::YachtName, "stark"), Err(RejectReason::NotCapitalized));
        assert!(matches!(
            v.check(CanonicalKey::YachtName, "X"),
            Err(RejectReason::Length { .. })
        ));
        assert!(!v.validate(CanonicalKey::Builder, &"A".repeat(51)));
        assert!(!v.validate(CanonicalKey::OwnerAddress, &format!("1 {}", "A".repeat(60))));
        assert!(v.validate(CanonicalKey::OwnerAddress, &format!("A {}", "b".repeat(150))));
    }

    #[test]
    fn test_known_flag_and_port_accepted() {
        let v = validator();
        assert_eq!(v.check(CanonicalKey::FlagState, "malta"), Ok(CanonicalValue::Text("MALTA".into())));
        assert_eq!(
            v.check(CanonicalKey::HomePort, "george town"),
            Ok(CanonicalValue::Text("GEORGE TOWN".into()))
        );
        // Unknown but well-formed values still pass the free-text rules
        assert!(v.validate(CanonicalKey::FlagState, "Vanuatu"));
    }

    #[test]
    fn test_enum_vocabulary() {
        let v = validator();
        assert_eq!(v.check(CanonicalKey::HullMaterial, "Fibreglass"), Ok(CanonicalValue::Text("GRP".into())));
        assert_eq!(
            v.check(CanonicalKey::VesselType, "m/y"),
            Ok(CanonicalValue::Text("MOTOR YACHT".into()))
        );
        assert_eq!(
            v.check(CanonicalKey::FuelType, "whale oil"),
            Err(RejectReason::NotInVocabulary { key: CanonicalKey::FuelType })
        );
    }

    #[test]
    fn test_dates_become_iso() {
        let v = validator();
        for raw in ["2024-03-12", "12/03/2024", "12.03.2024", "12 March 2024", "12 Mar 2024", "March 12, 2024"] {
            assert_eq!(
                v.check(CanonicalKey::DateOfRegistry, raw),
                Ok(CanonicalValue::Text("2024-03-12".into())),
                "{}",
                raw
            );
        }
        assert_eq!(v.check(CanonicalKey::DateOfRegistry, "31/02/2024"), Err(RejectReason::BadDate));
    }

    #[test]
    fn test_lists_split_and_dedup() {
        let v = validator();
        assert_eq!(
            v.check(CanonicalKey::DiscoveredModels, "m1, m2; m1\nm3"),
            Ok(CanonicalValue::List(vec!["m1".into(), "m2".into(), "m3".into()]))
        );
        assert_eq!(v.check(CanonicalKey::PreviousNames, " , ;"), Err(RejectReason::Empty));
    }

    #[test]
    fn test_code_class() {
        let v = validator();
        assert!(v.validate(CanonicalKey::EngineModel, "16V 4000 M90"));
        assert!(v.validate(CanonicalKey::HullId, "ITAZI0421B525"));
        assert!(!v.validate(CanonicalKey::EngineModel, "--"));
    }
}
