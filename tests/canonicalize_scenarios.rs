//! End-to-end canonicalization scenarios
//!
//! Tests verify:
//! 1. Label variants and OCR-mangled names map to the right key
//! 2. Composite fields split into several keys
//! 3. Boilerplate never becomes a value and falls through to page text
//! 4. Page-text fallback never overrides an accepted value
//! 5. Merging with a stored record and the empty-input confidence

use pretty_assertions::assert_eq;
use vessel_canon::{
    merge_records, CandidateSource, CanonicalKey, CanonicalRecord, CanonicalValue,
    CanonicalizationEngine, EngineConfig, ExtractionResult, RejectReason,
};

// ============================================================================
// FIXTURES
// ============================================================================

fn engine() -> CanonicalizationEngine {
    let mut config = EngineConfig::default_config().unwrap();
    config.validation.current_year = Some(2026);
    CanonicalizationEngine::new(&config).unwrap()
}

fn text(s: &str) -> CanonicalValue {
    CanonicalValue::Text(s.to_string())
}

fn list(items: &[&str]) -> CanonicalValue {
    CanonicalValue::List(items.iter().map(|s| s.to_string()).collect())
}

const REGISTRY_PAGE: &str = "REPUBLIC OF MALTA\n\
    MERCHANT SHIPPING DIRECTORATE\n\
    CERTIFICATE OF REGISTRY\n\
    Name of Ship: LADY M\n\
    Official No. 12345\n\
    Call Sign: 9HB77\n\
    IMO No. 9876543\n\
    Gross Tonnage: 499\n\
    Certificate No. 12/2024\n\
    This certificate issued in terms of Article 12 of the Merchant Shipping Act";

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_mangled_name_label() {
    let out = engine().canonicalize(&ExtractionResult::new().with_field("Name_o_fShip", "STARK"));
    assert_eq!(out.record.get(CanonicalKey::YachtName), Some(&text("STARK")));
    assert_eq!(out.record.len(), 1);
}

#[test]
fn test_annotated_name_label_keeps_value() {
    let out = engine().canonicalize(&ExtractionResult::new().with_field("Name of Ship (in full)", "LADY M"));
    assert_eq!(out.record.get(CanonicalKey::YachtName), Some(&text("LADY M")));
    assert!(out.unresolved.is_empty());
}

#[test]
fn test_master_name_not_taken_as_vessel_name() {
    let out = engine().canonicalize(&ExtractionResult::new().with_field("Name of Master", "John Smith"));
    assert!(!out.record.contains_key(CanonicalKey::YachtName));
    assert_eq!(out.unmapped_fields, vec!["Name of Master".to_string()]);
}

#[test]
fn test_entity_without_confidence_is_used() {
    let json = r#"{"entities": [{"type": "call_sign", "value": "9HA123"}]}"#;
    let extraction: ExtractionResult = serde_json::from_str(json).unwrap();
    let out = engine().canonicalize(&extraction);
    assert_eq!(out.record.get(CanonicalKey::CallSign), Some(&text("9HA123")));
    assert_eq!(
        out.provenance[&CanonicalKey::CallSign].source,
        CandidateSource::Entity
    );
}

#[test]
fn test_when_and_where_built() {
    let extraction = ExtractionResult::new().with_field(
        "When_and_Where_Built",
        "2025 AZIMUT BENETTI SPA, VIAREGGIO (LUCCA), ITALY",
    );
    let out = engine().canonicalize(&extraction);

    assert_eq!(
        out.record.get(CanonicalKey::YearBuilt),
        Some(&CanonicalValue::Integer(2025))
    );
    assert_eq!(
        out.record.get(CanonicalKey::Builder),
        Some(&text("AZIMUT BENETTI SPA"))
    );
    assert_eq!(
        out.record.get(CanonicalKey::PlaceOfBuild),
        Some(&text("VIAREGGIO"))
    );
    assert_eq!(
        out.provenance[&CanonicalKey::Builder].raw_source_field.as_deref(),
        Some("When_and_Where_Built")
    );
}

#[test]
fn test_callsign_uppercased() {
    let out = engine().canonicalize(&ExtractionResult::new().with_field("Callsign", "9hA123"));
    assert_eq!(out.record.get(CanonicalKey::CallSign), Some(&text("9HA123")));
}

#[test]
fn test_boilerplate_certificate_number_rejected() {
    let extraction = ExtractionResult::new().with_field(
        "Certificate_No",
        "This certificate issued in terms of Article 12",
    );
    let out = engine().canonicalize(&extraction);

    assert!(!out.record.contains_key(CanonicalKey::CertificateNumber));
    assert_eq!(out.unresolved.len(), 1);
    assert_eq!(out.unresolved[0].key, CanonicalKey::CertificateNumber);
    assert_eq!(out.unresolved[0].reason, RejectReason::Boilerplate);
}

#[test]
fn test_boilerplate_certificate_number_recovered_from_text() {
    let extraction = ExtractionResult::new()
        .with_field(
            "Certificate_No",
            "This certificate issued in terms of Article 12",
        )
        .with_text(REGISTRY_PAGE);
    let out = engine().canonicalize(&extraction);

    assert_eq!(
        out.record.get(CanonicalKey::CertificateNumber),
        Some(&text("12/2024"))
    );
    assert_eq!(
        out.provenance[&CanonicalKey::CertificateNumber].source,
        CandidateSource::TextFallback
    );
    assert!(out.unresolved.is_empty());
}

#[test]
fn test_discovered_models_merge() {
    let previous = CanonicalRecord::new().with(
        CanonicalKey::DiscoveredModels,
        vec!["m1".to_string(), "m2".to_string()],
    );
    let extraction = ExtractionResult::new().with_field("Discovered Models", "m2, m3");
    let out = engine().canonicalize_with_previous(&extraction, Some(&previous));

    assert_eq!(
        out.record.get(CanonicalKey::DiscoveredModels),
        Some(&list(&["m1", "m2", "m3"]))
    );
}

#[test]
fn test_empty_extraction() {
    let out = engine().canonicalize(&ExtractionResult::new());
    assert!(out.record.is_empty());
    assert!(out.upstream_empty);
    assert_eq!(out.confidence, 0.5);
    assert_eq!(
        serde_json::to_value(&out.record).unwrap(),
        serde_json::json!({})
    );
}

// ============================================================================
// LAWS
// ============================================================================

#[test]
fn test_exact_beats_substring_regardless_of_order() {
    let yaml = r#"
version: "1.0"
vocabularies:
  enums:
    vessel_type: { values: [MOTOR YACHT] }
    hull_material: { values: [STEEL] }
    engine_type: { values: [DIESEL] }
    propulsion_type: { values: [SHAFT] }
    fuel_type: { values: [DIESEL] }
    registration_status: { values: [PERMANENT] }
rules:
  - pattern: "port"
    key: home_port
  - pattern: "port of registry"
    key: flag_state
"#;
    let engine = CanonicalizationEngine::new(&EngineConfig::load_from_str(yaml).unwrap()).unwrap();
    let out = engine.canonicalize(&ExtractionResult::new().with_field("Port of Registry", "Valletta"));

    assert_eq!(out.record.get(CanonicalKey::FlagState), Some(&text("Valletta")));
    assert!(!out.record.contains_key(CanonicalKey::HomePort));
}

#[test]
fn test_fallback_never_overrides_accepted_value() {
    let extraction = ExtractionResult::new()
        .with_field("Callsign", "9HA123")
        .with_text(REGISTRY_PAGE);
    let out = engine().canonicalize(&extraction);

    // Page text says 9HB77, the form field wins
    assert_eq!(out.record.get(CanonicalKey::CallSign), Some(&text("9HA123")));
    assert_eq!(
        out.provenance[&CanonicalKey::CallSign].source,
        CandidateSource::Mapping
    );
    // Keys with no form field are still filled from text
    assert_eq!(
        out.record.get(CanonicalKey::ImoNumber),
        Some(&text("9876543"))
    );
}

#[test]
fn test_validator_soundness() {
    let engine = engine();
    let v = engine.validator();
    for boilerplate in [
        "This certificate issued in terms of Article 12",
        "Pursuant to the Merchant Shipping Act",
        "Regulation No 4",
        "ARTICLE",
    ] {
        assert!(!v.validate(CanonicalKey::YachtName, boilerplate), "{}", boilerplate);
    }
    for flag in ["MALTA", "Cayman Islands", "marshall islands"] {
        assert!(v.validate(CanonicalKey::FlagState, flag), "{}", flag);
    }
}

// ============================================================================
// FULL DOCUMENT
// ============================================================================

#[test]
fn test_full_registry_document() {
    let extraction = ExtractionResult::new()
        .with_field("Name of Ship", "LADY M")
        .with_field("Port_and_Flag", "VALLETTA\nMALTA")
        .with_field("Length Overall (m)", "45.60")
        .with_field("Gross Tonnage", "499 GT")
        .with_field("Hull Material", "Steel & Aluminium")
        .with_field("Number of Engines", "2")
        .with_field("Date of Registry", "12/03/2024")
        .with_field("Stamp", "OFFICIAL")
        .with_entity("Organization", "Some Bank", 0.95)
        .with_text(REGISTRY_PAGE);
    let out = engine().canonicalize(&extraction);

    let expected = CanonicalRecord::new()
        .with(CanonicalKey::YachtName, "LADY M")
        .with(CanonicalKey::HomePort, "VALLETTA")
        .with(CanonicalKey::FlagState, "MALTA")
        .with(CanonicalKey::LengthOverallM, 45.6)
        .with(CanonicalKey::GrossTonnage, 499.0)
        .with(CanonicalKey::HullMaterial, "STEEL AND ALUMINIUM")
        .with(CanonicalKey::EngineCount, 2i64)
        .with(CanonicalKey::DateOfRegistry, "2024-03-12")
        .with(CanonicalKey::OfficialNumber, "12345")
        .with(CanonicalKey::CallSign, "9HB77")
        .with(CanonicalKey::ImoNumber, "9876543")
        .with(CanonicalKey::CertificateNumber, "12/2024");
    assert_eq!(out.record, expected);

    assert_eq!(out.unmapped_fields, vec!["Stamp".to_string()]);
    assert!((out.confidence - 1.0).abs() < 1e-9);
    assert!(!out.upstream_empty);
}

#[test]
fn test_engine_output_merges_like_merge_records() {
    let engine = engine();
    let first = engine
        .canonicalize(&ExtractionResult::new().with_field("Flag", "MALTA"))
        .record;
    let second_extraction = ExtractionResult::new()
        .with_field("Flag", "ITALY")
        .with_field("Callsign", "9HA123");

    let via_engine = engine
        .canonicalize_with_previous(&second_extraction, Some(&first))
        .record;
    let via_merge = merge_records(&first, &engine.canonicalize(&second_extraction).record);

    assert_eq!(via_engine, via_merge);
    assert_eq!(via_engine.get(CanonicalKey::FlagState), Some(&text("MALTA")));
}
