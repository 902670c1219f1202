//! Vessel registration canonicalization engine
//!
//! Turns the noisy key/value pairs, entities and page text returned by a
//! document-understanding provider into a fixed, validated vessel record.
//!
//! ## Pipeline
//! ExtractionResult -> Normalizer -> {Mapper, Decomposer} -> Validator
//! -> Text Fallback -> Confidence & Merge -> CanonicalRecord
//!
//! ## Quick Start
//!
//! ```rust
//! use vessel_canon::{CanonicalKey, CanonicalizationEngine, ExtractionResult};
//!
//! let engine = CanonicalizationEngine::from_default_config().unwrap();
//! let extraction = ExtractionResult::new()
//!     .with_field("Name_o_fShip", "STARK")
//!     .with_field("Callsign", "9hA123");
//!
//! let result = engine.canonicalize(&extraction);
//! assert_eq!(
//!     result.record.get(CanonicalKey::CallSign).and_then(|v| v.as_text()),
//!     Some("9HA123")
//! );
//! ```

// Core error handling
pub mod error;

// Schema and upstream types
pub mod schema;
pub mod types;

// YAML tables
pub mod config;
pub mod vocab;

// Pipeline stages, leaves first
pub mod normalize;
pub mod rules;
pub mod decompose;
pub mod validate;
pub mod fallback;
pub mod resolve;

// Orchestration
pub mod engine;

pub use config::EngineConfig;
pub use engine::{Canonicalization, CanonicalizationEngine, Provenance, Rejection};
pub use error::{CanonError, Result};
pub use resolve::merge_records;
pub use schema::{CanonicalKey, CanonicalRecord, CanonicalValue, FieldClass};
pub use types::{CandidateSource, ExtractedEntity, ExtractionResult, MatchType};
pub use validate::RejectReason;
