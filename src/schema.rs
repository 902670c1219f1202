//! Canonical vessel-registration schema
//!
//! The closed vocabulary of canonical keys, the validation class each key
//! belongs to, and the typed record the engine hands back to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CANONICAL KEYS
// =============================================================================

/// One of the fixed, normalized vessel-attribute names the engine outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalKey {
    // Identity
    YachtName,
    PreviousNames,
    VesselType,
    // Registration
    FlagState,
    HomePort,
    OfficialNumber,
    ImoNumber,
    Mmsi,
    CallSign,
    CertificateNumber,
    RegistrationStatus,
    DateOfRegistry,
    CertificateIssueDate,
    CertificateExpiryDate,
    // Build
    Builder,
    Designer,
    YearBuilt,
    PlaceOfBuild,
    KeelLaidDate,
    HullNumber,
    HullId,
    HullMaterial,
    // Dimensions & tonnage
    LengthOverallM,
    LengthRegisteredM,
    BeamM,
    DepthM,
    DraftM,
    GrossTonnage,
    NetTonnage,
    NumberOfDecks,
    NumberOfMasts,
    PassengerCapacity,
    CrewCapacity,
    // Machinery
    EngineType,
    EngineMake,
    EngineModel,
    EngineCount,
    EnginePowerKw,
    PropulsionType,
    FuelType,
    FuelCapacityL,
    MaxSpeedKnots,
    CruisingSpeedKnots,
    // Ownership
    OwnerName,
    OwnerAddress,
    // Provider bookkeeping
    DiscoveredModels,
}

impl CanonicalKey {
    pub const ALL: [CanonicalKey; 46] = [
        CanonicalKey::YachtName,
        CanonicalKey::PreviousNames,
        CanonicalKey::VesselType,
        CanonicalKey::FlagState,
        CanonicalKey::HomePort,
        CanonicalKey::OfficialNumber,
        CanonicalKey::ImoNumber,
        CanonicalKey::Mmsi,
        CanonicalKey::CallSign,
        CanonicalKey::CertificateNumber,
        CanonicalKey::RegistrationStatus,
        CanonicalKey::DateOfRegistry,
        CanonicalKey::CertificateIssueDate,
        CanonicalKey::CertificateExpiryDate,
        CanonicalKey::Builder,
        CanonicalKey::Designer,
        CanonicalKey::YearBuilt,
        CanonicalKey::PlaceOfBuild,
        CanonicalKey::KeelLaidDate,
        CanonicalKey::HullNumber,
        CanonicalKey::HullId,
        CanonicalKey::HullMaterial,
        CanonicalKey::LengthOverallM,
        CanonicalKey::LengthRegisteredM,
        CanonicalKey::BeamM,
        CanonicalKey::DepthM,
        CanonicalKey::DraftM,
        CanonicalKey::GrossTonnage,
        CanonicalKey::NetTonnage,
        CanonicalKey::NumberOfDecks,
        CanonicalKey::NumberOfMasts,
        CanonicalKey::PassengerCapacity,
        CanonicalKey::CrewCapacity,
        CanonicalKey::EngineType,
        CanonicalKey::EngineMake,
        CanonicalKey::EngineModel,
        CanonicalKey::EngineCount,
        CanonicalKey::EnginePowerKw,
        CanonicalKey::PropulsionType,
        CanonicalKey::FuelType,
        CanonicalKey::FuelCapacityL,
        CanonicalKey::MaxSpeedKnots,
        CanonicalKey::CruisingSpeedKnots,
        CanonicalKey::OwnerName,
        CanonicalKey::OwnerAddress,
        CanonicalKey::DiscoveredModels,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalKey::YachtName => "yacht_name",
            CanonicalKey::PreviousNames => "previous_names",
            CanonicalKey::VesselType => "vessel_type",
            CanonicalKey::FlagState => "flag_state",
            CanonicalKey::HomePort => "home_port",
            CanonicalKey::OfficialNumber => "official_number",
            CanonicalKey::ImoNumber => "imo_number",
            CanonicalKey::Mmsi => "mmsi",
            CanonicalKey::CallSign => "call_sign",
            CanonicalKey::CertificateNumber => "certificate_number",
            CanonicalKey::RegistrationStatus => "registration_status",
            CanonicalKey::DateOfRegistry => "date_of_registry",
            CanonicalKey::CertificateIssueDate => "certificate_issue_date",
            CanonicalKey::CertificateExpiryDate => "certificate_expiry_date",
            CanonicalKey::Builder => "builder",
            CanonicalKey::Designer => "designer",
            CanonicalKey::YearBuilt => "year_built",
            CanonicalKey::PlaceOfBuild => "place_of_build",
            CanonicalKey::KeelLaidDate => "keel_laid_date",
            CanonicalKey::HullNumber => "hull_number",
            CanonicalKey::HullId => "hull_id",
            CanonicalKey::HullMaterial => "hull_material",
            CanonicalKey::LengthOverallM => "length_overall_m",
            CanonicalKey::LengthRegisteredM => "length_registered_m",
            CanonicalKey::BeamM => "beam_m",
            CanonicalKey::DepthM => "depth_m",
            CanonicalKey::DraftM => "draft_m",
            CanonicalKey::GrossTonnage => "gross_tonnage",
            CanonicalKey::NetTonnage => "net_tonnage",
            CanonicalKey::NumberOfDecks => "number_of_decks",
            CanonicalKey::NumberOfMasts => "number_of_masts",
            CanonicalKey::PassengerCapacity => "passenger_capacity",
            CanonicalKey::CrewCapacity => "crew_capacity",
            CanonicalKey::EngineType => "engine_type",
            CanonicalKey::EngineMake => "engine_make",
            CanonicalKey::EngineModel => "engine_model",
            CanonicalKey::EngineCount => "engine_count",
            CanonicalKey::EnginePowerKw => "engine_power_kw",
            CanonicalKey::PropulsionType => "propulsion_type",
            CanonicalKey::FuelType => "fuel_type",
            CanonicalKey::FuelCapacityL => "fuel_capacity_l",
            CanonicalKey::MaxSpeedKnots => "max_speed_knots",
            CanonicalKey::CruisingSpeedKnots => "cruising_speed_knots",
            CanonicalKey::OwnerName => "owner_name",
            CanonicalKey::OwnerAddress => "owner_address",
            CanonicalKey::DiscoveredModels => "discovered_models",
        }
    }

    /// Validation class deciding plausibility checks and the output type
    pub fn class(&self) -> FieldClass {
        use CanonicalKey::*;
        match self {
            YachtName | FlagState | HomePort | Builder | Designer | PlaceOfBuild | EngineMake
            | OwnerName => FieldClass::FreeText { max_len: 50 },
            OwnerAddress => FieldClass::FreeText { max_len: 200 },

            CallSign => FieldClass::Identifier(IdentifierShape::CallSign),
            ImoNumber => FieldClass::Identifier(IdentifierShape::Imo),
            Mmsi => FieldClass::Identifier(IdentifierShape::Mmsi),
            OfficialNumber | CertificateNumber | HullNumber => {
                FieldClass::Identifier(IdentifierShape::Registry)
            }

            EngineModel | HullId => FieldClass::Code,

            VesselType | HullMaterial | EngineType | PropulsionType | FuelType
            | RegistrationStatus => FieldClass::Enum,

            DateOfRegistry | CertificateIssueDate | CertificateExpiryDate | KeelLaidDate => {
                FieldClass::Date
            }

            PreviousNames | DiscoveredModels => FieldClass::List,

            YearBuilt => FieldClass::Year,
            EngineCount => FieldClass::Integer { min: 1, max: 12 },
            NumberOfDecks => FieldClass::Integer { min: 1, max: 20 },
            NumberOfMasts => FieldClass::Integer { min: 0, max: 10 },
            PassengerCapacity => FieldClass::Integer { min: 0, max: 10_000 },
            CrewCapacity => FieldClass::Integer { min: 0, max: 2_000 },

            LengthOverallM | LengthRegisteredM => FieldClass::Decimal {
                min: 0.0,
                max: 1000.0,
            },
            BeamM => FieldClass::Decimal {
                min: 0.0,
                max: 200.0,
            },
            DepthM => FieldClass::Decimal {
                min: 0.0,
                max: 100.0,
            },
            DraftM => FieldClass::Decimal {
                min: 0.0,
                max: 50.0,
            },
            GrossTonnage | NetTonnage => FieldClass::Decimal {
                min: 0.0,
                max: 500_000.0,
            },
            MaxSpeedKnots | CruisingSpeedKnots => FieldClass::Decimal {
                min: 0.0,
                max: 100.0,
            },
            EnginePowerKw => FieldClass::Decimal {
                min: 0.0,
                max: 100_000.0,
            },
            FuelCapacityL => FieldClass::Decimal {
                min: 0.0,
                max: 5_000_000.0,
            },
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.class(), FieldClass::List)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown canonical key: {}", s))
    }
}

// =============================================================================
// FIELD CLASSES
// =============================================================================

/// How a canonical key is validated and typed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldClass {
    /// Decimal number within an inclusive range
    Decimal { min: f64, max: f64 },
    /// Whole number within an inclusive range
    Integer { min: i64, max: i64 },
    /// Build year, 1800 up to two years past the current year
    Year,
    /// Registry identifier with a fixed shape
    Identifier(IdentifierShape),
    /// Human-readable name or place
    FreeText { max_len: usize },
    /// Model or hull code, digits allowed in first position
    Code,
    /// Member of a named vocabulary
    Enum,
    /// Calendar date, emitted as ISO-8601
    Date,
    /// Ordered, de-duplicated list of strings
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierShape {
    /// 3-8 alphanumerics
    CallSign,
    /// 7-10 digits, optional "IMO" prefix
    Imo,
    /// Exactly 9 digits
    Mmsi,
    /// Official, certificate and hull numbers
    Registry,
}

// =============================================================================
// VALUES AND RECORDS
// =============================================================================

/// Typed value stored under a canonical key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl CanonicalValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CanonicalValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CanonicalValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CanonicalValue::Number(n) => Some(*n),
            CanonicalValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            CanonicalValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalValue::Integer(n) => write!(f, "{}", n),
            CanonicalValue::Number(n) => write!(f, "{}", n),
            CanonicalValue::Text(s) => f.write_str(s),
            CanonicalValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        CanonicalValue::Text(s.to_string())
    }
}

impl From<i64> for CanonicalValue {
    fn from(n: i64) -> Self {
        CanonicalValue::Integer(n)
    }
}

impl From<f64> for CanonicalValue {
    fn from(n: f64) -> Self {
        CanonicalValue::Number(n)
    }
}

impl From<Vec<String>> for CanonicalValue {
    fn from(items: Vec<String>) -> Self {
        CanonicalValue::List(items)
    }
}

/// Canonical vessel record: each canonical key at most once.
///
/// Serializes as a flat JSON object keyed by the snake_case key names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(BTreeMap<CanonicalKey, CanonicalValue>);

impl CanonicalRecord {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: CanonicalKey) -> Option<&CanonicalValue> {
        self.0.get(&key)
    }

    pub fn contains_key(&self, key: CanonicalKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, &CanonicalValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = CanonicalKey> + '_ {
        self.0.keys().copied()
    }

    /// Set a value, returning the one it replaced.
    ///
    /// For caller-maintained records. The engine itself only writes through
    /// [`CanonicalRecord::insert_new`] and the merge resolver.
    pub fn insert(
        &mut self,
        key: CanonicalKey,
        value: impl Into<CanonicalValue>,
    ) -> Option<CanonicalValue> {
        self.0.insert(key, value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, key: CanonicalKey, value: impl Into<CanonicalValue>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    /// Insert only if the key is still unset. Returns whether it was written.
    pub(crate) fn insert_new(&mut self, key: CanonicalKey, value: CanonicalValue) -> bool {
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    pub fn into_inner(self) -> BTreeMap<CanonicalKey, CanonicalValue> {
        self.0
    }
}

impl FromIterator<(CanonicalKey, CanonicalValue)> for CanonicalRecord {
    fn from_iter<I: IntoIterator<Item = (CanonicalKey, CanonicalValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CanonicalRecord {
    type Item = (CanonicalKey, CanonicalValue);
    type IntoIter = std::collections::btree_map::IntoIter<CanonicalKey, CanonicalValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
