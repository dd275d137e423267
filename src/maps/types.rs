//! Core types for the Maps link pipeline.

use crate::extract::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which stages the orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Resolve and extract only. No host check, no enrichment, no search.
    #[serde(rename = "coordinates")]
    CoordinatesOnly,
    /// Host check plus reverse-geocode enrichment.
    #[serde(rename = "address")]
    WithAddress,
    /// Everything in `WithAddress`, plus place search.
    #[default]
    #[serde(rename = "search")]
    WithSearch,
}

impl Mode {
    pub fn enriches(self) -> bool {
        !matches!(self, Self::CoordinatesOnly)
    }

    pub fn checks_host(self) -> bool {
        self.enriches()
    }

    pub fn allows_search(self) -> bool {
        matches!(self, Self::WithSearch)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoordinatesOnly => write!(f, "coordinates"),
            Self::WithAddress => write!(f, "address"),
            Self::WithSearch => write!(f, "search"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coordinates" | "coords" => Ok(Self::CoordinatesOnly),
            "address" => Ok(Self::WithAddress),
            "search" | "full" => Ok(Self::WithSearch),
            _ => Err(format!(
                "Unknown mode '{}'. Use 'coordinates', 'address' or 'search'.",
                s
            )),
        }
    }
}

// ─── Reverse geocode payload ────────────────────────────────────

/// One level of the administrative hierarchy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrativeEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalityInfo {
    #[serde(default)]
    pub administrative: Vec<AdministrativeEntry>,
}

/// Reverse-geocode response, as sent by the upstream service.
///
/// The coordinates and `localityInfo` are required, so error bodies the
/// service sends with a success status fail to decode. The string fields
/// may be absent; defaults are applied by [`reshape_address`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub lookup_source: Option<String>,
    pub locality_language_requested: Option<String>,
    pub continent: Option<String>,
    pub continent_code: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
    pub principal_subdivision: Option<String>,
    pub principal_subdivision_code: Option<String>,
    pub city: Option<String>,
    pub locality: Option<String>,
    pub postcode: Option<String>,
    pub plus_code: Option<String>,
    pub locality_info: LocalityInfo,
}

// ─── Address result ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub locality: String,
    pub city: String,
    pub postcode: String,
    pub plus_code: String,
    pub district: String,
    pub state: String,
    pub state_code: String,
    pub country_name: String,
    pub country_code: String,
    pub lookup_source: String,
    pub locality_language_requested: String,
    pub continent: String,
    pub continent_code: String,
}

/// Coordinates enriched with a postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub latitude: f64,
    pub longitude: f64,
    pub source_url: String,
    pub address: Address,
}

/// Administrative order that carries the district name.
pub const DISTRICT_ORDER: i64 = 9;

fn or_empty(v: Option<String>) -> String {
    v.unwrap_or_default()
}

fn or_default(v: Option<String>, fallback: &str) -> String {
    match v {
        Some(s) if !s.is_empty() => s,
        _ => fallback.to_string(),
    }
}

/// Reshape an upstream payload into the stable [`AddressResult`] schema.
pub fn reshape_address(data: RawLocationData, source_url: &str) -> AddressResult {
    let district = data
        .locality_info
        .administrative
        .iter()
        .find(|entry| entry.order == DISTRICT_ORDER)
        .map(|entry| entry.name.clone())
        .unwrap_or_default();

    AddressResult {
        latitude: data.latitude,
        longitude: data.longitude,
        source_url: source_url.to_string(),
        address: Address {
            locality: or_empty(data.locality),
            city: or_empty(data.city),
            postcode: or_empty(data.postcode),
            plus_code: or_empty(data.plus_code),
            district,
            state: or_empty(data.principal_subdivision),
            state_code: or_empty(data.principal_subdivision_code),
            country_name: or_empty(data.country_name),
            country_code: or_empty(data.country_code),
            lookup_source: or_default(data.lookup_source, "coordinates"),
            locality_language_requested: or_default(data.locality_language_requested, "en"),
            continent: or_empty(data.continent),
            continent_code: or_empty(data.continent_code),
        },
    }
}

// ─── Place search ───────────────────────────────────────────────

/// One Nominatim search hit, projected to the fields callers use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSearchResult {
    pub place_id: i64,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
    #[serde(default, rename = "type")]
    pub place_type: String,
    #[serde(default)]
    pub place_rank: i32,
    #[serde(default)]
    pub addresstype: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

// ─── Orchestrator outcome ───────────────────────────────────────

/// What a successful expansion produced.
///
/// Serialized untagged: a bare string means only the URL could be
/// recovered, an object with `address` means enrichment succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expansion {
    Url(String),
    Coordinates(Coordinates),
    Address(AddressResult),
}

impl Expansion {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Coordinates(_) => "coordinates",
            Self::Address(_) => "address",
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────

/// Failure talking to one of the upstream services.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Upstream returned HTTP {0}")]
    Status(u16),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpandError {
    #[error("Empty URL")]
    EmptyInput,
    #[error("Invalid Google Maps URL")]
    InvalidUrl(String),
    #[error("Could not resolve URL: {0}")]
    Unresolved(LookupError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("Place search is not enabled in this mode")]
    Unavailable,
    #[error("Empty search query")]
    EmptyQuery,
    #[error("Something went wrong: {last} (after {attempts} attempts)")]
    Exhausted { attempts: u32, last: LookupError },
}

/// `{"error": "..."}` body for failed expansions.
#[derive(Debug, Serialize)]
pub struct ExpandErrorBody {
    pub error: String,
}

impl From<&ExpandError> for ExpandErrorBody {
    fn from(e: &ExpandError) -> Self {
        Self { error: e.to_string() }
    }
}

/// `{"error": true, "message": "..."}` body for failed searches.
#[derive(Debug, Serialize)]
pub struct SearchErrorBody {
    pub error: bool,
    pub message: String,
}

impl From<&SearchError> for SearchErrorBody {
    fn from(e: &SearchError) -> Self {
        Self {
            error: true,
            message: e.to_string(),
        }
    }
}
