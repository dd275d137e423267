//! Coordinate extraction from expanded Google Maps URLs.
//!
//! Four URL shapes are recognised, tried in a fixed priority order. The
//! first pattern that matches anywhere in the string wins, even if a later
//! pattern would match elsewhere.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Patterns ───────────────────────────────────────────────────

/// `/@LAT,LON,ZOOMz/` — map centre segment.
static MAP_CENTRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/@(-?\d+\.\d+),(-?\d+\.\d+),\d+(?:\.\d+)?z/").unwrap());

/// `/LAT,+LON?` — path coordinate right before the query string.
static PATH_POINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(-?\d+\.\d+),\+?(-?\d+\.\d+)\?").unwrap());

/// `?q=LAT,LON` or `&q=LAT,LON`.
static QUERY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]q=(-?\d+\.\d+),(-?\d+\.\d+)").unwrap());

/// `!3dLAT!4dLON` — data blob marker pair.
static DATA_BLOB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").unwrap());

/// `^https?://(www.)?(google.com/maps|maps.app.goo.gl)`, case-insensitive.
static MAPS_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://(www\.)?(google\.com/maps|maps\.app\.goo\.gl)").unwrap());

/// Which URL shape produced a coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Pattern1,
    Pattern2,
    Pattern3,
    Pattern4,
}

impl Pattern {
    /// All patterns in the order they are tried.
    pub const PRIORITY: [Pattern; 4] = [
        Pattern::Pattern1,
        Pattern::Pattern2,
        Pattern::Pattern3,
        Pattern::Pattern4,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            Self::Pattern1 => &*MAP_CENTRE,
            Self::Pattern2 => &*PATH_POINT,
            Self::Pattern3 => &*QUERY_PARAM,
            Self::Pattern4 => &*DATA_BLOB,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern1 => write!(f, "pattern1"),
            Self::Pattern2 => write!(f, "pattern2"),
            Self::Pattern3 => write!(f, "pattern3"),
            Self::Pattern4 => write!(f, "pattern4"),
        }
    }
}

/// A latitude/longitude pair found in a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub source_url: String,
    pub matched_pattern: Pattern,
}

/// Find the first coordinate pair in `url`.
///
/// Returns `None` when no pattern matches. That is an ordinary outcome:
/// plenty of Maps links (search pages, directions) carry no coordinates.
pub fn extract(url: &str) -> Option<Coordinates> {
    Pattern::PRIORITY.iter().find_map(|&pattern| {
        let caps = pattern.regex().captures(url)?;
        let latitude = caps[1].parse::<f64>().ok()?;
        let longitude = caps[2].parse::<f64>().ok()?;
        Some(Coordinates {
            latitude,
            longitude,
            source_url: url.to_string(),
            matched_pattern: pattern,
        })
    })
}

/// Host allow-list check for Google Maps links.
pub fn is_google_maps_url(url: &str) -> bool {
    MAPS_HOST.is_match(url)
}
