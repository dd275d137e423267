//! Locality languages accepted by the reverse-geocoding service.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Language for locality names in reverse-geocode responses.
///
/// The named variants are the codes the service documents; anything else
/// goes through [`Language::Other`] untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Hi,
    Bn,
    Ta,
    Te,
    Mr,
    Gu,
    Kn,
    Ml,
    ZhCn,
    ZhTw,
    Ja,
    Ko,
    De,
    Fr,
    Es,
    It,
    Pt,
    Ru,
    Pl,
    Vi,
    Id,
    Th,
    Tr,
    Ar,
    Uk,
    Af,
    Ms,
    My,
    Fil,
    Sw,
    Xh,
    Zu,
    Cy,
    Other(String),
}

/// Documented codes, in the service's order.
pub const KNOWN_CODES: &[&str] = &[
    "en",
    "hi",
    "bn",
    "ta",
    "te",
    "mr",
    "gu",
    "kn",
    "ml",
    "zh-CN",
    "zh-TW",
    "ja",
    "ko",
    "de",
    "fr",
    "es",
    "it",
    "pt",
    "ru",
    "pl",
    "vi",
    "id",
    "th",
    "tr",
    "ar",
    "uk",
    "af",
    "ms",
    "my",
    "fil",
    "sw",
    "xh",
    "zu",
    "cy",
];

fn known(code: &str) -> Option<Language> {
    let lang = match code {
        "en" => Language::En,
        "hi" => Language::Hi,
        "bn" => Language::Bn,
        "ta" => Language::Ta,
        "te" => Language::Te,
        "mr" => Language::Mr,
        "gu" => Language::Gu,
        "kn" => Language::Kn,
        "ml" => Language::Ml,
        "zh-CN" => Language::ZhCn,
        "zh-TW" => Language::ZhTw,
        "ja" => Language::Ja,
        "ko" => Language::Ko,
        "de" => Language::De,
        "fr" => Language::Fr,
        "es" => Language::Es,
        "it" => Language::It,
        "pt" => Language::Pt,
        "ru" => Language::Ru,
        "pl" => Language::Pl,
        "vi" => Language::Vi,
        "id" => Language::Id,
        "th" => Language::Th,
        "tr" => Language::Tr,
        "ar" => Language::Ar,
        "uk" => Language::Uk,
        "af" => Language::Af,
        "ms" => Language::Ms,
        "my" => Language::My,
        "fil" => Language::Fil,
        "sw" => Language::Sw,
        "xh" => Language::Xh,
        "zu" => Language::Zu,
        "cy" => Language::Cy,
        _ => return None,
    };
    Some(lang)
}

impl Language {
    /// The code sent as `localityLanguage`.
    pub fn code(&self) -> &str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Bn => "bn",
            Self::Ta => "ta",
            Self::Te => "te",
            Self::Mr => "mr",
            Self::Gu => "gu",
            Self::Kn => "kn",
            Self::Ml => "ml",
            Self::ZhCn => "zh-CN",
            Self::ZhTw => "zh-TW",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ru => "ru",
            Self::Pl => "pl",
            Self::Vi => "vi",
            Self::Id => "id",
            Self::Th => "th",
            Self::Tr => "tr",
            Self::Ar => "ar",
            Self::Uk => "uk",
            Self::Af => "af",
            Self::Ms => "ms",
            Self::My => "my",
            Self::Fil => "fil",
            Self::Sw => "sw",
            Self::Xh => "xh",
            Self::Zu => "zu",
            Self::Cy => "cy",
            Self::Other(code) => code,
        }
    }

    /// Whether this is one of the documented codes.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Language code must not be empty".into());
        }
        // zh-CN / zh-TW are matched case-insensitively, like the rest
        let found = KNOWN_CODES
            .iter()
            .find(|code| code.eq_ignore_ascii_case(s))
            .and_then(|code| known(code));
        Ok(found.unwrap_or_else(|| Self::Other(s.to_string())))
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
