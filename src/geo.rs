//! Geo Detection
//!
//! Best-effort country inference used for UI defaults only: the default dial
//! code in the phone input and the order channels are offered in. Nothing in
//! the funnel's correctness depends on it.

/// Environment variables consulted for a locale, most specific first.
const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Countries that share the North American presentation rules.
const NORTH_AMERICA: &[&str] = &["US", "CA"];

/// Advisory country classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoHint {
    /// ISO 3166-1 alpha-2, upper case
    pub country: Option<String>,
    pub is_us: bool,
}

impl GeoHint {
    pub fn from_country(country: Option<&str>) -> Self {
        let country = country.and_then(normalize_country);
        let is_us = country.as_deref().is_some_and(is_north_america);
        Self { country, is_us }
    }

    /// Parse a locale tag such as `en_US.UTF-8`, `en-GB` or `pt_BR@euro`.
    pub fn from_locale(locale: &str) -> Self {
        Self::from_country(region_from_locale(locale).as_deref())
    }

    /// Detect from an explicit override, then from the process locale.
    pub fn detect(country_override: Option<&str>) -> Self {
        if let Some(country) = country_override.filter(|c| !c.trim().is_empty()) {
            let hint = Self::from_country(Some(country));
            tracing::debug!("Geo hint from override: {:?}", hint.country);
            return hint;
        }

        for var in LOCALE_VARS {
            if let Ok(value) = std::env::var(var) {
                let hint = Self::from_locale(&value);
                if hint.country.is_some() {
                    tracing::debug!("Geo hint from {}: {:?}", var, hint.country);
                    return hint;
                }
            }
        }

        tracing::debug!("No geo hint available");
        Self::default()
    }
}

/// Whether a country gets the North American channel order.
pub fn is_north_america(country: &str) -> bool {
    NORTH_AMERICA
        .iter()
        .any(|c| c.eq_ignore_ascii_case(country))
}

fn normalize_country(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

fn region_from_locale(locale: &str) -> Option<String> {
    // Strip encoding and modifier: en_US.UTF-8@euro -> en_US
    let tag = locale
        .split(['.', '@'])
        .next()
        .unwrap_or("")
        .trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    tag.split(['_', '-'])
        .skip(1)
        .find(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|part| part.to_ascii_uppercase())
}
