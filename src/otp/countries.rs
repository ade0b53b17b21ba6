/// Entry in the dial-code selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// ISO 3166-1 alpha-2
    pub iso: &'static str,
    pub name: &'static str,
    pub dial_code: &'static str,
    pub flag: &'static str,
}

const fn country(
    iso: &'static str,
    name: &'static str,
    dial_code: &'static str,
    flag: &'static str,
) -> Country {
    Country {
        iso,
        name,
        dial_code,
        flag,
    }
}

/// Countries offered in the phone input, source markets and destinations
pub const COUNTRIES: &[Country] = &[
    country("US", "United States", "+1", "🇺🇸"),
    country("CA", "Canada", "+1", "🇨🇦"),
    country("GB", "United Kingdom", "+44", "🇬🇧"),
    country("IE", "Ireland", "+353", "🇮🇪"),
    country("AU", "Australia", "+61", "🇦🇺"),
    country("NZ", "New Zealand", "+64", "🇳🇿"),
    country("DE", "Germany", "+49", "🇩🇪"),
    country("FR", "France", "+33", "🇫🇷"),
    country("NL", "Netherlands", "+31", "🇳🇱"),
    country("BE", "Belgium", "+32", "🇧🇪"),
    country("CH", "Switzerland", "+41", "🇨🇭"),
    country("AT", "Austria", "+43", "🇦🇹"),
    country("SE", "Sweden", "+46", "🇸🇪"),
    country("NO", "Norway", "+47", "🇳🇴"),
    country("DK", "Denmark", "+45", "🇩🇰"),
    country("ES", "Spain", "+34", "🇪🇸"),
    country("PT", "Portugal", "+351", "🇵🇹"),
    country("IT", "Italy", "+39", "🇮🇹"),
    country("PL", "Poland", "+48", "🇵🇱"),
    country("HU", "Hungary", "+36", "🇭🇺"),
    country("CZ", "Czechia", "+420", "🇨🇿"),
    country("HR", "Croatia", "+385", "🇭🇷"),
    country("GR", "Greece", "+30", "🇬🇷"),
    country("TR", "Turkey", "+90", "🇹🇷"),
    country("AE", "United Arab Emirates", "+971", "🇦🇪"),
    country("SA", "Saudi Arabia", "+966", "🇸🇦"),
    country("IN", "India", "+91", "🇮🇳"),
    country("TH", "Thailand", "+66", "🇹🇭"),
    country("MY", "Malaysia", "+60", "🇲🇾"),
    country("SG", "Singapore", "+65", "🇸🇬"),
    country("KR", "South Korea", "+82", "🇰🇷"),
    country("MX", "Mexico", "+52", "🇲🇽"),
    country("CO", "Colombia", "+57", "🇨🇴"),
    country("CR", "Costa Rica", "+506", "🇨🇷"),
    country("BR", "Brazil", "+55", "🇧🇷"),
    country("ZA", "South Africa", "+27", "🇿🇦"),
];

/// Look up a country by ISO code (case-insensitive)
pub fn country_by_iso(iso: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.iso.eq_ignore_ascii_case(iso.trim()))
}

/// Filter the selector list by name, ISO code or dial code.
///
/// An empty query returns every country in table order.
pub fn search_countries(query: &str) -> Vec<&'static Country> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return COUNTRIES.iter().collect();
    }
    let dial_query = query.trim_start_matches('+');

    COUNTRIES
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&query)
                || c.iso.eq_ignore_ascii_case(&query)
                || (!dial_query.is_empty()
                    && dial_query.chars().all(|ch| ch.is_ascii_digit())
                    && c.dial_code[1..].starts_with(dial_query))
        })
        .collect()
}
