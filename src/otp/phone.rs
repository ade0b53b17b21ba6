use once_cell::sync::Lazy;
use regex::Regex;

use super::countries::{COUNTRIES, Country, country_by_iso, search_countries};

static E164: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("valid regex"));

/// International phone number input: dial-code selector + local digits.
///
/// Every mutation returns the combined value so callers can forward it
/// upward immediately.
#[derive(Debug, Clone)]
pub struct PhoneInput {
    country: &'static Country,
    local: String,

    // Dial-code selector
    pub selector_open: bool,
    pub search: String,
    pub selected: usize,
}

impl PhoneInput {
    /// Start with the dial code of `iso`, falling back to the first table entry
    pub fn new(iso: &str) -> Self {
        Self {
            country: country_by_iso(iso).unwrap_or(&COUNTRIES[0]),
            local: String::new(),
            selector_open: false,
            search: String::new(),
            selected: 0,
        }
    }

    pub fn country(&self) -> &'static Country {
        self.country
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    /// Dial code followed by the sanitized local digits
    pub fn value(&self) -> String {
        format!("{}{}", self.country.dial_code, self.local)
    }

    pub fn is_valid(&self) -> bool {
        is_valid_e164(&self.value())
    }

    /// Replace the local part, keeping digits only
    pub fn set_local(&mut self, raw: &str) -> String {
        self.local = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        self.value()
    }

    pub fn push_char(&mut self, c: char) -> Option<String> {
        if c.is_ascii_digit() && self.local.len() < 15 {
            self.local.push(c);
            Some(self.value())
        } else {
            None
        }
    }

    pub fn backspace(&mut self) -> String {
        self.local.pop();
        self.value()
    }

    /// Switch country; the combined value changes with it
    pub fn select_country(&mut self, country: &'static Country) -> String {
        self.country = country;
        self.close_selector();
        self.value()
    }

    /// Load an existing E.164 value, matching the longest dial code
    pub fn set_value(&mut self, value: &str) -> String {
        let Some(rest) = value.trim().strip_prefix('+') else {
            return self.set_local(value);
        };
        let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
        let best = COUNTRIES
            .iter()
            .filter(|c| digits.starts_with(&c.dial_code[1..]))
            .max_by_key(|c| c.dial_code.len());
        match best {
            Some(country) => {
                // Keep the current country when it shares the dial code (US/CA)
                if self.country.dial_code != country.dial_code {
                    self.country = country;
                }
                self.local = digits[country.dial_code.len() - 1..].to_string();
            }
            None => self.local = digits,
        }
        self.value()
    }

    // ─── Selector ────────────────────────────────────────────

    pub fn open_selector(&mut self) {
        self.selector_open = true;
        self.search.clear();
        self.selected = 0;
    }

    pub fn close_selector(&mut self) {
        self.selector_open = false;
        self.search.clear();
        self.selected = 0;
    }

    /// Countries matching the current search text
    pub fn matches(&self) -> Vec<&'static Country> {
        search_countries(&self.search)
    }

    pub fn search_push(&mut self, c: char) {
        self.search.push(c);
        self.selected = 0;
    }

    pub fn search_pop(&mut self) {
        self.search.pop();
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        let len = self.matches().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_prev(&mut self) {
        let len = self.matches().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Commit the highlighted search result, if any
    pub fn confirm_selection(&mut self) -> Option<String> {
        let country = *self.matches().get(self.selected)?;
        Some(self.select_country(country))
    }
}

/// `+` followed by 7 to 15 digits, no leading zero
pub fn is_valid_e164(value: &str) -> bool {
    E164.is_match(value)
}

/// Mask all but the last 4 digits, for logs
pub fn mask_phone(phone: &str) -> String {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let keep = digits.saturating_sub(4);
    let mut seen = 0;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen <= keep { '*' } else { c }
            } else {
                c
            }
        })
        .collect()
}
