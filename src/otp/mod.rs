//! Phone verification building blocks
//!
//! Input state for the Verify step: the international phone number field,
//! the six-cell code entry, and the resend countdown. None of these talk to
//! the backend; the funnel driver does.

mod code;
mod cooldown;
mod countries;
mod phone;

pub use code::CodeInput;
pub use cooldown::ResendCooldown;
pub use countries::{COUNTRIES, Country, country_by_iso, search_countries};
pub use phone::{PhoneInput, is_valid_e164, mask_phone};

/// Number of digits in a one-time code
pub const OTP_LENGTH: usize = 6;

/// Whether `code` has the shape the backend expects
pub fn is_complete_code(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}
