use validator::ValidationError;

use crate::models::appointment::Location;

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 11;

/// Result of cleaning up typed phone input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneInput {
    pub digits: String,
    pub truncated: bool,
}

/// Drops every non-digit and keeps at most [`PHONE_MAX_DIGITS`] digits.
pub fn normalize_phone(raw: &str) -> PhoneInput {
    let all: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let truncated = all.len() > PHONE_MAX_DIGITS;
    let digits = all.chars().take(PHONE_MAX_DIGITS).collect();
    PhoneInput { digits, truncated }
}

pub fn phone_length_ok(phone: &str) -> bool {
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&phone.len())
        && phone.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_length_ok(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_length");
        err.message = Some("phone must be 10-11 digits".into());
        Err(err)
    }
}

pub fn validate_location(location: &str) -> Result<(), ValidationError> {
    if Location::parse(location).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("location");
        err.message = Some("location is not one of the dealership addresses".into());
        Err(err)
    }
}
