//! IPv4 address validation for registry input.

use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted quad, no leading zeros, every octet within 0..=255.
#[allow(clippy::unwrap_used)]
static IPV4_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((25[0-5]|(2[0-4]|1\d|[1-9]|)\d)\.?\b){4}$").unwrap());

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("IP address must not be empty")]
    Empty,
    #[error("Invalid IP format: {0:?} is not a valid IPv4 address (e.g. 192.168.1.1)")]
    Invalid(String),
}

pub fn is_valid_ipv4(input: &str) -> bool {
    IPV4_PATTERN.is_match(input)
}

/// Validates user input and returns the parsed address.
/// Surrounding whitespace is ignored.
pub fn validate_ipv4(input: &str) -> Result<Ipv4Addr, AddressError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AddressError::Empty);
    }
    if !is_valid_ipv4(input) {
        return Err(AddressError::Invalid(input.to_owned()));
    }
    input
        .parse::<Ipv4Addr>()
        .map_err(|_| AddressError::Invalid(input.to_owned()))
}
