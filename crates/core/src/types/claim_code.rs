//! Claim codes for out-of-band order pickup.
//!
//! A claim code is a short human-shareable token (`READ-XXXX-XXXX`) that
//! identifies an order at the counter without requiring the customer's
//! session. Codes are random enough that collisions are negligible, but
//! they are not secrets: possession of a code only allows verifying the
//! one order it names.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed prefix for every claim code.
const PREFIX: &str = "READ";

/// Uppercase alphanumeric alphabet (36 characters).
const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters per group.
const GROUP_LEN: usize = 4;

/// Errors from parsing a claim code out of a string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimCodeError {
    /// The code does not match `READ-XXXX-XXXX`.
    #[error("invalid claim code format: {0}")]
    InvalidFormat(String),
}

/// A unique, human-shareable order pickup code.
///
/// Format: `READ-XXXX-XXXX` where `X` is drawn uniformly from `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClaimCode(String);

impl ClaimCode {
    /// Generate a fresh random claim code.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut group = || -> String {
            (0..GROUP_LEN)
                .map(|_| {
                    let idx = rng.random_range(0..ALPHABET.len());
                    char::from(ALPHABET[idx])
                })
                .collect()
        };
        let first = group();
        let second = group();
        Self(format!("{PREFIX}-{first}-{second}"))
    }

    /// Parse and validate a claim code from its string form.
    ///
    /// Lowercase input is accepted and normalized to uppercase, since
    /// codes are typed by hand at pickup.
    ///
    /// # Errors
    ///
    /// Returns `ClaimCodeError::InvalidFormat` if the input does not match
    /// `READ-XXXX-XXXX`.
    pub fn parse(input: &str) -> Result<Self, ClaimCodeError> {
        let normalized = input.trim().to_ascii_uppercase();
        let mut parts = normalized.split('-');

        let valid = parts.next() == Some(PREFIX)
            && parts
                .next()
                .is_some_and(|g| g.len() == GROUP_LEN && g.bytes().all(|b| ALPHABET.contains(&b)))
            && parts
                .next()
                .is_some_and(|g| g.len() == GROUP_LEN && g.bytes().all(|b| ALPHABET.contains(&b)))
            && parts.next().is_none();

        if valid {
            Ok(Self(normalized))
        } else {
            Err(ClaimCodeError::InvalidFormat(input.to_string()))
        }
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClaimCode {
    type Err = ClaimCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ClaimCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ClaimCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ClaimCode {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ClaimCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn is_code_char(c: char) -> bool {
        c.is_ascii_uppercase() || c.is_ascii_digit()
    }

    #[test]
    fn test_generated_codes_match_pattern() {
        for _ in 0..100 {
            let code = ClaimCode::generate();
            let parts: Vec<&str> = code.as_str().split('-').collect();
            assert_eq!(parts.len(), 3, "code: {code}");
            assert_eq!(parts[0], "READ");
            for group in &parts[1..] {
                assert_eq!(group.len(), 4);
                assert!(group.chars().all(is_code_char), "code: {code}");
            }
        }
    }

    #[test]
    fn test_generated_codes_are_unique_across_samples() {
        // Statistical, not absolute: 36^8 possible codes makes a collision
        // across 1000 samples astronomically unlikely.
        let codes: HashSet<String> = (0..1000)
            .map(|_| ClaimCode::generate().as_str().to_string())
            .collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_parse_round_trip() {
        let code = ClaimCode::generate();
        let parsed = ClaimCode::parse(code.as_str()).expect("valid code");
        assert_eq!(parsed, code);
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let parsed = ClaimCode::parse("  read-ab12-cd34 ").expect("valid code");
        assert_eq!(parsed.as_str(), "READ-AB12-CD34");
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        for bad in [
            "",
            "READ-AB12",
            "READ-AB12-CD34-EF56",
            "BOOK-AB12-CD34",
            "READ-AB1-CD34",
            "READ-AB!2-CD34",
            "READAB12CD34",
        ] {
            assert!(ClaimCode::parse(bad).is_err(), "accepted: {bad:?}");
        }
    }
}
