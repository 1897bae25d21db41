//! Monetary amounts for financial entries and orders.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A non-negative amount in the smallest currency unit (cents).
///
/// Parsed from user input such as `"12.50"`, `"$12.5"` or `"300"`; at most two
/// fractional digits are accepted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn from_cents(cents: i64) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::validation("amount must not be negative"));
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix('$').unwrap_or(raw);
        if raw.is_empty() {
            return Err(DomainError::validation("amount is empty"));
        }

        let (whole, frac) = match raw.split_once('.') {
            Some((w, f)) => (w, f),
            None => (raw, ""),
        };

        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) || frac.len() > 2 {
            return Err(DomainError::validation(format!("'{s}' is not a valid amount")));
        }
        if raw.ends_with('.') {
            return Err(DomainError::validation(format!("'{s}' is not a valid amount")));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| DomainError::validation(format!("'{s}' is out of range")))?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("'{s}' is out of range")))
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!("12.50".parse::<Amount>().unwrap().cents(), 1250);
        assert_eq!("$12.5".parse::<Amount>().unwrap().cents(), 1250);
        assert_eq!("300".parse::<Amount>().unwrap().cents(), 30000);
        assert_eq!(" $0.07 ".parse::<Amount>().unwrap().cents(), 7);
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "$", "-5", "1.234", "12.", ".5", "1,000", "abc", "$$1"] {
            assert!(bad.parse::<Amount>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn displays_with_two_decimals() {
        assert_eq!(Amount::from_cents(1205).unwrap().to_string(), "12.05");
        assert!(Amount::from_cents(-1).is_err());
    }
}
