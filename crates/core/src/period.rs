//! Relative period filters such as `"7d"` or `"3M"`.
//!
//! List endpoints accept these to restrict results to records created within
//! the trailing period.

use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::error::DomainError;

/// Unit suffix of a relative period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    /// 30 days.
    Months,
    /// 365 days.
    Years,
}

impl PeriodUnit {
    fn from_suffix(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Seconds),
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            'w' => Some(Self::Weeks),
            'M' => Some(Self::Months),
            'y' => Some(Self::Years),
            _ => None,
        }
    }

    fn seconds(&self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 60 * 60 * 24,
            Self::Weeks => 60 * 60 * 24 * 7,
            Self::Months => 60 * 60 * 24 * 30,
            Self::Years => 60 * 60 * 24 * 365,
        }
    }
}

/// A trailing time window: a positive count followed by a unit suffix.
///
/// Only constructed through [`FromStr`], which rejects counts whose duration
/// is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativePeriod {
    duration: Duration,
}

impl RelativePeriod {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Earliest instant included in the window ending at `now`, or `None`
    /// when it would fall before the earliest representable date.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(self.duration)
    }
}

impl FromStr for RelativePeriod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DomainError::validation(format!("'{s}' is not a valid period"));

        let unit_char = s.chars().last().ok_or_else(invalid)?;
        let unit = PeriodUnit::from_suffix(unit_char).ok_or_else(invalid)?;
        let digits = &s[..s.len() - unit_char.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u32 = digits.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        let duration = Duration::try_seconds(i64::from(count) * unit.seconds()).ok_or_else(invalid)?;
        Ok(Self { duration })
    }
}
