use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use backoffice_auth::Role;
use backoffice_core::{AccountId, Amount, RelativePeriod};

use crate::app::errors;
use crate::store::{AdminAccount, CustomerAccount};

/// `?filter=7d` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

impl FilterQuery {
    /// Start of the trailing window. Unparsable filters mean no window.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.filter
            .as_deref()
            .and_then(|f| f.trim().parse::<RelativePeriod>().ok())
            .and_then(|period| period.cutoff(now))
    }
}

/// What the employees listing exposes about an account.
#[derive(Debug, Serialize)]
pub struct EmployeeSummary {
    pub id: AccountId,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl From<AdminAccount> for EmployeeSummary {
    fn from(account: AdminAccount) -> Self {
        Self {
            id: account.id,
            username: account.username,
            firstname: account.firstname,
            lastname: account.lastname,
            email: account.email,
            role: account.role,
        }
    }
}

/// What staff see about a customer account.
#[derive(Debug, Serialize)]
pub struct CustomerSummary {
    pub id: AccountId,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phonenumber: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub verified: bool,
}

impl From<CustomerAccount> for CustomerSummary {
    fn from(customer: CustomerAccount) -> Self {
        Self {
            id: customer.id,
            username: customer.username,
            firstname: customer.firstname,
            lastname: customer.lastname,
            phonenumber: customer.phonenumber,
            email: customer.email,
            enabled: customer.enabled,
            verified: customer.verified,
        }
    }
}

/// Profile fields of an already validated completion request. Names and
/// email are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub email: String,
}

impl Profile {
    pub fn from_body(body: &Value) -> Self {
        let text = |key: &str| field_text(body, key).unwrap_or_default();
        Self {
            firstname: text("firstname").to_lowercase(),
            lastname: text("lastname").to_lowercase(),
            phonenumber: text("phonenumber"),
            email: text("email").to_lowercase(),
        }
    }
}

/// Text form of a scalar body field. Numbers are kept as written.
pub fn field_text(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an amount field, reporting a field error on failure.
pub fn amount_field(body: &Value, key: &str) -> Result<Option<Amount>, axum::response::Response> {
    match field_text(body, key).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<Amount>()
            .map(Some)
            .map_err(|_| errors::field_error(key, format!("The {key} is not a valid amount"))),
    }
}

/// Signed cents as `"-12.50"`.
pub fn signed_amount(cents: i128) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn filter_parses_relative_period() {
        let now = Utc::now();
        let q = FilterQuery {
            filter: Some("7d".to_string()),
        };
        assert_eq!(q.since(now), Some(now - Duration::days(7)));

        let q = FilterQuery {
            filter: Some("soon".to_string()),
        };
        assert_eq!(q.since(now), None);
        assert_eq!(FilterQuery::default().since(now), None);
    }

    #[test]
    fn out_of_range_filters_mean_no_window() {
        let now = Utc::now();
        for filter in ["4294967295y", "300000y"] {
            let q = FilterQuery {
                filter: Some(filter.to_string()),
            };
            assert_eq!(q.since(now), None, "{filter}");
        }
    }

    #[test]
    fn profile_lowercases_names_and_email() {
        let profile = Profile::from_body(&json!({
            "firstname": " Jane ",
            "lastname": "DOE",
            "phonenumber": "+16473034246",
            "email": "Jane@Example.com",
        }));
        assert_eq!(profile.firstname, "jane");
        assert_eq!(profile.lastname, "doe");
        assert_eq!(profile.phonenumber, "+16473034246");
        assert_eq!(profile.email, "jane@example.com");
    }

    #[test]
    fn amounts_from_strings_and_numbers() {
        let body = json!({ "a": "$12.50", "b": 3, "c": "twelve", "d": "" });
        assert_eq!(amount_field(&body, "a").unwrap().map(|a| a.cents()), Some(1250));
        assert_eq!(amount_field(&body, "b").unwrap().map(|a| a.cents()), Some(300));
        assert!(amount_field(&body, "c").is_err());
        assert_eq!(amount_field(&body, "d").unwrap(), None);
        assert_eq!(amount_field(&body, "missing").unwrap(), None);
    }

    #[test]
    fn signed_amount_formats_negative_balances() {
        assert_eq!(signed_amount(1250), "12.50");
        assert_eq!(signed_amount(-5), "-0.05");
        assert_eq!(signed_amount(0), "0.00");
        let max = i128::from(i64::MAX);
        assert_eq!(signed_amount(2 * max), "184467440737095516.14");
        assert_eq!(signed_amount(-max), "-92233720368547758.07");
    }
}
