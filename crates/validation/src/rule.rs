//! Rule and rule-set definitions.
//!
//! The JSON form mirrors what route handlers declare:
//!
//! ```json
//! [{ "title": "username", "type": "text",
//!    "required": { "value": true, "error": "Username is required" },
//!    "length": { "value": [3, 20], "error": "Username must be 3-20 characters" } }]
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine;
use crate::result::ValidationResult;

/// Date format used when a date rule does not name one (`31/12/2024`).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("invalid rule set document: {0}")]
    Document(String),

    #[error("rule '{title}': length bounds [{min}, {max}] are inverted")]
    InvertedLength { title: String, min: usize, max: usize },

    #[error("rule '{0}': options rule declares no valid options")]
    EmptyOptions(String),

    #[error("rule '{0}': title is empty")]
    EmptyTitle(String),
}

/// Whether the field must be present, and the message when it is not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Required {
    pub value: bool,
    #[serde(default)]
    pub error: String,
}

/// Inclusive character-count bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Length {
    pub value: (usize, usize),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Length {
    pub fn min(&self) -> usize {
        self.value.0
    }

    pub fn max(&self) -> usize {
        self.value.1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidOptions {
    pub value: BTreeSet<String>,
}

/// Type-specific part of a rule, tagged by the JSON `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<Length>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Password {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<Length>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(alias = "phonenumber")]
    PhoneNumber {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Date {
        /// `chrono` format string; defaults to [`DEFAULT_DATE_FORMAT`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Options {
        #[serde(rename = "validOptions", default)]
        valid_options: ValidOptions,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// One field's validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub title: String,
    #[serde(default)]
    pub required: Required,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl Rule {
    fn with_kind(title: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            title: title.into(),
            required: Required::default(),
            kind,
        }
    }

    pub fn text(title: impl Into<String>) -> Self {
        Self::with_kind(title, RuleKind::Text { length: None, error: None })
    }

    pub fn password(title: impl Into<String>) -> Self {
        Self::with_kind(title, RuleKind::Password { length: None, error: None })
    }

    pub fn phone_number(title: impl Into<String>) -> Self {
        Self::with_kind(title, RuleKind::PhoneNumber { error: None })
    }

    pub fn email(title: impl Into<String>) -> Self {
        Self::with_kind(title, RuleKind::Email { error: None })
    }

    pub fn date(title: impl Into<String>) -> Self {
        Self::with_kind(title, RuleKind::Date { format: None, error: None })
    }

    pub fn options<I, S>(title: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value = options.into_iter().map(Into::into).collect();
        Self::with_kind(
            title,
            RuleKind::Options {
                valid_options: ValidOptions { value },
                error: None,
            },
        )
    }

    /// Mark the field required, reporting `error` when it is absent or empty.
    pub fn required(mut self, error: impl Into<String>) -> Self {
        self.required = Required {
            value: true,
            error: error.into(),
        };
        self
    }

    /// Inclusive length bounds. Only text and password rules check length.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        if let RuleKind::Text { length, .. } | RuleKind::Password { length, .. } = &mut self.kind {
            *length = Some(Length {
                value: (min, max),
                error: None,
            });
        }
        self
    }

    /// Dedicated message for a length failure. Call after [`Rule::length`].
    pub fn length_error(mut self, message: impl Into<String>) -> Self {
        if let RuleKind::Text { length: Some(l), .. } | RuleKind::Password { length: Some(l), .. } =
            &mut self.kind
        {
            l.error = Some(message.into());
        }
        self
    }

    /// Message for the type-specific check.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        let slot = match &mut self.kind {
            RuleKind::Text { error, .. }
            | RuleKind::Password { error, .. }
            | RuleKind::PhoneNumber { error }
            | RuleKind::Email { error }
            | RuleKind::Date { error, .. }
            | RuleKind::Options { error, .. } => error,
        };
        *slot = Some(message.into());
        self
    }

    /// Date format for date rules.
    pub fn format(mut self, fmt: impl Into<String>) -> Self {
        if let RuleKind::Date { format, .. } = &mut self.kind {
            *format = Some(fmt.into());
        }
        self
    }

    /// The rule's generic invalid-value message, if one was declared.
    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::Text { error, .. }
            | RuleKind::Password { error, .. }
            | RuleKind::PhoneNumber { error }
            | RuleKind::Email { error }
            | RuleKind::Date { error, .. }
            | RuleKind::Options { error, .. } => error.as_deref(),
        }
    }

    fn check_definition(&self) -> Result<(), RuleSetError> {
        if self.title.trim().is_empty() {
            return Err(RuleSetError::EmptyTitle(self.title.clone()));
        }
        match &self.kind {
            RuleKind::Text { length: Some(l), .. } | RuleKind::Password { length: Some(l), .. }
                if l.min() > l.max() =>
            {
                Err(RuleSetError::InvertedLength {
                    title: self.title.clone(),
                    min: l.min(),
                    max: l.max(),
                })
            }
            RuleKind::Options { valid_options, .. } if valid_options.value.is_empty() => {
                Err(RuleSetError::EmptyOptions(self.title.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Ordered, immutable collection of rules for one request shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    /// Build from rules declared in code. Definitions are checked the same
    /// way as [`RuleSet::from_json`].
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleSetError> {
        for rule in &rules {
            rule.check_definition()?;
        }
        Ok(Self(rules))
    }

    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let rules: Vec<Rule> =
            serde_json::from_str(json).map_err(|e| RuleSetError::Document(e.to_string()))?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self, input: &serde_json::Map<String, serde_json::Value>) -> ValidationResult {
        engine::validate(input, self)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_schema() {
        let json = r#"[
            {
                "title": "username",
                "type": "text",
                "required": { "value": true, "error": "required" },
                "length": { "value": [8, 20], "error": "bad length" }
            },
            {
                "title": "phonenumber",
                "type": "phonenumber",
                "required": { "value": true, "error": "required" },
                "error": "The phone number is not valid"
            },
            {
                "title": "process",
                "type": "options",
                "required": { "value": false, "error": "" },
                "validOptions": { "value": ["placed", "approved"] }
            }
        ]"#;

        let rules = RuleSet::from_json(json).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.rules()[0],
            Rule::text("username").required("required").length(8, 20).length_error("bad length")
        );
        assert_eq!(
            rules.rules()[1],
            Rule::phone_number("phonenumber")
                .required("required")
                .error("The phone number is not valid")
        );
        assert_eq!(rules.rules()[2], Rule::options("process", ["placed", "approved"]));
    }

    #[test]
    fn canonical_tag_is_kebab_case() {
        let json = serde_json::to_value(Rule::phone_number("phone")).unwrap();
        assert_eq!(json["type"], "phone-number");
        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(back, Rule::phone_number("phone"));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let json = r#"[{ "title": "x", "type": "colour" }]"#;
        assert!(matches!(RuleSet::from_json(json), Err(RuleSetError::Document(_))));
    }

    #[test]
    fn definition_errors_are_reported() {
        assert_eq!(
            RuleSet::new(vec![Rule::text("name").length(10, 2)]).unwrap_err(),
            RuleSetError::InvertedLength {
                title: "name".to_string(),
                min: 10,
                max: 2
            }
        );
        assert_eq!(
            RuleSet::new(vec![Rule::options("kind", Vec::<String>::new())]).unwrap_err(),
            RuleSetError::EmptyOptions("kind".to_string())
        );
        assert!(matches!(
            RuleSet::new(vec![Rule::email(" ")]),
            Err(RuleSetError::EmptyTitle(_))
        ));
    }

    #[test]
    fn builder_ignores_settings_for_other_kinds() {
        assert_eq!(Rule::email("email").length(1, 2), Rule::email("email"));
        assert_eq!(Rule::text("t").format("%Y"), Rule::text("t"));
    }
}
