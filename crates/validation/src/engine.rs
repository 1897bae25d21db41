//! The validation engine.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::checks::{self, PASSWORD_UPPERCASE_MESSAGE};
use crate::result::ValidationResult;
use crate::rule::{DEFAULT_DATE_FORMAT, Length, Rule, RuleKind, RuleSet};

/// Absent-or-empty test used for `required`.
///
/// `null`, whitespace-only strings, and empty arrays or objects are blank.
/// Numbers and booleans never are, so `0` and `false` satisfy `required`.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Check every rule against `input`, recording the first failure per field.
pub fn validate(input: &Map<String, Value>, rules: &RuleSet) -> ValidationResult {
    let mut errors = BTreeMap::new();

    for rule in rules {
        let value = input.get(&rule.title).filter(|v| !is_blank(v));

        let failure = match value {
            None if rule.required.value => Some(rule.required.error.clone()),
            None => None,
            Some(value) => check(rule, value),
        };

        if let Some(message) = failure {
            errors.entry(rule.title.clone()).or_insert(message);
        }
    }

    ValidationResult::from_errors(errors)
}

/// Like [`validate`] for an arbitrary JSON body; anything other than an
/// object is treated as an empty record.
pub fn validate_value(input: &Value, rules: &RuleSet) -> ValidationResult {
    match input {
        Value::Object(fields) => validate(fields, rules),
        _ => validate(&Map::new(), rules),
    }
}

fn check(rule: &Rule, value: &Value) -> Option<String> {
    let Some(text) = as_text(value) else {
        return Some(invalid_message(rule));
    };

    match &rule.kind {
        RuleKind::Text { length, .. } => check_length(rule, length.as_ref(), &text),
        RuleKind::Password { length, .. } => check_length(rule, length.as_ref(), &text).or_else(|| {
            (!checks::has_uppercase(&text)).then(|| PASSWORD_UPPERCASE_MESSAGE.to_string())
        }),
        RuleKind::PhoneNumber { .. } => {
            (!checks::is_phone_number(&text)).then(|| invalid_message(rule))
        }
        RuleKind::Email { .. } => (!checks::is_email(&text)).then(|| invalid_message(rule)),
        RuleKind::Date { format, .. } => {
            let format = format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
            (!checks::is_date(&text, format)).then(|| invalid_message(rule))
        }
        RuleKind::Options { valid_options, .. } => {
            (!valid_options.value.contains(&*text)).then(|| invalid_message(rule))
        }
    }
}

fn check_length(rule: &Rule, length: Option<&Length>, text: &str) -> Option<String> {
    let length = length?;
    if checks::length_within(text, length.min(), length.max()) {
        return None;
    }
    let message = length
        .error
        .as_deref()
        .or(rule.error_message())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "The {} length should be between {} and {}",
                rule.title,
                length.min(),
                length.max()
            )
        });
    Some(message)
}

fn invalid_message(rule: &Rule) -> String {
    rule.error_message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("The {} is not valid", rule.title))
}

/// Textual form of scalar values; arrays and objects have none.
fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn username_rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::text("username")
                .required("required")
                .length(8, 20)
                .length_error("bad length"),
        ])
        .unwrap()
    }

    #[test]
    fn empty_required_field_reports_required_error() {
        let rules = RuleSet::new(vec![Rule::text("username").required("required")]).unwrap();
        let result = validate(&object(json!({ "username": "" })), &rules);

        assert!(!result.is_valid());
        assert_eq!(result.error("username"), Some("required"));
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn missing_and_whitespace_are_blank() {
        let rules = RuleSet::new(vec![Rule::text("username").required("required")]).unwrap();
        for input in [json!({}), json!({ "username": null }), json!({ "username": "   " })] {
            let result = validate(&object(input.clone()), &rules);
            assert_eq!(result.error("username"), Some("required"), "{input}");
        }
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let rules = username_rules();

        let short = validate(&object(json!({ "username": "aaaaaaa" })), &rules);
        assert_eq!(short.error("username"), Some("bad length"));

        let max = validate(&object(json!({ "username": "a".repeat(20) })), &rules);
        assert!(max.is_valid());
        assert!(max.errors().is_empty());

        let long = validate(&object(json!({ "username": "a".repeat(21) })), &rules);
        assert_eq!(long.error("username"), Some("bad length"));
    }

    #[test]
    fn password_without_uppercase_gets_dedicated_message() {
        let rules = RuleSet::new(vec![
            Rule::password("password")
                .required("required")
                .length(8, 20)
                .error("The password is not valid"),
        ])
        .unwrap();

        let result = validate(&object(json!({ "password": "aaaaaaaa&" })), &rules);
        assert_eq!(result.error("password"), Some(PASSWORD_UPPERCASE_MESSAGE));

        let ok = validate(&object(json!({ "password": "aaaaaaaA&" })), &rules);
        assert!(ok.is_valid());
    }

    #[test]
    fn password_length_is_checked_before_composition() {
        let rules = RuleSet::new(vec![Rule::password("password").length(8, 20)]).unwrap();
        let result = validate(&object(json!({ "password": "abc" })), &rules);
        assert_eq!(
            result.error("password"),
            Some("The password length should be between 8 and 20")
        );
    }

    #[test]
    fn length_error_falls_back_to_rule_error() {
        let rules = RuleSet::new(vec![Rule::text("detail").length(3, 800).error("bad detail")]).unwrap();
        let result = validate(&object(json!({ "detail": "no" })), &rules);
        assert_eq!(result.error("detail"), Some("bad detail"));
    }

    #[test]
    fn typed_checks_use_rule_messages() {
        let rules = RuleSet::new(vec![
            Rule::phone_number("phonenumber").required("required").error("p"),
            Rule::email("email").required("required").error("e"),
            Rule::date("birthdate").required("required").error("a"),
            Rule::options("process", ["placed", "approved"]),
        ])
        .unwrap();

        let good = validate(
            &object(json!({
                "phonenumber": "+16473034246",
                "email": "a@c.com",
                "birthdate": "28/02/2022",
                "process": "approved",
            })),
            &rules,
        );
        assert!(good.is_valid(), "{:?}", good.errors());

        let bad = validate(
            &object(json!({
                "phonenumber": "6473034246",
                "email": "a@c",
                "birthdate": "31/02/2022",
                "process": "shipped",
            })),
            &rules,
        );
        assert_eq!(bad.error("phonenumber"), Some("p"));
        assert_eq!(bad.error("email"), Some("e"));
        assert_eq!(bad.error("birthdate"), Some("a"));
        assert_eq!(bad.error("process"), Some("The process is not valid"));
    }

    #[test]
    fn optional_blank_field_is_skipped() {
        let rules = RuleSet::new(vec![Rule::email("email")]).unwrap();
        assert!(validate(&object(json!({ "email": "" })), &rules).is_valid());
        assert!(validate(&object(json!({})), &rules).is_valid());
    }

    #[test]
    fn every_field_is_checked() {
        let rules = RuleSet::new(vec![
            Rule::text("firstname").required("firstname required"),
            Rule::text("lastname").required("lastname required"),
            Rule::email("email").required("email required"),
        ])
        .unwrap();
        let result = validate(&object(json!({ "lastname": "Doe" })), &rules);
        assert_eq!(result.errors().len(), 2);
        assert_eq!(result.error("firstname"), Some("firstname required"));
        assert_eq!(result.error("email"), Some("email required"));
    }

    #[test]
    fn first_failure_wins_across_duplicate_titles() {
        let rules = RuleSet::new(vec![
            Rule::text("code").length(4, 4).length_error("first"),
            Rule::text("code").length(1, 2).length_error("second"),
        ])
        .unwrap();
        let result = validate(&object(json!({ "code": "abc" })), &rules);
        assert_eq!(result.error("code"), Some("first"));
    }

    #[test]
    fn scalars_are_checked_by_text_and_containers_are_invalid() {
        let rules = RuleSet::new(vec![
            Rule::text("amount").length(1, 3),
            Rule::text("tags"),
        ])
        .unwrap();

        let ok = validate(&object(json!({ "amount": 125 })), &rules);
        assert!(ok.is_valid());

        let result = validate(&object(json!({ "amount": 12345, "tags": ["a"] })), &rules);
        assert_eq!(
            result.error("amount"),
            Some("The amount length should be between 1 and 3")
        );
        assert_eq!(result.error("tags"), Some("The tags is not valid"));
    }

    #[test]
    fn non_object_body_is_an_empty_record() {
        let rules = RuleSet::new(vec![Rule::text("username").required("required")]).unwrap();
        let result = validate_value(&json!(["username"]), &rules);
        assert_eq!(result.error("username"), Some("required"));
    }

    #[test]
    fn rules_from_json_drive_the_engine() {
        let rules = RuleSet::from_json(
            r#"[{"title":"password","type":"password",
                 "required":{"value":true,"error":"required"},
                 "length":{"value":[8,20]}}]"#,
        )
        .unwrap();
        let result = rules.validate(&object(json!({ "password": "aaaaaaaa&" })));
        assert_eq!(result.error("password"), Some(PASSWORD_UPPERCASE_MESSAGE));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: validating the same input twice produces byte-identical output.
        #[test]
        fn validation_is_deterministic(
            username in ".{0,30}",
            password in ".{0,30}",
            email in "[a-z@.]{0,12}",
        ) {
            let rules = RuleSet::new(vec![
                Rule::text("username").required("required").length(8, 20),
                Rule::password("password").required("required").length(8, 20),
                Rule::email("email").required("required"),
            ]).unwrap();
            let input = object(json!({
                "username": username,
                "password": password,
                "email": email,
            }));

            let first = serde_json::to_vec(&validate(&input, &rules)).unwrap();
            let second = serde_json::to_vec(&validate(&input, &rules)).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: a non-blank text value passes a length rule iff its char count is in [min, max].
        #[test]
        fn length_rule_matches_char_count(
            text in "[a-zA-Z0-9é]{1,40}",
            min in 0usize..20,
            span in 0usize..20,
        ) {
            let max = min + span;
            let rules = RuleSet::new(vec![Rule::text("field").length(min, max)]).unwrap();
            let result = validate(&object(json!({ "field": text.clone() })), &rules);

            let count = text.chars().count();
            prop_assert_eq!(result.is_valid(), count >= min && count <= max);
        }

        /// Property: validity always equals an empty error map.
        #[test]
        fn validity_is_derived_from_errors(value in proptest::option::of(".{0,12}")) {
            let rules = RuleSet::new(vec![Rule::phone_number("phone").required("required")]).unwrap();
            let mut input = Map::new();
            if let Some(v) = value {
                input.insert("phone".to_string(), Value::String(v));
            }
            let result = validate(&input, &rules);
            prop_assert_eq!(result.is_valid(), result.errors().is_empty());
        }
    }
}
