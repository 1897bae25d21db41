//! Validation rule sets, one per request shape.

use backoffice_auth::Role;
use backoffice_validation::{Rule, RuleSet};

use crate::store::OrderProcess;

fn declared(rules: Vec<Rule>) -> RuleSet {
    match RuleSet::new(rules) {
        Ok(set) => set,
        Err(e) => unreachable!("declared rule set is well-formed: {e}"),
    }
}

fn username() -> Rule {
    Rule::text("username")
        .required("Username is required")
        .length(3, 20)
        .length_error("Username must be between 3 and 20 characters")
}

fn password() -> Rule {
    Rule::password("password")
        .required("Password is required")
        .length(8, 20)
        .length_error("Password must be between 8 and 20 characters")
}

fn role() -> Rule {
    Rule::options("role", Role::ALL.map(|r| r.as_str()))
        .required("Role is required")
        .error("The role is not valid")
}

pub fn login() -> RuleSet {
    declared(vec![
        Rule::text("username").required("Username is required"),
        Rule::text("password").required("Password is required"),
    ])
}

pub fn register_admin() -> RuleSet {
    declared(vec![username(), password()])
}

pub fn register() -> RuleSet {
    declared(vec![username(), password(), role()])
}

/// Self-registration allows longer passwords than staff accounts.
pub fn register_customer() -> RuleSet {
    declared(vec![
        username(),
        Rule::password("password")
            .required("Password is required")
            .length(8, 30)
            .length_error("Password must be between 8 and 30 characters"),
    ])
}

pub fn change_role() -> RuleSet {
    declared(vec![role()])
}

pub fn complete_profile() -> RuleSet {
    declared(vec![
        Rule::text("firstname")
            .required("Firstname is required")
            .length(3, 20)
            .length_error("Firstname must be between 3 and 20 characters"),
        Rule::text("lastname")
            .required("Lastname is required")
            .length(3, 20)
            .length_error("Lastname must be between 3 and 20 characters"),
        Rule::phone_number("phonenumber")
            .required("Phone number is required")
            .error("The phone number is not valid"),
        Rule::email("email")
            .required("Email is required")
            .error("The email is not valid"),
    ])
}

/// Revenue and expense entries.
pub fn ledger_entry() -> RuleSet {
    declared(vec![
        Rule::text("title").required("Title is required").length(1, 100),
        Rule::text("cost").required("Cost is required"),
        Rule::text("detail").required("Detail is required").length(1, 800),
    ])
}

/// The customer is resolved separately: from the caller for plain accounts,
/// from the body for staff.
pub fn place_order() -> RuleSet {
    declared(vec![
        Rule::text("detail")
            .required("Detail is required")
            .length(6, 800)
            .length_error("Detail must be between 6 and 800 characters"),
    ])
}

pub fn modify_order() -> RuleSet {
    declared(vec![
        Rule::options("process", OrderProcess::NAMES)
            .required("Process is required")
            .error("Process must be one of: placed, approved"),
        Rule::text("detail")
            .required("Detail is required")
            .length(3, 800)
            .length_error("Detail must be between 3 and 800 characters"),
        Rule::text("comment")
            .length(3, 800)
            .length_error("Comment must be between 3 and 800 characters"),
        Rule::text("value"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn every_rule_set_is_well_formed() {
        for set in [
            login(),
            register_admin(),
            register(),
            register_customer(),
            change_role(),
            complete_profile(),
            ledger_entry(),
            place_order(),
            modify_order(),
        ] {
            assert!(!set.is_empty());
        }
    }

    #[test]
    fn register_checks_every_field() {
        let result = register().validate(&object(json!({
            "username": "ab",
            "password": "lowercase1",
            "role": "root",
        })));
        assert_eq!(
            result.error("username"),
            Some("Username must be between 3 and 20 characters")
        );
        assert_eq!(
            result.error("password"),
            Some("Password must contain one of A-Z characters")
        );
        assert_eq!(result.error("role"), Some("The role is not valid"));
    }

    #[test]
    fn customer_passwords_may_be_longer_than_staff_passwords() {
        let body = object(json!({
            "username": "carol",
            "password": format!("A{}", "b".repeat(26)),
        }));
        assert!(register_customer().validate(&body).is_valid());
        assert_eq!(
            register_admin().validate(&body).error("password"),
            Some("Password must be between 8 and 20 characters")
        );
    }

    #[test]
    fn complete_profile_accepts_valid_input() {
        let result = complete_profile().validate(&object(json!({
            "firstname": "Jane",
            "lastname": "Doe",
            "phonenumber": "+16473034246",
            "email": "jane@example.com",
        })));
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn order_comment_is_optional() {
        let result = modify_order().validate(&object(json!({
            "process": "approved",
            "detail": "two chairs",
        })));
        assert!(result.is_valid(), "{:?}", result.errors());
    }
}
