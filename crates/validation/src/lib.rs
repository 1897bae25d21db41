//! `backoffice-validation` — declarative request validation.
//!
//! A [`RuleSet`] is an ordered list of per-field [`Rule`]s. Validation is a
//! pure function of `(input, rules)`: no I/O, no shared state, and identical
//! arguments always produce identical results.

pub mod checks;
pub mod engine;
pub mod result;
pub mod rule;

pub use engine::{is_blank, validate, validate_value};
pub use result::ValidationResult;
pub use rule::{DEFAULT_DATE_FORMAT, Length, Required, Rule, RuleKind, RuleSet, RuleSetError, ValidOptions};
