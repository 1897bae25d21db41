//! `backoffice-auth` — credentials and role-hierarchy authorization.
//!
//! This crate is decoupled from HTTP; storage is reached only through the
//! [`AccountDirectory`] trait.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod hierarchy;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;

pub use account::{AccountDirectory, AccountRecord, DirectoryError, InMemoryAccountDirectory};
pub use authorize::{Authorizer, Decision, DenyReason, DEFAULT_LOOKUP_TIMEOUT};
pub use claims::{Claims, TokenPurpose, TokenValidationError, validate_claims};
pub use hierarchy::{HierarchyBuilder, HierarchyConfig, HierarchyError};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{ACTIVE_ACCOUNT, Action, Attribute, UnknownAction};
pub use roles::{Role, UnknownRole};
pub use token::{TokenError, TokenIssuer, TokenValidator, TokenVerifier};
