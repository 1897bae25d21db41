//! `backoffice-core` — shared domain primitives.
//!
//! Identifiers, the domain error model and the small value parsers (amounts,
//! relative periods) used by the record-keeping routes. No I/O lives here.

pub mod error;
pub mod id;
pub mod money;
pub mod period;

pub use error::DomainError;
pub use id::{AccountId, EntryId, OrderId};
pub use money::Amount;
pub use period::RelativePeriod;
