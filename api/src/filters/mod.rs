//! Translation of GraphQL filter arguments into normalized filter expressions.
//!
//! Translation is lenient per entry: an entry that cannot be decoded, has no usable value or
//! names an attribute without a queryable field is skipped and reported in
//! [`FilterOutcome::dropped`], and the remaining entries still apply.

mod arg;
mod translator;

pub use arg::{FilterArg, Operand};
pub use translator::{FilterOutcome, FilterTranslator};
