//! Receipt validation.
//!
//! [`validate_receipt`] gates the submit path: a receipt that fails here is
//! never scored and never stored. The returned [`ValidationError`] names the
//! rule that failed so it can be logged; the HTTP layer collapses every
//! variant into the same client-facing rejection.

pub mod input_guards;
pub mod receipt;

pub use input_guards::{
    ValidationError, ValidationResult, parse_purchase_date, parse_purchase_time, validate_amount,
    validate_retailer, validate_short_description,
};
pub use receipt::{is_valid, validate_receipt};
