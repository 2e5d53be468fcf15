use super::input_guards::{
    ValidationError, ValidationResult, parse_purchase_date, parse_purchase_time, validate_amount,
    validate_retailer, validate_short_description,
};
use crate::model::Receipt;

/// Checks every rule a receipt must satisfy before it is scored, returning
/// the first violation found.
///
/// Rules are checked in a fixed order: retailer, total, purchase date,
/// purchase time, item count, then each item's description and price.
pub fn validate_receipt(receipt: &Receipt) -> ValidationResult<()> {
    validate_retailer(&receipt.retailer)?;
    validate_amount("total", &receipt.total)?;
    parse_purchase_date(&receipt.purchase_date)?;
    parse_purchase_time(&receipt.purchase_time)?;

    if receipt.items.is_empty() {
        return Err(ValidationError::NoItems);
    }

    for (index, item) in receipt.items.iter().enumerate() {
        validate_short_description(index, &item.short_description)?;
        validate_amount(&format!("items[{index}].price"), &item.price)?;
    }

    Ok(())
}

/// Boolean form of [`validate_receipt`].
pub fn is_valid(receipt: &Receipt) -> bool {
    validate_receipt(receipt).is_ok()
}
