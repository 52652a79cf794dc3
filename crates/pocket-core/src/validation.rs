//! Input preconditions shared by the repository and the CLI.

use crate::error::{PocketError, Result};
use crate::types::{EntityKind, NewRecord, RecordPatch};

/// Check the fields of a record about to be inserted.
pub fn validate_new(kind: EntityKind, fields: &NewRecord) -> Result<()> {
    validate_title(&fields.title)?;

    if let Some(amount) = fields.amount {
        validate_amount(amount)?;
    }

    if kind.requires_amount() {
        if fields.amount.is_none() {
            return Err(PocketError::Validation(format!(
                "{} require an amount",
                kind
            )));
        }
        if fields.type_tag.is_none() {
            return Err(PocketError::Validation(format!(
                "{} require a type (income or expense)",
                kind
            )));
        }
    }

    Ok(())
}

/// Check the supplied fields of a partial update. Absent fields are not
/// checked.
pub fn validate_patch(patch: &RecordPatch) -> Result<()> {
    if let Some(ref title) = patch.title {
        validate_title(title)?;
    }
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    Ok(())
}

/// Parse a user-typed amount. Accepts an optional thousands separator
/// (`1,500`) and surrounding whitespace.
pub fn parse_amount(input: &str) -> Result<f64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let amount: f64 = cleaned
        .parse()
        .map_err(|_| PocketError::Validation(format!("amount '{}' is not a number", input)))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(PocketError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(PocketError::Validation(format!(
            "amount {} is not a finite number",
            amount
        )));
    }
    if amount <= 0.0 {
        return Err(PocketError::Validation(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}
