//! Validation utilities for procurement documents

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{WorkflowError, WorkflowResult};
use crate::money::HUNDRED;

/// Calendar date format accepted on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field-level check used by `#[validate(custom = "not_blank")]`
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Run derived validation and report the first failing field
pub fn validate_input<T: Validate>(input: &T) -> WorkflowResult<()> {
    input.validate().map_err(first_violation)
}

fn first_violation(errors: ValidationErrors) -> WorkflowError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    match fields.first() {
        Some((field, errors)) => {
            let message = errors
                .first()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed {} check", e.code))
                })
                .unwrap_or_else(|| "is invalid".to_string());
            WorkflowError::validation(*field, message)
        }
        None => WorkflowError::validation("input", "is invalid"),
    }
}

/// Require a present, non-blank text value
pub fn require_text(field: &str, value: Option<&str>) -> WorkflowResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(WorkflowError::validation(field, "is required")),
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_calendar_date(field: &str, value: &str) -> WorkflowResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        WorkflowError::validation(field, format!("'{}' is not a valid calendar date", value))
    })
}

/// Parse a delivery date that must not lie in the past
pub fn parse_delivery_date(field: &str, value: &str, today: NaiveDate) -> WorkflowResult<NaiveDate> {
    let date = parse_calendar_date(field, value)?;
    if date < today {
        return Err(WorkflowError::validation(
            field,
            format!("{} is in the past", date),
        ));
    }
    Ok(date)
}

/// Validate a percentage between 0 and 100 inclusive
pub fn validate_percent(field: &str, value: Decimal) -> WorkflowResult<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(WorkflowError::validation(field, "must be between 0 and 100"));
    }
    Ok(())
}

/// Validate a percentage that has no upper bound (taxes)
pub fn validate_non_negative(field: &str, value: Decimal) -> WorkflowResult<()> {
    if value < Decimal::ZERO {
        return Err(WorkflowError::validation(field, "cannot be negative"));
    }
    Ok(())
}

pub fn validate_positive(field: &str, value: Decimal) -> WorkflowResult<()> {
    if value <= Decimal::ZERO {
        return Err(WorkflowError::validation(field, "must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(custom = "not_blank")]
        name: String,
        #[validate(length(max = 4, message = "too long"))]
        code: String,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn blank_text_fails_derived_validation() {
        let err = validate_input(&Named {
            name: "   ".to_string(),
            code: "AB".to_string(),
        })
        .unwrap_err();
        assert_eq!(err, WorkflowError::validation("name", "must not be blank"));
    }

    #[test]
    fn derived_message_is_reported() {
        let err = validate_input(&Named {
            name: "Bolt".to_string(),
            code: "ABCDEF".to_string(),
        })
        .unwrap_err();
        assert_eq!(err, WorkflowError::validation("code", "too long"));
    }

    #[test]
    fn require_text_trims() {
        assert_eq!(require_text("reason", Some("  late ")).unwrap(), "late");
        assert!(require_text("reason", Some("  ")).is_err());
        assert!(require_text("reason", None).is_err());
    }

    #[test]
    fn calendar_dates_must_exist() {
        assert!(parse_calendar_date("validTill", "2026-02-28").is_ok());
        assert!(parse_calendar_date("validTill", "2026-02-30").is_err());
        assert!(parse_calendar_date("validTill", "28/02/2026").is_err());
    }

    #[test]
    fn delivery_date_today_is_allowed() {
        assert_eq!(
            parse_delivery_date("expectedDeliveryDate", "2026-10-19", today()).unwrap(),
            today()
        );
        assert!(parse_delivery_date("expectedDeliveryDate", "2026-10-18", today()).is_err());
    }

    #[test]
    fn percent_bounds_inclusive() {
        assert!(validate_percent("advancePaymentPercent", Decimal::ZERO).is_ok());
        assert!(validate_percent("advancePaymentPercent", HUNDRED).is_ok());
        assert!(validate_percent("advancePaymentPercent", Decimal::new(1001, 1)).is_err());
        assert!(validate_percent("advancePaymentPercent", Decimal::NEGATIVE_ONE).is_err());
    }
}
