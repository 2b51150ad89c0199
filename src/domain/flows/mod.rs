//! Reference domains.
//!
//! Each domain declares its field enum, its draft and how raw values merge
//! into it. Stores, record API calls and prompts live in
//! `application::flows`.

pub mod death;
pub mod expense;

use chrono::{Duration, NaiveDate, Utc};

use crate::domain::registration::{EntityRef, FieldName, FieldValue, ServiceError};

pub use death::{DeathCause, DeathDraft, DeathField};
pub use expense::{ExpenseDraft, ExpenseField};

pub(crate) fn parse_text<F: FieldName>(
    field: F,
    value: &FieldValue,
) -> Result<String, ServiceError> {
    match value {
        FieldValue::Reference(reference) => Ok(reference.name.clone()),
        FieldValue::Number(_) | FieldValue::Flag(_) => Ok(value.to_string()),
        FieldValue::Text(_) => value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::validation(
                    field.as_str(),
                    format!("{} cannot be empty.", field.label()),
                )
            }),
    }
}

pub(crate) fn parse_positive_number<F: FieldName>(
    field: F,
    value: &FieldValue,
) -> Result<f64, ServiceError> {
    match value.as_number() {
        Some(number) if number > 0.0 && number.is_finite() => Ok(number),
        _ => Err(ServiceError::validation(
            field.as_str(),
            format!("{} must be a number greater than zero.", field.label()),
        )),
    }
}

pub(crate) fn parse_count<F: FieldName>(field: F, value: &FieldValue) -> Result<u32, ServiceError> {
    let number = parse_positive_number(field, value)?;
    if number.fract() != 0.0 || number > f64::from(u32::MAX) {
        return Err(ServiceError::validation(
            field.as_str(),
            format!("{} must be a whole number.", field.label()),
        ));
    }
    Ok(number as u32)
}

/// Accepts a menu reference, or free text used as both id and name.
pub(crate) fn parse_reference<F: FieldName>(
    field: F,
    value: &FieldValue,
) -> Result<EntityRef, ServiceError> {
    match value {
        FieldValue::Reference(reference) if !reference.id.trim().is_empty() => {
            Ok(reference.clone())
        }
        other => {
            let name = parse_text(field, other)?;
            Ok(EntityRef::new(name.to_lowercase(), name))
        }
    }
}

/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, `today` and `yesterday`.
pub(crate) fn parse_date<F: FieldName>(
    field: F,
    value: &FieldValue,
) -> Result<NaiveDate, ServiceError> {
    let invalid = || {
        ServiceError::validation(
            field.as_str(),
            format!("{} must be a date like 2024-05-31 or 31/05/2024.", field.label()),
        )
    };
    let text = value.as_text().ok_or_else(invalid)?;
    let today = Utc::now().date_naive();
    match text.to_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .map_err(|_| invalid())
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_date_formats() {
        let iso = parse_date(ExpenseField::PaymentDate, &FieldValue::text("2024-05-31")).unwrap();
        let br = parse_date(ExpenseField::PaymentDate, &FieldValue::text("31/05/2024")).unwrap();
        assert_eq!(iso, br);
        assert_eq!(format_date(&iso), "31/05/2024");
    }

    #[test]
    fn parses_relative_dates() {
        let today = parse_date(DeathField::DeathDate, &FieldValue::text("Today")).unwrap();
        let yesterday = parse_date(DeathField::DeathDate, &FieldValue::text("yesterday")).unwrap();
        assert_eq!(today - yesterday, Duration::days(1));
    }

    #[test]
    fn rejects_garbage_dates() {
        let err = parse_date(DeathField::DeathDate, &FieldValue::text("soon")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref field, .. } if field == "death_date"));
    }

    #[test]
    fn count_rejects_fractions_and_zero() {
        assert!(parse_count(DeathField::Quantity, &FieldValue::Number(2.5)).is_err());
        assert!(parse_count(DeathField::Quantity, &FieldValue::Number(0.0)).is_err());
        assert_eq!(parse_count(DeathField::Quantity, &FieldValue::text("3")).unwrap(), 3);
    }

    #[test]
    fn free_text_reference_uses_lowercase_id() {
        let reference = parse_reference(ExpenseField::Category, &FieldValue::text("Feed")).unwrap();
        assert_eq!(reference, EntityRef::new("feed", "Feed"));
    }

    #[test]
    fn reference_without_id_falls_back_to_name() {
        let value = FieldValue::reference(" ", "Vaccines");
        let reference = parse_reference(ExpenseField::Category, &value).unwrap();
        assert_eq!(reference, EntityRef::new("vaccines", "Vaccines"));
    }
}
