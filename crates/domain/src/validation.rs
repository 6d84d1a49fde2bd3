//! Invariant checks shared by entity mutators.

use std::ops::RangeInclusive;

use chrono::{Datelike, Utc};

use crate::error::{DomainError, Result};

/// Checks a text field's length in characters.
///
/// The minimum applies to the trimmed value so whitespace-only input cannot
/// satisfy a required field.
pub(crate) fn text(
    entity_type: &'static str,
    field: &str,
    value: &str,
    length: RangeInclusive<usize>,
) -> Result<()> {
    let trimmed = value.trim().chars().count();
    let total = value.chars().count();

    if trimmed < *length.start() {
        return Err(DomainError::input_not_valid(
            entity_type,
            if *length.start() == 1 {
                format!("{field} must not be empty")
            } else {
                format!("{field} must be at least {} characters", length.start())
            },
        ));
    }
    if total > *length.end() {
        return Err(DomainError::input_not_valid(
            entity_type,
            format!("{field} must be at most {} characters", length.end()),
        ));
    }
    Ok(())
}

pub(crate) fn number(
    entity_type: &'static str,
    field: &str,
    value: i32,
    range: RangeInclusive<i32>,
) -> Result<()> {
    if !range.contains(&value) {
        return Err(DomainError::input_not_valid(
            entity_type,
            format!(
                "{field} must be between {} and {}, got {value}",
                range.start(),
                range.end()
            ),
        ));
    }
    Ok(())
}

/// Release years run from year 1 up to the current calendar year.
pub(crate) fn release_year(entity_type: &'static str, value: i32) -> Result<()> {
    number(entity_type, "release year", value, 1..=Utc::now().year())
}

pub(crate) fn email(entity_type: &'static str, value: &str) -> Result<()> {
    text(entity_type, "email", value, 3..=254)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::input_not_valid(
            entity_type,
            format!("{value} is not a valid email address"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rejects_whitespace_only_required_value() {
        assert!(matches!(
            text("Book", "title", "   ", 1..=128),
            Err(DomainError::InputNotValid { .. })
        ));
    }

    #[test]
    fn text_allows_empty_optional_value() {
        assert!(text("Book", "isbn", "", 0..=64).is_ok());
    }

    #[test]
    fn text_counts_characters_not_bytes() {
        let title = "é".repeat(128);
        assert!(text("Book", "title", &title, 1..=128).is_ok());
        assert!(text("Book", "title", &format!("{title}é"), 1..=128).is_err());
    }

    #[test]
    fn release_year_rejects_future_years() {
        let next_year = Utc::now().year() + 1;
        assert!(release_year("Book", 1965).is_ok());
        assert!(release_year("Book", 0).is_err());
        assert!(release_year("Book", next_year).is_err());
    }

    #[test]
    fn email_requires_local_and_domain_parts() {
        assert!(email("User", "reader@example.com").is_ok());
        assert!(email("User", "reader.example.com").is_err());
        assert!(email("User", "@example.com").is_err());
    }
}
