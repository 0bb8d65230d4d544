//! Form validation helpers shared by every page.
//!
//! Forms derive `validator::Validate`; `validator` reports errors in a
//! hash map, so each form also lists its fields in display order and only
//! the first violated rule is surfaced.

use std::sync::LazyLock;

use regex::Regex;
use validator::{Validate, ValidationErrors};

use crate::shared::types::AdminError;

/// `+254` followed by nine digits.
pub static KENYAN_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+254\d{9}$").expect("static phone pattern compiles"));

/// Message of the first violated rule, walking fields in `order`.
pub fn first_violation(errors: &ValidationErrors, order: &[&str]) -> String {
    let field_errors = errors.field_errors();

    let ordered = order
        .iter()
        .filter_map(|field| field_errors.get(*field).map(|errs| (*field, *errs)));
    let rest = field_errors
        .iter()
        .map(|(field, errs)| (field.as_ref(), *errs));

    ordered
        .chain(rest)
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}

/// Run the derived rules and turn the first failure into
/// [`AdminError::Validation`].
pub fn validate_form<T: Validate>(form: &T, order: &[&str]) -> Result<(), AdminError> {
    form.validate()
        .map_err(|errors| AdminError::Validation(first_violation(&errors, order)))
}

pub fn clamp_page_size(size: Option<u32>) -> u32 {
    size.unwrap_or(crate::shared::DEFAULT_PAGE_SIZE).clamp(1, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Name is too short"))]
        name: String,
        #[validate(email(message = "Bad email"))]
        email: String,
    }

    #[test]
    fn first_violation_follows_declared_order() {
        let sample = Sample {
            name: "ab".into(),
            email: "nope".into(),
        };
        let err = validate_form(&sample, &["name", "email"]).unwrap_err();
        assert_eq!(err.to_string(), "Name is too short");

        let err = validate_form(&sample, &["email", "name"]).unwrap_err();
        assert_eq!(err.to_string(), "Bad email");
    }

    #[test]
    fn valid_form_passes() {
        let sample = Sample {
            name: "Alice".into(),
            email: "alice@example.com".into(),
        };
        assert!(validate_form(&sample, &["name", "email"]).is_ok());
    }

    #[test]
    fn kenyan_phone_pattern() {
        assert!(KENYAN_PHONE.is_match("+254712345678"));
        assert!(!KENYAN_PHONE.is_match("+25471234567"));
        assert!(!KENYAN_PHONE.is_match("0712345678"));
        assert!(!KENYAN_PHONE.is_match("+254"));
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(None), 20);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(500)), 100);
    }
}
