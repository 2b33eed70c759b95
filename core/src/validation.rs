//! Raw text to typed value conversion with error accumulation.
//!
//! # Design
//! A `FieldValidator` lives for one form submission. Each `to_*` call either
//! returns a value or returns `None` and appends exactly one `FieldError`;
//! never both. Blank input is "not entered" and is not an error. Conversions
//! never short-circuit, so a single pass over a form collects every problem.

use std::fmt;

use chrono::NaiveDate;

use crate::isbn;
use crate::sink::{MessageSink, Severity};

/// Date pattern used by the book forms (`dd/MM/yyyy`).
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// A single field that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    field: String,
    message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Identifier of the input the error belongs to.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Field errors in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", summary_text(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn summary_text(errors: &[FieldError]) -> String {
    let mut text = String::from("The following errors were found:\n\n");
    for error in errors {
        text.push_str("• ");
        text.push_str(error.message());
        text.push('\n');
    }
    text
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// The first failing field; the form moves focus here.
    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    /// Multi-line listing shown to the user after a form scan.
    pub fn summary(&self) -> String {
        summary_text(&self.0)
    }

    /// Shows the summary on `sink`. Does nothing when there are no errors.
    pub fn report_to(&self, sink: &dyn MessageSink) {
        if self.is_empty() {
            return;
        }
        sink.show_message(&self.summary(), "Validation error", Severity::Error);
    }

    fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accumulating converter for one form submission.
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: ValidationErrors,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a signed integer identifier.
    pub fn to_integer(&mut self, field: &str, text: &str) -> Option<i64> {
        let value = text.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse::<i64>() {
            Ok(number) => Some(number),
            Err(_) => {
                self.reject(
                    field,
                    format!("The value [{value}] is invalid for field [{field}]."),
                );
                None
            }
        }
    }

    /// Parses a calendar date with a `chrono` format string such as
    /// [`DISPLAY_DATE_FORMAT`].
    ///
    /// Input made only of separators (an untouched `__/__/____` mask reads as
    /// `"  /  /  "`) counts as not entered. Every component must be written at
    /// the full width of the format, so `01/02/24` and `1/2/2024` are rejected.
    pub fn to_date(&mut self, field: &str, text: &str, format: &str) -> Option<NaiveDate> {
        let value = text.trim();
        if value.chars().all(|c| !c.is_alphanumeric()) {
            return None;
        }
        let parsed = NaiveDate::parse_from_str(value, format)
            .ok()
            .filter(|date| date.format(format).to_string().eq_ignore_ascii_case(value));
        match parsed {
            Some(date) => Some(date),
            None => {
                self.reject(field, format!("Invalid date in field \"{field}\": {value}"));
                None
            }
        }
    }

    /// Trimmed free text. Never fails.
    pub fn to_text(&mut self, _field: &str, text: &str) -> Option<String> {
        let value = text.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Strips everything except digits and `X`, then checks the ISBN-10 and
    /// ISBN-13 checksums. Returns the cleaned value upper-cased.
    pub fn to_isbn(&mut self, field: &str, text: &str) -> Option<String> {
        let value = text.trim();
        if value.is_empty() {
            return None;
        }
        let cleaned: String = value
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if isbn::is_valid_isbn(&cleaned) {
            Some(cleaned)
        } else {
            self.reject(
                field,
                format!("The value [{value}] is an invalid ISBN for field [{field}]."),
            );
            None
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Ends the submission, handing back the collected errors.
    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// `Ok(value)` when nothing failed, the collected errors otherwise.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    fn reject(&mut self, field: &str, message: String) {
        tracing::debug!(field, %message, "field rejected");
        self.errors.push(FieldError::new(field, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", Some(42))]
    #[case("  7 ", Some(7))]
    #[case("-3", Some(-3))]
    #[case("", None)]
    #[case("   ", None)]
    fn to_integer_accepts_numbers_and_blank(#[case] text: &str, #[case] expected: Option<i64>) {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_integer("id", text), expected);
        assert!(!validator.has_errors());
    }

    #[rstest]
    #[case("abc")]
    #[case("1.5")]
    #[case("99999999999999999999")]
    fn to_integer_rejects_non_numeric(#[case] text: &str) {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_integer("id", text), None);
        assert_eq!(validator.errors().len(), 1);
        let error = validator.errors().first().unwrap();
        assert_eq!(error.field(), "id");
        assert_eq!(
            error.message(),
            format!("The value [{}] is invalid for field [id].", text.trim())
        );
    }

    #[rstest]
    #[case("")]
    #[case("  /  /  ")]
    #[case("//")]
    #[case("__/__/____")]
    fn to_date_treats_blank_and_separators_as_absent(#[case] text: &str) {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_date("date", text, DISPLAY_DATE_FORMAT), None);
        assert!(!validator.has_errors());
    }

    #[test]
    fn to_date_parses_display_format() {
        let mut validator = FieldValidator::new();
        let date = validator.to_date("date", " 05/11/1965 ", DISPLAY_DATE_FORMAT);
        assert_eq!(date, NaiveDate::from_ymd_opt(1965, 11, 5));
        assert!(!validator.has_errors());
    }

    #[rstest]
    #[case::two_digit_year("01/02/24")]
    #[case::unpadded_day_and_month("1/2/2024")]
    fn to_date_requires_full_width_components(#[case] text: &str) {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_date("date", text, DISPLAY_DATE_FORMAT), None);
        assert_eq!(validator.errors().len(), 1);
        assert_eq!(
            validator.errors().first().unwrap().message(),
            format!("Invalid date in field \"date\": {text}")
        );
    }

    #[test]
    fn to_date_rejects_impossible_month() {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_date("date", "31/13/2024", DISPLAY_DATE_FORMAT), None);
        assert_eq!(validator.errors().len(), 1);
        assert_eq!(
            validator.errors().first().unwrap().message(),
            "Invalid date in field \"date\": 31/13/2024"
        );
    }

    #[test]
    fn to_text_trims_and_drops_blank() {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_text("title", "  Dune "), Some("Dune".to_string()));
        assert_eq!(validator.to_text("title", "   "), None);
        assert!(!validator.has_errors());
    }

    #[rstest]
    #[case("978-0-306-40615-7", "9780306406157")]
    #[case("0-8044-2957-x", "080442957X")]
    #[case("ISBN 0306406152", "0306406152")]
    fn to_isbn_cleans_and_uppercases(#[case] text: &str, #[case] expected: &str) {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_isbn("isbn", text).as_deref(), Some(expected));
        assert!(!validator.has_errors());
    }

    #[test]
    fn to_isbn_is_idempotent_on_clean_output() {
        let mut validator = FieldValidator::new();
        let first = validator.to_isbn("isbn", "0-8044-2957-x").unwrap();
        let second = validator.to_isbn("isbn", &first).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn to_isbn_rejects_bad_checksum() {
        let mut validator = FieldValidator::new();
        assert_eq!(validator.to_isbn("isbn", "978-0-306-40615-8"), None);
        assert_eq!(
            validator.errors().first().unwrap().message(),
            "The value [978-0-306-40615-8] is an invalid ISBN for field [isbn]."
        );
    }

    #[test]
    fn errors_accumulate_in_field_order() {
        let mut validator = FieldValidator::new();
        validator.to_integer("id", "x");
        validator.to_isbn("isbn", "123");
        validator.to_text("title", "ok");
        validator.to_date("date", "99/99/9999", DISPLAY_DATE_FORMAT);

        let fields: Vec<&str> = validator.errors().iter().map(FieldError::field).collect();
        assert_eq!(fields, ["id", "isbn", "date"]);
        assert!(validator.finish(()).is_err());
    }

    #[test]
    fn summary_lists_every_message() {
        let mut validator = FieldValidator::new();
        validator.to_integer("id", "x");
        validator.to_isbn("isbn", "1");
        let summary = validator.into_errors().summary();
        assert!(summary.starts_with("The following errors were found:\n\n"));
        assert_eq!(summary.matches("• ").count(), 2);
    }

    #[test]
    fn display_matches_summary() {
        let mut validator = FieldValidator::new();
        validator.to_integer("id", "x");
        let errors = validator.into_errors();
        assert_eq!(errors.to_string(), errors.summary());
        let boxed: Box<dyn std::error::Error> = Box::new(errors);
        assert!(boxed.to_string().contains("[x]"));
    }
}
