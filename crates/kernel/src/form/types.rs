//! Validation errors and field validators shared by all forms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key under which form-level (non-field) errors are reported.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field name (None for form-level errors).
    pub field: Option<String>,

    /// Error message.
    pub message: String,
}

impl ValidationError {
    /// Create a field-level error.
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            message: message.into(),
        }
    }

    /// Create a form-level error.
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Errors collected while validating one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<ValidationError>,
}

/// Outcome of cleaning a form: the typed input, or what was wrong with it.
pub type Cleaned<T> = Result<T, FormErrors>;

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single form-level error.
    pub fn single(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(ValidationError::form(message));
        errors
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a field-level error.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.push(ValidationError::field(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether `field` has at least one error.
    pub fn has(&self, field: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.field.as_deref() == Some(field))
    }

    /// Messages grouped by field, for templates. Form-level errors are keyed
    /// by [`NON_FIELD_ERRORS`].
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            let key = error.field.as_deref().unwrap_or(NON_FIELD_ERRORS);
            map.entry(key.to_string())
                .or_default()
                .push(error.message.clone());
        }
        map
    }

    /// Finish validation: `Ok(value)` when no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Cleaned<T> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Serialize for FormErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

// -----------------------------------------------------------------------------
// Field validators
// -----------------------------------------------------------------------------

/// Reject an empty value.
pub fn require(errors: &mut FormErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    }
}

/// Reject values longer than `max` characters.
pub fn max_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

/// Reject a non-empty value that is not a plausible email address.
pub fn email(errors: &mut FormErrors, field: &str, value: &str) {
    if !value.is_empty() && !is_valid_email(value) {
        errors.add(field, "Enter a valid email address.");
    }
}

/// Reject a non-empty value that is neither an http(s) URL nor a site path.
pub fn url(errors: &mut FormErrors, field: &str, value: &str) {
    if !value.is_empty() && !is_valid_url(value) {
        errors.add(field, "Enter a valid URL.");
    }
}

/// Loose structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Absolute http(s) URL, or a path on this site.
pub fn is_valid_url(value: &str) -> bool {
    if value.starts_with('/') && !value.starts_with("//") {
        return !value.chars().any(char::is_whitespace);
    }
    match url::Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

/// `Some(value)` unless blank.
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let field_error = ValidationError::field("email", "Invalid email");
        assert_eq!(field_error.field, Some("email".to_string()));

        let form_error = ValidationError::form("Form expired");
        assert!(form_error.field.is_none());
    }

    #[test]
    fn errors_group_by_field() {
        let mut errors = FormErrors::new();
        errors.add("email", "one");
        errors.add("email", "two");
        errors.push(ValidationError::form("whole form"));

        let map = errors.to_map();
        assert_eq!(map["email"], vec!["one", "two"]);
        assert_eq!(map[NON_FIELD_ERRORS], vec!["whole form"]);
        assert!(errors.has("email"));
        assert!(!errors.has("name"));
    }

    #[test]
    fn serializes_as_map() {
        let errors = FormErrors::single("nope");
        let json = serde_json::to_value(&errors).unwrap_or_default();
        assert_eq!(json["__all__"][0], "nope");
    }

    #[test]
    fn required_and_length() {
        let mut errors = FormErrors::new();
        require(&mut errors, "a", "   ");
        max_length(&mut errors, "b", "abcdef", 5);
        max_length(&mut errors, "c", "abcde", 5);
        assert!(errors.has("a"));
        assert!(errors.has("b"));
        assert!(!errors.has("c"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@localhost"));
        assert!(!is_valid_email("ada @example.com"));
        assert!(!is_valid_email("ada@example..com"));
    }

    #[test]
    fn url_shapes() {
        assert!(is_valid_url("https://example.com/a.png"));
        assert!(is_valid_url("/static/images/placeholder.png"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("//evil.example.com/x.png"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn into_result() {
        assert_eq!(FormErrors::new().into_result(5), Ok(5));
        assert!(FormErrors::single("x").into_result(5).is_err());
    }
}
