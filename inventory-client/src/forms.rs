//! Maps failures onto what a form shows: per-field messages, a conflict on a
//! known field, or a transient notice.

use std::collections::BTreeMap;

use validator::ValidationErrors;

use crate::api::{ApiError, FieldMessage};

pub const GENERIC_FAILURE: &str = "Something went wrong, try again later";

/// Field name to message, ordered for stable rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<&ValidationErrors> for FieldErrors {
    /// First message per field wins; errors without a message fall back to
    /// their code.
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            if let Some(error) = list.first() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                fields.insert(field.to_string(), message);
            }
        }
        fields
    }
}

impl From<&BTreeMap<String, FieldMessage>> for FieldErrors {
    fn from(errors: &BTreeMap<String, FieldMessage>) -> Self {
        FieldErrors(
            errors
                .iter()
                .map(|(field, value)| (field.clone(), value.message.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFeedback {
    Fields(FieldErrors),
    Conflict { field: String, message: String },
    Transient(String),
}

fn is_duplicate_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already exists") || message.contains("duplicate")
}

/// Decide how a failed call surfaces on a form. `conflict_field` is the field
/// a duplicate-name conflict is pinned to.
pub fn classify(error: &ApiError, conflict_field: &str) -> FormFeedback {
    match error {
        ApiError::Rejected { body, .. } => {
            if let Some(errors) = body.errors.as_ref().filter(|e| !e.is_empty()) {
                return FormFeedback::Fields(FieldErrors::from(errors));
            }
            if error.status() == Some(409) || is_duplicate_message(&body.message) {
                return FormFeedback::Conflict {
                    field: conflict_field.to_string(),
                    message: body.message.clone(),
                };
            }
            FormFeedback::Transient(GENERIC_FAILURE.to_string())
        }
        _ => FormFeedback::Transient(GENERIC_FAILURE.to_string()),
    }
}
