//! Configuration field metadata for the rule editor.
//!
//! Schemas describe the form the editor renders for a trigger or action.
//! The typed config enums stay the source of truth at run time; a schema
//! only drives the UI and the required-field check at save time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldError;

/// Input widget the editor renders for a field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Select,
    Boolean,
    Date,
    ColumnPicker,
    UserPicker,
    PriorityPicker,
}

/// One choice in a select field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A single configurable field in a trigger or action form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigField {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub default_value: Option<Value>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Whether `{{card.*}}` placeholders are rendered in this field
    #[serde(default)]
    pub supports_variables: bool,
}

impl ConfigField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            help_text: None,
            default_value: None,
            options: Vec::new(),
            supports_variables: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn supports_variables(mut self) -> Self {
        self.supports_variables = true;
        self
    }
}

/// The full form definition for one trigger or action type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
    /// Announced in the picker but not executable yet
    #[serde(default)]
    pub coming_soon: bool,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: ConfigField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn coming_soon(mut self) -> Self {
        self.coming_soon = true;
        self
    }

    /// Check a raw config object against the schema.
    ///
    /// Required fields must be present, non-null, and non-blank for
    /// strings; number fields must hold numbers. All problems are
    /// collected, not just the first.
    pub fn check(&self, config: &Value) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for field in &self.fields {
            let value = config.get(&field.key);

            let missing = match value {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };

            if missing {
                if field.required {
                    errors.push(FieldError::required(&field.key));
                }
                continue;
            }

            if field.field_type == FieldType::Number && !value.is_some_and(Value::is_number) {
                errors.push(FieldError::invalid(&field.key, "expected a number"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
