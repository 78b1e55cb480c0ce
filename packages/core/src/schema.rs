//! Payload schema descriptors.
//!
//! A [`PayloadSchema`] is the registration-time description of the model a
//! codec deserializes into. It replaces runtime type tokens: subscriptions
//! and producer calls carry an explicit descriptor value, and decoded
//! bodies are validated against it before a handler ever sees them.

use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Schema for a payload model.
///
/// A schema with no fields accepts any body (useful for raw passthrough
/// and fire-and-forget paths). A schema with fields requires the body to
/// be an object and every `required` field to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadSchema {
    /// Model name, used in diagnostics only.
    pub name: String,
    /// Field definitions that comprise this model.
    pub fields: Vec<FieldDef>,
}

/// Single field definition within a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Name of the field.
    pub name: String,
    /// Whether the field must be present in every payload.
    pub required: bool,
}

/// Result of validating a body against a schema.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// The body conforms to the schema.
    Valid,
    /// The body violates one or more schema constraints.
    Invalid {
        /// Human-readable descriptions of each violation.
        errors: Vec<String>,
    },
}

impl ValidationOutcome {
    /// Returns `true` for [`ValidationOutcome::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

impl PayloadSchema {
    /// Creates an empty schema that accepts any body.
    #[must_use]
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a schema with the given name and no fields yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::any(name)
    }

    /// Adds a field definition. Builder-style, consumes and returns `self`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, required: bool) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            required,
        });
        self
    }

    /// Validates a decoded body against this schema.
    #[must_use]
    pub fn validate(&self, body: &Body) -> ValidationOutcome {
        if self.fields.is_empty() {
            return ValidationOutcome::Valid;
        }

        let Some(map) = body.as_map() else {
            return ValidationOutcome::Invalid {
                errors: vec![format!("`{}` expects an object payload", self.name)],
            };
        };

        let errors: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.required && !map.contains_key(&f.name))
            .map(|f| format!("`{}` is missing required field `{}`", self.name, f.name))
            .collect();

        if errors.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid { errors }
        }
    }
}
