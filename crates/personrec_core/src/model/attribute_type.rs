//! Person attribute type model.
//!
//! # Responsibility
//! - Expose persisted attribute types as read-only snapshots.
//! - Provide a detached draft type for edits that are not yet saved.
//!
//! # Invariants
//! - A `PersonAttributeType` is only produced from a persisted row.
//! - Editing an `AttributeTypeDraft` never changes a snapshot or the store.
//! - Names are non-blank and unique ignoring case.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned attribute type identifier.
pub type AttributeTypeId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeTypeValidationError {
    EmptyName,
}

impl Display for AttributeTypeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "attribute type name cannot be blank"),
        }
    }
}

impl Error for AttributeTypeValidationError {}

/// Persisted attribute type snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonAttributeType {
    id: AttributeTypeId,
    uuid: Uuid,
    name: String,
    description: Option<String>,
    retired: bool,
}

impl PersonAttributeType {
    pub(crate) fn from_row(
        id: AttributeTypeId,
        uuid: Uuid,
        name: String,
        description: Option<String>,
        retired: bool,
    ) -> Self {
        Self {
            id,
            uuid,
            name,
            description,
            retired,
        }
    }

    pub fn id(&self) -> AttributeTypeId {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn retired(&self) -> bool {
        self.retired
    }

    /// Returns a detached editable copy of this snapshot.
    pub fn edit(&self) -> AttributeTypeDraft {
        AttributeTypeDraft {
            id: Some(self.id),
            uuid: self.uuid,
            name: self.name.clone(),
            description: self.description.clone(),
            retired: self.retired,
        }
    }
}

/// Editable attribute type, possibly carrying unsaved changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTypeDraft {
    /// `None` for a type that has never been saved.
    #[serde(default)]
    pub id: Option<AttributeTypeId>,
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub retired: bool,
}

impl AttributeTypeDraft {
    /// Creates a draft for a new attribute type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: None,
            retired: false,
        }
    }

    pub fn validate(&self) -> Result<(), AttributeTypeValidationError> {
        if self.name.trim().is_empty() {
            return Err(AttributeTypeValidationError::EmptyName);
        }
        Ok(())
    }
}
