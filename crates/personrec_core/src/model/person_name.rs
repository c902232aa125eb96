//! Person name model.
//!
//! A person may carry several names; at most one is expected to be
//! `preferred`, but the store does not enforce that.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned person name identifier.
pub type PersonNameId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonNameValidationError {
    EmptyGivenName,
}

impl Display for PersonNameValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGivenName => write!(f, "person name requires a non-blank given name"),
        }
    }
}

impl Error for PersonNameValidationError {}

/// One name record owned by a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default)]
    pub id: Option<PersonNameId>,
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    /// Owning person. Must reference an existing row when saved.
    pub person_id: PersonId,
    pub given_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub preferred: bool,
    #[serde(default)]
    pub voided: bool,
}

impl PersonName {
    /// Creates an unsaved name for `person_id`.
    pub fn new(person_id: PersonId, given_name: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            person_id,
            given_name: given_name.into(),
            middle_name: None,
            family_name: None,
            preferred: false,
            voided: false,
        }
    }

    pub fn validate(&self) -> Result<(), PersonNameValidationError> {
        if self.given_name.trim().is_empty() {
            return Err(PersonNameValidationError::EmptyGivenName);
        }
        Ok(())
    }

    /// Joins the non-empty name parts with single spaces.
    pub fn full_name(&self) -> String {
        [
            Some(self.given_name.as_str()),
            self.middle_name.as_deref(),
            self.family_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}
