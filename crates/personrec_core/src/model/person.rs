//! Person domain model.
//!
//! # Responsibility
//! - Define the person record with split birth date and birth time.
//! - Derive the combined birth date-time from the stored components.
//!
//! # Invariants
//! - `birth_time` is only meaningful together with `birth_date`.
//! - `birth_time` has whole-second precision; finer values fail validation.
//! - `death_date` is set only when `dead` is true and never precedes birth.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned person identifier.
pub type PersonId = i64;

/// Administrative gender as recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
    #[serde(rename = "U")]
    Unknown,
}

impl Gender {
    /// Single-letter storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "O",
            Self::Unknown => "U",
        }
    }

    /// Parses a single-letter storage code.
    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "O" => Some(Self::Other),
            "U" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Validation errors for person write/read paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    BirthTimeWithoutDate,
    /// Birth times persist at whole-second precision only.
    SubSecondBirthTime(NaiveTime),
    EstimatedWithoutBirthDate,
    DeathDateWithoutDeadFlag,
    DeathBeforeBirth {
        birth_date: NaiveDate,
        death_date: NaiveDate,
    },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BirthTimeWithoutDate => write!(f, "birth time requires a birth date"),
            Self::SubSecondBirthTime(time) => write!(
                f,
                "birth time {time} has sub-second precision; use whole seconds"
            ),
            Self::EstimatedWithoutBirthDate => {
                write!(f, "birth date cannot be estimated when it is not set")
            }
            Self::DeathDateWithoutDeadFlag => {
                write!(f, "death date requires the person to be marked dead")
            }
            Self::DeathBeforeBirth {
                birth_date,
                death_date,
            } => write!(
                f,
                "death date {death_date} precedes birth date {birth_date}"
            ),
        }
    }
}

impl Error for PersonValidationError {}

/// Canonical person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// `None` until the store assigns (or the caller picks) an identifier.
    #[serde(default)]
    pub id: Option<PersonId>,
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Time of day of birth. Stored separately from `birth_date`.
    #[serde(default)]
    pub birth_time: Option<NaiveTime>,
    #[serde(default)]
    pub birth_date_estimated: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub death_date: Option<NaiveDate>,
    #[serde(default)]
    pub voided: bool,
}

impl Default for Person {
    fn default() -> Self {
        Self::new()
    }
}

impl Person {
    /// Creates an unsaved person with a fresh uuid and no birth data.
    pub fn new() -> Self {
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            gender: None,
            birth_date: None,
            birth_time: None,
            birth_date_estimated: false,
            dead: false,
            death_date: None,
            voided: false,
        }
    }

    /// Creates a person with a caller-chosen identifier.
    ///
    /// Used by import and fixture paths where identity already exists.
    pub fn with_id(id: PersonId) -> Self {
        Self {
            id: Some(id),
            ..Self::new()
        }
    }

    /// Sets the birth time, dropping any sub-second component.
    pub fn set_birth_time(&mut self, time: NaiveTime) {
        self.birth_time = Some(time.with_nanosecond(0).unwrap_or(time));
    }

    /// Returns the combined birth date-time.
    ///
    /// - date and time set: the exact concatenation of both.
    /// - only date set: midnight of that date.
    /// - no date: `None`.
    pub fn birth_date_time(&self) -> Option<NaiveDateTime> {
        let date = self.birth_date?;
        match self.birth_time {
            Some(time) => Some(date.and_time(time)),
            None => date.and_hms_opt(0, 0, 0),
        }
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if let Some(time) = self.birth_time {
            if time.nanosecond() != 0 {
                return Err(PersonValidationError::SubSecondBirthTime(time));
            }
        }

        if self.birth_date.is_none() {
            if self.birth_time.is_some() {
                return Err(PersonValidationError::BirthTimeWithoutDate);
            }
            if self.birth_date_estimated {
                return Err(PersonValidationError::EstimatedWithoutBirthDate);
            }
        }

        if let Some(death_date) = self.death_date {
            if !self.dead {
                return Err(PersonValidationError::DeathDateWithoutDeadFlag);
            }
            if let Some(birth_date) = self.birth_date {
                if death_date < birth_date {
                    return Err(PersonValidationError::DeathBeforeBirth {
                        birth_date,
                        death_date,
                    });
                }
            }
        }

        Ok(())
    }

    /// Returns whether this person should be considered active.
    pub fn is_active(&self) -> bool {
        !self.voided
    }
}
