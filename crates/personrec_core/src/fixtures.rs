//! JSON data sets for seeding a person store.
//!
//! # Responsibility
//! - Parse data set documents into domain records.
//! - Load a data set into a migrated connection atomically.
//!
//! # Invariants
//! - Every record in a data set carries an explicit identifier.
//! - Loading is all-or-nothing: any failure rolls the whole set back.
//! - Attribute types load first, then persons, then person names.

use crate::model::attribute_type::AttributeTypeDraft;
use crate::model::person::Person;
use crate::model::person_name::PersonName;
use crate::repo::person_repo::{PersonRepository, RepoError, SqlitePersonRepository};
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

/// Records to seed into a person store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub attribute_types: Vec<AttributeTypeDraft>,
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub person_names: Vec<PersonName>,
}

/// Row counts written by `load_dataset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub attribute_types: usize,
    pub persons: usize,
    pub person_names: usize,
}

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    MissingId { entity: &'static str, index: usize },
    Repo(RepoError),
}

impl Display for FixtureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read data set: {err}"),
            Self::Parse(err) => write!(f, "invalid data set document: {err}"),
            Self::MissingId { entity, index } => {
                write!(f, "data set {entity} #{index} has no identifier")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FixtureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::MissingId { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for FixtureError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for FixtureError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl Dataset {
    pub fn from_json_str(document: &str) -> Result<Self, FixtureError> {
        serde_json::from_str(document).map_err(FixtureError::Parse)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let document = std::fs::read_to_string(path).map_err(FixtureError::Io)?;
        Self::from_json_str(&document)
    }

    fn check_ids(&self) -> Result<(), FixtureError> {
        let missing = |entity, index| FixtureError::MissingId { entity, index };
        if let Some(index) = self.attribute_types.iter().position(|t| t.id.is_none()) {
            return Err(missing("attribute_type", index));
        }
        if let Some(index) = self.persons.iter().position(|p| p.id.is_none()) {
            return Err(missing("person", index));
        }
        if let Some(index) = self.person_names.iter().position(|n| n.id.is_none()) {
            return Err(missing("person_name", index));
        }
        Ok(())
    }
}

/// Writes every record of `dataset` in one transaction.
pub fn load_dataset(
    conn: &mut Connection,
    dataset: &Dataset,
) -> Result<DatasetSummary, FixtureError> {
    let started_at = Instant::now();
    dataset.check_ids()?;

    let result = load_in_transaction(conn, dataset);
    match &result {
        Ok(summary) => info!(
            "event=dataset_load module=fixtures status=ok duration_ms={} attribute_types={} persons={} person_names={}",
            started_at.elapsed().as_millis(),
            summary.attribute_types,
            summary.persons,
            summary.person_names
        ),
        Err(err) => error!(
            "event=dataset_load module=fixtures status=error duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn load_in_transaction(
    conn: &mut Connection,
    dataset: &Dataset,
) -> Result<DatasetSummary, FixtureError> {
    let tx = conn.transaction()?;
    {
        let repo = SqlitePersonRepository::try_new(&tx)?;
        for attribute_type in &dataset.attribute_types {
            repo.save_attribute_type(attribute_type)?;
        }
        for person in &dataset.persons {
            repo.save_person(person)?;
        }
        for name in &dataset.person_names {
            repo.save_person_name(name)?;
        }
    }
    tx.commit()?;

    Ok(DatasetSummary {
        attribute_types: dataset.attribute_types.len(),
        persons: dataset.persons.len(),
        person_names: dataset.person_names.len(),
    })
}
