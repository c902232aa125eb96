//! Person record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide save/lookup APIs for persons, person names and attribute types.
//! - Keep SQL details and column encodings inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Dates are stored as `YYYY-MM-DD`, birth times as `HH:MM:SS`.
//! - Saved-name lookups read the store and never the caller's draft.

use crate::db::migrations::{current_version, latest_version};
use crate::db::{missing_person_table, DbError};
use crate::model::attribute_type::{
    AttributeTypeDraft, AttributeTypeId, AttributeTypeValidationError, PersonAttributeType,
};
use crate::model::person::{Gender, Person, PersonId, PersonValidationError};
use crate::model::person_name::{PersonName, PersonNameId, PersonNameValidationError};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

const PERSON_SELECT_SQL: &str = "SELECT
    person_id,
    uuid,
    gender,
    birthdate,
    birthtime,
    birthdate_estimated,
    dead,
    death_date,
    voided
FROM person";

const PERSON_NAME_SELECT_SQL: &str = "SELECT
    person_name_id,
    uuid,
    person_id,
    preferred,
    given_name,
    middle_name,
    family_name,
    voided
FROM person_name";

const ATTRIBUTE_TYPE_SELECT_SQL: &str = "SELECT
    person_attribute_type_id,
    uuid,
    name,
    description,
    retired
FROM person_attribute_type";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from person record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Person(PersonValidationError),
    PersonName(PersonNameValidationError),
    AttributeType(AttributeTypeValidationError),
    Db(DbError),
    /// An operation required an existing row that is absent.
    NotFound { entity: &'static str, id: i64 },
    /// A record without an identifier was used where a saved one is required.
    NotPersisted(&'static str),
    /// A uniqueness or integrity constraint rejected the write.
    Conflict(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person(err) => write!(f, "{err}"),
            Self::PersonName(err) => write!(f, "{err}"),
            Self::AttributeType(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::NotPersisted(entity) => write!(f, "{entity} has not been saved yet"),
            Self::Conflict(message) => write!(f, "write conflict: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "person repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "person repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Person(err) => Some(err),
            Self::PersonName(err) => Some(err),
            Self::AttributeType(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::NotPersisted(_)
            | Self::Conflict(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Person(value)
    }
}

impl From<PersonNameValidationError> for RepoError {
    fn from(value: PersonNameValidationError) -> Self {
        Self::PersonName(value)
    }
}

impl From<AttributeTypeValidationError> for RepoError {
    fn from(value: AttributeTypeValidationError) -> Self {
        Self::AttributeType(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(message.unwrap_or_else(|| failure.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Data access contract for person records.
pub trait PersonRepository {
    /// Inserts or updates a person keyed by identifier and returns it.
    fn save_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn get_person_by_uuid(&self, uuid: Uuid) -> RepoResult<Option<Person>>;
    /// Saves a person and its names as one unit; on any error nothing is kept.
    ///
    /// Names are re-owned by the saved person id.
    fn save_person_with_names(
        &self,
        person: &Person,
        names: &[PersonName],
    ) -> RepoResult<PersonId>;

    /// Inserts or updates a name. The owning person must exist.
    fn save_person_name(&self, name: &PersonName) -> RepoResult<PersonNameId>;
    /// Returns `None` for any identifier without a row, negative ones included.
    fn get_person_name(&self, id: PersonNameId) -> RepoResult<Option<PersonName>>;
    /// Lists names of one person, preferred first.
    fn get_person_names(
        &self,
        person_id: PersonId,
        include_voided: bool,
    ) -> RepoResult<Vec<PersonName>>;

    /// Inserts or updates an attribute type and returns the stored snapshot.
    fn save_attribute_type(&self, draft: &AttributeTypeDraft) -> RepoResult<PersonAttributeType>;
    fn get_attribute_type(&self, id: AttributeTypeId) -> RepoResult<Option<PersonAttributeType>>;
    /// Case-insensitive exact match on the trimmed name.
    fn get_attribute_type_by_name(&self, name: &str) -> RepoResult<Option<PersonAttributeType>>;
    fn list_attribute_types(&self, include_retired: bool) -> RepoResult<Vec<PersonAttributeType>>;
    /// Returns the name persisted for the draft's identifier, ignoring any
    /// unsaved change carried by the draft itself.
    fn get_saved_attribute_type_name(&self, draft: &AttributeTypeDraft) -> RepoResult<String>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    /// - `MissingRequiredTable` when a person table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn write_person_with_names(
        &self,
        person: &Person,
        names: &[PersonName],
    ) -> RepoResult<PersonId> {
        let person_id = self.save_person(person)?;
        for name in names {
            let mut owned = name.clone();
            owned.person_id = person_id;
            self.save_person_name(&owned)?;
        }
        Ok(person_id)
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn save_person(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;

        self.conn.execute(
            "INSERT INTO person (
                person_id,
                uuid,
                gender,
                birthdate,
                birthtime,
                birthdate_estimated,
                dead,
                death_date,
                voided
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (person_id) DO UPDATE SET
                gender = excluded.gender,
                birthdate = excluded.birthdate,
                birthtime = excluded.birthtime,
                birthdate_estimated = excluded.birthdate_estimated,
                dead = excluded.dead,
                death_date = excluded.death_date,
                voided = excluded.voided,
                date_changed = (strftime('%s', 'now') * 1000);",
            params![
                person.id,
                person.uuid.to_string(),
                person.gender.map(Gender::code),
                person.birth_date.map(format_date),
                person.birth_time.map(format_time),
                bool_to_int(person.birth_date_estimated),
                bool_to_int(person.dead),
                person.death_date.map(format_date),
                bool_to_int(person.voided),
            ],
        )?;

        Ok(person.id.unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE person_id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn get_person_by_uuid(&self, uuid: Uuid) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn save_person_with_names(
        &self,
        person: &Person,
        names: &[PersonName],
    ) -> RepoResult<PersonId> {
        person.validate()?;
        for name in names {
            name.validate()?;
        }

        // Savepoints nest, so this also works inside a caller's transaction.
        self.conn.execute_batch("SAVEPOINT save_person_with_names;")?;
        let result = self.write_person_with_names(person, names);
        match &result {
            Ok(_) => self
                .conn
                .execute_batch("RELEASE save_person_with_names;")?,
            Err(_) => self.conn.execute_batch(
                "ROLLBACK TO save_person_with_names;
                 RELEASE save_person_with_names;",
            )?,
        }
        result
    }

    fn save_person_name(&self, name: &PersonName) -> RepoResult<PersonNameId> {
        name.validate()?;

        if !person_exists(self.conn, name.person_id)? {
            return Err(RepoError::NotFound {
                entity: "person",
                id: name.person_id,
            });
        }

        self.conn.execute(
            "INSERT INTO person_name (
                person_name_id,
                uuid,
                person_id,
                preferred,
                given_name,
                middle_name,
                family_name,
                voided
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (person_name_id) DO UPDATE SET
                person_id = excluded.person_id,
                preferred = excluded.preferred,
                given_name = excluded.given_name,
                middle_name = excluded.middle_name,
                family_name = excluded.family_name,
                voided = excluded.voided,
                date_changed = (strftime('%s', 'now') * 1000);",
            params![
                name.id,
                name.uuid.to_string(),
                name.person_id,
                bool_to_int(name.preferred),
                name.given_name.trim(),
                name.middle_name.as_deref(),
                name.family_name.as_deref(),
                bool_to_int(name.voided),
            ],
        )?;

        Ok(name.id.unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    fn get_person_name(&self, id: PersonNameId) -> RepoResult<Option<PersonName>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_NAME_SELECT_SQL} WHERE person_name_id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_name_row(row)?));
        }
        Ok(None)
    }

    fn get_person_names(
        &self,
        person_id: PersonId,
        include_voided: bool,
    ) -> RepoResult<Vec<PersonName>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_NAME_SELECT_SQL}
             WHERE person_id = ?1
               AND (?2 = 1 OR voided = 0)
             ORDER BY preferred DESC, person_name_id ASC;"
        ))?;
        let mut rows = stmt.query(params![person_id, bool_to_int(include_voided)])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(parse_person_name_row(row)?);
        }
        Ok(names)
    }

    fn save_attribute_type(&self, draft: &AttributeTypeDraft) -> RepoResult<PersonAttributeType> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO person_attribute_type (
                person_attribute_type_id,
                uuid,
                name,
                description,
                retired
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (person_attribute_type_id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                retired = excluded.retired,
                date_changed = (strftime('%s', 'now') * 1000);",
            params![
                draft.id,
                draft.uuid.to_string(),
                draft.name.trim(),
                draft.description.as_deref(),
                bool_to_int(draft.retired),
            ],
        )?;

        let id = draft.id.unwrap_or_else(|| self.conn.last_insert_rowid());
        self.get_attribute_type(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "person_attribute_type {id} missing right after save"
            ))
        })
    }

    fn get_attribute_type(&self, id: AttributeTypeId) -> RepoResult<Option<PersonAttributeType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_TYPE_SELECT_SQL} WHERE person_attribute_type_id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attribute_type_row(row)?));
        }
        Ok(None)
    }

    fn get_attribute_type_by_name(&self, name: &str) -> RepoResult<Option<PersonAttributeType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_TYPE_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE;"
        ))?;
        let mut rows = stmt.query([name.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attribute_type_row(row)?));
        }
        Ok(None)
    }

    fn list_attribute_types(&self, include_retired: bool) -> RepoResult<Vec<PersonAttributeType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_TYPE_SELECT_SQL}
             WHERE (?1 = 1 OR retired = 0)
             ORDER BY name COLLATE NOCASE ASC, person_attribute_type_id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_retired)])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(parse_attribute_type_row(row)?);
        }
        Ok(types)
    }

    fn get_saved_attribute_type_name(&self, draft: &AttributeTypeDraft) -> RepoResult<String> {
        let id = draft
            .id
            .ok_or(RepoError::NotPersisted("person_attribute_type"))?;

        self.conn
            .query_row(
                "SELECT name
                 FROM person_attribute_type
                 WHERE person_attribute_type_id = ?1;",
                [id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: "person_attribute_type",
                id,
            })
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let gender = match row.get::<_, Option<String>>("gender")? {
        Some(code) => Some(Gender::from_code(&code).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid gender `{code}` in person.gender"))
        })?),
        None => None,
    };

    let person = Person {
        id: Some(row.get("person_id")?),
        uuid: parse_uuid(&row.get::<_, String>("uuid")?, "person.uuid")?,
        gender,
        birth_date: parse_optional_date(row.get("birthdate")?, "person.birthdate")?,
        birth_time: parse_optional_time(row.get("birthtime")?, "person.birthtime")?,
        birth_date_estimated: int_to_bool(
            row.get("birthdate_estimated")?,
            "person.birthdate_estimated",
        )?,
        dead: int_to_bool(row.get("dead")?, "person.dead")?,
        death_date: parse_optional_date(row.get("death_date")?, "person.death_date")?,
        voided: int_to_bool(row.get("voided")?, "person.voided")?,
    };
    person.validate()?;
    Ok(person)
}

fn parse_person_name_row(row: &Row<'_>) -> RepoResult<PersonName> {
    let name = PersonName {
        id: Some(row.get("person_name_id")?),
        uuid: parse_uuid(&row.get::<_, String>("uuid")?, "person_name.uuid")?,
        person_id: row.get("person_id")?,
        given_name: row.get("given_name")?,
        middle_name: row.get("middle_name")?,
        family_name: row.get("family_name")?,
        preferred: int_to_bool(row.get("preferred")?, "person_name.preferred")?,
        voided: int_to_bool(row.get("voided")?, "person_name.voided")?,
    };
    name.validate()?;
    Ok(name)
}

fn parse_attribute_type_row(row: &Row<'_>) -> RepoResult<PersonAttributeType> {
    Ok(PersonAttributeType::from_row(
        row.get("person_attribute_type_id")?,
        parse_uuid(
            &row.get::<_, String>("uuid")?,
            "person_attribute_type.uuid",
        )?,
        row.get("name")?,
        row.get("description")?,
        int_to_bool(row.get("retired")?, "person_attribute_type.retired")?,
    ))
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_optional_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    value
        .map(|text| {
            NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!("invalid date `{text}` in {column}"))
            })
        })
        .transpose()
}

fn parse_optional_time(value: Option<String>, column: &str) -> RepoResult<Option<NaiveTime>> {
    value
        .map(|text| {
            NaiveTime::parse_from_str(&text, TIME_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!("invalid time `{text}` in {column}"))
            })
        })
        .transpose()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn person_exists(conn: &Connection, id: PersonId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM person WHERE person_id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if let Some(table) = missing_person_table(conn)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    Ok(())
}
