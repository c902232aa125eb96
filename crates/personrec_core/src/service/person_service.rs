//! Person use-case service.
//!
//! # Responsibility
//! - Provide the entry points callers use instead of the raw repository.
//! - Compose repository calls for multi-step person workflows.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Service layer remains storage-agnostic.

use crate::model::attribute_type::{AttributeTypeDraft, AttributeTypeId, PersonAttributeType};
use crate::model::person::{Person, PersonId};
use crate::model::person_name::{PersonName, PersonNameId};
use crate::repo::person_repo::{PersonRepository, RepoError, RepoResult};
use log::{debug, info};
use uuid::Uuid;

/// Outcome of an attribute type rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedAttributeType {
    /// Name that was persisted before the rename.
    pub previous_name: String,
    /// Snapshot read back after the rename.
    pub current: PersonAttributeType,
}

/// Use-case service wrapper for person records.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn save_person(&self, person: &Person) -> RepoResult<PersonId> {
        self.repo.save_person(person)
    }

    pub fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.repo.get_person(id)
    }

    pub fn get_person_by_uuid(&self, uuid: Uuid) -> RepoResult<Option<Person>> {
        self.repo.get_person_by_uuid(uuid)
    }

    pub fn save_person_name(&self, name: &PersonName) -> RepoResult<PersonNameId> {
        self.repo.save_person_name(name)
    }

    pub fn get_person_name(&self, id: PersonNameId) -> RepoResult<Option<PersonName>> {
        self.repo.get_person_name(id)
    }

    pub fn get_person_names(
        &self,
        person_id: PersonId,
        include_voided: bool,
    ) -> RepoResult<Vec<PersonName>> {
        self.repo.get_person_names(person_id, include_voided)
    }

    pub fn save_attribute_type(
        &self,
        draft: &AttributeTypeDraft,
    ) -> RepoResult<PersonAttributeType> {
        self.repo.save_attribute_type(draft)
    }

    pub fn get_attribute_type(
        &self,
        id: AttributeTypeId,
    ) -> RepoResult<Option<PersonAttributeType>> {
        self.repo.get_attribute_type(id)
    }

    pub fn get_attribute_type_by_name(
        &self,
        name: &str,
    ) -> RepoResult<Option<PersonAttributeType>> {
        self.repo.get_attribute_type_by_name(name)
    }

    pub fn list_attribute_types(
        &self,
        include_retired: bool,
    ) -> RepoResult<Vec<PersonAttributeType>> {
        self.repo.list_attribute_types(include_retired)
    }

    pub fn get_saved_attribute_type_name(&self, draft: &AttributeTypeDraft) -> RepoResult<String> {
        self.repo.get_saved_attribute_type_name(draft)
    }

    /// Renames an attribute type and reports the name it replaced.
    ///
    /// # Errors
    /// - `NotFound` when no attribute type has `id`.
    /// - Validation/conflict errors from the repository unchanged.
    pub fn rename_attribute_type(
        &self,
        id: AttributeTypeId,
        new_name: &str,
    ) -> RepoResult<RenamedAttributeType> {
        let snapshot = self
            .repo
            .get_attribute_type(id)?
            .ok_or(RepoError::NotFound {
                entity: "person_attribute_type",
                id,
            })?;

        let mut draft = snapshot.edit();
        draft.name = new_name.to_string();

        let previous_name = self.repo.get_saved_attribute_type_name(&draft)?;
        let current = self.repo.save_attribute_type(&draft)?;
        info!(
            "event=attribute_type_rename module=service status=ok attribute_type_id={id} name_changed={}",
            previous_name != current.name()
        );

        Ok(RenamedAttributeType {
            previous_name,
            current,
        })
    }

    /// Saves a person together with its names.
    ///
    /// Names are re-owned by the saved person id, so callers may build them
    /// before the person has an identifier. A failing name leaves no person
    /// row behind.
    pub fn register_person(&self, person: &Person, names: &[PersonName]) -> RepoResult<PersonId> {
        let person_id = self.repo.save_person_with_names(person, names)?;
        debug!(
            "event=person_register module=service status=ok person_id={person_id} name_count={}",
            names.len()
        );
        Ok(person_id)
    }
}
