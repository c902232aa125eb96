//! Domain model for person records.
//!
//! # Responsibility
//! - Define the canonical person, person-name and attribute-type shapes.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Identifiers are store-assigned integers; `None` means "not yet saved".
//! - Records are never hard-deleted; `voided`/`retired` flags mark them.
//! - Persisted attribute-type snapshots and editable drafts are distinct types.

pub mod attribute_type;
pub mod person;
pub mod person_name;
