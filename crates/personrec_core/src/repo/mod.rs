//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the person record access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes validate records before any SQL mutation.
//! - Lookup misses are `Ok(None)`; `NotFound` is reserved for operations
//!   that require an existing row.

pub mod person_repo;
