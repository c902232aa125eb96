#![allow(dead_code)]

use personrec_core::db::open_db_in_memory;
use personrec_core::{load_dataset, Dataset};
use rusqlite::Connection;

pub const STANDARD_DATASET: &str = include_str!("../fixtures/standard_dataset.json");

/// Opens a migrated in-memory store seeded with the standard data set.
pub fn seeded_connection() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    let dataset = Dataset::from_json_str(STANDARD_DATASET).unwrap();
    load_dataset(&mut conn, &dataset).unwrap();
    conn
}
