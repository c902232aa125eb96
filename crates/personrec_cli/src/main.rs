//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `personrec_core` linkage and store bootstrap from a shell.
//! - Optionally seed a store from a JSON data set and report row counts.
//!
//! Usage: `personrec_cli [DB_PATH] [DATASET_JSON]`. Without `DB_PATH` an
//! in-memory store is used. File logging starts only when
//! `PERSONREC_LOG_DIR` is set.

use personrec_core::db::{open_db, open_db_in_memory};
use personrec_core::{
    init_logging, load_dataset, Dataset, LoggingConfig, PersonRepository, SqlitePersonRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("personrec_core ping={}", personrec_core::ping());
    println!("personrec_core version={}", personrec_core::core_version());

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    if std::env::var_os(personrec_core::logging::LOG_DIR_ENV).is_some() {
        init_logging(&LoggingConfig::from_env()?)?;
    }

    let mut conn = match args.first() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    if let Some(dataset_path) = args.get(1) {
        let dataset = Dataset::from_file(dataset_path)?;
        let summary = load_dataset(&mut conn, &dataset)?;
        println!(
            "loaded attribute_types={} persons={} person_names={}",
            summary.attribute_types, summary.persons, summary.person_names
        );
    }

    let repo = SqlitePersonRepository::try_new(&conn)?;
    let attribute_types = repo.list_attribute_types(true)?;
    println!("attribute_types total={}", attribute_types.len());
    for attribute_type in attribute_types {
        println!(
            "  id={} name={} retired={}",
            attribute_type.id(),
            attribute_type.name(),
            attribute_type.retired()
        );
    }

    Ok(())
}
