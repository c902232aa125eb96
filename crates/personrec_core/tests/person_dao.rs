mod common;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::seeded_connection;
use personrec_core::db::migrations::latest_version;
use personrec_core::db::open_db_in_memory;
use personrec_core::{
    Gender, Person, PersonName, PersonRepository, PersonValidationError, RepoError,
    SqlitePersonRepository,
};
use rusqlite::Connection;

#[test]
fn get_saved_attribute_type_name_ignores_unsaved_draft_changes() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let snapshot = repo.get_attribute_type(1).unwrap().unwrap();
    let original_name = snapshot.name().to_string();
    let new_name = "Race Updated";
    assert_ne!(original_name, new_name);

    let mut draft = snapshot.edit();
    draft.name = new_name.to_string();

    let saved_name = repo.get_saved_attribute_type_name(&draft).unwrap();
    assert_eq!(saved_name, original_name);
    assert_eq!(snapshot.name(), original_name);
}

#[test]
fn get_saved_attribute_type_name_reports_missing_and_unsaved_types() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut missing = repo.get_attribute_type(1).unwrap().unwrap().edit();
    missing.id = Some(9_999);
    let err = repo.get_saved_attribute_type_name(&missing).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "person_attribute_type",
            id: 9_999
        }
    ));

    let unsaved = personrec_core::AttributeTypeDraft::new("Mother's Name");
    let err = repo.get_saved_attribute_type_name(&unsaved).unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted("person_attribute_type")));
}

#[test]
fn get_person_name_returns_record_for_known_id() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let name = repo.get_person_name(2).unwrap().unwrap();
    assert_eq!(name.id, Some(2));
    assert_eq!(name.person_id, 2);
    assert_eq!(name.full_name(), "Johnny Test Doe");
}

#[test]
fn get_person_name_returns_none_for_invalid_ids() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    assert!(repo.get_person_name(-1).unwrap().is_none());
    assert!(repo.get_person_name(0).unwrap().is_none());
    assert!(repo.get_person_name(i64::MAX).unwrap().is_none());
}

#[test]
fn save_person_with_birth_date_time_roundtrips_exactly() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = Person::with_id(345);
    person.set_birth_time(NaiveTime::parse_from_str("15:23:56", "%H:%M:%S").unwrap());
    person.birth_date = Some(NaiveDate::parse_from_str("2012-05-29", "%Y-%m-%d").unwrap());
    person.dead = false;
    person.voided = false;
    person.birth_date_estimated = false;
    repo.save_person(&person).unwrap();

    let saved = repo.get_person(345).unwrap().unwrap();
    let expected =
        NaiveDateTime::parse_from_str("2012-05-29 15:23:56", "%Y-%m-%d %H:%M:%S").unwrap();
    assert_eq!(saved.birth_date_time(), Some(expected));
}

#[test]
fn save_person_without_birth_time_keeps_date_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = Person::with_id(10);
    person.birth_date = NaiveDate::from_ymd_opt(2001, 2, 3);
    repo.save_person(&person).unwrap();

    let saved = repo.get_person(10).unwrap().unwrap();
    assert_eq!(saved.birth_time, None);
    assert_eq!(
        saved.birth_date_time(),
        NaiveDate::from_ymd_opt(2001, 2, 3).and_then(|date| date.and_hms_opt(0, 0, 0))
    );

    let stored_time: Option<String> = conn
        .query_row("SELECT birthtime FROM person WHERE person_id = 10;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored_time, None);
}

#[test]
fn saving_same_person_twice_leaves_state_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = Person::with_id(77);
    person.gender = Some(Gender::Female);
    person.birth_date = NaiveDate::from_ymd_opt(1990, 12, 31);
    person.set_birth_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap());

    repo.save_person(&person).unwrap();
    let first = repo.get_person(77).unwrap().unwrap();
    repo.save_person(&person).unwrap();
    let second = repo.get_person(77).unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(first, person);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM person;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn save_person_updates_existing_row_by_id() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = repo.get_person(1).unwrap().unwrap();
    person.dead = true;
    person.death_date = NaiveDate::from_ymd_opt(2020, 6, 1);
    repo.save_person(&person).unwrap();

    let reloaded = repo.get_person(1).unwrap().unwrap();
    assert!(reloaded.dead);
    assert_eq!(reloaded.death_date, NaiveDate::from_ymd_opt(2020, 6, 1));
    assert_eq!(reloaded.uuid, person.uuid);
}

#[test]
fn save_person_without_id_assigns_one() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let person = Person::new();
    let id = repo.save_person(&person).unwrap();
    assert!(id > 501);

    let by_uuid = repo.get_person_by_uuid(person.uuid).unwrap().unwrap();
    assert_eq!(by_uuid.id, Some(id));
}

#[test]
fn save_person_rejects_invalid_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = Person::with_id(1);
    person.birth_time = NaiveTime::from_hms_opt(8, 0, 0);
    let err = repo.save_person(&person).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Person(PersonValidationError::BirthTimeWithoutDate)
    ));
    assert!(repo.get_person(1).unwrap().is_none());
}

#[test]
fn save_person_with_duplicate_uuid_is_a_conflict() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let existing = repo.get_person(1).unwrap().unwrap();
    let mut clone = Person::with_id(900);
    clone.uuid = existing.uuid;

    let err = repo.save_person(&clone).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn get_person_returns_none_for_unknown_id() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    assert!(repo.get_person(-1).unwrap().is_none());
    assert!(repo.get_person(12_345).unwrap().is_none());
}

#[test]
fn save_person_name_requires_existing_owner() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let orphan = PersonName::new(4_242, "Nobody");
    let err = repo.save_person_name(&orphan).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "person",
            id: 4_242
        }
    ));
}

#[test]
fn save_person_name_inserts_and_updates() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut name = PersonName::new(1, "Admin");
    name.family_name = Some("Account".to_string());
    let id = repo.save_person_name(&name).unwrap();

    name.id = Some(id);
    name.given_name = "Administrator".to_string();
    repo.save_person_name(&name).unwrap();

    let reloaded = repo.get_person_name(id).unwrap().unwrap();
    assert_eq!(reloaded.given_name, "Administrator");
    assert_eq!(reloaded.family_name.as_deref(), Some("Account"));
}

#[test]
fn get_person_names_orders_preferred_first_and_hides_voided() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let active: Vec<_> = repo
        .get_person_names(2, false)
        .unwrap()
        .into_iter()
        .map(|name| name.id)
        .collect();
    assert_eq!(active, vec![Some(2), Some(4)]);

    let all: Vec<_> = repo
        .get_person_names(2, true)
        .unwrap()
        .into_iter()
        .map(|name| name.id)
        .collect();
    assert_eq!(all, vec![Some(2), Some(3), Some(4)]);
}

#[test]
fn reading_corrupt_birth_time_is_rejected() {
    let conn = seeded_connection();
    conn.execute(
        "UPDATE person SET birthtime = 'quarter past three' WHERE person_id = 2;",
        [],
    )
    .unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let err = repo.get_person(2).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("person.birthtime")));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqlitePersonRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_person_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqlitePersonRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("person"))));
}

#[test]
fn save_person_rejects_sub_second_birth_time_instead_of_truncating() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = Person::with_id(345);
    person.birth_date = NaiveDate::from_ymd_opt(2012, 5, 29);
    person.birth_time = NaiveTime::from_hms_milli_opt(15, 23, 56, 500);

    let err = repo.save_person(&person).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Person(PersonValidationError::SubSecondBirthTime(_))
    ));
    assert!(repo.get_person(345).unwrap().is_none());

    person.set_birth_time(person.birth_time.unwrap());
    repo.save_person(&person).unwrap();
    let saved = repo.get_person(345).unwrap().unwrap();
    assert_eq!(saved.birth_date_time(), person.birth_date_time());
}

#[test]
fn dataset_with_sub_second_birth_time_fails_to_load() {
    let mut conn = open_db_in_memory().unwrap();
    let dataset = personrec_core::Dataset::from_json_str(
        r#"{ "persons": [{ "id": 9, "birth_date": "2012-05-29", "birth_time": "15:23:56.750" }] }"#,
    )
    .unwrap();

    let err = personrec_core::load_dataset(&mut conn, &dataset).unwrap_err();
    assert!(matches!(
        err,
        personrec_core::FixtureError::Repo(RepoError::Person(
            PersonValidationError::SubSecondBirthTime(_)
        ))
    ));

    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    assert!(repo.get_person(9).unwrap().is_none());
}

#[test]
fn save_person_with_names_keeps_nothing_when_a_name_fails() {
    let conn = seeded_connection();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let person = Person::with_id(42);
    let names = [PersonName::new(0, "Ada"), PersonName::new(0, "   ")];
    let err = repo.save_person_with_names(&person, &names).unwrap_err();
    assert!(matches!(err, RepoError::PersonName(_)));
    assert!(repo.get_person(42).unwrap().is_none());

    let mut clash = PersonName::new(0, "Ada");
    clash.uuid = repo.get_person_name(2).unwrap().unwrap().uuid;
    let err = repo
        .save_person_with_names(&person, &[PersonName::new(0, "Ada"), clash])
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
    assert!(repo.get_person(42).unwrap().is_none());
    assert!(repo.get_person_names(42, true).unwrap().is_empty());
}
