use serde_json::{json, Value};
use student_records::db::{self, Database, Record, Table};
use student_records::Config;
use tempfile::TempDir;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn setup(enforce_foreign_keys: bool) -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::with_db_path(temp_dir.path().join("data").join("Database.db"));
    config.enforce_foreign_keys = enforce_foreign_keys;
    (temp_dir, config)
}

#[test]
fn schema_bootstrap_is_idempotent_across_reopen() {
    let (_temp, config) = setup(true);

    let database = Database::open(&config).unwrap();
    db::insert_into_table(
        database.conn(),
        Table::Department,
        &record(json!({"department_id": 1, "department_name": "Geology"})),
    )
    .unwrap();
    database.close().unwrap();

    let reopened = Database::open(&config).unwrap();
    let all = db::query_all(reopened.conn(), Table::Department).unwrap();
    assert_eq!(all.rows.len(), 1);
    assert_eq!(all.rows[0]["department_name"], json!("Geology"));
}

#[test]
fn foreign_key_enforcement_follows_config() {
    let (_temp, config) = setup(true);
    let database = Database::open(&config).unwrap();
    assert!(database.foreign_keys_enabled().unwrap());

    let orphan = record(json!({
        "schedule_id": 1,
        "student_id": 42,
        "course_id": 42,
        "start_time": "08:00",
        "end_time": "09:00",
        "room_number": "A1",
    }));
    let err = db::insert_into_table(database.conn(), Table::Schedule, &orphan).unwrap_err();
    assert!(err.is_constraint_violation());

    let (_temp_off, config_off) = setup(false);
    let relaxed = Database::open(&config_off).unwrap();
    assert!(!relaxed.foreign_keys_enabled().unwrap());
    assert_eq!(
        db::insert_into_table(relaxed.conn(), Table::Schedule, &orphan).unwrap(),
        1
    );
}

#[test]
fn find_one_distinguishes_found_and_missing() {
    let database = Database::open_in_memory().unwrap();
    db::insert_into_table(
        database.conn(),
        Table::Department,
        &record(json!({"department_id": 5, "department_name": "Biology"})),
    )
    .unwrap();

    let found = db::find_one(database.conn(), Table::Department, &json!(5)).unwrap();
    assert_eq!(
        found.into_option().unwrap()["department_name"],
        json!("Biology")
    );
    assert_eq!(
        db::find_one(database.conn(), Table::Department, &json!(6)).unwrap(),
        db::Lookup::NotFound
    );
}

#[test]
fn table_columns_come_from_introspection() {
    let database = Database::open_in_memory().unwrap();
    let columns = db::table_columns(database.conn(), Table::Schedule).unwrap();
    assert_eq!(
        columns,
        [
            "schedule_id",
            "student_id",
            "course_id",
            "start_time",
            "end_time",
            "room_number"
        ]
    );
}
