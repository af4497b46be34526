use serde_json::{json, Value};
use student_records::models::{Course, Department};
use student_records::{AccessError, Bridge, Config, Database, Record, Table};
use tempfile::TempDir;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn setup() -> Bridge {
    Bridge::spawn(Database::open_in_memory().unwrap()).unwrap()
}

#[tokio::test]
async fn query_all_lists_declared_columns_for_every_table() {
    let bridge = setup();
    let api = bridge.expose().my_api;

    for table in Table::ALL {
        let result = api.query_all(table).await.unwrap();
        let expected: Vec<&str> = table.columns().iter().map(|c| c.name).collect();
        assert_eq!(result.columns, expected, "columns of {table}");
    }
}

#[tokio::test]
async fn unknown_table_name_is_rejected() {
    let bridge = setup();
    let api = bridge.expose().my_api;

    let err = api.query_all_by_name("grades").await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidTable(name) if name == "grades"));
}

#[tokio::test]
async fn crud_round_trip_through_the_bridge() {
    let bridge = setup();
    let api = bridge.expose().my_api;

    let values = record(json!({
        "professor_id": 3,
        "professor_name": "Noether",
        "address": "Erlangen",
        "phone_number": "555-0133",
        "email_address": "emmy@example.com",
    }));
    let id = api
        .insert_into_table(Table::Professor, values.clone())
        .await
        .unwrap();
    assert_eq!(id, 3);
    assert_eq!(api.query_one(Table::Professor, id).await.unwrap(), values);

    let message = api
        .update_table_row(
            Table::Professor,
            "professor_id",
            id,
            record(json!({"address": "Bryn Mawr"})),
        )
        .await
        .unwrap();
    assert_eq!(message, "Row updated in professor");

    let updated = api.query_one(Table::Professor, id).await.unwrap();
    assert_eq!(updated["address"], json!("Bryn Mawr"));
    assert_eq!(updated["professor_name"], json!("Noether"));
    assert_eq!(updated["email_address"], json!("emmy@example.com"));

    api.delete_table_row(Table::Professor, id, "professor_id")
        .await
        .unwrap();
    let err = api.query_one(Table::Professor, id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn miss_fails_instead_of_hanging() {
    let bridge = setup();
    let api = bridge.expose().my_api;

    let err = api.query_one(Table::Course, 12345).await.unwrap_err();
    assert!(
        matches!(&err, AccessError::NotFound { table, key } if table == "courses" && key == "12345")
    );
}

#[tokio::test]
async fn concurrent_inserts_with_distinct_keys() {
    let bridge = setup();
    let api = bridge.expose().my_api;
    let other = api.clone();

    let (first, second) = tokio::join!(
        api.insert_into_table(
            Table::Department,
            record(json!({"department_id": 1, "department_name": "Art"})),
        ),
        other.insert_into_table(
            Table::Department,
            record(json!({"department_id": 2, "department_name": "Music"})),
        ),
    );
    assert_eq!(first.unwrap(), 1);
    assert_eq!(second.unwrap(), 2);

    let art: Department = api.fetch(1).await.unwrap();
    let music: Department = api.fetch(2).await.unwrap();
    assert_eq!(art.department_name, "Art");
    assert_eq!(music.department_name, "Music");
}

#[tokio::test]
async fn typed_insert_and_fetch() {
    let bridge = setup();
    let api = bridge.expose().my_api;

    let course = Course {
        course_id: 101,
        course_name: "Compilers".into(),
        instructor_name: "Hopper".into(),
        start_time: "13:00".into(),
        end_time: "14:30".into(),
        course_description: "From source to machine code".into(),
    };
    assert_eq!(api.insert(&course).await.unwrap(), 101);
    let fetched: Course = api.fetch(101).await.unwrap();
    assert_eq!(fetched, course);
}

#[tokio::test]
async fn raw_capabilities_run_arbitrary_sql() {
    let bridge = setup();
    let caps = bridge.expose();

    caps.insert_user
        .insert_user(
            "INSERT INTO department (department_id, department_name) VALUES (?, ?)",
            vec![json!(8), json!("Linguistics")],
        )
        .await
        .unwrap();

    let row = caps
        .db_get
        .db_get(
            "SELECT department_name FROM department WHERE department_id = ?",
            vec![json!(8)],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["department_name"], json!("Linguistics"));

    let none = caps
        .db_get
        .db_get("SELECT * FROM department WHERE department_id = ?", vec![json!(9)])
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn calls_after_close_report_bridge_closed() {
    let bridge = setup();
    let api = bridge.expose().my_api;

    bridge.close().unwrap();

    let err = api.query_all(Table::Student).await.unwrap_err();
    assert!(matches!(err, AccessError::BridgeClosed));
}

#[tokio::test]
async fn close_drains_requests_queued_before_it() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_db_path(temp_dir.path().join("Database.db"));
    let bridge = Bridge::spawn(Database::open(&config).unwrap()).unwrap();
    let api = bridge.expose().my_api;

    let pending = tokio::spawn(async move {
        api.insert_into_table(
            Table::Department,
            record(json!({"department_id": 9, "department_name": "Astronomy"})),
        )
        .await
    });
    // Let the insert reach the worker queue before shutting down.
    tokio::task::yield_now().await;

    bridge.close().unwrap();
    assert_eq!(pending.await.unwrap().unwrap(), 9);

    let reopened = Database::open(&config).unwrap();
    let row = student_records::db::query_one(reopened.conn(), Table::Department, &json!(9))
        .unwrap();
    assert_eq!(row["department_name"], json!("Astronomy"));
}
