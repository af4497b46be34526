use student_records::config::LogConfig;
use student_records::logging;
use tempfile::TempDir;

#[test]
fn init_reports_an_already_installed_subscriber() {
    tracing_subscriber::fmt()
        .with_writer(std::io::sink)
        .try_init()
        .unwrap();

    let dir = TempDir::new().unwrap();
    let config = LogConfig {
        path: dir.path().join("records.log"),
        max_bytes: 1024,
        filter: "student_records=debug".to_string(),
    };

    let err = logging::init(&config).unwrap_err();
    assert!(err.to_string().contains("log subscriber"));
    assert!(config.path.exists(), "log file is still created");
}
