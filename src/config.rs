use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".student-records";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "Database.db";
const LOG_FILE_NAME: &str = "student-records.log";
/// Log files roll over once they reach 5 MiB.
const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_LOG_FILTER: &str = "student_records=debug";

const ENV_DB_PATH: &str = "STUDENT_RECORDS_DB";
const ENV_LOG_PATH: &str = "STUDENT_RECORDS_LOG";
const ENV_LOG_LEVEL: &str = "STUDENT_RECORDS_LOG_LEVEL";
const ENV_FOREIGN_KEYS: &str = "STUDENT_RECORDS_FOREIGN_KEYS";

/// Where the database lives and how the connection is configured.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// Applied as `PRAGMA foreign_keys` when the connection opens.
    pub enforce_foreign_keys: bool,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub path: PathBuf,
    /// Size at which the log rolls over to `<name>.old`.
    pub max_bytes: u64,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Config {
    /// Defaults rooted in the user's home directory, overridden by the
    /// `STUDENT_RECORDS_*` environment variables.
    pub fn load() -> Result<Self> {
        let data_dir = data_dir()?;
        Ok(Self::from_lookup(data_dir, |key| env::var(key).ok()))
    }

    /// Configuration for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            enforce_foreign_keys: true,
            log: LogConfig {
                path: env::temp_dir().join(LOG_FILE_NAME),
                max_bytes: LOG_MAX_BYTES,
                filter: DEFAULT_LOG_FILTER.to_string(),
            },
        }
    }

    /// Configuration for a database file at `path`, everything else default.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::in_memory()
        }
    }

    fn from_lookup(data_dir: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DB_FILE_NAME));
        let log_path = lookup(ENV_LOG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(LOG_FILE_NAME));
        let filter = lookup(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let enforce_foreign_keys = lookup(ENV_FOREIGN_KEYS)
            .map(|raw| parse_switch(&raw))
            .unwrap_or(true);

        Self {
            db_path: Some(db_path),
            enforce_foreign_keys,
            log: LogConfig {
                path: log_path,
                max_bytes: LOG_MAX_BYTES,
                filter,
            },
        }
    }
}

/// Anything except an explicit "off" value counts as enabled.
fn parse_switch(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_live_in_data_dir() {
        let config = Config::from_lookup(PathBuf::from("/home/me/.student-records"), |_| None);
        assert_eq!(
            config.db_path.as_deref(),
            Some(PathBuf::from("/home/me/.student-records/Database.db").as_path())
        );
        assert_eq!(
            config.log.path,
            PathBuf::from("/home/me/.student-records/student-records.log")
        );
        assert_eq!(config.log.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.log.filter, "student_records=debug");
        assert!(config.enforce_foreign_keys);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(
            PathBuf::from("/data"),
            lookup_from(&[
                ("STUDENT_RECORDS_DB", "/tmp/records.db"),
                ("STUDENT_RECORDS_LOG", "/tmp/records.log"),
                ("STUDENT_RECORDS_LOG_LEVEL", "student_records=warn"),
                ("STUDENT_RECORDS_FOREIGN_KEYS", "off"),
            ]),
        );
        assert_eq!(
            config.db_path.as_deref(),
            Some(PathBuf::from("/tmp/records.db").as_path())
        );
        assert_eq!(config.log.path, PathBuf::from("/tmp/records.log"));
        assert_eq!(config.log.filter, "student_records=warn");
        assert!(!config.enforce_foreign_keys);
    }

    #[test]
    fn switch_parsing() {
        assert!(!parse_switch("0"));
        assert!(!parse_switch(" FALSE "));
        assert!(parse_switch("1"));
        assert!(parse_switch("on"));
    }

    #[test]
    fn in_memory_has_no_db_path() {
        assert!(Config::in_memory().db_path.is_none());
        let file = Config::with_db_path("/tmp/x.db");
        assert_eq!(file.db_path, Some(PathBuf::from("/tmp/x.db")));
    }
}
