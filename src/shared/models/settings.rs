use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

const SETTINGS_FILENAME: &str = "settings.json";
const SETTINGS_PATH_ENV: &str = "TASK_MANAGER_SETTINGS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Which task/user store the server runs on. Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redb,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tcp_socket_binding: String,
    pub tcp_socket_port: u16,
    pub storage: StorageBackend,
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_expiration_in_minutes: u64,
    pub default_admin_email: String,
    pub default_admin_password: String,
    pub log_level: String,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tcp_socket_binding: "0.0.0.0".to_string(),
            tcp_socket_port: 3000,
            storage: StorageBackend::Memory,
            database_path: "tasks.redb".to_string(),
            jwt_secret: "dev-secret-change-in-production".to_string(),
            jwt_expiration_in_minutes: 24 * 60,
            default_admin_email: "admin@localhost".to_string(),
            default_admin_password: "adminadmin".to_string(),
            log_level: "info".to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// Load settings from `$TASK_MANAGER_SETTINGS`, or `settings.json` in the working directory.
    ///
    /// A missing default file means compiled defaults; a missing file named through the
    /// environment is an error.
    pub fn load() -> Result<Settings, ConfigError> {
        match std::env::var_os(SETTINGS_PATH_ENV) {
            Some(path) => Settings::from_path(Path::new(&path)),
            None => match fs::read_to_string(SETTINGS_FILENAME) {
                Ok(content) => Settings::parse(&content, Path::new(SETTINGS_FILENAME)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
                Err(e) => Err(ConfigError::ReadFile {
                    path: PathBuf::from(SETTINGS_FILENAME),
                    source: e,
                }),
            },
        }
    }

    pub fn from_path(path: &Path) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Settings::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Settings, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.tcp_socket_binding, self.tcp_socket_port)
    }
}

/// Upper bounds, in milliseconds, for each usecase's trip to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub task_create: u64,
    pub task_update: u64,
    pub task_delete: u64,
    pub task_get: u64,
    pub task_list: u64,
    pub user_create: u64,
    pub user_login: u64,
    pub user_delete: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            task_create: 5_000,
            task_update: 5_000,
            task_delete: 5_000,
            task_get: 5_000,
            task_list: 8_000,
            user_create: 5_000,
            user_login: 5_000,
            user_delete: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.tcp_socket_port, 3000);
        assert_eq!(settings.storage, StorageBackend::Memory);
        assert_eq!(settings.timeouts, Timeouts::default());
        assert_eq!(settings.jwt_expiration_in_minutes, 1440);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let json = r#"{
            "tcp_socket_port": 8080,
            "storage": "redb",
            "timeouts": { "task_list": 100 }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.tcp_socket_port, 8080);
        assert_eq!(settings.storage, StorageBackend::Redb);
        assert_eq!(settings.timeouts.task_list, 100);
        assert_eq!(settings.timeouts.task_get, 5_000);
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn unknown_backend_rejected() {
        let result: Result<Settings, _> = serde_json::from_str(r#"{"storage": "mongo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = Settings::from_path(Path::new("/nonexistent/settings.json"));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
