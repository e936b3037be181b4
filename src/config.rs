use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "trip-checklist-tui";

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub session_cookie: Option<String>,
    pub trip_id: Option<u64>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub session_cookie: Option<String>,
    pub trip_id: u64,
    pub log_file: PathBuf,
}

/// Values given on the command line, applied last.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub trip_id: Option<u64>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("trip-checklist.log")
}

impl FileConfig {
    pub fn from_toml_str(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the file if it exists; a missing file is an empty config.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Applies `TRIPCHECK_*` variables from `lookup` over the file values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TRIPCHECK_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(session) = lookup("TRIPCHECK_SESSION") {
            self.session_cookie = Some(session);
        }
        if let Some(value) = lookup("TRIPCHECK_TRIP_ID") {
            let id = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "TRIPCHECK_TRIP_ID",
                    value,
                })?;
            self.trip_id = Some(id);
        }
        if let Some(path) = lookup("TRIPCHECK_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn finish(self, overrides: Overrides) -> Result<Config, ConfigError> {
        let api_url = overrides
            .api_url
            .or(self.api_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("api_url"))?;
        let trip_id = overrides
            .trip_id
            .or(self.trip_id)
            .ok_or(ConfigError::Missing("trip_id"))?;

        Ok(Config {
            api_url,
            session_cookie: self.session_cookie.filter(|s| !s.trim().is_empty()),
            trip_id,
            log_file: self.log_file.unwrap_or_else(default_log_path),
        })
    }
}

impl Config {
    /// File, then environment (after `.env`), then command line.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Config, ConfigError> {
        let mut file = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => FileConfig::read(&path)?,
            None => FileConfig::default(),
        };
        file.apply_env(|key| std::env::var(key).ok())?;
        file.finish(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_values_are_used() {
        let file = FileConfig::from_toml_str(
            Path::new("config.toml"),
            r#"
api_url = "https://trips.example.com/api/"
session_cookie = "sessionid=abc"
trip_id = 5
log_file = "/tmp/trip.log"
"#,
        )
        .unwrap();

        let config = file.finish(Overrides::default()).unwrap();
        assert_eq!(config.api_url, "https://trips.example.com/api");
        assert_eq!(config.session_cookie.as_deref(), Some("sessionid=abc"));
        assert_eq!(config.trip_id, 5);
        assert_eq!(config.log_file, PathBuf::from("/tmp/trip.log"));
    }

    #[test]
    fn test_env_then_cli_override_file() {
        let mut file = FileConfig {
            api_url: Some("https://file.example.com".to_string()),
            trip_id: Some(1),
            ..Default::default()
        };
        file.apply_env(env(&[
            ("TRIPCHECK_API_URL", "https://env.example.com"),
            ("TRIPCHECK_TRIP_ID", "7"),
        ]))
        .unwrap();

        let config = file
            .finish(Overrides {
                api_url: None,
                trip_id: Some(9),
            })
            .unwrap();
        assert_eq!(config.api_url, "https://env.example.com");
        assert_eq!(config.trip_id, 9);
        assert_eq!(config.session_cookie, None);
    }

    #[test]
    fn test_invalid_trip_id_in_env() {
        let mut file = FileConfig::default();
        let err = file
            .apply_env(env(&[("TRIPCHECK_TRIP_ID", "five")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "TRIPCHECK_TRIP_ID",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_required_settings() {
        let err = FileConfig::default()
            .finish(Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("api_url")));

        let file = FileConfig {
            api_url: Some("http://localhost:8000".to_string()),
            ..Default::default()
        };
        let err = file.finish(Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("trip_id")));
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let path = std::env::temp_dir().join("trip-checklist-tui-does-not-exist.toml");
        assert_eq!(FileConfig::read(&path).unwrap(), FileConfig::default());
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let err = FileConfig::from_toml_str(Path::new("bad.toml"), "trip_id = \"x\"").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
