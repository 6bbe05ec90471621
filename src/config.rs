//! Configuration loading with tier-based merging.
//!
//! Tiers, lowest to highest priority: embedded defaults, the user file
//! (`<config dir>/todo-store/config.yaml`), the project file (`./todo.yaml`),
//! an explicit `--config` file, then `TODO_*` environment variables.
//! Command-line flags are applied on top by the binary.

use crate::db::{DEFAULT_BUSY_TIMEOUT_MS, StoreOptions};
use crate::format::OutputFormat;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file used when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "todo_tasks.db";

pub const ENV_DB_PATH: &str = "TODO_DB";
pub const ENV_WAL: &str = "TODO_WAL";
pub const ENV_BUSY_TIMEOUT_MS: &str = "TODO_BUSY_TIMEOUT_MS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the database lives and how its connection is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_wal")]
    pub wal: bool,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            wal: default_wal(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            wal: self.wal,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_wal() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Files consulted for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub user_file: Option<PathBuf>,
    pub project_file: Option<PathBuf>,
    /// Must exist and parse when set.
    pub explicit_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Standard locations, plus an optional explicit file.
    pub fn discover(explicit_file: Option<PathBuf>) -> Self {
        Self {
            user_file: dirs::config_dir().map(|d| d.join("todo-store").join("config.yaml")),
            project_file: Some(PathBuf::from("todo.yaml")),
            explicit_file,
        }
    }
}

impl Config {
    /// Load and merge every tier, reading overrides from the process environment.
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        Self::load_with_env(paths, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(paths: &ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = serde_json::to_value(Config::default())?;

        for file in [&paths.user_file, &paths.project_file].into_iter().flatten() {
            match read_optional_tier(file) {
                Ok(Some(layer)) => {
                    debug!(path = %file.display(), "Loaded config tier");
                    merge_into(&mut merged, layer);
                }
                Ok(None) => {}
                Err(e) => warn!(path = %file.display(), error = %e, "Ignoring unreadable config file"),
            }
        }

        if let Some(file) = &paths.explicit_file {
            let layer = read_tier(file)?;
            merge_into(&mut merged, layer);
        }

        let mut config: Config =
            serde_json::from_value(merged).context("invalid configuration values")?;
        config.apply_env_overrides(env)?;
        Ok(config)
    }

    /// Apply `TODO_*` variables. Malformed values are errors, not silently ignored.
    pub fn apply_env_overrides<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = env(ENV_DB_PATH) {
            self.store.db_path = PathBuf::from(db_path);
        }

        if let Some(wal) = env(ENV_WAL) {
            self.store.wal = parse_bool(&wal)
                .with_context(|| format!("{} must be a boolean, got {:?}", ENV_WAL, wal))?;
        }

        if let Some(timeout) = env(ENV_BUSY_TIMEOUT_MS) {
            self.store.busy_timeout_ms = timeout.trim().parse().with_context(|| {
                format!("{} must be a number of milliseconds, got {:?}", ENV_BUSY_TIMEOUT_MS, timeout)
            })?;
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("unrecognized boolean"),
    }
}

fn read_tier(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse config file {}", path.display()))?;
    Ok(value)
}

fn read_optional_tier(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    read_tier(path).map(Some)
}

/// Merge `overlay` into `base` key by key. A null overlay leaves `base` alone.
fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_when_no_files_exist() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths {
            user_file: Some(temp.path().join("user.yaml")),
            project_file: Some(temp.path().join("todo.yaml")),
            explicit_file: None,
        };

        let config = Config::load_with_env(&paths, no_env).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.store.db_path, PathBuf::from("todo_tasks.db"));
        assert!(config.store.wal);
        assert_eq!(config.store.busy_timeout_ms, 5000);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn project_overrides_user_field_by_field() {
        let temp = TempDir::new().unwrap();
        let user = write(&temp, "user.yaml", "store:\n  db_path: user.db\n  busy_timeout_ms: 100\n");
        let project = write(&temp, "todo.yaml", "store:\n  db_path: project.db\n");

        let paths = ConfigPaths {
            user_file: Some(user),
            project_file: Some(project),
            explicit_file: None,
        };
        let config = Config::load_with_env(&paths, no_env).unwrap();

        assert_eq!(config.store.db_path, PathBuf::from("project.db"));
        assert_eq!(config.store.busy_timeout_ms, 100);
        assert!(config.store.wal);
    }

    #[test]
    fn explicit_file_must_exist() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths {
            explicit_file: Some(temp.path().join("missing.yaml")),
            ..ConfigPaths::default()
        };

        assert!(Config::load_with_env(&paths, no_env).is_err());
    }

    #[test]
    fn malformed_optional_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project = write(&temp, "todo.yaml", "store: [unclosed");
        let paths = ConfigPaths {
            project_file: Some(project),
            ..ConfigPaths::default()
        };

        let config = Config::load_with_env(&paths, no_env).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_overrides_files() {
        let temp = TempDir::new().unwrap();
        let explicit = write(&temp, "cfg.yaml", "store:\n  db_path: file.db\noutput:\n  format: json\n");
        let paths = ConfigPaths {
            explicit_file: Some(explicit),
            ..ConfigPaths::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "env.db"),
            (ENV_WAL, "off"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ]);

        let config =
            Config::load_with_env(&paths, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.store.db_path, PathBuf::from("env.db"));
        assert!(!config.store.wal);
        assert_eq!(config.store.busy_timeout_ms, 250);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn malformed_env_value_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(|key| (key == ENV_BUSY_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_BUSY_TIMEOUT_MS));
    }

    #[test]
    fn merge_keeps_base_on_null_overlay() {
        let mut base = json!({"store": {"wal": true, "db_path": "a.db"}});
        merge_into(&mut base, json!({"store": {"wal": null, "db_path": "b.db"}}));
        assert_eq!(base, json!({"store": {"wal": true, "db_path": "b.db"}}));
    }

    #[test]
    fn store_options_follow_config() {
        let store = StoreConfig {
            wal: false,
            busy_timeout_ms: 10,
            ..StoreConfig::default()
        };
        assert_eq!(
            store.options(),
            StoreOptions {
                wal: false,
                busy_timeout_ms: 10
            }
        );
    }
}
