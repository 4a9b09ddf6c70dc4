use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::EngineOptions,
    error::{Result, StoreError},
};

pub const DATA_DIR_ENV: &str = "RESERVEDB_DATA_DIR";
pub const DEFAULT_MAX_OPEN_FILES: i32 = 512;
const STORE_DIR_NAME: &str = "snapshots";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
    #[serde(default = "default_max_open_files")]
    pub max_open_files: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            data_dir: default_data_dir(),
            sync_writes: default_sync_writes(),
            max_open_files: default_max_open_files(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub data_dir: Option<PathBuf>,
    pub sync_writes: Option<bool>,
    pub max_open_files: Option<i32>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.data_dir.is_none() && self.sync_writes.is_none() && self.max_open_files.is_none()
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let mut path = default_config_root()?;
    path.push("config.toml");
    Ok(path)
}

/// Loads the config at `path` (or the default location), writing a fresh
/// default file when none exists yet. `RESERVEDB_DATA_DIR` overrides the
/// data directory without being persisted.
pub fn load_or_default(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        toml::from_str::<Config>(&contents)?
    } else {
        let cfg = Config::default();
        cfg.save(&config_path)?;
        cfg
    };

    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        cfg.data_dir = PathBuf::from(dir);
    }
    Ok((cfg, config_path))
}

impl Config {
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_update(&mut self, update: ConfigUpdate) -> Result<()> {
        if let Some(dir) = update.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(StoreError::Config("data_dir must not be empty".into()));
            }
            self.data_dir = dir;
        }
        if let Some(sync_writes) = update.sync_writes {
            self.sync_writes = sync_writes;
        }
        if let Some(max_open_files) = update.max_open_files {
            // -1 keeps every file open.
            if max_open_files == 0 || max_open_files < -1 {
                return Err(StoreError::Config(format!(
                    "max_open_files must be positive or -1, got {max_open_files}"
                )));
            }
            self.max_open_files = max_open_files;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_DIR_NAME)
    }

    pub fn logs_path(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            sync_writes: self.sync_writes,
            max_open_files: self.max_open_files,
        }
    }
}

fn default_config_root() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        Ok(home.join(".reservedb"))
    } else {
        env::current_dir()
            .map(|dir| dir.join(".reservedb"))
            .map_err(|err| StoreError::Config(err.to_string()))
    }
}

fn default_data_dir() -> PathBuf {
    default_config_root().unwrap_or_else(|_| PathBuf::from(".reservedb"))
}

fn default_sync_writes() -> bool {
    true
}

fn default_max_open_files() -> i32 {
    DEFAULT_MAX_OPEN_FILES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = toml::from_str(
            r#"
data_dir = "/var/lib/reservedb"
created_at = "2024-01-01T00:00:00Z"
updated_at = "2024-01-01T00:00:00Z"
"#,
        )
        .expect("minimal config should parse");
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/reservedb"));
        assert!(cfg.sync_writes);
        assert_eq!(cfg.max_open_files, DEFAULT_MAX_OPEN_FILES);
        assert_eq!(cfg.store_path(), PathBuf::from("/var/lib/reservedb/snapshots"));
        assert_eq!(cfg.logs_path(), PathBuf::from("/var/lib/reservedb/logs"));
    }

    #[test]
    fn default_logs_live_under_config_root() {
        let cfg = Config::default();
        let root = default_config_root().unwrap();
        assert_eq!(cfg.data_dir, root);
        assert_eq!(cfg.logs_path(), root.join("logs"));
    }

    #[test]
    fn applies_updates() {
        let mut config = Config::default();
        let before = config.updated_at;
        config
            .apply_update(ConfigUpdate {
                sync_writes: Some(false),
                max_open_files: Some(-1),
                ..ConfigUpdate::default()
            })
            .unwrap();
        assert!(!config.sync_writes);
        assert_eq!(config.engine_options().max_open_files, -1);
        assert!(config.updated_at >= before);
    }

    #[test]
    fn rejects_invalid_updates() {
        let mut config = Config::default();
        let err = config
            .apply_update(ConfigUpdate {
                max_open_files: Some(0),
                ..ConfigUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));

        let err = config
            .apply_update(ConfigUpdate {
                data_dir: Some(PathBuf::new()),
                ..ConfigUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_or_default_writes_and_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (created, created_path) = load_or_default(Some(path.clone())).unwrap();
        assert_eq!(created_path, path);
        assert!(path.exists());

        let mut updated = created.clone();
        updated
            .apply_update(ConfigUpdate {
                data_dir: Some(dir.path().join("data")),
                ..ConfigUpdate::default()
            })
            .unwrap();
        updated.save(&path).unwrap();

        let (reloaded, _) = load_or_default(Some(path)).unwrap();
        if env::var_os(DATA_DIR_ENV).is_none() {
            assert_eq!(reloaded.data_dir, dir.path().join("data"));
        }
        assert_eq!(reloaded.created_at, created.created_at);
    }
}
