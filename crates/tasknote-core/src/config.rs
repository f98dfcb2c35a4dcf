use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::json_store::JsonStore;
use crate::store::TaskStore;
use crate::vault::VaultStore;

pub const DEFAULT_JSON_PATH: &str = "tasks.json";
pub const DEFAULT_VAULT_DIR: &str = "vault";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Json,
    Vault,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasknoteConfig {
    /// Which store this deployment uses.
    pub backend: Option<BackendKind>,
    /// JSON document path, relative to the config root unless absolute.
    pub json_path: Option<String>,
    /// Vault directory, relative to the config root unless absolute.
    pub vault_dir: Option<String>,
}

/// Fully resolved store settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub backend: BackendKind,
    pub backend_source: &'static str,
    pub json_path: PathBuf,
    pub vault_dir: PathBuf,
}

impl StoreConfig {
    pub fn json_store(&self) -> JsonStore {
        JsonStore::new(&self.json_path)
    }

    pub fn vault_store(&self) -> VaultStore {
        VaultStore::new(&self.vault_dir)
    }

    pub fn open_store(&self) -> Box<dyn TaskStore> {
        match self.backend {
            BackendKind::Json => Box::new(self.json_store()),
            BackendKind::Vault => Box::new(self.vault_store()),
        }
    }
}

pub fn config_filename_candidates() -> [&'static str; 2] {
    [".tasknote.toml", ".tasknoterc"]
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(".tasknote.toml")
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    for var in ["HOME", "USERPROFILE"] {
        if let Ok(value) = std::env::var(var) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
    }
    None
}

pub fn resolve_tasknote_home_dir() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("TASKNOTE_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".tasknote"))
}

pub fn global_config_path() -> Option<PathBuf> {
    resolve_tasknote_home_dir().map(|home| home.join("config.toml"))
}

pub fn find_config_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    for candidate in start.ancestors() {
        for name in config_filename_candidates() {
            if candidate.join(name).is_file() {
                return Some(candidate.to_path_buf());
            }
        }
    }
    None
}

fn read_config_file(path: &Path) -> Result<TasknoteConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    toml::from_str::<TasknoteConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_config(root: &Path) -> Result<Option<TasknoteConfig>, ConfigError> {
    for name in config_filename_candidates() {
        let path = root.join(name);
        if path.is_file() {
            return read_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

pub fn load_global_config() -> Result<Option<TasknoteConfig>, ConfigError> {
    match global_config_path() {
        Some(path) if path.is_file() => read_config_file(&path).map(Some),
        _ => Ok(None),
    }
}

pub fn write_config(root: &Path, config: &TasknoteConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path(root);
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Resolves store settings starting at `start`: the nearest project config
/// wins field by field over the global config, which wins over defaults.
pub fn resolve_store_config(start: &Path) -> Result<StoreConfig, ConfigError> {
    let root = find_config_root(start).unwrap_or_else(|| start.to_path_buf());
    let project = load_config(&root)?;
    let global = load_global_config()?;
    let layers = [(project.as_ref(), "project"), (global.as_ref(), "global")];

    let (backend, backend_source) = layers
        .iter()
        .find_map(|(config, source)| config.and_then(|c| c.backend).map(|b| (b, *source)))
        .unwrap_or((BackendKind::default(), "default"));
    let json_path = layers
        .iter()
        .find_map(|(config, _)| config.and_then(|c| c.json_path.clone()))
        .unwrap_or_else(|| DEFAULT_JSON_PATH.to_string());
    let vault_dir = layers
        .iter()
        .find_map(|(config, _)| config.and_then(|c| c.vault_dir.clone()))
        .unwrap_or_else(|| DEFAULT_VAULT_DIR.to_string());

    let resolved = StoreConfig {
        json_path: root.join(json_path),
        vault_dir: root.join(vault_dir),
        root,
        backend,
        backend_source,
    };
    debug!(
        backend = ?resolved.backend,
        source = backend_source,
        root = %resolved.root.display(),
        "resolved store config"
    );
    Ok(resolved)
}
