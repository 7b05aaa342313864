//! Project configuration
//!
//! `mozusync.toml` holds task-level `[options]`, named `[targets.<name>]`
//! and the `[watch]` section. It is layered with figment (defaults, then the
//! file, then `MOZUSYNC_` environment variables) and kept as a JSON tree in a
//! [`SharedConfig`] so watch adapters can rewrite keys at runtime.

use crate::watch::WatchAdapterConfig;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const CONFIG_FILE: &str = "mozusync.toml";
pub const ENV_PREFIX: &str = "MOZUSYNC_";
pub const DEFAULT_ACTION: &str = "upload";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No target named `{0}` in the project configuration")]
    UnknownTarget(String),

    #[error("Invalid configuration for `{key}`: {message}")]
    Invalid { key: String, message: String },
}

/// Options of one sync run, after merging task and target options
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SyncOptions {
    #[serde(default = "default_action")]
    pub action: String,

    pub application_key: Option<String>,

    pub context: Option<ContextOptions>,

    #[serde(default)]
    pub no_clobber: bool,

    #[serde(default)]
    pub no_store_auth: bool,

    /// Overrides the action's own solo policy
    pub solo_only: Option<bool>,

    #[serde(default)]
    pub watch_adapters: Vec<WatchAdapterConfig>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            action: default_action(),
            application_key: None,
            context: None,
            no_clobber: false,
            no_store_auth: false,
            solo_only: None,
            watch_adapters: Vec::new(),
        }
    }
}

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ContextOptions {
    pub base_url: Option<String>,
    pub developer_account: Option<DeveloperAccount>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct DeveloperAccount {
    pub email_address: Option<String>,
    pub password: Option<String>,
}

/// One `{src, dest}` rename pair
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RenameFile {
    pub src: String,
    pub dest: String,
}

/// File data of a target
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct TargetData {
    /// Glob patterns or literal paths to upload
    #[serde(default)]
    pub src: Vec<String>,

    /// Remote paths to delete
    #[serde(default)]
    pub remove: Vec<String>,

    #[serde(default)]
    pub files: Vec<RenameFile>,
}

#[derive(Deserialize, Debug, Clone, Default)]
struct RawTarget {
    #[serde(default)]
    options: Value,
    #[serde(flatten)]
    data: TargetData,
}

/// Options and data for one target
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub name: String,
    pub options: SyncOptions,
    pub data: TargetData,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct WatchSection {
    /// Targets re-run after a watch adapter rewrites configuration
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// Locates and loads `mozusync.toml`
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use `path`, or `mozusync.toml` in the current directory
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            config_path: path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE)),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory that relative paths in the configuration resolve against
    pub fn project_root(&self) -> PathBuf {
        match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Load with layered priority: ENV > file > defaults
    pub fn load(&self) -> Result<Value> {
        let mut figment = Figment::new().merge(Serialized::defaults(json!({
            "options": { "action": DEFAULT_ACTION },
            "targets": {},
            "watch": { "tasks": [] },
        })));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        } else {
            log::debug!("No configuration file at {}", self.config_path.display());
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().context("Failed to load configuration")
    }
}

/// Deep-merge `overlay` into `base`; overlay wins on conflicts
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_values(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, Value::Null) if !base.is_null() => {}
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Names of all configured targets
pub fn target_names(config: &Value) -> Vec<String> {
    config
        .get("targets")
        .and_then(Value::as_object)
        .map(|targets| targets.keys().cloned().collect())
        .unwrap_or_default()
}

/// Merge task options with a target's options and read its file data
pub fn resolve_target(config: &Value, name: &str) -> Result<ResolvedTarget, ConfigError> {
    let raw = config
        .get("targets")
        .and_then(|targets| targets.get(name))
        .ok_or_else(|| ConfigError::UnknownTarget(name.to_string()))?;
    let raw: RawTarget = serde_json::from_value(raw.clone()).map_err(|e| ConfigError::Invalid {
        key: format!("targets.{name}"),
        message: e.to_string(),
    })?;

    let mut options = config
        .get("options")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    merge_values(&mut options, &raw.options);

    let options: SyncOptions = serde_json::from_value(options).map_err(|e| ConfigError::Invalid {
        key: format!("targets.{name}.options"),
        message: e.to_string(),
    })?;

    Ok(ResolvedTarget {
        name: name.to_string(),
        options,
        data: raw.data,
    })
}

pub fn watch_section(config: &Value) -> WatchSection {
    config
        .get("watch")
        .cloned()
        .and_then(|watch| serde_json::from_value(watch).ok())
        .unwrap_or_default()
}

/// Configuration tree shared between the watch adapters and sync runs
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<Mutex<Value>>,
}

impl SharedConfig {
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Copy of the whole tree
    pub fn snapshot(&self) -> Value {
        self.inner
            .lock()
            .map(|value| value.clone())
            .unwrap_or(Value::Null)
    }

    /// Value at a dotted key such as `targets.upload.src`
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.inner.lock().ok()?;
        key.split('.')
            .try_fold(&*value, |current, part| current.get(part))
            .cloned()
    }

    /// Set a dotted key, creating intermediate tables
    pub fn set(&self, key: &str, new_value: Value) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            key: key.to_string(),
            message: message.to_string(),
        };
        let mut root = self
            .inner
            .lock()
            .map_err(|_| invalid("configuration lock poisoned"))?;

        let parts: Vec<&str> = key.split('.').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid("empty key segment"));
        }

        let mut current = &mut *root;
        for part in &parts[..parts.len() - 1] {
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            current = current
                .as_object_mut()
                .ok_or_else(|| invalid(&format!("expected a table at '{part}'")))?
                .entry(part.to_string())
                .or_insert(Value::Null);
        }

        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current
            .as_object_mut()
            .ok_or_else(|| invalid("expected a table"))?
            .insert(parts[parts.len() - 1].to_string(), new_value);
        Ok(())
    }
}
