use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::defaults::AppConfig;
use super::paths::AppPaths;
use super::validation::validate_config;
use crate::core::errors::ApiError;

#[derive(Debug, Clone)]
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    /// Resolves `config.yml` from `STEPFLOW_CONFIG_PATH`, then the user data
    /// dir, then the project root.
    pub fn new(paths: &AppPaths) -> Self {
        Self {
            config_path: resolve_config_path(paths),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads and validates the config. A missing or unparsable file yields
    /// defaults; a file with out-of-range values is an error.
    pub fn load_config(&self) -> Result<AppConfig, ApiError> {
        let raw = load_yaml_file(&self.config_path);
        validate_config(&raw)?;
        serde_json::from_value(raw).map_err(|err| {
            ApiError::BadRequest(format!(
                "Invalid config at '{}': {}",
                self.config_path.display(),
                err
            ))
        })
    }
}

fn resolve_config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("STEPFLOW_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return user_config;
    }

    paths.project_root.join("config.yml")
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring unparsable config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}
