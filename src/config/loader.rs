//! Load declarative metadata and backend catalogs from JSON (strings, files, or a config directory).

use crate::backend::{ActionCatalog, SchemaCatalog};
use crate::config::AppConfig;
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const APP_CONFIG_FILE: &str = "app.json";
pub const SCHEMA_CATALOG_FILE: &str = "schemas.json";
pub const ACTION_CATALOG_FILE: &str = "actions.json";

/// Config directory. From env `AUIX_CONFIG_DIR`, default `auix`.
pub fn config_dir() -> PathBuf {
    std::env::var("AUIX_CONFIG_DIR")
        .unwrap_or_else(|_| "auix".into())
        .into()
}

pub fn load_from_str<T: DeserializeOwned>(json: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_from_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    tracing::debug!(path = %path.display(), "loading config file");
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Everything found in a config directory. Catalog files are optional.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub app: AppConfig,
    pub schemas: Option<SchemaCatalog>,
    pub actions: Option<ActionCatalog>,
}

pub fn load_from_dir(dir: &Path) -> Result<LoadedConfig, ConfigError> {
    let app = load_from_file(&dir.join(APP_CONFIG_FILE))?;
    let schemas = optional(&dir.join(SCHEMA_CATALOG_FILE))?;
    let actions = optional(&dir.join(ACTION_CATALOG_FILE))?;
    if schemas.is_none() && actions.is_none() {
        return Err(ConfigError::Load(format!(
            "{}: neither {} nor {} present",
            dir.display(),
            SCHEMA_CATALOG_FILE,
            ACTION_CATALOG_FILE
        )));
    }
    Ok(LoadedConfig { app, schemas, actions })
}

fn optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if path.exists() {
        load_from_file(path).map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_from_str() {
        let app: AppConfig = load_from_str(
            r#"{
                "resources": [{"name": "product", "schema": "Inventory.Product", "fields": [{"name": "reference", "length": 30}]}],
                "layouts": [{"resource": "product", "form": ["reference"]}],
                "naming_policy": {"hidden": ["^id$"]}
            }"#,
        )
        .unwrap();
        assert_eq!(app.resources.len(), 1);
        assert_eq!(app.resources[0].fields[0].length, Some(30));
        assert_eq!(app.layouts[0].resource, "product");
        assert_eq!(app.naming_policy.hidden, vec!["^id$".to_string()]);
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        let err = load_from_str::<AppConfig>("{").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn missing_directory_is_a_load_error() {
        let err = load_from_dir(Path::new("/nonexistent/auix")).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
