use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// HTTP listen address
    pub listen: String,
    /// Directory holding the boundary datasets
    pub data_dir: PathBuf,
    /// Keep non-root datasets in memory after the first load
    pub cache: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    pub layout: DatasetLayout,
}

/// File naming under `data_dir`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DatasetLayout {
    pub root_file: String,
    pub province_dir: String,
    pub city_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            data_dir: PathBuf::from("geodata"),
            cache: true,
            log_level: "info".to_string(),
            layout: DatasetLayout::default(),
        }
    }
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            root_file: "china.json".to_string(),
            province_dir: "province".to_string(),
            city_dir: "citys".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/srv/geodata"
            cache = false

            [layout]
            city_dir = "city"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/geodata"));
        assert!(!config.cache);
        assert_eq!(config.listen, "0.0.0.0:8000");
        assert_eq!(config.layout.root_file, "china.json");
        assert_eq!(config.layout.province_dir, "province");
        assert_eq!(config.layout.city_dir, "city");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("adlocate.toml");
        fs::write(&path, "listen = \"127.0.0.1:9000\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert!(config.cache);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::load_from_file("/nonexistent/adlocate.toml").is_err());
    }
}
