// src/config.rs
use crate::error::ConfigError;
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use toml;

const CONFIG_FILE_NAME: &str = "keychain_inspector.toml";
const STORE_FILE_NAME: &str = "credentials.bin";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Access group passed to every store call. Empty means nothing selected.
    pub target_access_group: String,
    pub store_path: Option<PathBuf>,
    /// Access-group patterns this client may read and write.
    pub entitlements: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_access_group: String::new(),
            store_path: None,
            entitlements: vec!["*".to_string()],
        }
    }
}

impl Config {
    /// Configured store file, falling back to the platform data directory.
    pub fn resolved_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(STORE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(STORE_FILE_NAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "KeychainInspector", "KeychainInspector")
}

fn get_config_path() -> Option<PathBuf> {
    project_dirs().map(|proj_dirs| proj_dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn write_config(config_path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
            info!("Created config directory: {:?}", parent_dir);
        }
    }

    let toml_string = toml::to_string_pretty(config)?;
    let mut file = fs::File::create(config_path)?;
    file.write_all(toml_string.as_bytes())?;

    info!("Saved configuration to {:?}", config_path);
    Ok(())
}

fn read_config(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(
            "Config file not found at {:?}. Creating and using default configuration.",
            config_path
        );
        let default_config = Config::default();
        if let Err(e) = write_config(config_path, &default_config) {
            warn!("Failed to save default configuration: {}", e);
        }
        return default_config;
    }

    info!("Loading configuration from {:?}", config_path);
    match fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(loaded_config) => {
                info!("Configuration loaded successfully.");
                loaded_config
            }
            Err(e) => {
                warn!(
                    "Failed to parse config file at {:?}: {}. Using default configuration.",
                    config_path, e
                );
                Config::default()
            }
        },
        Err(e) => {
            warn!(
                "Failed to read config file at {:?}: {}. Using default configuration.",
                config_path, e
            );
            Config::default()
        }
    }
}

pub fn load_config() -> Config {
    match get_config_path() {
        Some(config_path) => read_config(&config_path),
        None => {
            warn!("Could not determine config directory. Using default configuration.");
            Config::default()
        }
    }
}

pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let config_path = get_config_path().ok_or(ConfigError::NoConfigDir)?;
    write_config(&config_path, config)
}
