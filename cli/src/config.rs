//! Configuration file and caller identity resolution

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "pool.toml";
pub const DEFAULT_STATE_PATH: &str = "pool.json";
pub const DEFAULT_ACCOUNT: &str = "default";

/// Contents of `pool.toml`; every key is optional
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub state_path: Option<PathBuf>,
    pub default_account: Option<String>,
    pub default_fee: Option<u64>,
}

impl FileConfig {
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Resolved settings: command-line flag > config file > built-in default
#[derive(Debug)]
pub struct PoolConfig {
    pub state_path: PathBuf,
    pub account: String,
    pub default_fee: u128,
    pub config_path: Option<PathBuf>,
}

impl PoolConfig {
    pub fn new(
        config_path: Option<PathBuf>,
        state_path: Option<PathBuf>,
        account: Option<String>,
    ) -> Result<Self> {
        let (file, config_path) = match config_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                (load_file(&path)?, Some(path))
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    (load_file(&path)?, Some(path))
                } else {
                    (FileConfig::default(), None)
                }
            }
        };

        Ok(Self::resolve(file, config_path, state_path, account))
    }

    fn resolve(
        file: FileConfig,
        config_path: Option<PathBuf>,
        state_path: Option<PathBuf>,
        account: Option<String>,
    ) -> Self {
        Self {
            state_path: state_path
                .or(file.state_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            account: account
                .or(file.default_account)
                .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
            default_fee: file.default_fee.map(u128::from).unwrap_or(0),
            config_path,
        }
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    FileConfig::parse(&data, path)
}
