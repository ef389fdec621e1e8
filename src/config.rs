use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::store::xlsx::DEFAULT_SHEET;
use crate::utils::data_dir;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Xlsx,
}

/// Settings read from `config.toml`. Every key is optional, relative
/// defaults live next to the config file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub backend: Backend,
    pub database: PathBuf,
    pub workbook: PathBuf,
    pub sheet: String,
    /// Workbook merged into the database every time it is opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<PathBuf>,
}

impl Config {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            backend: Backend::default(),
            database: dir.join("jobinfo.db"),
            workbook: dir.join("Project3Data.xlsx"),
            sheet: DEFAULT_SHEET.to_string(),
            seed: None,
        }
    }

    pub fn parse(text: &str, dir: &Path) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Partial {
            backend: Option<Backend>,
            database: Option<PathBuf>,
            workbook: Option<PathBuf>,
            sheet: Option<String>,
            seed: Option<PathBuf>,
        }

        let partial: Partial = toml::from_str(text)?;
        let defaults = Self::in_dir(dir);
        Ok(Self {
            backend: partial.backend.unwrap_or(defaults.backend),
            database: partial.database.unwrap_or(defaults.database),
            workbook: partial.workbook.unwrap_or(defaults.workbook),
            sheet: partial.sheet.unwrap_or(defaults.sheet),
            seed: partial.seed,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(CONFIG_FILE))
}

/// Reads the config at `path`, falling back to defaults when it does not exist
pub fn read_config(path: &Path) -> Result<Config> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => data_dir()?.to_path_buf(),
    };
    match std::fs::read_to_string(path) {
        Ok(text) => Config::parse(&text, &dir)
            .with_context(|| format!("Invalid config file {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::in_dir(&dir))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

pub fn generate_config(path: &Path, force: bool) -> Result<Config> {
    if path.exists() && !force {
        return Err(anyhow!(
            "Config file {} already exists, use --force to overwrite",
            path.display()
        ));
    }
    let dir = path
        .parent()
        .ok_or(anyhow!("Config path has no parent directory"))?;
    std::fs::create_dir_all(dir)?;
    let config = Config::in_dir(dir);
    std::fs::write(path, toml::to_string_pretty(&config)?)?;

    Ok(config)
}
