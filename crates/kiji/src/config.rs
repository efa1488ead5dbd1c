//! `blog.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use kiji_site::SiteConfig;

/// Configuration file structure (blog.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// Root of the `YYYY/MM/<file>` tree
    pub dir: PathBuf,
    /// Static files (images) served at the site root
    pub public_dir: Option<PathBuf>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/posts"),
            public_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub output: PathBuf,
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
            minify: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub live_reload: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            live_reload: true,
        }
    }
}

/// Load configuration from `path` if it exists.
///
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}
