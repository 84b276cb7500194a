use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Flags controlling normalization for a session.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    /// Use parsed hierarchies verbatim; rule tables aren't loaded
    pub skip_fixing: bool,
    /// Keep empty levels instead of hoisting, and render them as empty slots
    pub allow_empty_levels: bool,
    /// Partial geocodes count as geocoded unless a recheck is requested
    pub include_partials: bool,
    /// Rule file, or directory of rule files
    pub rules: Option<PathBuf>,
    /// User rule file whose geocoder fixes take precedence
    pub user_geocoder_fixes: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skip_fixing: false,
            allow_empty_levels: false,
            include_partials: true,
            rules: None,
            user_geocoder_fixes: None,
        }
    }
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Settings =
            toml::from_str(&content).context("Failed to parse settings file")?;
        Ok(settings)
    }
}
