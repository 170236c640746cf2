use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::encoder::EncoderKind;

/// Persisted defaults for the converter. CLI flags override these per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Font size used when burning in subtitles
    pub subtitle_font_size: u32,
    /// Default output directory; unset means `<input>/converted`
    pub output_dir: Option<PathBuf>,
    /// Preferred encoder; unset means auto-detect
    pub encoder: Option<EncoderKind>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            subtitle_font_size: Self::DEFAULT_FONT_SIZE,
            output_dir: None,
            encoder: None,
        }
    }
}

impl ConvertConfig {
    pub const DEFAULT_FONT_SIZE: u32 = 20;

    pub fn load() -> Result<Self> {
        Self::load_from_path(config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents).context("parsing boxfit config")?;
        if config.subtitle_font_size == 0 {
            config.subtitle_font_size = Self::DEFAULT_FONT_SIZE;
        }
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("serializing boxfit config")?;
        fs::write(path, contents)
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }
}

fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("unable to determine user config directory")?;
    Ok(dir.join("boxfit").join("config.toml"))
}
