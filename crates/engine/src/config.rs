use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnConfig {
    pub video_root: PathBuf,
    pub subtitle_root: PathBuf,
    pub output_root: PathBuf,
    pub fonts_dir: PathBuf,
    pub accel: AccelConfig,
    pub style: StyleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelConfig {
    pub enabled: bool,
    pub category: AccelCategory,
    /// Quality in the selected encoder's native unit system. None picks the
    /// per-encoder default.
    pub quality: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelCategory {
    Auto,
    Nvidia,
    Amd,
    Intel,
    Apple,
    Cpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_size: Option<u32>,
    pub margin_v: Option<u32>,
    /// Numeric-keypad alignment, 1-9. 2 is bottom-center.
    pub alignment: Option<u8>,
    /// Font family name, or a path to a font file.
    pub font: Option<String>,
    pub outline: Option<u32>,
    pub shadow: Option<u32>,
    /// Pick a per-language font when no explicit font is set.
    pub auto_font: bool,
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            video_root: PathBuf::from("videos"),
            subtitle_root: PathBuf::from("subtitles"),
            output_root: PathBuf::from("output"),
            fonts_dir: PathBuf::from("fonts"),
            accel: AccelConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            category: AccelCategory::Auto,
            quality: None,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_size: None,
            margin_v: None,
            alignment: None,
            font: None,
            outline: None,
            shadow: None,
            auto_font: true,
        }
    }
}

pub fn load_config(path: Option<&std::path::Path>) -> Result<BurnConfig> {
    let config = if let Some(config_path) = path {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

            toml::from_str::<BurnConfig>(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?
        } else {
            #[cfg(not(test))]
            tracing::warn!("Config file not found at {:?}, using defaults", config_path);
            BurnConfig::default()
        }
    } else {
        BurnConfig::default()
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &BurnConfig) -> Result<()> {
    if let Some(alignment) = config.style.alignment {
        if !(1..=9).contains(&alignment) {
            anyhow::bail!("style.alignment must be between 1 and 9 (numeric keypad layout)");
        }
    }

    Ok(())
}
