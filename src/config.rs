use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    #[serde(rename = "json")]
    Json,
}

/// Appearance settings for one render call.
///
/// Passed explicitly to every renderer; nothing about chart appearance is
/// held in shared state.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    /// Series color name (red, green, blue, ...). Blue when unset.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_histogram_bins() -> usize { 10 }

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: None,
            x_label: None,
            y_label: None,
            color: None,
            histogram_bins: default_histogram_bins(),
            format: OutputFormat::Png,
        }
    }
}

impl ChartConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
