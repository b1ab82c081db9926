use crate::detector::params::DEFAULT_SENSITIVITY;
use crate::SplitterParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct SplitToolConfig {
    pub input: PathBuf,
    /// Expected page count; absent or `0` selects automatic mode.
    #[serde(default)]
    pub pages: Option<usize>,
    /// 1..=10 preset for the separator height bounds. Explicit values in
    /// `splitter` win over the preset.
    #[serde(default)]
    pub sensitivity: Option<u8>,
    #[serde(default)]
    pub splitter: Option<serde_json::Value>,
    #[serde(default)]
    pub output: SplitOutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SplitOutputConfig {
    /// Directory receiving one PNG per kept page.
    pub pages_dir: Option<PathBuf>,
    /// File name prefix of the page PNGs.
    pub page_prefix: Option<String>,
    pub report_json: Option<PathBuf>,
    /// Number of candidates listed in the text summary.
    pub top_candidates: Option<usize>,
}

impl SplitOutputConfig {
    pub fn prefix(&self) -> &str {
        self.page_prefix.as_deref().unwrap_or("page")
    }

    pub fn top_candidates(&self) -> usize {
        self.top_candidates.unwrap_or(20)
    }
}

impl SplitToolConfig {
    /// Splitter parameters: sensitivity preset first, then explicit overrides.
    pub fn splitter_params(&self) -> Result<SplitterParams, String> {
        let sensitivity = self.sensitivity.unwrap_or(DEFAULT_SENSITIVITY);
        let preset = SplitterParams::from_sensitivity(sensitivity).map_err(|e| e.to_string())?;
        match &self.splitter {
            None => Ok(preset),
            Some(overrides) => merge_params(preset, overrides),
        }
    }
}

/// Overlay the keys present in `overrides` onto `base`.
pub fn merge_params(
    base: SplitterParams,
    overrides: &serde_json::Value,
) -> Result<SplitterParams, String> {
    let mut merged = serde_json::to_value(&base)
        .map_err(|e| format!("Failed to serialize splitter params: {e}"))?;
    merge_json(&mut merged, overrides);
    serde_json::from_value(merged).map_err(|e| format!("Invalid splitter params: {e}"))
}

fn merge_json(base: &mut serde_json::Value, overrides: &serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(dst), serde_json::Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        dst.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

pub fn load_config(path: &Path) -> Result<SplitToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_sensitivity() {
        let config: SplitToolConfig = serde_json::from_str(
            r#"{
                "input": "strip.png",
                "pages": 4,
                "sensitivity": 8,
                "splitter": {"max_separator_height": 60, "selection": {"min_score": 55.0}}
            }"#,
        )
        .unwrap();
        let params = config.splitter_params().unwrap();
        assert_eq!(params.min_separator_height, 3);
        assert_eq!(params.max_separator_height, 60);
        assert_eq!(params.selection.min_score, 55.0);
        assert_eq!(params.selection.search_fraction, 0.4);
        assert_eq!(config.output.top_candidates(), 20);
    }

    #[test]
    fn bad_sensitivity_is_reported() {
        let config: SplitToolConfig =
            serde_json::from_str(r#"{"input": "a.png", "sensitivity": 12}"#).unwrap();
        assert!(config.splitter_params().is_err());
    }
}
