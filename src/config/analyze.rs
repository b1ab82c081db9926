use crate::analyzer::AnalyzerParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct AnalyzeToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub analyzer: AnalyzerParams,
    #[serde(default)]
    pub output: AnalyzeOutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeOutputConfig {
    pub report_json: Option<PathBuf>,
    /// Include every sampled row in the JSON report.
    pub include_rows: bool,
    /// Number of possible separators listed in the text summary.
    pub max_listed: Option<usize>,
}

pub fn load_config(path: &Path) -> Result<AnalyzeToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
