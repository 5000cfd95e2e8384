//! JSON configuration of the `traj_demo` tool.
//!
//! ```json
//! {
//!   "input": "data/planes.json",
//!   "params": { "max_steps": 5000, "vertex": { "hammer_doca": 3.0 } },
//!   "output": { "result_json": "out/report.json" }
//! }
//! ```
//!
//! `params` is optional and may be partial; missing fields keep their
//! defaults.

use crate::params::TrajParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ReconToolConfig {
    /// JSON file with an array of plane records.
    pub input: PathBuf,
    #[serde(default)]
    pub params: TrajParams,
    pub output: ReconOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ReconOutputConfig {
    pub result_json: PathBuf,
}

pub fn load_config(path: &Path) -> Result<ReconToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn parse_config(data: &str) -> Result<ReconToolConfig, serde_json::Error> {
    serde_json::from_str(data)
}
