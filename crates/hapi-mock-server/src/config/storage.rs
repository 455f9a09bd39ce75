//! Store directory configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory holding `rules.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesConfig {
    #[serde(default = "default_rules_directory")]
    pub directory: PathBuf,
}

fn default_rules_directory() -> PathBuf {
    PathBuf::from("rules")
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            directory: default_rules_directory(),
        }
    }
}

/// Directory holding `requests.json` and the per-request trace files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    #[serde(default = "default_recording_directory")]
    pub directory: PathBuf,
}

fn default_recording_directory() -> PathBuf {
    PathBuf::from("requests")
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            directory: default_recording_directory(),
        }
    }
}
