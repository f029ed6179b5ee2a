use std::path::Path;

use crate::error::{LeaderboardError, Result};
use crate::scoring::ScoringRules;

/// Process settings for the leaderboard tools.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    // Directory holding the scores/players snapshot.
    pub data_dir: String,
    // JSON content table of activity definitions.
    pub activities_path: String,
    // Survival ranks by time before points when set.
    pub survival_time_first: bool,
    pub log_filter: String,
    pub replay_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: "data".to_string(),
            activities_path: "data/activities.json".to_string(),
            survival_time_first: false,
            log_filter: "info".to_string(),
            replay_workers: 4,
        }
    }

    /// Reads the config JSON. Returns `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|err| LeaderboardError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|err| LeaderboardError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(Some(config))
    }

    pub fn rules(&self) -> ScoringRules {
        ScoringRules {
            survival_time_first: self.survival_time_first,
        }
    }
}
