use thiserror::Error;

use crate::types::{ActivityId, LeaderboardType};

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("activity {0} has no leaderboard definition")]
    UnknownActivity(ActivityId),

    #[error("malformed save arguments for {leaderboard_type:?}: {reason}")]
    MalformedSaveArguments {
        leaderboard_type: LeaderboardType,
        reason: String,
    },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("leaderboard type None cannot be {0}")]
    UnreachableType(&'static str),

    #[error("failed to read {path}: {reason}")]
    Config { path: String, reason: String },
}

impl From<std::io::Error> for LeaderboardError {
    fn from(err: std::io::Error) -> Self {
        LeaderboardError::StorageUnavailable(err.to_string())
    }
}

impl From<csv::Error> for LeaderboardError {
    fn from(err: csv::Error) -> Self {
        LeaderboardError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;
