//! Per-activity leaderboards: rank stored scores, cut the window around a
//! requesting player, render it in the row protocol, and keep each player's
//! best score per activity.

pub mod activity;
pub mod config;
pub mod error;
pub mod reader;
pub mod scoring;
pub mod service;
pub mod store;
pub mod types;
pub mod window;
pub mod writer;

pub use activity::{ActivityLookup, ActivityTable, ActivityTypeResolver};
pub use config::Config;
pub use error::{LeaderboardError, Result};
pub use scoring::{ScoringRules, UpsertDecision};
pub use service::{LeaderboardResponse, LeaderboardService};
pub use store::{MemoryStore, SaveOutcome, ScoreStore};
pub use types::{ActivityId, ConnectionId, InfoType, LeaderboardType, PlayerId, RankedRow, ScoreRecord, ScoreValues};
pub use window::LeaderboardWindow;
pub use writer::LeaderboardPayload;
