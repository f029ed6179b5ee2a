use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::reader::{format_values, parse_values};
use crate::scoring::{ScoringRules, UpsertDecision};
use crate::types::{ActivityId, LeaderboardType, PlayerId, RankedRow, ScoreRecord, ScoreValues};

pub const SCORES_FILE: &str = "scores.csv";
pub const PLAYERS_FILE: &str = "players.csv";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Result of a conditional save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Replaced,
    Kept,
    // Nothing was attempted, e.g. a None leaderboard.
    Skipped,
}

/// Storage collaborator for rankings and conditional writes.
pub trait ScoreStore: Send + Sync {
    /// Every record of the activity in ranking order, ranks starting at 1.
    /// `since` keeps only records played at or after that unix time.
    fn ranking(
        &self,
        activity_id: ActivityId,
        leaderboard_type: LeaderboardType,
        rules: ScoringRules,
        since: Option<i64>,
    ) -> impl Future<Output = Result<Vec<RankedRow>>> + Send;

    /// Inserts, or replaces only when `values` beats the stored record.
    /// The compare and the write happen as one atomic step.
    fn save_if_better(
        &self,
        player_id: PlayerId,
        activity_id: ActivityId,
        values: ScoreValues,
        played_at: i64,
        rules: ScoringRules,
    ) -> impl Future<Output = Result<SaveOutcome>> + Send;
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct StoredScore {
    player_id: PlayerId,
    activity_id: ActivityId,
    leaderboard_type: u32,
    last_played: i64,
    values: String,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct StoredPlayer {
    player_id: PlayerId,
    name: String,
}

#[derive(Default)]
struct Tables {
    // (player_id, activity_id) -> best record
    scores: HashMap<(PlayerId, ActivityId), ScoreRecord>,
    // player_id -> display name
    players: HashMap<PlayerId, String>,
}

/// In-process store guarded by one lock, persisted as `;`-delimited CSV snapshots.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores `scores.csv` and `players.csv` from `dir`. Missing files give empty tables.
    pub async fn load(dir: &Path) -> Result<Self> {
        let mut tables = Tables::default();

        let players_path = dir.join(PLAYERS_FILE);
        if players_path.exists() {
            let bytes = tokio::fs::read(&players_path).await?;
            let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(bytes.as_slice());
            for result in rdr.deserialize() {
                let player: StoredPlayer = result?;
                tables.players.insert(player.player_id, player.name);
            }
        }

        let scores_path = dir.join(SCORES_FILE);
        if scores_path.exists() {
            let bytes = tokio::fs::read(&scores_path).await?;
            let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(bytes.as_slice());
            for result in rdr.deserialize() {
                let stored: StoredScore = result?;
                // Skip rows this build cannot interpret rather than refusing the whole snapshot.
                let leaderboard_type = match LeaderboardType::from_code(stored.leaderboard_type) {
                    Some(ty) => ty,
                    None => {
                        warn!(code = stored.leaderboard_type, "skipping stored score with unknown type");
                        continue;
                    }
                };
                let values = match parse_values(leaderboard_type, &stored.values) {
                    Ok(values) => values,
                    Err(err) => {
                        warn!(player_id = stored.player_id, activity_id = stored.activity_id, %err, "skipping stored score");
                        continue;
                    }
                };
                tables.scores.insert(
                    (stored.player_id, stored.activity_id),
                    ScoreRecord {
                        player_id: stored.player_id,
                        activity_id: stored.activity_id,
                        values,
                        last_played: stored.last_played,
                    },
                );
            }
        }

        debug!(scores = tables.scores.len(), players = tables.players.len(), "loaded snapshot");
        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    /// Writes the snapshot to `dir`, creating it when needed.
    pub async fn write(&self, dir: &Path) -> Result<()> {
        let (scores, players) = {
            let tables = self.tables.lock().await;

            let mut scores = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
            let mut records: Vec<&ScoreRecord> = tables.scores.values().collect();
            records.sort_by_key(|record| (record.activity_id, record.player_id));
            for record in records {
                scores.serialize(StoredScore {
                    player_id: record.player_id,
                    activity_id: record.activity_id,
                    leaderboard_type: record.values.leaderboard_type().code(),
                    last_played: record.last_played,
                    values: format_values(&record.values),
                })?;
            }

            let mut players = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
            let mut names: Vec<(&PlayerId, &String)> = tables.players.iter().collect();
            names.sort();
            for (player_id, name) in names {
                players.serialize(StoredPlayer {
                    player_id: *player_id,
                    name: name.clone(),
                })?;
            }

            (into_bytes(scores)?, into_bytes(players)?)
        };

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(SCORES_FILE), scores).await?;
        tokio::fs::write(dir.join(PLAYERS_FILE), players).await?;
        Ok(())
    }

    pub async fn register_player(&self, player_id: PlayerId, name: &str) {
        self.tables.lock().await.players.insert(player_id, name.to_string());
    }

    pub async fn record(&self, player_id: PlayerId, activity_id: ActivityId) -> Option<ScoreRecord> {
        self.tables.lock().await.scores.get(&(player_id, activity_id)).cloned()
    }

    pub async fn len(&self) -> usize {
        self.tables.lock().await.scores.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|err| std::io::Error::other(err.to_string()).into())
}

impl ScoreStore for MemoryStore {
    fn ranking(
        &self,
        activity_id: ActivityId,
        leaderboard_type: LeaderboardType,
        rules: ScoringRules,
        since: Option<i64>,
    ) -> impl Future<Output = Result<Vec<RankedRow>>> + Send {
        async move {
            let tables = self.tables.lock().await;

            let mut records: Vec<&ScoreRecord> = tables
                .scores
                .values()
                .filter(|record| record.activity_id == activity_id)
                .filter(|record| record.values.leaderboard_type() == leaderboard_type)
                .filter(|record| since.map_or(true, |since| record.last_played >= since))
                .collect();

            // Full ties fall back to who got there first, then player id.
            records.sort_by(|a, b| {
                rules
                    .rank_order(&a.values, &b.values)
                    .then(a.last_played.cmp(&b.last_played))
                    .then(a.player_id.cmp(&b.player_id))
            });

            let rows = records
                .into_iter()
                .enumerate()
                .map(|(idx, record)| RankedRow {
                    rank: (idx + 1) as u32,
                    player_id: record.player_id,
                    last_played: record.last_played,
                    num_played: 1,
                    name: tables
                        .players
                        .get(&record.player_id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                    values: record.values,
                })
                .collect();
            Ok(rows)
        }
    }

    fn save_if_better(
        &self,
        player_id: PlayerId,
        activity_id: ActivityId,
        values: ScoreValues,
        played_at: i64,
        rules: ScoringRules,
    ) -> impl Future<Output = Result<SaveOutcome>> + Send {
        async move {
            let mut tables = self.tables.lock().await;
            let key = (player_id, activity_id);

            let decision = rules.decide(tables.scores.get(&key).map(|record| &record.values), &values);
            let outcome = match decision {
                UpsertDecision::Insert => SaveOutcome::Inserted,
                UpsertDecision::Replace => SaveOutcome::Replaced,
                UpsertDecision::Keep => return Ok(SaveOutcome::Kept),
            };

            tables.scores.insert(
                key,
                ScoreRecord {
                    player_id,
                    activity_id,
                    values,
                    last_played: played_at,
                },
            );
            Ok(outcome)
        }
    }
}
