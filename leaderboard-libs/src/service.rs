use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, info, warn};

use crate::activity::{ActivityLookup, ActivityTypeResolver};
use crate::error::{LeaderboardError, Result};
use crate::scoring::ScoringRules;
use crate::store::{SaveOutcome, ScoreStore};
use crate::types::{ActivityId, ConnectionId, InfoType, LeaderboardType, PlayerId, ScoreValues};
use crate::window::{self, LeaderboardWindow};
use crate::writer::{self, LeaderboardPayload};

/// Serialized leaderboard addressed to one client connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardResponse {
    pub target: ConnectionId,
    pub payload: LeaderboardPayload,
}

/// Answers leaderboard reads and score saves on top of a store and the activity table.
pub struct LeaderboardService<S, L> {
    store: S,
    resolver: ActivityTypeResolver<L>,
    rules: ScoringRules,
}

/// Unix time of Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> i64 {
    let days = now.weekday().num_days_from_monday() as i64;
    let monday = now.date_naive() - Duration::days(days);
    monday
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp())
        .unwrap_or_else(|| now.timestamp())
}

impl<S: ScoreStore, L: ActivityLookup> LeaderboardService<S, L> {
    pub fn new(store: S, lookup: L, rules: ScoringRules) -> Self {
        Self {
            store,
            resolver: ActivityTypeResolver::new(lookup),
            rules,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &ActivityTypeResolver<L> {
        &self.resolver
    }

    pub fn rules(&self) -> ScoringRules {
        self.rules
    }

    /// Resolves the type, ranks the activity and cuts the window for `requester`.
    pub async fn build_window(
        &self,
        activity_id: ActivityId,
        info_type: InfoType,
        weekly: bool,
        requester: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<(LeaderboardType, LeaderboardWindow)> {
        let leaderboard_type = self.resolver.resolve(activity_id);
        if leaderboard_type == LeaderboardType::None {
            warn!(activity_id, "leaderboard requested for an activity of type None");
            return Ok((leaderboard_type, LeaderboardWindow::empty()));
        }

        let since = if weekly { Some(week_start(now)) } else { None };
        let ranking = self.store.ranking(activity_id, leaderboard_type, self.rules, since).await?;

        let window = match info_type {
            InfoType::Top => window::select_top(&ranking),
            InfoType::Standings | InfoType::MyStanding => window::select(&ranking, requester),
        };
        debug!(
            activity_id,
            total = ranking.len(),
            start_rank = window.start_rank,
            rows = window.rows.len(),
            "built leaderboard window"
        );
        Ok((leaderboard_type, window))
    }

    pub async fn get_leaderboard_at(
        &self,
        activity_id: ActivityId,
        info_type: InfoType,
        weekly: bool,
        target: ConnectionId,
        requester: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardResponse> {
        let (leaderboard_type, window) = self.build_window(activity_id, info_type, weekly, requester, now).await?;
        Ok(LeaderboardResponse {
            target,
            payload: writer::serialize(&window, leaderboard_type),
        })
    }

    pub async fn get_leaderboard(
        &self,
        activity_id: ActivityId,
        info_type: InfoType,
        weekly: bool,
        target: ConnectionId,
        requester: PlayerId,
    ) -> Result<LeaderboardResponse> {
        self.get_leaderboard_at(activity_id, info_type, weekly, target, requester, Utc::now())
            .await
    }

    pub async fn save_score_at(
        &self,
        player_id: PlayerId,
        activity_id: ActivityId,
        leaderboard_type: LeaderboardType,
        values: ScoreValues,
        played_at: i64,
    ) -> Result<SaveOutcome> {
        if leaderboard_type == LeaderboardType::None {
            warn!(player_id, activity_id, "saving a score of type None, ignoring");
            return Ok(SaveOutcome::Skipped);
        }
        if values.leaderboard_type() != leaderboard_type {
            return Err(LeaderboardError::MalformedSaveArguments {
                leaderboard_type,
                reason: format!("values are for {:?}", values.leaderboard_type()),
            });
        }

        let outcome = self
            .store
            .save_if_better(player_id, activity_id, values, played_at, self.rules)
            .await?;
        info!(player_id, activity_id, ?outcome, "saved score");
        Ok(outcome)
    }

    pub async fn save_score(
        &self,
        player_id: PlayerId,
        activity_id: ActivityId,
        leaderboard_type: LeaderboardType,
        values: ScoreValues,
    ) -> Result<SaveOutcome> {
        self.save_score_at(player_id, activity_id, leaderboard_type, values, Utc::now().timestamp())
            .await
    }
}
