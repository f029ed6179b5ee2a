use std::fmt;
use std::path::Path;
use std::sync::Arc;

use flume::{Receiver, RecvError};
use tracing::warn;

use leaderboard_libs::{reader, LeaderboardError, LeaderboardType, SaveOutcome};

use crate::Service;

/// One row of a replay file: `player_id;activity_id;values`.
#[derive(Debug, serde::Deserialize)]
pub struct Submission {
  pub player_id: u64,
  pub activity_id: u32,
  pub values: String,
}

/// Outcome counts of a replay pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
  pub inserted: usize,
  pub replaced: usize,
  pub kept: usize,
  pub skipped: usize,
  pub rejected: usize,
}

impl ReplaySummary {
  fn count(&mut self, outcome: SaveOutcome) {
    match outcome {
      SaveOutcome::Inserted => self.inserted += 1,
      SaveOutcome::Replaced => self.replaced += 1,
      SaveOutcome::Kept => self.kept += 1,
      SaveOutcome::Skipped => self.skipped += 1,
    }
  }

  fn merge(&mut self, other: ReplaySummary) {
    self.inserted += other.inserted;
    self.replaced += other.replaced;
    self.kept += other.kept;
    self.skipped += other.skipped;
    self.rejected += other.rejected;
  }
}

impl fmt::Display for ReplaySummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "inserted:{},replaced:{},kept:{},skipped:{},rejected:{}",
      self.inserted, self.replaced, self.kept, self.skipped, self.rejected
    )
  }
}

/// Feeds every submission of `path` through `workers` save tasks sharing one service.
///
/// Storage failures stop the replay; bad rows are counted as rejected and skipped.
pub async fn run(service: Arc<Service>, path: &Path, workers: usize) -> leaderboard_libs::Result<ReplaySummary> {
  let bytes = tokio::fs::read(path).await?;

  let (sender, receiver) = flume::unbounded();

  let mut handles = Vec::new();
  for _ in 0..workers.max(1) {
    handles.push(tokio::task::spawn(save_worker(service.clone(), receiver.clone())));
  }
  drop(receiver);

  let mut summary = ReplaySummary::default();
  let mut rdr = csv::ReaderBuilder::new()
    .delimiter(b';')
    .from_reader(bytes.as_slice());
  for result in rdr.deserialize::<Submission>() {
    match result {
      Ok(submission) => {
        // Every worker gone means one of them hit a storage error.
        if sender.send_async(submission).await.is_err() {
          break;
        }
      }
      Err(err) => {
        warn!(%err, "skipping unreadable submission row");
        summary.rejected += 1;
      }
    }
  }
  drop(sender);

  for handle in handles {
    match handle.await {
      Ok(Ok(part)) => summary.merge(part),
      Ok(Err(err)) => return Err(err),
      Err(err) => return Err(LeaderboardError::StorageUnavailable(err.to_string())),
    }
  }
  Ok(summary)
}

/// Applies submissions until the channel closes.
async fn save_worker(
  service: Arc<Service>,
  receiver: Receiver<Submission>
) -> leaderboard_libs::Result<ReplaySummary> {
  let mut summary = ReplaySummary::default();
  #[allow(clippy::while_let_loop)]
  loop {
    match receiver.recv_async().await {
      Ok(submission) => {
        let leaderboard_type = service.resolver().resolve(submission.activity_id);
        if leaderboard_type == LeaderboardType::None {
          warn!(activity_id = submission.activity_id, "replayed score for an activity of type None");
          summary.skipped += 1;
          continue;
        }
        let values = match reader::parse_values(leaderboard_type, &submission.values) {
          Ok(values) => values,
          Err(err) => {
            warn!(player_id = submission.player_id, %err, "rejecting submission");
            summary.rejected += 1;
            continue;
          }
        };
        let outcome = service
          .save_score(submission.player_id, submission.activity_id, leaderboard_type, values)
          .await?;
        summary.count(outcome);
      }
      Err(RecvError::Disconnected) => break,
    }
  }
  Ok(summary)
}
