use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use leaderboard_libs::{
  reader, ActivityTable, Config, InfoType, LeaderboardError, LeaderboardService, LeaderboardType, MemoryStore, SaveOutcome,
};

mod replay;

pub type Service = LeaderboardService<MemoryStore, ActivityTable>;

/// Command-line access to the activity leaderboards.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
  /// Path to the JSON config file; defaults apply when it is missing.
  #[arg(long, default_value = "leaderboard.json")]
  pub config: PathBuf,
  /// Snapshot directory, overriding `data_dir` from the config.
  #[arg(long)]
  pub data_dir: Option<PathBuf>,
  /// Activity table, overriding `activities_path` from the config.
  #[arg(long)]
  pub activities: Option<PathBuf>,
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the leaderboard window for a requesting player.
  Get {
    #[arg(long)]
    activity: u32,
    #[arg(long)]
    requester: u64,
    #[arg(long, value_enum, default_value_t = InfoArg::Standings)]
    info_type: InfoArg,
    /// Only rank scores played this week.
    #[arg(long)]
    weekly: bool,
    /// Connection the payload is addressed to.
    #[arg(long, default_value_t = 0)]
    target: u64,
    /// Write the length-prefixed frame instead of plain text.
    #[arg(long)]
    framed: bool,
  },
  /// Save a score, keeping the player's best.
  Save {
    #[arg(long)]
    player: u64,
    #[arg(long)]
    activity: u32,
    /// Comma-separated values in the leaderboard's column order.
    #[arg(long, allow_hyphen_values = true)]
    values: String,
    /// Numeric leaderboard type; resolved from the activity table when omitted.
    #[arg(long)]
    leaderboard_type: Option<u32>,
  },
  /// Set a player's display name.
  Player {
    #[arg(long)]
    id: u64,
    #[arg(long)]
    name: String,
  },
  /// Apply a `player_id;activity_id;values` CSV of submissions.
  Replay {
    #[arg(long)]
    file: PathBuf,
    #[arg(long)]
    workers: Option<usize>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InfoArg {
  Standings,
  Top,
  MyStanding,
}

impl From<InfoArg> for InfoType {
  fn from(arg: InfoArg) -> Self {
    match arg {
      InfoArg::Standings => InfoType::Standings,
      InfoArg::Top => InfoType::Top,
      InfoArg::MyStanding => InfoType::MyStanding,
    }
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let args = Args::parse();

  let config = match Config::read(&args.config) {
    Ok(Some(config)) => config,
    Ok(None) => Config::new(),
    Err(err) => {
      eprintln!("{}", err);
      return ExitCode::FAILURE;
    }
  };

  // Logs go to stderr; stdout carries the payload.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
    .with_writer(std::io::stderr)
    .init();

  match run(args, config).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!(%err, "command failed");
      ExitCode::FAILURE
    }
  }
}

async fn run(args: Args, config: Config) -> leaderboard_libs::Result<()> {
  let start = Instant::now();

  let data_dir = args.data_dir.unwrap_or_else(|| PathBuf::from(&config.data_dir));
  let activities_path = args.activities.unwrap_or_else(|| PathBuf::from(&config.activities_path));

  let store = MemoryStore::load(&data_dir).await?;
  let table = ActivityTable::read(&activities_path)?;
  let service: Arc<Service> = Arc::new(LeaderboardService::new(store, table, config.rules()));
  info!("Load snapshot: {:?}", start.elapsed());

  match args.command {
    Command::Get { activity, requester, info_type, weekly, target, framed } => {
      let response = service
        .get_leaderboard(activity, info_type.into(), weekly, target, requester)
        .await?;
      let mut stdout = tokio::io::stdout();
      if framed {
        response.payload.write_frame(&mut stdout).await?;
      } else {
        stdout.write_all(response.payload.as_str().as_bytes()).await?;
        stdout.flush().await?;
      }
    }
    Command::Save { player, activity, values, leaderboard_type } => {
      let outcome = save(&service, player, activity, &values, leaderboard_type).await?;
      println!("{:?}", outcome);
      if outcome != SaveOutcome::Skipped {
        service.store().write(&data_dir).await?;
      }
    }
    Command::Player { id, name } => {
      service.store().register_player(id, &name).await;
      service.store().write(&data_dir).await?;
    }
    Command::Replay { file, workers } => {
      let workers = workers.unwrap_or(config.replay_workers);
      let summary = replay::run(service.clone(), &file, workers).await?;
      println!("{}", summary);
      service.store().write(&data_dir).await?;
    }
  }

  info!("Done: {:?}", start.elapsed());
  Ok(())
}

/// Saves one score given on the command line. Activities that resolve to no
/// leaderboard, including unknown ones, are skipped.
async fn save(
  service: &Service,
  player: u64,
  activity: u32,
  values: &str,
  code: Option<u32>,
) -> leaderboard_libs::Result<SaveOutcome> {
  let leaderboard_type = match code {
    Some(code) => LeaderboardType::from_code(code).ok_or_else(|| LeaderboardError::MalformedSaveArguments {
      leaderboard_type: LeaderboardType::None,
      reason: format!("unknown leaderboard type code {}", code),
    })?,
    None => service.resolver().resolve(activity),
  };
  if leaderboard_type == LeaderboardType::None {
    warn!(player, activity, "saving a score of type None, ignoring");
    return Ok(SaveOutcome::Skipped);
  }

  let values = reader::parse_values(leaderboard_type, values)?;
  service.save_score(player, activity, leaderboard_type, values).await
}
