use std::cmp::Ordering;
use std::fmt;

use crate::error::{LeaderboardError, Result};

pub type PlayerId = u64;
pub type ActivityId = u32;
pub type ConnectionId = u64;

/// Schema and ranking rule of one minigame's score table.
///
/// Codes follow the content table: the enum order below is the declared
/// numeric code, `None` is `u32::MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeaderboardType {
    ShootingGallery,
    Racing,
    MonumentRace,
    FootRace,
    // No activity declares it, but the client still expects Points.
    UnusedLeaderboard4,
    Survival,
    SurvivalNS,
    Donations,
    None,
}

impl LeaderboardType {
    pub const ALL: [LeaderboardType; 9] = [
        LeaderboardType::ShootingGallery,
        LeaderboardType::Racing,
        LeaderboardType::MonumentRace,
        LeaderboardType::FootRace,
        LeaderboardType::UnusedLeaderboard4,
        LeaderboardType::Survival,
        LeaderboardType::SurvivalNS,
        LeaderboardType::Donations,
        LeaderboardType::None,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::ShootingGallery),
            1 => Some(Self::Racing),
            2 => Some(Self::MonumentRace),
            3 => Some(Self::FootRace),
            4 => Some(Self::UnusedLeaderboard4),
            5 => Some(Self::Survival),
            6 => Some(Self::SurvivalNS),
            7 => Some(Self::Donations),
            u32::MAX => Some(Self::None),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::ShootingGallery => 0,
            Self::Racing => 1,
            Self::MonumentRace => 2,
            Self::FootRace => 3,
            Self::UnusedLeaderboard4 => 4,
            Self::Survival => 5,
            Self::SurvivalNS => 6,
            Self::Donations => 7,
            Self::None => u32::MAX,
        }
    }

    /// Column layout and default sort order shared by ranking, save and serialization.
    pub fn descriptor(&self) -> &'static Descriptor {
        match self {
            Self::ShootingGallery => &SHOOTING_GALLERY,
            Self::Racing => &RACING,
            Self::MonumentRace => &MONUMENT_RACE,
            Self::FootRace => &FOOT_RACE,
            Self::UnusedLeaderboard4 => &UNUSED_LEADERBOARD_4,
            Self::Survival => &SURVIVAL,
            Self::SurvivalNS => &SURVIVAL_NS,
            Self::Donations => &DONATIONS,
            Self::None => &NONE,
        }
    }
}

/// Primitive tag of a column on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Int32,
}

impl FieldKind {
    pub fn ldf_code(&self) -> u8 {
        match self {
            FieldKind::Float => LDF_FLOAT,
            FieldKind::Int32 => LDF_S32,
        }
    }
}

// Row protocol type tags.
pub const LDF_UTF16: u8 = 0;
pub const LDF_S32: u8 = 1;
pub const LDF_FLOAT: u8 = 3;
pub const LDF_U64: u8 = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Int32(i32),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Int32(_) => FieldKind::Int32,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Float(f) => *f as f64,
            FieldValue::Int32(i) => *i as f64,
        }
    }

    fn as_f32(&self) -> f32 {
        match self {
            FieldValue::Float(f) => *f,
            FieldValue::Int32(i) => *i as f32,
        }
    }

    fn as_i32(&self) -> i32 {
        match self {
            FieldValue::Float(f) => *f as i32,
            FieldValue::Int32(i) => *i,
        }
    }

    /// Numeric comparison; NaN sorts with `total_cmp` rules so the order stays total.
    pub fn cmp_value(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Int32(a), FieldValue::Int32(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Int32(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One tie-break level: which column, and whether lower or higher wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    // Key written on the wire.
    pub wire_name: &'static str,
    // Name of the storage column.
    pub storage_name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub columns: &'static [Column],
    pub sort_keys: &'static [SortKey],
}

const fn col(wire_name: &'static str, storage_name: &'static str, kind: FieldKind) -> Column {
    Column { wire_name, storage_name, kind }
}

const fn asc(column: usize) -> SortKey {
    SortKey { column, direction: SortDirection::Ascending }
}

const fn desc(column: usize) -> SortKey {
    SortKey { column, direction: SortDirection::Descending }
}

static SHOOTING_GALLERY: Descriptor = Descriptor {
    columns: &[
        col("HitPercentage", "hitPercentage", FieldKind::Float),
        col("Score", "score", FieldKind::Int32),
        col("Streak", "streak", FieldKind::Int32),
    ],
    sort_keys: &[desc(1), desc(2), desc(0)],
};

static RACING: Descriptor = Descriptor {
    columns: &[
        col("BestLapTime", "bestLapTime", FieldKind::Float),
        col("BestTime", "bestTime", FieldKind::Float),
        col("License", "license", FieldKind::Int32),
        col("NumWins", "numWins", FieldKind::Int32),
    ],
    sort_keys: &[asc(1), asc(0), desc(3)],
};

static UNUSED_LEADERBOARD_4: Descriptor = Descriptor {
    columns: &[col("Points", "points", FieldKind::Int32)],
    sort_keys: &[desc(0)],
};

static MONUMENT_RACE: Descriptor = Descriptor {
    columns: &[col("Time", "time", FieldKind::Int32)],
    sort_keys: &[asc(0)],
};

// Same column as MonumentRace, but the longer time wins.
static FOOT_RACE: Descriptor = Descriptor {
    columns: &[col("Time", "time", FieldKind::Int32)],
    sort_keys: &[desc(0)],
};

static SURVIVAL: Descriptor = Descriptor {
    columns: &[
        col("Points", "points", FieldKind::Int32),
        col("Time", "time", FieldKind::Int32),
    ],
    sort_keys: &[desc(0), desc(1)],
};

/// Survival order used when time takes precedence over points.
pub static SURVIVAL_TIME_FIRST_KEYS: [SortKey; 2] = [desc(1), desc(0)];

static SURVIVAL_NS: Descriptor = Descriptor {
    columns: &[
        col("Time", "time", FieldKind::Int32),
        col("Wave", "wave", FieldKind::Int32),
    ],
    sort_keys: &[desc(0), desc(1)],
};

static DONATIONS: Descriptor = Descriptor {
    columns: &[col("Score", "score", FieldKind::Int32)],
    sort_keys: &[desc(0)],
};

static NONE: Descriptor = Descriptor {
    columns: &[],
    sort_keys: &[],
};

/// Which slice of the ranking the client asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoType {
    Standings,
    Top,
    MyStanding,
}

/// Score values of one submission, one variant per concrete leaderboard type.
///
/// Field order matches the wire column order of the type's descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScoreValues {
    ShootingGallery { hit_percentage: f32, score: i32, streak: i32 },
    Racing { best_lap_time: f32, best_time: f32, license: i32, num_wins: i32 },
    UnusedLeaderboard4 { points: i32 },
    MonumentRace { time: i32 },
    FootRace { time: i32 },
    Survival { points: i32, time: i32 },
    SurvivalNS { time: i32, wave: i32 },
    Donations { score: i32 },
}

impl ScoreValues {
    pub fn leaderboard_type(&self) -> LeaderboardType {
        match self {
            ScoreValues::ShootingGallery { .. } => LeaderboardType::ShootingGallery,
            ScoreValues::Racing { .. } => LeaderboardType::Racing,
            ScoreValues::UnusedLeaderboard4 { .. } => LeaderboardType::UnusedLeaderboard4,
            ScoreValues::MonumentRace { .. } => LeaderboardType::MonumentRace,
            ScoreValues::FootRace { .. } => LeaderboardType::FootRace,
            ScoreValues::Survival { .. } => LeaderboardType::Survival,
            ScoreValues::SurvivalNS { .. } => LeaderboardType::SurvivalNS,
            ScoreValues::Donations { .. } => LeaderboardType::Donations,
        }
    }

    /// Positional values in descriptor column order.
    pub fn fields(&self) -> Vec<FieldValue> {
        use FieldValue::{Float, Int32};
        match *self {
            ScoreValues::ShootingGallery { hit_percentage, score, streak } => {
                vec![Float(hit_percentage), Int32(score), Int32(streak)]
            }
            ScoreValues::Racing { best_lap_time, best_time, license, num_wins } => {
                vec![Float(best_lap_time), Float(best_time), Int32(license), Int32(num_wins)]
            }
            ScoreValues::UnusedLeaderboard4 { points } => vec![Int32(points)],
            ScoreValues::MonumentRace { time } => vec![Int32(time)],
            ScoreValues::FootRace { time } => vec![Int32(time)],
            ScoreValues::Survival { points, time } => vec![Int32(points), Int32(time)],
            ScoreValues::SurvivalNS { time, wave } => vec![Int32(time), Int32(wave)],
            ScoreValues::Donations { score } => vec![Int32(score)],
        }
    }

    /// Builds typed values from positional arguments, checked against the descriptor.
    ///
    /// An integer is accepted for a float column; a float for an integer column is
    /// rejected, as is any count mismatch or a non-finite float.
    pub fn from_fields(leaderboard_type: LeaderboardType, values: &[FieldValue]) -> Result<Self> {
        let columns = leaderboard_type.descriptor().columns;
        if columns.is_empty() {
            return Err(LeaderboardError::UnreachableType("saved"));
        }
        if values.len() != columns.len() {
            return Err(LeaderboardError::MalformedSaveArguments {
                leaderboard_type,
                reason: format!("expected {} values, got {}", columns.len(), values.len()),
            });
        }
        for (column, value) in columns.iter().zip(values) {
            if column.kind == FieldKind::Int32 && value.kind() == FieldKind::Float {
                return Err(LeaderboardError::MalformedSaveArguments {
                    leaderboard_type,
                    reason: format!("{} must be an integer, got {}", column.wire_name, value),
                });
            }
            if let FieldValue::Float(f) = value {
                if !f.is_finite() {
                    return Err(LeaderboardError::MalformedSaveArguments {
                        leaderboard_type,
                        reason: format!("{} must be a finite number, got {}", column.wire_name, f),
                    });
                }
            }
        }

        let v = values;
        let typed = match leaderboard_type {
            LeaderboardType::ShootingGallery => ScoreValues::ShootingGallery {
                hit_percentage: v[0].as_f32(),
                score: v[1].as_i32(),
                streak: v[2].as_i32(),
            },
            LeaderboardType::Racing => ScoreValues::Racing {
                best_lap_time: v[0].as_f32(),
                best_time: v[1].as_f32(),
                license: v[2].as_i32(),
                num_wins: v[3].as_i32(),
            },
            LeaderboardType::UnusedLeaderboard4 => ScoreValues::UnusedLeaderboard4 { points: v[0].as_i32() },
            LeaderboardType::MonumentRace => ScoreValues::MonumentRace { time: v[0].as_i32() },
            LeaderboardType::FootRace => ScoreValues::FootRace { time: v[0].as_i32() },
            LeaderboardType::Survival => ScoreValues::Survival { points: v[0].as_i32(), time: v[1].as_i32() },
            LeaderboardType::SurvivalNS => ScoreValues::SurvivalNS { time: v[0].as_i32(), wave: v[1].as_i32() },
            LeaderboardType::Donations => ScoreValues::Donations { score: v[0].as_i32() },
            LeaderboardType::None => return Err(LeaderboardError::UnreachableType("saved")),
        };
        Ok(typed)
    }
}

/// One player's stored best for one activity.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRecord {
    pub player_id: PlayerId,
    pub activity_id: ActivityId,
    pub values: ScoreValues,
    // Unix seconds of the write that produced these values.
    pub last_played: i64,
}

/// A stored record placed in the ranking. `rank` is 1-based and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedRow {
    pub rank: u32,
    pub player_id: PlayerId,
    pub last_played: i64,
    pub num_played: i32,
    pub name: String,
    pub values: ScoreValues,
}
