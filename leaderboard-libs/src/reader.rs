use crate::error::{LeaderboardError, Result};
use crate::types::{FieldValue, LeaderboardType, ScoreValues};

fn parse_field(leaderboard_type: LeaderboardType, token: &str) -> Result<FieldValue> {
    if let Ok(value) = token.parse::<i32>() {
        return Ok(FieldValue::Int32(value));
    }
    match token.parse::<f32>() {
        Ok(value) => Ok(FieldValue::Float(value)),
        Err(_) => Err(LeaderboardError::MalformedSaveArguments {
            leaderboard_type,
            reason: format!("`{}` is not a number", token),
        }),
    }
}

/// Parses a comma-separated positional value list, e.g. `"0.75,1200,8"`.
pub fn parse_values(leaderboard_type: LeaderboardType, line: &str) -> Result<ScoreValues> {
    let fields = line
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| parse_field(leaderboard_type, token))
        .collect::<Result<Vec<FieldValue>>>()?;
    ScoreValues::from_fields(leaderboard_type, &fields)
}

/// Inverse of [`parse_values`].
pub fn format_values(values: &ScoreValues) -> String {
    values
        .fields()
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(",")
}
