use std::fmt::Display;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::types::{LeaderboardType, RankedRow, LDF_S32, LDF_U64, LDF_UTF16};
use crate::window::LeaderboardWindow;

/// Serialized leaderboard in the row protocol text format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardPayload {
    text: String,
    row_count: usize,
}

impl LeaderboardPayload {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Text prefixed with its byte length as a little-endian `u32`.
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(4 + self.text.len());
        frame.extend_from_slice(&(self.text.len() as u32).to_le_bytes());
        frame.extend_from_slice(self.text.as_bytes());
        frame
    }

    pub async fn write_frame<W>(&self, out: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        out.write_u32_le(self.text.len() as u32).await?;
        out.write_all(self.text.as_bytes()).await?;
        out.flush().await
    }
}

fn write_header(out: &mut String, row_count: usize) {
    out.push_str("ADO.Result=7:1\n");
    out.push_str("Result.Count=1:1\n");
    out.push_str("Result[0].Index=0:RowNumber\n");
    out.push_str(&format!("Result[0].RowCount=1:{}\n", row_count));
}

fn write_row_field(out: &mut String, index: usize, key: &str, ldf_type: u8, value: impl Display) {
    out.push_str(&format!("Result[0].Row[{}].{}={}:{}\n", index, key, ldf_type, value));
}

fn write_identity(out: &mut String, index: usize, row: &RankedRow) {
    write_row_field(out, index, "CharacterID", LDF_U64, row.player_id);
    write_row_field(out, index, "LastPlayed", LDF_U64, row.last_played.max(0));
    write_row_field(out, index, "NumPlayed", LDF_S32, row.num_played);
    // One field per line, so names must stay on one line.
    write_row_field(out, index, "name", LDF_UTF16, row.name.replace(['\n', '\r'], " "));
    write_row_field(out, index, "RowNumber", LDF_S32, row.rank);
}

/// Renders a window for one leaderboard type.
///
/// Each row gets the type's columns in descriptor order, then the identity
/// fields. A `None` type renders the header with zero rows.
pub fn serialize(window: &LeaderboardWindow, leaderboard_type: LeaderboardType) -> LeaderboardPayload {
    let mut text = String::new();

    if leaderboard_type == LeaderboardType::None {
        warn!("serializing a leaderboard of type None, sending no rows");
        write_header(&mut text, 0);
        return LeaderboardPayload { text, row_count: 0 };
    }

    let columns = leaderboard_type.descriptor().columns;
    write_header(&mut text, window.rows.len());

    for (index, row) in window.rows.iter().enumerate() {
        if row.values.leaderboard_type() == leaderboard_type {
            for (column, value) in columns.iter().zip(row.values.fields()) {
                write_row_field(&mut text, index, column.wire_name, column.kind.ldf_code(), value);
            }
        } else {
            warn!(
                player_id = row.player_id,
                stored = ?row.values.leaderboard_type(),
                expected = ?leaderboard_type,
                "row does not match the leaderboard type, sending identity only"
            );
        }
        write_identity(&mut text, index, row);
    }

    LeaderboardPayload {
        text,
        row_count: window.rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreValues;

    fn row(rank: u32, player_id: u64, name: &str, values: ScoreValues) -> RankedRow {
        RankedRow {
            rank,
            player_id,
            last_played: 1_700_000_000,
            num_played: 1,
            name: name.to_string(),
            values,
        }
    }

    fn keys_of_row(payload: &LeaderboardPayload, index: usize) -> Vec<String> {
        let prefix = format!("Result[0].Row[{}].", index);
        payload
            .as_str()
            .lines()
            .filter_map(|line| line.strip_prefix(&prefix))
            .map(|rest| rest.split('=').next().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn empty_window_still_has_header() {
        let payload = serialize(&LeaderboardWindow::empty(), LeaderboardType::Donations);
        assert_eq!(
            payload.as_str(),
            "ADO.Result=7:1\nResult.Count=1:1\nResult[0].Index=0:RowNumber\nResult[0].RowCount=1:0\n"
        );
        assert_eq!(payload.row_count(), 0);
    }

    #[test]
    fn donations_row_layout() {
        let window = LeaderboardWindow {
            start_rank: 1,
            rows: vec![row(1, 77, "Sparky", ScoreValues::Donations { score: 250 })],
        };
        let payload = serialize(&window, LeaderboardType::Donations);
        let expected = "ADO.Result=7:1\n\
            Result.Count=1:1\n\
            Result[0].Index=0:RowNumber\n\
            Result[0].RowCount=1:1\n\
            Result[0].Row[0].Score=1:250\n\
            Result[0].Row[0].CharacterID=8:77\n\
            Result[0].Row[0].LastPlayed=8:1700000000\n\
            Result[0].Row[0].NumPlayed=1:1\n\
            Result[0].Row[0].name=0:Sparky\n\
            Result[0].Row[0].RowNumber=1:1\n";
        assert_eq!(payload.as_str(), expected);
    }

    #[test]
    fn racing_fields_in_declared_order() {
        let window = LeaderboardWindow {
            start_rank: 4,
            rows: vec![
                row(4, 1, "a", ScoreValues::Racing { best_lap_time: 31.5, best_time: 95.25, license: 1, num_wins: 3 }),
                row(5, 2, "b", ScoreValues::Racing { best_lap_time: 32.0, best_time: 97.0, license: 0, num_wins: 1 }),
            ],
        };
        let payload = serialize(&window, LeaderboardType::Racing);

        assert!(payload.as_str().contains("Result[0].RowCount=1:2\n"));
        assert!(payload.as_str().contains("Result[0].Row[0].BestLapTime=3:31.5\n"));
        assert!(payload.as_str().contains("Result[0].Row[1].BestTime=3:97\n"));
        assert!(payload.as_str().contains("Result[0].Row[1].RowNumber=1:5\n"));
        for index in 0..2 {
            assert_eq!(
                keys_of_row(&payload, index),
                vec!["BestLapTime", "BestTime", "License", "NumWins", "CharacterID", "LastPlayed", "NumPlayed", "name", "RowNumber"]
            );
        }
    }

    #[test]
    fn survival_ns_orders_time_before_wave() {
        let window = LeaderboardWindow {
            start_rank: 1,
            rows: vec![row(1, 1, "a", ScoreValues::SurvivalNS { time: 300, wave: 12 })],
        };
        let payload = serialize(&window, LeaderboardType::SurvivalNS);
        assert_eq!(&keys_of_row(&payload, 0)[..2], &["Time".to_string(), "Wave".to_string()]);
    }

    #[test]
    fn none_type_sends_no_rows() {
        let window = LeaderboardWindow {
            start_rank: 1,
            rows: vec![row(1, 1, "a", ScoreValues::Donations { score: 1 })],
        };
        let payload = serialize(&window, LeaderboardType::None);
        assert_eq!(payload.row_count(), 0);
        assert!(payload.as_str().ends_with("Result[0].RowCount=1:0\n"));
    }

    #[test]
    fn names_cannot_break_lines() {
        let window = LeaderboardWindow {
            start_rank: 1,
            rows: vec![row(1, 1, "bad\nname", ScoreValues::FootRace { time: 1 })],
        };
        let payload = serialize(&window, LeaderboardType::FootRace);
        assert!(payload.as_str().contains("name=0:bad name\n"));
    }

    #[tokio::test]
    async fn frame_is_length_prefixed() {
        let payload = serialize(&LeaderboardWindow::empty(), LeaderboardType::MonumentRace);
        let frame = payload.to_frame();
        let len = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, payload.as_str().len());
        assert_eq!(&frame[4..], payload.as_str().as_bytes());

        let mut written: Vec<u8> = Vec::new();
        payload.write_frame(&mut written).await.unwrap();
        assert_eq!(written, frame);
    }
}
