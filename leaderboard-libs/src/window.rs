use crate::types::{PlayerId, RankedRow};

/// Rows sent to one client.
pub const WINDOW_SIZE: usize = 11;
// Rows shown above the requester when they are away from both ends.
const ROWS_ABOVE: usize = 5;

/// Slice of a ranking sent to one requester.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardWindow {
    pub start_rank: u32,
    pub rows: Vec<RankedRow>,
}

impl LeaderboardWindow {
    pub fn empty() -> Self {
        Self {
            start_rank: 1,
            rows: Vec::new(),
        }
    }
}

/// 1-based position of `player_id`, or one past the end when they have no row.
pub fn requester_ranking(ranking: &[RankedRow], player_id: PlayerId) -> usize {
    ranking
        .iter()
        .position(|row| row.player_id == player_id)
        .map(|idx| idx + 1)
        .unwrap_or(ranking.len() + 1)
}

/// First rank of the window for a requester at `my_ranking` out of `total` rows.
pub fn start_rank(total: usize, my_ranking: usize) -> usize {
    if total < my_ranking + ROWS_ABOVE {
        // Near the bottom: show the last rows in full.
        total.saturating_sub(WINDOW_SIZE - 1).max(1)
    } else if my_ranking > ROWS_ABOVE {
        my_ranking - ROWS_ABOVE
    } else {
        1
    }
}

/// Window of up to [`WINDOW_SIZE`] rows around `requester`.
pub fn select(ranking: &[RankedRow], requester: PlayerId) -> LeaderboardWindow {
    let my_ranking = requester_ranking(ranking, requester);
    materialize(ranking, start_rank(ranking.len(), my_ranking))
}

/// Window holding the top of the ranking.
pub fn select_top(ranking: &[RankedRow]) -> LeaderboardWindow {
    materialize(ranking, 1)
}

fn materialize(ranking: &[RankedRow], start_rank: usize) -> LeaderboardWindow {
    if ranking.is_empty() {
        return LeaderboardWindow::empty();
    }
    let first = start_rank - 1;
    let last = (first + WINDOW_SIZE).min(ranking.len());

    let rows = ranking[first..last]
        .iter()
        .enumerate()
        .map(|(position, row)| {
            let mut row = row.clone();
            row.rank = (start_rank + position) as u32;
            row
        })
        .collect();

    LeaderboardWindow {
        start_rank: start_rank as u32,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreValues;

    // Players 1..=total, already ordered by score.
    fn ranking(total: usize) -> Vec<RankedRow> {
        (1..=total)
            .map(|i| RankedRow {
                rank: i as u32,
                player_id: i as u64,
                last_played: 0,
                num_played: 1,
                name: format!("player{}", i),
                values: ScoreValues::Donations { score: (1000 - i) as i32 },
            })
            .collect()
    }

    fn ranks(window: &LeaderboardWindow) -> Vec<u32> {
        window.rows.iter().map(|row| row.rank).collect()
    }

    #[test]
    fn empty_ranking_gives_empty_window() {
        let window = select(&[], 7);
        assert!(window.rows.is_empty());
        assert_eq!(window.start_rank, 1);
    }

    #[test]
    fn small_rankings_are_shown_whole() {
        for total in 1..=WINDOW_SIZE {
            let rows = ranking(total);
            for requester in 1..=(total as u64 + 1) {
                let window = select(&rows, requester);
                assert_eq!(window.start_rank, 1, "total {} requester {}", total, requester);
                assert_eq!(window.rows, rows);
            }
        }
    }

    #[test]
    fn three_row_donations_example() {
        let rows = vec![
            RankedRow { rank: 1, player_id: 10, last_played: 0, num_played: 1, name: "A".into(), values: ScoreValues::Donations { score: 100 } },
            RankedRow { rank: 2, player_id: 20, last_played: 0, num_played: 1, name: "B".into(), values: ScoreValues::Donations { score: 90 } },
            RankedRow { rank: 3, player_id: 30, last_played: 0, num_played: 1, name: "C".into(), values: ScoreValues::Donations { score: 80 } },
        ];
        let window = select(&rows, 20);
        assert_eq!(window.start_rank, 1);
        assert_eq!(window.rows.len(), 3);
        assert_eq!(window.rows[1].player_id, 20);
        assert_eq!(window.rows[1].rank, 2);
    }

    #[test]
    fn top_five_requester_sees_top_window() {
        let rows = ranking(30);
        for requester in 1..=5 {
            let window = select(&rows, requester);
            assert_eq!(window.start_rank, 1);
            assert_eq!(ranks(&window), (1..=11).collect::<Vec<u32>>());
        }
    }

    #[test]
    fn middle_requester_sits_at_position_six() {
        let rows = ranking(30);
        for requester in 6..=25 {
            let window = select(&rows, requester);
            assert_eq!(window.start_rank as u64, requester - 5);
            assert_eq!(window.rows.len(), WINDOW_SIZE);
            assert_eq!(window.rows[5].player_id, requester);
        }
    }

    #[test]
    fn bottom_requester_sees_last_eleven() {
        let rows = ranking(20);
        let window = select(&rows, 20);
        assert_eq!(window.start_rank, 10);
        assert_eq!(ranks(&window), (10..=20).collect::<Vec<u32>>());

        for requester in 16..=20 {
            assert_eq!(select(&rows, requester).start_rank, 10);
        }
    }

    #[test]
    fn absent_requester_ranks_last() {
        let rows = ranking(20);
        assert_eq!(requester_ranking(&rows, 999), 21);
        let window = select(&rows, 999);
        assert_eq!(window.start_rank, 10);
        assert_eq!(window.rows.len(), WINDOW_SIZE);
    }

    #[test]
    fn top_window_ignores_requester() {
        let rows = ranking(40);
        let window = select_top(&rows);
        assert_eq!(ranks(&window), (1..=11).collect::<Vec<u32>>());
    }

    #[test]
    fn ranks_are_rewritten_from_start_rank() {
        let mut rows = ranking(15);
        for row in rows.iter_mut() {
            row.rank = 0;
        }
        let window = select(&rows, 8);
        assert_eq!(window.start_rank, 3);
        assert_eq!(ranks(&window), (3..=13).collect::<Vec<u32>>());
    }
}
