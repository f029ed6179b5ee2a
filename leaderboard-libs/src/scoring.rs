use std::cmp::Ordering;

use crate::types::{LeaderboardType, ScoreValues, SortDirection, SortKey, SURVIVAL_TIME_FIRST_KEYS};

/// Deployment switches that change how scores are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoringRules {
    pub survival_time_first: bool,
}

/// What a save should do with the stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertDecision {
    Insert,
    Replace,
    Keep,
}

impl ScoringRules {
    pub fn sort_keys(&self, leaderboard_type: LeaderboardType) -> &'static [SortKey] {
        if leaderboard_type == LeaderboardType::Survival && self.survival_time_first {
            return &SURVIVAL_TIME_FIRST_KEYS;
        }
        leaderboard_type.descriptor().sort_keys
    }

    /// Ranking order of two score sets: `Less` means `a` ranks above `b`.
    ///
    /// Values of different leaderboard types are not comparable and report `Equal`.
    pub fn rank_order(&self, a: &ScoreValues, b: &ScoreValues) -> Ordering {
        let leaderboard_type = a.leaderboard_type();
        if leaderboard_type != b.leaderboard_type() {
            return Ordering::Equal;
        }
        let a_fields = a.fields();
        let b_fields = b.fields();

        self.sort_keys(leaderboard_type)
            .iter()
            .map(|key| {
                let ord = a_fields[key.column].cmp_value(&b_fields[key.column]);
                match key.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// True only when `incoming` strictly beats `existing`.
    pub fn is_better(&self, incoming: &ScoreValues, existing: &ScoreValues) -> bool {
        self.rank_order(incoming, existing) == Ordering::Less
    }

    pub fn decide(&self, existing: Option<&ScoreValues>, incoming: &ScoreValues) -> UpsertDecision {
        match existing {
            None => UpsertDecision::Insert,
            // Stored under another schema; the new type governs the activity now.
            Some(stored) if stored.leaderboard_type() != incoming.leaderboard_type() => UpsertDecision::Replace,
            Some(stored) if self.is_better(incoming, stored) => UpsertDecision::Replace,
            Some(_) => UpsertDecision::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScoringRules {
        ScoringRules::default()
    }

    fn gallery(score: i32, streak: i32, hit_percentage: f32) -> ScoreValues {
        ScoreValues::ShootingGallery { hit_percentage, score, streak }
    }

    fn racing(best_time: f32, best_lap_time: f32, num_wins: i32) -> ScoreValues {
        ScoreValues::Racing { best_lap_time, best_time, license: 0, num_wins }
    }

    #[test]
    fn shooting_gallery_tie_breaks() {
        assert!(rules().is_better(&gallery(100, 0, 0.1), &gallery(90, 9, 0.9)));
        assert!(rules().is_better(&gallery(100, 5, 0.1), &gallery(100, 4, 0.9)));
        assert!(rules().is_better(&gallery(100, 5, 0.6), &gallery(100, 5, 0.5)));
        assert!(!rules().is_better(&gallery(100, 5, 0.5), &gallery(100, 5, 0.5)));
    }

    #[test]
    fn racing_prefers_lower_times_then_more_wins() {
        assert!(rules().is_better(&racing(90.0, 40.0, 0), &racing(95.0, 30.0, 9)));
        assert!(rules().is_better(&racing(90.0, 30.0, 0), &racing(90.0, 31.0, 9)));
        assert!(rules().is_better(&racing(90.0, 30.0, 3), &racing(90.0, 30.0, 2)));
        assert!(!rules().is_better(&racing(91.0, 30.0, 3), &racing(90.0, 30.0, 2)));
    }

    #[test]
    fn racing_ignores_license() {
        let with_license = ScoreValues::Racing { best_lap_time: 30.0, best_time: 90.0, license: 1, num_wins: 2 };
        let without = ScoreValues::Racing { best_lap_time: 30.0, best_time: 90.0, license: 0, num_wins: 2 };
        assert_eq!(rules().rank_order(&with_license, &without), Ordering::Equal);
    }

    #[test]
    fn monument_and_foot_race_point_opposite_ways() {
        let fast = ScoreValues::MonumentRace { time: 50 };
        let slow = ScoreValues::MonumentRace { time: 60 };
        assert!(rules().is_better(&fast, &slow));

        let short = ScoreValues::FootRace { time: 50 };
        let long = ScoreValues::FootRace { time: 60 };
        assert!(rules().is_better(&long, &short));
    }

    #[test]
    fn survival_precedence_can_be_swapped() {
        let points = ScoreValues::Survival { points: 500, time: 100 };
        let time = ScoreValues::Survival { points: 400, time: 200 };
        assert!(rules().is_better(&points, &time));

        let swapped = ScoringRules { survival_time_first: true };
        assert!(swapped.is_better(&time, &points));
    }

    #[test]
    fn survival_ns_time_then_wave() {
        assert!(rules().is_better(&ScoreValues::SurvivalNS { time: 300, wave: 1 }, &ScoreValues::SurvivalNS { time: 200, wave: 9 }));
        assert!(rules().is_better(&ScoreValues::SurvivalNS { time: 300, wave: 2 }, &ScoreValues::SurvivalNS { time: 300, wave: 1 }));
    }

    #[test]
    fn decide_covers_insert_replace_keep() {
        let old = ScoreValues::Donations { score: 10 };
        assert_eq!(rules().decide(None, &old), UpsertDecision::Insert);
        assert_eq!(rules().decide(Some(&old), &ScoreValues::Donations { score: 11 }), UpsertDecision::Replace);
        assert_eq!(rules().decide(Some(&old), &ScoreValues::Donations { score: 10 }), UpsertDecision::Keep);
        assert_eq!(rules().decide(Some(&old), &ScoreValues::Donations { score: 9 }), UpsertDecision::Keep);
        assert_eq!(
            rules().decide(Some(&old), &ScoreValues::UnusedLeaderboard4 { points: 1 }),
            UpsertDecision::Replace
        );
    }
}
