use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::{LeaderboardError, Result};
use crate::types::{ActivityId, LeaderboardType};

/// Read-only access to the activity definitions shipped with the game content.
pub trait ActivityLookup: Send + Sync {
    fn lookup(&self, activity_id: ActivityId) -> Option<LeaderboardType>;
}

// Row of the content table as it appears in the JSON export.
#[derive(Debug, serde::Deserialize)]
struct ActivityEntry {
    #[serde(rename = "ActivityID")]
    activity_id: ActivityId,
    #[serde(rename = "leaderboardType")]
    leaderboard_type: u32,
}

// activity_id -> declared leaderboard type
#[derive(Clone, Debug, Default)]
pub struct ActivityTable(pub HashMap<ActivityId, LeaderboardType>);

impl ActivityTable {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ActivityId, LeaderboardType)>,
    {
        Self(entries.into_iter().collect())
    }

    /// Loads the activity table from a JSON array of `{ActivityID, leaderboardType}`.
    ///
    /// A missing file gives an empty table. Unknown type codes are kept as `None`.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "activity table not found, every activity resolves to None");
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        let entries: Vec<ActivityEntry> = serde_json::from_str(&contents).map_err(|err| LeaderboardError::Config {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        let table = entries
            .into_iter()
            .map(|entry| {
                let leaderboard_type = match LeaderboardType::from_code(entry.leaderboard_type) {
                    Some(ty) => ty,
                    None => {
                        warn!(
                            activity_id = entry.activity_id,
                            code = entry.leaderboard_type,
                            "unknown leaderboard type code"
                        );
                        LeaderboardType::None
                    }
                };
                (entry.activity_id, leaderboard_type)
            })
            .collect();
        Ok(Self(table))
    }
}

impl ActivityLookup for ActivityTable {
    fn lookup(&self, activity_id: ActivityId) -> Option<LeaderboardType> {
        self.0.get(&activity_id).copied()
    }
}

/// Resolves activity ids to leaderboard types, caching every answer for the
/// lifetime of the resolver, including the not-found answer.
pub struct ActivityTypeResolver<L> {
    lookup: L,
    cache: RwLock<HashMap<ActivityId, LeaderboardType>>,
}

impl<L: ActivityLookup> ActivityTypeResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, activity_id: ActivityId) -> LeaderboardType {
        {
            let cache = self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(ty) = cache.get(&activity_id) {
                return *ty;
            }
        }

        let ty = self.lookup.lookup(activity_id).unwrap_or(LeaderboardType::None);
        debug!(activity_id, leaderboard_type = ?ty, "resolved leaderboard type");

        // Two racing misses write the same value.
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(activity_id, ty);
        ty
    }

    /// Like [`resolve`](Self::resolve), but an activity without a usable type is an error.
    pub fn resolve_known(&self, activity_id: ActivityId) -> Result<LeaderboardType> {
        match self.resolve(activity_id) {
            LeaderboardType::None => Err(LeaderboardError::UnknownActivity(activity_id)),
            ty => Ok(ty),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct CountingLookup {
        table: ActivityTable,
        calls: Arc<AtomicUsize>,
    }

    impl ActivityLookup for CountingLookup {
        fn lookup(&self, activity_id: ActivityId) -> Option<LeaderboardType> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table.lookup(activity_id)
        }
    }

    fn counting(entries: Vec<(ActivityId, LeaderboardType)>) -> (ActivityTypeResolver<CountingLookup>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let lookup = CountingLookup {
            table: ActivityTable::from_entries(entries),
            calls: calls.clone(),
        };
        (ActivityTypeResolver::new(lookup), calls)
    }

    #[test]
    fn hit_is_cached() {
        let (resolver, calls) = counting(vec![(1864, LeaderboardType::ShootingGallery)]);

        assert_eq!(resolver.resolve(1864), LeaderboardType::ShootingGallery);
        assert_eq!(resolver.resolve(1864), LeaderboardType::ShootingGallery);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn miss_is_cached_as_none() {
        let (resolver, calls) = counting(vec![]);

        assert_eq!(resolver.resolve(42), LeaderboardType::None);
        assert_eq!(resolver.resolve(42), LeaderboardType::None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_len(), 1);
    }

    #[test]
    fn resolve_known_reports_unknown_activity() {
        let (resolver, _) = counting(vec![(5, LeaderboardType::Donations)]);

        assert_eq!(resolver.resolve_known(5).unwrap(), LeaderboardType::Donations);
        assert!(matches!(resolver.resolve_known(6), Err(LeaderboardError::UnknownActivity(6))));
    }

    #[test]
    fn reads_content_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activities.json");
        std::fs::write(
            &path,
            r#"[{"ActivityID": 1864, "leaderboardType": 0},
                {"ActivityID": 42, "leaderboardType": 1},
                {"ActivityID": 7, "leaderboardType": 99}]"#,
        )
        .unwrap();

        let table = ActivityTable::read(&path).unwrap();
        assert_eq!(table.lookup(1864), Some(LeaderboardType::ShootingGallery));
        assert_eq!(table.lookup(42), Some(LeaderboardType::Racing));
        assert_eq!(table.lookup(7), Some(LeaderboardType::None));
        assert_eq!(table.lookup(8), None);
    }

    #[test]
    fn missing_content_table_is_empty() {
        let dir = tempdir().unwrap();
        let table = ActivityTable::read(&dir.path().join("nope.json")).unwrap();
        assert!(table.0.is_empty());
    }
}
