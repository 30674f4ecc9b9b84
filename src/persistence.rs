use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::StateError;
use crate::types::{Position, RotationInterval, VocabularyEntry};

/// Rotation progress and user preferences, saved as `state.json`
///
/// Indices refer to the vocabulary list that was loaded alongside this state.
/// After loading, call [`ProgressState::normalize`] against the current list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub window_position: Position,

    /// Entry on screen (negative persisted values read as 0)
    #[serde(deserialize_with = "deserialize_index")]
    pub current_index: usize,

    /// `None` until the first rotation, so the first timer tick is always due
    pub last_rotation: Option<DateTime<Utc>>,

    /// Not yet shown, ascending file order
    #[serde(deserialize_with = "deserialize_indices")]
    pub remaining_queue: VecDeque<usize>,

    /// Marked "already known" by the user during this cycle
    #[serde(deserialize_with = "deserialize_indices")]
    pub skipped_set: BTreeSet<usize>,

    #[serde(rename = "rotationIntervalOption")]
    pub rotation_interval: RotationInterval,

    pub auto_start_enabled: bool,
    pub intro_shown: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            window_position: Position::default(),
            current_index: 0,
            last_rotation: None,
            remaining_queue: VecDeque::new(),
            skipped_set: BTreeSet::new(),
            rotation_interval: RotationInterval::default(),
            auto_start_enabled: true,
            intro_shown: false,
        }
    }
}

fn deserialize_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(usize::try_from(raw).unwrap_or(0))
}

/// Accepts any integer sequence, silently dropping negative entries
fn deserialize_indices<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: FromIterator<usize>,
{
    let raw = Option::<Vec<i64>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.into_iter().filter_map(|i| usize::try_from(i).ok()).collect())
}

impl ProgressState {
    /// Bring the state in line with `entries`
    ///
    /// Drops out-of-range and duplicate indices, removes seen or skipped
    /// indices from the queue, puts it back in file order and clamps
    /// `current_index`.
    pub fn normalize(&mut self, entries: &[VocabularyEntry]) {
        let len = entries.len();
        let before = (self.remaining_queue.len(), self.skipped_set.len());

        self.skipped_set.retain(|&i| i < len);

        // Collected through a set: ascending and free of duplicates
        let skipped = &self.skipped_set;
        let queued: BTreeSet<usize> = self
            .remaining_queue
            .iter()
            .copied()
            .filter(|&i| i < len && !entries[i].seen && !skipped.contains(&i))
            .collect();
        self.remaining_queue = queued.into_iter().collect();

        if self.current_index >= len {
            debug!(
                current_index = self.current_index,
                len,
                "Current index out of range, resetting"
            );
            self.current_index = 0;
        }

        let after = (self.remaining_queue.len(), self.skipped_set.len());
        if before != after {
            debug!(
                queue_removed = before.0 - after.0,
                skipped_removed = before.1 - after.1,
                "Purged stale indices"
            );
        }
    }
}

/// Reads and writes [`ProgressState`] as pretty-printed JSON
pub struct StatePersistence {
    path: PathBuf,
}

impl StatePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved state, or a fresh default on any failure
    pub fn load(&self) -> ProgressState {
        match self.try_load() {
            Ok(state) => {
                info!(
                    path = %self.path.display(),
                    current_index = state.current_index,
                    "Loaded progress state"
                );
                state
            }
            Err(StateError::Missing(path)) => {
                info!(path = %path.display(), "No saved state, starting fresh");
                ProgressState::default()
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable state");
                ProgressState::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<ProgressState, StateError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StateError::Missing(self.path.clone())
            } else {
                StateError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&contents).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write state to disk, creating the directory on demand
    pub fn save(&self, state: &ProgressState) -> Result<(), StateError> {
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)?;
        debug!(path = %self.path.display(), "Saved progress state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entries(seen: &[bool]) -> Vec<VocabularyEntry> {
        seen.iter()
            .enumerate()
            .map(|(i, &s)| VocabularyEntry::new(format!("word{i}"), "", "").with_seen(s))
            .collect()
    }

    fn sample_state() -> ProgressState {
        ProgressState {
            window_position: Position::new(640.5, 12.0),
            current_index: 2,
            last_rotation: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
            remaining_queue: VecDeque::from([3, 4, 7]),
            skipped_set: BTreeSet::from([1, 5]),
            rotation_interval: RotationInterval::Hours2,
            auto_start_enabled: false,
            intro_shown: true,
        }
    }

    #[test]
    fn test_default_state() {
        let state = ProgressState::default();
        assert_eq!(state.window_position, Position::new(10.0, 10.0));
        assert_eq!(state.current_index, 0);
        assert_eq!(state.last_rotation, None);
        assert_eq!(state.rotation_interval, RotationInterval::Hours3);
        assert!(state.auto_start_enabled);
        assert!(!state.intro_shown);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let persistence = StatePersistence::new(dir.path().join("state.json"));
        let state = sample_state();

        persistence.save(&state).unwrap();
        let mut loaded = persistence.load();
        assert_eq!(loaded, state);

        // Normalizing against a list that covers every index changes nothing
        loaded.normalize(&entries(&[false; 8]));
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_round_trip_purges_indices_outside_new_list() {
        let dir = TempDir::new().unwrap();
        let persistence = StatePersistence::new(dir.path().join("state.json"));
        persistence.save(&sample_state()).unwrap();

        let mut loaded = persistence.load();
        loaded.normalize(&entries(&[false; 4]));

        assert_eq!(loaded.remaining_queue, VecDeque::from([3]));
        assert_eq!(loaded.skipped_set, BTreeSet::from([1]));
        assert_eq!(loaded.current_index, 2);
        assert_eq!(loaded.rotation_interval, RotationInterval::Hours2);
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(sample_state()).unwrap();
        assert_eq!(json["windowPosition"]["x"], 640.5);
        assert_eq!(json["currentIndex"], 2);
        assert_eq!(json["remainingQueue"], serde_json::json!([3, 4, 7]));
        assert_eq!(json["skippedSet"], serde_json::json!([1, 5]));
        assert_eq!(json["rotationIntervalOption"], 2);
        assert_eq!(json["autoStartEnabled"], false);
        assert_eq!(json["introShown"], true);
        assert_eq!(json["lastRotation"], "2024-03-01T09:30:00Z");
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let persistence = StatePersistence::new(dir.path().join("state.json"));
        assert!(matches!(persistence.try_load(), Err(StateError::Missing(_))));
        assert_eq!(persistence.load(), ProgressState::default());
    }

    #[test]
    fn test_corrupt_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"currentIndex\": \"three\"").unwrap();

        let persistence = StatePersistence::new(&path);
        assert!(matches!(persistence.try_load(), Err(StateError::Corrupt { .. })));
        assert_eq!(persistence.load(), ProgressState::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"currentIndex": 4, "rotationIntervalOption": 7}"#).unwrap();

        let state = StatePersistence::new(&path).load();
        assert_eq!(state.current_index, 4);
        assert_eq!(state.rotation_interval, RotationInterval::Never);
        assert!(state.auto_start_enabled);
        assert!(state.remaining_queue.is_empty());
    }

    #[test]
    fn test_negative_indices_are_dropped() {
        let state: ProgressState = serde_json::from_str(
            r#"{
                "currentIndex": -3,
                "remainingQueue": [-1, 2],
                "skippedSet": [-5, 0],
                "lastRotation": null
            }"#,
        )
        .unwrap();
        assert_eq!(state.current_index, 0);
        assert_eq!(state.remaining_queue, VecDeque::from([2]));
        assert_eq!(state.skipped_set, BTreeSet::from([0]));
    }

    #[test]
    fn test_normalize_removes_seen_skipped_and_duplicates() {
        let mut state = ProgressState {
            current_index: 9,
            remaining_queue: VecDeque::from([0, 1, 1, 2, 3]),
            skipped_set: BTreeSet::from([2, 12]),
            ..ProgressState::default()
        };
        state.normalize(&entries(&[false, true, false, false]));

        assert_eq!(state.remaining_queue, VecDeque::from([0, 3]));
        assert_eq!(state.skipped_set, BTreeSet::from([2]));
        assert_eq!(state.current_index, 0);
    }

    #[test]
    fn test_normalize_sorts_hand_edited_queue() {
        let mut state = ProgressState {
            remaining_queue: VecDeque::from([3, 1, 0, 3]),
            ..ProgressState::default()
        };
        state.normalize(&entries(&[false; 4]));

        assert_eq!(state.remaining_queue, VecDeque::from([0, 1, 3]));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = TempDir::new().unwrap();
        let persistence = StatePersistence::new(dir.path().join("a").join("b").join("state.json"));
        persistence.save(&ProgressState::default()).unwrap();
        assert!(persistence.path().exists());
    }
}
