//! Rotation engine
//!
//! Owns the vocabulary store and the progress state and is the only place
//! either is mutated. Every operation takes the current time as a parameter;
//! nothing in here reads the clock.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::constants::format;
use crate::error::StoreError;
use crate::persistence::{ProgressState, StatePersistence};
use crate::types::{Position, RotationInterval, VocabularyEntry};
use crate::vocabulary::VocabularyStore;

pub struct RotationEngine {
    store: VocabularyStore,
    state: ProgressState,
    persistence: StatePersistence,
}

impl RotationEngine {
    /// Load saved progress and reconcile it with the store's list
    pub fn open(store: VocabularyStore, persistence: StatePersistence) -> Self {
        let state = persistence.load();
        Self::from_parts(store, state, persistence)
    }

    pub fn from_parts(
        store: VocabularyStore,
        mut state: ProgressState,
        persistence: StatePersistence,
    ) -> Self {
        state.normalize(store.entries());
        info!(
            entries = store.len(),
            current_index = state.current_index,
            queued = state.remaining_queue.len(),
            skipped = state.skipped_set.len(),
            interval = %state.rotation_interval,
            "Rotation engine ready"
        );
        Self { store, state, persistence }
    }

    /// Entry on screen, `None` only when the list is empty
    pub fn current_entry(&self) -> Option<&VocabularyEntry> {
        self.store.get(self.state.current_index)
    }

    pub fn progress(&self) -> &ProgressState {
        &self.state
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        self.store.entries()
    }

    pub fn store(&self) -> &VocabularyStore {
        &self.store
    }

    pub fn state_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Advance to the first unseen, unskipped entry in file order
    ///
    /// Returns false when there is nothing left to show; the current entry
    /// then stays on screen.
    pub fn pick_next(&mut self, now: DateTime<Utc>) -> bool {
        if self.store.is_empty() {
            return false;
        }

        self.reset_cycle_if_exhausted();
        if self.state.remaining_queue.is_empty() {
            self.refill_queue();
        }

        let Some(next) = self.state.remaining_queue.pop_front() else {
            debug!("No unseen entries left");
            return false;
        };

        self.state.current_index = next;
        self.state.last_rotation = Some(now);

        if self.store.mark_seen(next) && self.store.source_exists() {
            self.save_vocabulary();
        }

        if let Some(entry) = self.store.get(next) {
            info!(
                index = next,
                source = %entry.source,
                remaining = self.state.remaining_queue.len(),
                "Showing next entry"
            );
        }
        true
    }

    /// User-requested rotation, persisted right away
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let rotated = self.pick_next(now);
        self.persist();
        rotated
    }

    /// Timer callback: rotate if the configured interval has elapsed
    ///
    /// State is saved on every due tick.
    pub fn maybe_rotate_on_timer(&mut self, now: DateTime<Utc>) -> bool {
        let Some(interval) = self.state.rotation_interval.duration() else {
            return false;
        };
        let due = match self.state.last_rotation {
            Some(last) => now - last >= interval,
            None => true,
        };
        if !due {
            return false;
        }

        debug!(interval = %self.state.rotation_interval, "Rotation interval elapsed");
        // A due tick may start a new cycle even when nothing is left to show
        let rotated = self.pick_next(now);
        self.persist();
        rotated
    }

    pub fn on_timer_tick(&mut self, now: DateTime<Utc>) -> bool {
        self.maybe_rotate_on_timer(now)
    }

    /// Mark the current entry as already known and move on
    pub fn skip_current(&mut self, now: DateTime<Utc>) {
        if self.store.is_empty() {
            return;
        }

        let current = self.state.current_index;
        if self.state.skipped_set.insert(current) {
            info!(index = current, skipped = self.state.skipped_set.len(), "Skipped entry");
        }
        self.state.remaining_queue.retain(|&i| i != current);
        self.reset_cycle_if_exhausted();

        self.pick_next(now);
        self.persist();
    }

    /// Mark every entry unseen and start over from the top of the list
    pub fn reset_all_progress(&mut self, now: DateTime<Utc>) {
        if self.store.is_empty() {
            return;
        }

        info!(entries = self.store.len(), "Resetting all progress");
        self.store.clear_seen();
        self.save_vocabulary();

        self.state.remaining_queue.clear();
        self.state.skipped_set.clear();
        self.state.current_index = 0;
        self.state.last_rotation = Some(now);

        self.pick_next(now);
        self.persist();
    }

    /// Re-read the vocabulary sources, keeping the displayed entry if it survived
    ///
    /// Returns true when the displayed entry was found again.
    pub fn reload_vocabulary(&mut self, now: DateTime<Utc>) -> bool {
        let previous = self.current_entry().cloned();

        self.store.load();
        self.state.remaining_queue.clear();
        self.state.normalize(self.store.entries());

        if self.store.is_empty() {
            self.persist();
            return false;
        }

        let found = previous
            .as_ref()
            .and_then(|prev| self.store.entries().iter().position(|e| e.same_word(prev)));

        match found {
            Some(index) => {
                info!(
                    from = self.state.current_index,
                    to = index,
                    "Kept current entry after reload"
                );
                self.state.current_index = index;
            }
            None => {
                info!(
                    previous = ?previous.map(|p| p.source),
                    "Current entry gone after reload, picking next"
                );
                self.state.current_index = 0;
                self.state.last_rotation = Some(now);
                self.pick_next(now);
            }
        }

        self.persist();
        found.is_some()
    }

    /// Change the rotation interval; the interval restarts at `now`
    pub fn set_rotation_option(&mut self, option: RotationInterval, now: DateTime<Utc>) {
        info!(interval = %option, "Rotation interval changed");
        self.state.rotation_interval = option;
        self.state.last_rotation = Some(now);
        self.persist();
    }

    /// Append a user-supplied entry and reload
    ///
    /// Fields are trimmed and may not contain the field separator. An empty
    /// source is rejected.
    pub fn add_entry(
        &mut self,
        source: &str,
        translation_a: &str,
        translation_b: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let source = sanitize_field(source);
        if source.is_empty() {
            warn!("Refusing to add entry without a source word");
            return false;
        }

        let entry = VocabularyEntry::new(
            source,
            sanitize_field(translation_a),
            sanitize_field(translation_b),
        );
        match self.store.append(entry) {
            Ok(()) => {
                self.reload_vocabulary(now);
            }
            Err(e) => {
                error!(error = %e, "Failed to save new entry, keeping it in memory");
                self.state.remaining_queue.clear();
                self.persist();
            }
        }
        true
    }

    /// Store the auto-start preference; registering with the OS is up to the caller
    pub fn set_auto_start(&mut self, enabled: bool) {
        info!(enabled, "Auto-start preference changed");
        self.state.auto_start_enabled = enabled;
        self.persist();
    }

    pub fn set_window_position(&mut self, position: Position) {
        debug!(x = position.x, y = position.y, "Window moved");
        self.state.window_position = position;
        self.persist();
    }

    /// True exactly once: the first time the widget starts
    pub fn take_intro(&mut self) -> bool {
        if self.state.intro_shown {
            return false;
        }
        self.state.intro_shown = true;
        self.persist();
        true
    }

    /// Path of the editable words file, written from the current list if missing
    pub fn ensure_source_file(&self) -> Result<PathBuf, StoreError> {
        self.store.ensure_source_file().map(|p| p.to_path_buf())
    }

    /// Flush state before exit
    pub fn on_shutdown(&self) {
        info!("Flushing state on shutdown");
        self.persist();
    }

    fn reset_cycle_if_exhausted(&mut self) {
        if !self.state.skipped_set.is_empty() && self.state.skipped_set.len() >= self.store.len() {
            info!(
                skipped = self.state.skipped_set.len(),
                "Every entry skipped, starting a new cycle"
            );
            self.state.skipped_set.clear();
            self.state.remaining_queue.clear();
        }
    }

    fn refill_queue(&mut self) {
        let skipped = &self.state.skipped_set;
        self.state.remaining_queue = self
            .store
            .entries()
            .iter()
            .enumerate()
            .filter(|(i, entry)| !entry.seen && !skipped.contains(i))
            .map(|(i, _)| i)
            .collect();
        debug!(queued = self.state.remaining_queue.len(), "Rebuilt remaining queue");
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.state) {
            error!(error = %e, "Failed to save progress state");
        }
    }

    fn save_vocabulary(&self) {
        if let Err(e) = self.store.save() {
            error!(error = %e, "Failed to save vocabulary");
        }
    }
}

fn sanitize_field(field: &str) -> String {
    field.trim().replace(format::FIELD_SEPARATOR, "/")
}
