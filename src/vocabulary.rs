//! Vocabulary store
//!
//! Loads the ordered word list from the human-editable `words.txt`, falling
//! back to `words.json` and finally to the built-in list. The store owns the
//! per-entry seen flag and rewrites `words.txt` in full on every save.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{format, BUILTIN_WORDS};
use crate::error::StoreError;
use crate::types::VocabularyEntry;

/// Where a loaded list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyOrigin {
    Text,
    Json,
    Builtin,
}

pub struct VocabularyStore {
    words_txt: PathBuf,
    words_json: PathBuf,
    entries: Vec<VocabularyEntry>,
    origin: VocabularyOrigin,
}

impl VocabularyStore {
    /// Create a store for the given sources and load it
    pub fn open(words_txt: impl Into<PathBuf>, words_json: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            words_txt: words_txt.into(),
            words_json: words_json.into(),
            entries: Vec::new(),
            origin: VocabularyOrigin::Builtin,
        };
        store.load();
        store
    }

    /// Re-read the list: text source, then JSON source, then built-in
    ///
    /// Never fails. Read errors are logged and the next source is tried.
    pub fn load(&mut self) -> &[VocabularyEntry] {
        let (entries, origin) = self.read_sources();
        self.entries = entries;
        self.origin = origin;
        &self.entries
    }

    fn read_sources(&self) -> (Vec<VocabularyEntry>, VocabularyOrigin) {
        match self.read_text() {
            Ok(entries) if !entries.is_empty() => {
                info!(
                    path = %self.words_txt.display(),
                    count = entries.len(),
                    "Loaded vocabulary from text source"
                );
                return (entries, VocabularyOrigin::Text);
            }
            Ok(_) => debug!(path = %self.words_txt.display(), "Text source missing or empty"),
            Err(e) => warn!(error = %e, "Falling back from text source"),
        }

        match self.read_json() {
            Ok(entries) if !entries.is_empty() => {
                info!(
                    path = %self.words_json.display(),
                    count = entries.len(),
                    "Loaded vocabulary from JSON source"
                );
                return (entries, VocabularyOrigin::Json);
            }
            Ok(_) => debug!(path = %self.words_json.display(), "JSON source missing or empty"),
            Err(e) => warn!(error = %e, "Falling back from JSON source"),
        }

        let entries = builtin();
        info!(count = entries.len(), "Using built-in vocabulary");
        (entries, VocabularyOrigin::Builtin)
    }

    /// Missing file reads as an empty list
    fn read_text(&self) -> Result<Vec<VocabularyEntry>, StoreError> {
        match fs::read_to_string(&self.words_txt) {
            Ok(contents) => Ok(parse_lines(&contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read {
                path: self.words_txt.clone(),
                source,
            }),
        }
    }

    fn read_json(&self) -> Result<Vec<VocabularyEntry>, StoreError> {
        let contents = match fs::read_to_string(&self.words_json) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.words_json.clone(),
                    source,
                })
            }
        };
        let contents = contents.trim_start_matches(format::BOM);
        serde_json::from_str(contents).map_err(|source| StoreError::Parse {
            path: self.words_json.clone(),
            source,
        })
    }

    /// Rewrite the text source from the in-memory list
    ///
    /// An empty list is never written so a broken load cannot wipe the file.
    pub fn save(&self) -> Result<(), StoreError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let write_err = |source| StoreError::Write {
            path: self.words_txt.clone(),
            source,
        };
        if let Some(parent) = self.words_txt.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.words_txt, format_lines(&self.entries)).map_err(write_err)?;
        debug!(path = %self.words_txt.display(), count = self.entries.len(), "Saved vocabulary");
        Ok(())
    }

    /// Add an unseen entry at the end and save at once
    ///
    /// The entry stays in memory even if the save fails.
    pub fn append(&mut self, entry: VocabularyEntry) -> Result<(), StoreError> {
        info!(source = %entry.source, "Appending vocabulary entry");
        self.entries.push(entry.with_seen(false));
        self.save()
    }

    /// Flag entry `index` as seen. Returns true if it was unseen before.
    pub fn mark_seen(&mut self, index: usize) -> bool {
        match self.entries.get(index) {
            Some(entry) if !entry.seen => {
                let updated = entry.with_seen(true);
                self.entries[index] = updated;
                true
            }
            _ => false,
        }
    }

    /// Clear the seen flag of every entry
    pub fn clear_seen(&mut self) {
        for slot in self.entries.iter_mut().filter(|e| e.seen) {
            *slot = slot.with_seen(false);
        }
    }

    /// Write the text source from the current list unless it exists already
    pub fn ensure_source_file(&self) -> Result<&Path, StoreError> {
        if !self.source_exists() {
            self.save()?;
        }
        Ok(&self.words_txt)
    }

    pub fn source_exists(&self) -> bool {
        self.words_txt.exists()
    }

    pub fn source_path(&self) -> &Path {
        &self.words_txt
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&VocabularyEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn origin(&self) -> VocabularyOrigin {
        self.origin
    }
}

/// Parse the line-oriented format, skipping comments, blanks and malformed lines
pub fn parse_lines(contents: &str) -> Vec<VocabularyEntry> {
    contents
        .trim_start_matches(format::BOM)
        .lines()
        .enumerate()
        .filter_map(|(number, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with(format::COMMENT_PREFIX) {
                return None;
            }
            let entry = parse_line(line);
            if entry.is_none() {
                debug!(line = number + 1, content = %line, "Skipping malformed vocabulary line");
            }
            entry
        })
        .collect()
}

/// `source|translationA|translationB|seen`, everything after the source optional
fn parse_line(line: &str) -> Option<VocabularyEntry> {
    let mut fields = line.split(format::FIELD_SEPARATOR).map(str::trim);
    let source = fields.next().filter(|s| !s.is_empty())?;
    let translation_a = fields.next().unwrap_or_default();
    let translation_b = fields.next().unwrap_or_default();
    let seen = fields.next().is_some_and(parse_seen_flag);
    Some(VocabularyEntry::new(source, translation_a, translation_b).with_seen(seen))
}

fn parse_seen_flag(flag: &str) -> bool {
    flag == "1" || flag.eq_ignore_ascii_case("true")
}

/// Serialize entries to the text format, header line first
pub fn format_lines(entries: &[VocabularyEntry]) -> String {
    let mut out = String::from(format::HEADER);
    out.push('\n');
    for entry in entries {
        let flag = if entry.seen { 1 } else { 0 };
        out.push_str(&format!(
            "{}|{}|{}|{}\n",
            entry.source, entry.translation_a, entry.translation_b, flag
        ));
    }
    out
}

/// The curated list compiled into the binary
pub fn builtin() -> Vec<VocabularyEntry> {
    parse_lines(BUILTIN_WORDS)
}
