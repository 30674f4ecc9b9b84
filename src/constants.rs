//! Application-wide constants
//!
//! File names, timing and the built-in vocabulary live here so that every
//! module agrees on the same values.

/// On-disk locations (relative to the data directory)
pub mod paths {
    /// Directory created under the platform config dir
    pub const APP_DIR: &str = "word-of-the-day";

    /// Human-editable primary vocabulary source
    pub const WORDS_TXT: &str = "words.txt";

    /// Structured secondary vocabulary source
    pub const WORDS_JSON: &str = "words.json";

    /// Persisted rotation progress
    pub const STATE_FILE: &str = "state.json";

    /// Environment variable overriding the data directory
    pub const DATA_DIR_ENV: &str = "WOTD_DATA_DIR";
}

/// Vocabulary file format
pub mod format {
    /// Field separator in the primary source
    pub const FIELD_SEPARATOR: char = '|';

    /// Prefix marking a comment line
    pub const COMMENT_PREFIX: char = '#';

    /// Header written at the top of the primary source on every save
    pub const HEADER: &str = "# Format: source|translationA|translationB|seen(0/1)";

    /// UTF-8 byte order mark some editors prepend
    pub const BOM: char = '\u{feff}';
}

/// Timer and rotation constants
pub mod timing {
    use std::time::Duration;

    /// Period of the cooperative rotation timer
    pub const TIMER_PERIOD: Duration = Duration::from_secs(60);

    /// How long the widget loop blocks waiting for a command before
    /// re-checking the shutdown flag
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Persisted value meaning "never rotate"
    pub const NEVER_OPTION: u8 = 7;

    /// Option used on first run (every 3 hours)
    pub const DEFAULT_OPTION: u8 = 3;
}

/// Default window placement (top-left corner, in screen units)
pub mod window {
    pub const DEFAULT_X: f64 = 10.0;
    pub const DEFAULT_Y: f64 = 10.0;
}

/// Built-in vocabulary used when neither source file has entries
pub const BUILTIN_WORDS: &str = include_str!("../data/default_words.txt");

/// Text shown once on first start and on `about`
pub const INTRO_TEXT: &str = "\
This widget helps you pick up new words without effort.\n\
Glance at it from time to time and the words will slowly stick.\n\
\n\
The word changes every few hours. Change the interval or turn it off with `interval`,\n\
or move on by hand with `skip`.\n\
\n\
Add your own words with `add`, or edit the words file (`path` prints its location)\n\
and run `reload` afterwards. Seen words are marked with a trailing \"1\" in that file\n\
and are not shown again until `reset`.";
