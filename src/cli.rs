//! Command-line interface

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::types::{Position, RotationInterval};
use crate::widget::WidgetCommand;

#[derive(Parser, Debug)]
#[command(
    name = "word-of-the-day",
    version,
    about = "Show one vocabulary word at a time and rotate through the list"
)]
pub struct Cli {
    /// Directory holding words.txt, words.json and state.json
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the current word (default)
    Show,
    /// Move on to the next unseen word
    Next,
    /// Mark the current word as already known and move on
    Skip,
    /// Mark every word unseen and start from the top
    Reset,
    /// Re-read the words file after editing it
    Reload,
    /// Add a word to the end of the list
    Add {
        source: String,
        #[arg(default_value = "")]
        translation_a: String,
        #[arg(default_value = "")]
        translation_b: String,
    },
    /// Set how often the word changes: 1h..6h or never
    Interval { interval: RotationInterval },
    /// Remember whether the widget should start with the session
    Autostart { toggle: Toggle },
    /// Remember the widget window position
    #[command(allow_negative_numbers = true)]
    Move { x: f64, y: f64 },
    /// Print the words file path, creating it from the current list if needed
    Path,
    /// Print progress counts and preferences
    Status,
    /// Print the introduction text
    About,
    /// Keep running: rotate on the timer and read commands from stdin
    Run,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Command {
    /// One-shot form of this command, `None` for `run`
    pub fn as_widget_command(&self) -> Option<WidgetCommand> {
        let command = match self {
            Command::Show => WidgetCommand::Show,
            Command::Next => WidgetCommand::Next,
            Command::Skip => WidgetCommand::Skip,
            Command::Reset => WidgetCommand::Reset,
            Command::Reload => WidgetCommand::Reload,
            Command::Add {
                source,
                translation_a,
                translation_b,
            } => WidgetCommand::Add {
                source: source.clone(),
                translation_a: translation_a.clone(),
                translation_b: translation_b.clone(),
            },
            Command::Interval { interval } => WidgetCommand::Interval(*interval),
            Command::Autostart { toggle } => WidgetCommand::AutoStart(*toggle == Toggle::On),
            Command::Move { x, y } => WidgetCommand::Move(Position::new(*x, *y)),
            Command::Path => WidgetCommand::Path,
            Command::Status => WidgetCommand::Status,
            Command::About => WidgetCommand::About,
            Command::Run => return None,
        };
        Some(command)
    }
}
