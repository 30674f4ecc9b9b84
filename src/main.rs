#![forbid(unsafe_code)]

mod cli;
mod config;
mod constants;
mod error;
mod persistence;
mod rotation;
mod types;
mod vocabulary;
mod widget;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::io;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Command};
use config::AppPaths;
use persistence::StatePersistence;
use rotation::RotationEngine;
use vocabulary::VocabularyStore;

fn main() -> Result<()> {
    // Logs go to stderr; stdout only carries the word itself
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config::log_level_from_env())
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let paths = AppPaths::resolve(cli.data_dir.clone());
    info!(data_dir = %paths.data_dir.display(), "Using data directory");

    let store = VocabularyStore::open(&paths.words_txt, &paths.words_json);
    let persistence = StatePersistence::new(&paths.state_file);
    let mut engine = RotationEngine::open(store, persistence);

    let command = cli.command.unwrap_or(Command::Show);
    match command.as_widget_command() {
        Some(one_shot) => {
            let mut out = io::stdout().lock();
            widget::execute_once(&mut engine, &one_shot, Utc::now(), &mut out)?;
            engine.on_shutdown();
            Ok(())
        }
        None => widget::run(&mut engine),
    }
}
