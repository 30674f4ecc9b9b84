//! Headless widget front end
//!
//! Stands in for the window: prints the current entry instead of drawing it,
//! turns user input into [`WidgetCommand`]s and drives the rotation timer.
//! All engine calls happen on the thread that calls [`run`]; the stdin
//! listener only parses lines and sends commands over a channel.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::constants::{format, timing, INTRO_TEXT};
use crate::rotation::RotationEngine;
use crate::types::{Position, RotationInterval};
use crate::vocabulary::VocabularyOrigin;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    Show,
    Next,
    Skip,
    Reset,
    Reload,
    Add {
        source: String,
        translation_a: String,
        translation_b: String,
    },
    Interval(RotationInterval),
    AutoStart(bool),
    Move(Position),
    Path,
    Status,
    About,
    Quit,
}

/// Whether the widget loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl FromStr for WidgetCommand {
    type Err = String;

    /// One command per line, e.g. `skip`, `interval 2h`, `add kuća|дом|house`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb.to_lowercase().as_str() {
            "show" => WidgetCommand::Show,
            "next" => WidgetCommand::Next,
            "skip" => WidgetCommand::Skip,
            "reset" => WidgetCommand::Reset,
            "reload" => WidgetCommand::Reload,
            "path" => WidgetCommand::Path,
            "status" => WidgetCommand::Status,
            "about" => WidgetCommand::About,
            "quit" | "exit" => WidgetCommand::Quit,
            "interval" => WidgetCommand::Interval(rest.parse()?),
            "autostart" => match rest.to_lowercase().as_str() {
                "on" | "true" | "1" => WidgetCommand::AutoStart(true),
                "off" | "false" | "0" => WidgetCommand::AutoStart(false),
                other => return Err(format!("expected on or off, got '{other}'")),
            },
            "move" => {
                let coords: Vec<f64> = rest
                    .split_whitespace()
                    .map(str::parse::<f64>)
                    .collect::<Result<_, _>>()
                    .map_err(|e| format!("invalid coordinate: {e}"))?;
                match coords.as_slice() {
                    [x, y] => WidgetCommand::Move(Position::new(*x, *y)),
                    _ => return Err("usage: move <x> <y>".to_string()),
                }
            }
            "add" => {
                let mut fields = rest.split(format::FIELD_SEPARATOR).map(str::trim);
                let source = fields.next().unwrap_or_default();
                if source.is_empty() {
                    return Err("usage: add source|translationA|translationB".to_string());
                }
                WidgetCommand::Add {
                    source: source.to_string(),
                    translation_a: fields.next().unwrap_or_default().to_string(),
                    translation_b: fields.next().unwrap_or_default().to_string(),
                }
            }
            "" => return Err("empty command".to_string()),
            other => return Err(format!("unknown command '{other}'")),
        };
        Ok(command)
    }
}

/// Apply one command to the engine and print the result
pub fn execute(
    engine: &mut RotationEngine,
    command: &WidgetCommand,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<Flow> {
    debug!(command = ?command, "Executing command");
    match command {
        WidgetCommand::Show => {}
        WidgetCommand::Next => {
            if !engine.advance(now) {
                writeln!(out, "No unseen words left. Use `reset` to start over.")?;
            }
        }
        WidgetCommand::Skip => engine.skip_current(now),
        WidgetCommand::Reset => engine.reset_all_progress(now),
        WidgetCommand::Reload => {
            engine.reload_vocabulary(now);
        }
        WidgetCommand::Add {
            source,
            translation_a,
            translation_b,
        } => {
            if !engine.add_entry(source, translation_a, translation_b, now) {
                writeln!(out, "A word needs a source text.")?;
                return Ok(Flow::Continue);
            }
            writeln!(out, "Added {source}.")?;
        }
        WidgetCommand::Interval(interval) => {
            engine.set_rotation_option(*interval, now);
            writeln!(out, "Word changes: {}", describe_interval(*interval))?;
            return Ok(Flow::Continue);
        }
        WidgetCommand::AutoStart(enabled) => {
            engine.set_auto_start(*enabled);
            writeln!(out, "Start with session: {}", if *enabled { "on" } else { "off" })?;
            return Ok(Flow::Continue);
        }
        WidgetCommand::Move(position) => {
            engine.set_window_position(*position);
            return Ok(Flow::Continue);
        }
        WidgetCommand::Path => {
            let path = engine
                .ensure_source_file()
                .context("Failed to create the words file")?;
            writeln!(out, "{}", path.display())?;
            return Ok(Flow::Continue);
        }
        WidgetCommand::Status => {
            write_status(engine, out)?;
            return Ok(Flow::Continue);
        }
        WidgetCommand::About => {
            writeln!(out, "{INTRO_TEXT}")?;
            return Ok(Flow::Continue);
        }
        WidgetCommand::Quit => return Ok(Flow::Quit),
    }
    render(engine, out)?;
    Ok(Flow::Continue)
}

/// Apply a one-shot command, first catching up on a rotation that came due
/// while the widget was not running
pub fn execute_once(
    engine: &mut RotationEngine,
    command: &WidgetCommand,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<Flow> {
    if matches!(command, WidgetCommand::Show | WidgetCommand::Status) {
        engine.on_timer_tick(now);
    }
    execute(engine, command, now, out)
}

/// Print the entry on screen
pub fn render(engine: &RotationEngine, out: &mut impl Write) -> io::Result<()> {
    match engine.current_entry() {
        Some(entry) => writeln!(out, "{entry}"),
        None => writeln!(out, "(no words)"),
    }
}

fn write_status(engine: &RotationEngine, out: &mut impl Write) -> io::Result<()> {
    let entries = engine.entries();
    let state = engine.progress();
    let seen = entries.iter().filter(|e| e.seen).count();

    writeln!(
        out,
        "Words:        {} ({} seen, {} unseen)",
        entries.len(),
        seen,
        entries.len() - seen
    )?;
    writeln!(out, "Current:      #{}", state.current_index + 1)?;
    writeln!(out, "Queued:       {}", state.remaining_queue.len())?;
    writeln!(out, "Skipped:      {}", state.skipped_set.len())?;
    writeln!(out, "Word changes: {}", describe_interval(state.rotation_interval))?;
    match state.last_rotation {
        Some(at) => writeln!(out, "Last change:  {}", at.to_rfc3339())?,
        None => writeln!(out, "Last change:  never")?,
    }
    writeln!(out, "Autostart:    {}", if state.auto_start_enabled { "on" } else { "off" })?;
    writeln!(out, "Position:     {}, {}", state.window_position.x, state.window_position.y)?;
    let origin = match engine.store().origin() {
        VocabularyOrigin::Text => "words file",
        VocabularyOrigin::Json => "JSON file",
        VocabularyOrigin::Builtin => "built-in list",
    };
    writeln!(out, "Loaded from:  {origin}")?;
    writeln!(out, "Words file:   {}", engine.store().source_path().display())?;
    writeln!(out, "State file:   {}", engine.state_path().display())
}

fn describe_interval(interval: RotationInterval) -> String {
    match interval.duration() {
        Some(d) if d.num_hours() == 1 => "every hour".to_string(),
        Some(d) => format!("every {} hours", d.num_hours()),
        None => "never".to_string(),
    }
}

/// Read commands from stdin on a background thread
fn spawn_stdin_listener(sender: Sender<WidgetCommand>) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            info!("Command listener started");
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!(error = %e, "Failed to read command");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<WidgetCommand>() {
                    Ok(command) => {
                        if sender.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(input = %line, error = %e, "Ignoring command"),
                }
            }
            debug!("Command listener finished");
        })
        .context("Failed to spawn command listener")
}

#[cfg(unix)]
fn register_shutdown_signals(flag: &Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

    for signal in [SIGINT, SIGTERM, SIGHUP] {
        signal_hook::flag::register(signal, Arc::clone(flag))
            .with_context(|| format!("Failed to register handler for signal {signal}"))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn register_shutdown_signals(_flag: &Arc<AtomicBool>) -> Result<()> {
    Ok(())
}

/// Widget main loop: timer ticks and stdin commands, serialized on this thread
pub fn run(engine: &mut RotationEngine) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    register_shutdown_signals(&shutdown)?;

    // The loop keeps its own sender so the channel stays open after stdin closes
    let (command_tx, command_rx) = mpsc::channel();
    let _listener = spawn_stdin_listener(command_tx.clone())?;

    let mut out = io::stdout();
    if engine.take_intro() {
        writeln!(out, "{INTRO_TEXT}\n")?;
    }
    render(engine, &mut out)?;

    let mut last_tick = Instant::now();
    info!(period_secs = timing::TIMER_PERIOD.as_secs(), "Widget running");

    while !shutdown.load(Ordering::Relaxed) {
        match command_rx.recv_timeout(timing::POLL_INTERVAL) {
            Ok(command) => match execute(engine, &command, Utc::now(), &mut out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => error!(error = ?e, "Command failed"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => thread::sleep(timing::POLL_INTERVAL),
        }

        if last_tick.elapsed() >= timing::TIMER_PERIOD {
            last_tick = Instant::now();
            if engine.on_timer_tick(Utc::now()) {
                render(engine, &mut out)?;
            }
        }
        out.flush()?;
    }

    drop(command_tx);
    engine.on_shutdown();
    info!("Widget stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::StatePersistence;
    use crate::vocabulary::VocabularyStore;
    use chrono::{TimeDelta, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn engine(dir: &TempDir) -> RotationEngine {
        fs::write(dir.path().join("words.txt"), "kuća|дом|house|0\nvoda|вода|water|0\n").unwrap();
        RotationEngine::open(
            VocabularyStore::open(dir.path().join("words.txt"), dir.path().join("words.json")),
            StatePersistence::new(dir.path().join("state.json")),
        )
    }

    fn run_command(engine: &mut RotationEngine, command: WidgetCommand) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = execute(engine, &command, t0(), &mut out).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("skip".parse::<WidgetCommand>(), Ok(WidgetCommand::Skip));
        assert_eq!("  Reload ".parse::<WidgetCommand>(), Ok(WidgetCommand::Reload));
        assert_eq!("exit".parse::<WidgetCommand>(), Ok(WidgetCommand::Quit));
        assert!("dance".parse::<WidgetCommand>().is_err());
        assert!("".parse::<WidgetCommand>().is_err());
    }

    #[test]
    fn test_parse_commands_with_arguments() {
        assert_eq!(
            "interval 5h".parse::<WidgetCommand>(),
            Ok(WidgetCommand::Interval(RotationInterval::Hours5))
        );
        assert_eq!("autostart off".parse::<WidgetCommand>(), Ok(WidgetCommand::AutoStart(false)));
        assert_eq!(
            "move 100 -20.5".parse::<WidgetCommand>(),
            Ok(WidgetCommand::Move(Position::new(100.0, -20.5)))
        );
        assert!("move 100".parse::<WidgetCommand>().is_err());
        assert!("interval soon".parse::<WidgetCommand>().is_err());
    }

    #[test]
    fn test_parse_add() {
        assert_eq!(
            "add kuća | дом | house".parse::<WidgetCommand>(),
            Ok(WidgetCommand::Add {
                source: "kuća".to_string(),
                translation_a: "дом".to_string(),
                translation_b: "house".to_string(),
            })
        );
        assert_eq!(
            "add hleb".parse::<WidgetCommand>(),
            Ok(WidgetCommand::Add {
                source: "hleb".to_string(),
                translation_a: String::new(),
                translation_b: String::new(),
            })
        );
        assert!("add".parse::<WidgetCommand>().is_err());
    }

    #[test]
    fn test_next_renders_new_entry() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        let (flow, output) = run_command(&mut engine, WidgetCommand::Next);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(output, "kuća | дом | house\n");

        let (_, output) = run_command(&mut engine, WidgetCommand::Skip);
        assert_eq!(output, "voda | вода | water\n");
    }

    #[test]
    fn test_next_when_exhausted_explains() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        run_command(&mut engine, WidgetCommand::Next);
        run_command(&mut engine, WidgetCommand::Next);

        let (_, output) = run_command(&mut engine, WidgetCommand::Next);
        assert!(output.starts_with("No unseen words left"));
        assert!(output.ends_with("voda | вода | water\n"));
    }

    #[test]
    fn test_interval_command_persists() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        let (_, output) =
            run_command(&mut engine, WidgetCommand::Interval(RotationInterval::Hours1));
        assert_eq!(output, "Word changes: every hour\n");

        let saved = StatePersistence::new(dir.path().join("state.json")).load();
        assert_eq!(saved.rotation_interval, RotationInterval::Hours1);
        assert_eq!(saved.last_rotation, Some(t0()));
    }

    #[test]
    fn test_status_and_path() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);

        let (_, status) = run_command(&mut engine, WidgetCommand::Status);
        assert!(status.contains("Words:        2 (0 seen, 2 unseen)"));
        assert!(status.contains("Word changes: every 3 hours"));
        assert!(status.contains("Last change:  never"));
        assert!(status.contains("Loaded from:  words file"));

        let (_, path) = run_command(&mut engine, WidgetCommand::Path);
        assert_eq!(path.trim(), dir.path().join("words.txt").display().to_string());
    }

    #[test]
    fn test_one_shot_show_catches_up_on_due_rotation() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let show = |engine: &mut RotationEngine, at: DateTime<Utc>| {
            let mut out = Vec::new();
            execute_once(engine, &WidgetCommand::Show, at, &mut out).unwrap();
            String::from_utf8(out).unwrap()
        };

        // Never rotated: the first look is due at once
        assert_eq!(show(&mut engine, t0()), "kuća | дом | house\n");
        assert_eq!(show(&mut engine, t0() + TimeDelta::hours(1)), "kuća | дом | house\n");
        assert_eq!(show(&mut engine, t0() + TimeDelta::hours(3)), "voda | вода | water\n");

        let saved = StatePersistence::new(dir.path().join("state.json")).load();
        assert_eq!(saved.current_index, 1);
    }

    #[test]
    fn test_one_shot_next_does_not_tick_first() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let mut out = Vec::new();
        execute_once(&mut engine, &WidgetCommand::Next, t0(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "kuća | дом | house\n");
    }

    #[test]
    fn test_quit_stops_loop() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir);
        let (flow, output) = run_command(&mut engine, WidgetCommand::Quit);
        assert_eq!(flow, Flow::Quit);
        assert!(output.is_empty());
    }
}
