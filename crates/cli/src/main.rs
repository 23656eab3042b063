use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use timeline::{apply_command, EditCommand, Editor, EditorConfig, Sequence};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "timeline-cli")]
#[command(about = "Headless timeline editing: run edit scripts and inspect job sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON edit script to a sequence
    Run {
        /// Sequence JSON file
        #[arg(short, long)]
        sequence: PathBuf,

        /// Script JSON file: an array of edit commands, `undo` and `redo`
        #[arg(long)]
        script: PathBuf,

        /// Editor settings JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the edited sequence (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep going when a step fails
        #[arg(long)]
        keep_going: bool,
    },

    /// Check a sequence file and print a summary of its tracks
    Verify {
        /// Sequence JSON file
        sequence: PathBuf,
    },

    /// Inspect or control job sessions
    Jobs {
        /// Directory holding the session folders
        #[arg(short, long)]
        root: PathBuf,

        #[command(subcommand)]
        action: JobAction,
    },
}

#[derive(Subcommand)]
enum JobAction {
    /// Print the latest status of a session
    Status { session: String },
    /// Ask a session's worker to stop
    Abort { session: String },
    /// Remove status, completion and abort messages
    Clear { session: String },
    /// Delete the session folder
    Remove { session: String },
    /// Follow a session until it completes or is aborted
    Watch {
        session: String,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval: u64,
    },
}

#[derive(Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum HistoryStep {
    Undo,
    Redo,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptStep {
    History(HistoryStep),
    Edit(EditCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Run {
            sequence,
            script,
            config,
            output,
            keep_going,
        } => run_command(sequence, script, config, output, keep_going),
        Commands::Verify { sequence } => verify_command(sequence),
        Commands::Jobs { root, action } => jobs_command(root, action),
    }
}

fn load_sequence(path: &Path) -> Result<Sequence> {
    Sequence::load_json(path).with_context(|| format!("load sequence {:?}", path))
}

fn run_command(
    sequence_path: PathBuf,
    script_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    keep_going: bool,
) -> Result<()> {
    let seq = load_sequence(&sequence_path)?;
    let config = match config_path {
        Some(path) => EditorConfig::load(&path).with_context(|| format!("load config {:?}", path))?,
        None => EditorConfig::default(),
    };
    let script = std::fs::read_to_string(&script_path)
        .with_context(|| format!("read script {:?}", script_path))?;
    let steps: Vec<ScriptStep> =
        serde_json::from_str(&script).with_context(|| format!("parse script {:?}", script_path))?;

    info!("Running {} steps on sequence '{}'", steps.len(), seq.name);
    let mut editor = Editor::headless(seq, config);
    for (n, step) in steps.into_iter().enumerate() {
        let result = match step {
            ScriptStep::History(HistoryStep::Undo) => editor.undo().map(|name| info!("undo {}", name)),
            ScriptStep::History(HistoryStep::Redo) => editor.redo().map(|name| info!("redo {}", name)),
            ScriptStep::Edit(command) => apply_command(&mut editor, command),
        };
        if let Err(e) = result {
            if !keep_going {
                return Err(e).with_context(|| format!("step {} failed", n));
            }
            warn!("Step {} failed: {}", n, e);
        }
    }

    let edited = editor.into_sequence();
    edited.check_invariants().context("edited sequence is inconsistent")?;
    let json = edited.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
            info!("Edited sequence written to: {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn verify_command(sequence_path: PathBuf) -> Result<()> {
    let seq = load_sequence(&sequence_path)?;
    seq.check_invariants().context("sequence is inconsistent")?;
    if let Some(clip) = seq.find_sync_cycle() {
        bail!("sync cycle through clip {}", clip);
    }
    println!("Sequence '{}': {} frames", seq.name, seq.length());
    for track in seq.tracks() {
        println!(
            "  {} {:?}{}: {} clips, {} entries, {} frames",
            track.name,
            track.kind,
            if track.locked { " (locked)" } else { "" },
            track.clip_count(),
            track.count(),
            track.length()
        );
    }
    println!("  {} compositors", seq.compositors.len());
    Ok(())
}

fn jobs_command(root: PathBuf, action: JobAction) -> Result<()> {
    let sessions = jobs::JobSessions::new(root);
    match action {
        JobAction::Status { session } => {
            match sessions.poll_status(&session)? {
                Some(status) => println!(
                    "step {} frame {}/{} ({:.0}%) elapsed {:.1}s",
                    status.step,
                    status.frame,
                    status.length,
                    status.progress() * 100.0,
                    status.elapsed
                ),
                None => println!("no status yet"),
            }
            if sessions.is_complete(&session) {
                println!("completed");
            }
        }
        JobAction::Abort { session } => {
            sessions.abort(&session)?;
            info!("Abort requested for {}", session);
        }
        JobAction::Clear { session } => sessions.clear_flag_files(&session)?,
        JobAction::Remove { session } => sessions.remove_session(&session)?,
        JobAction::Watch { session, interval } => watch_session(sessions, session, interval)?,
    }
    Ok(())
}

fn watch_session(sessions: jobs::JobSessions, session: String, interval: u64) -> Result<()> {
    // fail early on a missing session
    sessions.poll_status(&session)?;
    let mut monitor = jobs::JobMonitor::start(
        sessions,
        jobs::JobMonitorConfig {
            poll_interval_ms: interval,
        },
    );
    monitor.watch(session.clone());
    loop {
        let Some(event) = monitor.next_event(Duration::from_secs(60))? else {
            info!("Still waiting on {}", session);
            continue;
        };
        match event.status {
            jobs::JobStatus::Progress(status) => {
                info!("{} {:.0}%", session, status.progress() * 100.0)
            }
            jobs::JobStatus::Done => {
                info!("{} completed", session);
                break;
            }
            jobs::JobStatus::Aborted => {
                warn!("{} aborted", session);
                break;
            }
            jobs::JobStatus::Failed(e) => bail!("job {} failed: {}", session, e),
        }
    }
    monitor.stop()?;
    Ok(())
}
