//! Command-line harness for the playground.
//!
//! `run` executes a script file once and prints the resulting scene;
//! `watch` polls a script file and drives the live-edit session the way an
//! editor widget would, debounce included.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use crate::live_edit::LiveEditSession;
use crate::sandbox::RunOutcome;
use crate::scene::SceneObject;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script once and print the scene
    Run {
        /// Script file to execute
        #[arg(long)]
        script: PathBuf,

        /// JSON file holding an array of fixture documents
        #[arg(long)]
        fixtures: Option<PathBuf>,

        /// Dump the full scene as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Directory used for persistence (in-memory if omitted)
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Watch a script file and re-run it on change
    Watch {
        /// Script file to watch
        #[arg(long)]
        script: PathBuf,

        /// Directory used for persistence (in-memory if omitted)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Debounce window in milliseconds
        #[arg(long, default_value_t = 300)]
        debounce_ms: u64,

        /// File poll interval in milliseconds
        #[arg(long, default_value_t = 100)]
        poll_ms: u64,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            fixtures,
            json,
            store,
        } => run_once(&script, fixtures.as_deref(), json, store),
        Commands::Watch {
            script,
            store,
            debounce_ms,
            poll_ms,
        } => watch(&script, store, debounce_ms, poll_ms),
    }
}

fn make_store(dir: Option<PathBuf>) -> Box<dyn KeyValueStore> {
    match dir {
        Some(dir) => Box::new(FileStore::new(dir)),
        None => Box::new(MemoryStore::new()),
    }
}

fn load_fixtures(session: &mut LiveEditSession<Box<dyn KeyValueStore>>, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read fixtures file {path:?}"))?;
    let docs: Vec<serde_json::Value> =
        serde_json::from_str(&raw).with_context(|| format!("{path:?} is not a JSON array"))?;

    for doc in &docs {
        let text = serde_json::to_string(doc)?;
        session
            .add_fixture(&text)
            .map_err(|e| anyhow!("fixture rejected: {e}"))?;
    }
    Ok(())
}

fn run_once(script: &Path, fixtures: Option<&Path>, json: bool, store: Option<PathBuf>) -> Result<()> {
    let source = std::fs::read_to_string(script)
        .with_context(|| format!("cannot read script {script:?}"))?;

    let mut session = LiveEditSession::new(make_store(store));
    if let Some(path) = fixtures {
        load_fixtures(&mut session, path)?;
    }

    let outcome = session
        .run_now(&source)
        .map_err(|e| anyhow!("terminal failure: {e}"))?;

    report_outcome(&outcome);
    if let RunOutcome::Cleared(diagnostic) = &outcome {
        return Err(anyhow!("script failed: {diagnostic}"));
    }

    let scene = session.scene().borrow();
    if json {
        println!("{}", serde_json::to_string_pretty(&*scene)?);
    } else {
        println!(
            "scene: {} permanent + {} script objects",
            scene.permanent_len(),
            scene.transient().len()
        );
        for (i, object) in scene.transient().iter().enumerate() {
            println!("  [{i}] {}", object_label(object));
        }
    }
    Ok(())
}

fn watch(script: &Path, store: Option<PathBuf>, debounce_ms: u64, poll_ms: u64) -> Result<()> {
    let mut session = LiveEditSession::with_debounce(
        make_store(store),
        Duration::from_millis(debounce_ms),
    );

    println!("watching {script:?} (Ctrl-C to stop)");
    let mut last_seen: Option<String> = None;

    loop {
        match std::fs::read_to_string(script) {
            Ok(source) => {
                if last_seen.as_deref() != Some(source.as_str()) {
                    last_seen = Some(source.clone());
                    session.notify_change(&source, Instant::now());
                }
            }
            Err(e) => log::warn!("cannot read {script:?}: {e}"),
        }

        if let Some(result) = session.tick(Instant::now()) {
            match result {
                Ok(outcome) => {
                    report_outcome(&outcome);
                    let scene = session.scene().borrow();
                    println!(
                        "scene: {} permanent + {} script objects",
                        scene.permanent_len(),
                        scene.transient().len()
                    );
                }
                Err(e) => {
                    // Terminal double-failure: report and keep watching; the
                    // next edit starts a fresh attempt.
                    eprintln!("terminal failure: {e}");
                }
            }
        }

        std::thread::sleep(Duration::from_millis(poll_ms));
    }
}

fn report_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Applied => println!("applied"),
        RunOutcome::RolledBack(diagnostic) => {
            eprintln!("script failed: {diagnostic}");
            println!("rolled back to last good script");
        }
        RunOutcome::Cleared(diagnostic) => {
            eprintln!("script failed: {diagnostic}");
            println!("no good script yet, scene cleared");
        }
    }
}

fn object_label(object: &SceneObject) -> String {
    match object {
        SceneObject::Axes { length } => format!("axes length={length}"),
        SceneObject::Grid { extent, divisions, .. } => {
            format!("grid extent={extent} divisions={divisions}")
        }
        SceneObject::Sphere { center, radius, .. } => {
            format!("sphere at ({}, {}, {}) r={radius}", center[0], center[1], center[2])
        }
        SceneObject::Segment { start, end, .. } => format!(
            "segment ({}, {}, {}) -> ({}, {}, {})",
            start[0], start[1], start[2], end[0], end[1], end[2]
        ),
        SceneObject::Arrow { end, .. } => {
            format!("arrow to ({}, {}, {})", end[0], end[1], end[2])
        }
        SceneObject::Polyline { points, .. } => format!("polyline with {} points", points.len()),
        SceneObject::Quad { .. } => "quad".to_string(),
        SceneObject::WireBox { min, max, .. } => format!(
            "box ({}, {}, {}) .. ({}, {}, {})",
            min[0], min[1], min[2], max[0], max[1], max[2]
        ),
        SceneObject::Triad { origin, .. } => {
            format!("triad at ({}, {}, {})", origin[0], origin[1], origin[2])
        }
    }
}
