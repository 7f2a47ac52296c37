//! rstf CLI.
//!
//! `generate` runs a clean build of `.rstf/`; `watch` keeps it current while
//! handler and component files change.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use rstf_codegen::{ChangeEvent, ChangeKind, Generator, GeneratorConfig, RegenerateResult};

mod ui;

/// Quiet period before a burst of file events is handed to the generator.
const DEBOUNCE: Duration = Duration::from_millis(50);

/// Directories under the project root that never trigger regeneration,
/// besides hidden ones.
const UNWATCHED_DIRS: &[&str] = &["node_modules"];

#[derive(Parser)]
#[command(name = "rstf")]
#[command(about = "rstf codegen - typed glue between Go route handlers and TSX components")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct GenerateArgs {
    /// Project root (the directory holding go.mod)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Maximum concurrent tasks per phase (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Do not run `go get` for the framework packages
    #[arg(long)]
    skip_host_deps: bool,
}

impl GenerateArgs {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            workers: self.workers,
            resolve_host_deps: !self.skip_host_deps,
            ..GeneratorConfig::new(&self.root)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate .rstf/ from scratch
    Generate {
        #[command(flatten)]
        args: GenerateArgs,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Generate, then regenerate incrementally on every change
    Watch {
        #[command(flatten)]
        args: GenerateArgs,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { args, json } => run_generate(&args, json).await,
        Commands::Watch { args } => run_watch(&args).await,
    }
}

/// Full build.
async fn run_generate(args: &GenerateArgs, json: bool) -> miette::Result<()> {
    let start = Instant::now();
    let mut generator = Generator::new(args.config())?;

    if json {
        let result = generator.generate().await?;
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
        return Ok(());
    }

    ui::print_compact_header(env!("CARGO_PKG_VERSION"));
    let spinner = ui::spinner("Generating...");
    match generator.generate().await {
        Ok(result) => {
            spinner.finish_and_clear();
            ui::success(&format!(
                "{} route(s) {} {} hydration entr{}",
                result.route_count,
                ui::symbols::DOT,
                result.entries.len(),
                if result.entries.len() == 1 { "y" } else { "ies" }
            ));
            ui::timing("Done", start.elapsed().as_millis());
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            ui::error_header();
            ui::timing("Failed", start.elapsed().as_millis());
            Err(e.into())
        }
    }
}

/// Full build, then incremental regeneration until Ctrl+C.
async fn run_watch(args: &GenerateArgs) -> miette::Result<()> {
    ui::print_compact_header(env!("CARGO_PKG_VERSION"));

    let mut generator = Generator::new(args.config())?;
    let root = generator.root().to_path_buf();

    let start = Instant::now();
    let result = generator.generate().await?;
    ui::success(&format!(
        "Generated {} route(s) in {}ms",
        result.route_count,
        start.elapsed().as_millis()
    ));

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<ChangeEvent>>();
    let watch_root = root.clone();
    let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| match result {
        Ok(events) => {
            let batch: Vec<ChangeEvent> = events
                .into_iter()
                .filter(|event| is_watched(&watch_root, &event.path))
                .map(|event| ChangeEvent::classify(event.path))
                .filter(|event| event.kind != ChangeKind::Other)
                .collect();
            if !batch.is_empty() {
                let _ = tx.send(batch);
            }
        }
        Err(e) => tracing::warn!(error = %e, "File watcher error"),
    })
    .into_diagnostic()?;

    debouncer
        .watcher()
        .watch(&root, RecursiveMode::Recursive)
        .into_diagnostic()?;

    ui::info(&format!("Watching {}", root.display()));

    loop {
        tokio::select! {
            Some(mut batch) = rx.recv() => {
                while let Ok(more) = rx.try_recv() {
                    batch.extend(more);
                }
                let start = Instant::now();
                match generator.regenerate(&batch).await {
                    Ok(result) => report_regenerate(&root, &batch, &result, start.elapsed()),
                    Err(e) => {
                        ui::error(&format!("{}", e));
                        ui::dim("Keeping the previous generation.");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

fn report_regenerate(root: &Path, batch: &[ChangeEvent], result: &RegenerateResult, elapsed: Duration) {
    println!();
    for event in batch {
        ui::dim(&format!("changed {}", ui::relative(root, &event.path)));
    }
    for route in &result.changed_entries {
        ui::changed_item("entry", route);
    }
    if result.server_changed {
        ui::changed_item("server", "server_gen.go (restart required)");
    }
    ui::timing("Regenerated", elapsed.as_millis());
}

/// Whether a path is inside the project and outside hidden or vendored
/// directories.
fn is_watched(root: &Path, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    rel.components().all(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| !name.starts_with('.') && !UNWATCHED_DIRS.contains(&name)),
        _ => true,
    })
}
