#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tui;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use jot_core::config::{AppConfig, resolve_config};
use jot_core::context::AppContext;
use jot_core::db::schema::SchemaTooNew;
use jot_core::error::ErrorCode;
use output::{CliError, CodedError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "jot: a to-do list with a live task store and a profile viewer",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Task database file (overrides `store.path` from the config).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Config file (default: the per-user jot/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Open the full-screen task list (default)",
        after_help = "EXAMPLES:\n    # Open the UI\n    jot\n\n    # Use a scratch database\n    jot --db /tmp/scratch.sqlite3 ui"
    )]
    Ui,

    #[command(
        about = "Add a task",
        after_help = "EXAMPLES:\n    # Add a task\n    jot add \"Buy milk\"\n\n    # Emit machine-readable output\n    jot add \"Buy milk\" --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        about = "Toggle a task between done and not done",
        after_help = "EXAMPLES:\n    # Mark task 3 done (or not done again)\n    jot toggle 3"
    )]
    Toggle(cmd::toggle::ToggleArgs),

    #[command(
        about = "List tasks",
        after_help = "EXAMPLES:\n    # List every task\n    jot list\n\n    # Emit machine-readable output\n    jot list --json"
    )]
    List,

    #[command(
        about = "Print the task list every time it changes",
        after_help = "EXAMPLES:\n    # Follow until Ctrl-C\n    jot watch\n\n    # Print the current snapshot and exit\n    jot watch --count 1 --json"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        about = "Fetch and show a public profile",
        after_help = "EXAMPLES:\n    # Show the configured profile\n    jot profile\n\n    # Show another handle, failing the command on error\n    jot profile hubot --strict"
    )]
    Profile(cmd::profile::ProfileArgs),

    #[command(
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    jot completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Where log lines go.
enum LogSink<'a> {
    Stderr,
    /// TUI mode: a file, so logs do not draw over the screen.
    File(&'a Path),
}

fn init_tracing(verbose: bool, sink: &LogSink<'_>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("JOT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "jot=debug,info"
        } else {
            "jot=info,warn"
        })
    });

    let (writer, ansi) = match sink {
        LogSink::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let format = env::var("JOT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_ansi(ansi).with_writer(writer))
                .init();
        }
    }
    Ok(())
}

/// Log file used while the TUI owns the terminal: `jot.log` next to the database.
fn tui_log_path(config: &AppConfig) -> PathBuf {
    config.database_path().with_file_name("jot.log")
}

/// Map a failure onto its stable error code.
fn classify(error: &anyhow::Error) -> ErrorCode {
    for cause in error.chain() {
        if let Some(coded) = cause.downcast_ref::<CodedError>() {
            return coded.code;
        }
        if cause.downcast_ref::<SchemaTooNew>().is_some() {
            return ErrorCode::SchemaTooNew;
        }
        if cause.downcast_ref::<rusqlite::Error>().is_some() {
            return ErrorCode::StorageFault;
        }
    }
    ErrorCode::InternalUnexpected
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Ui);

    if let Commands::Completions(args) = &command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let config = resolve_config(cli.config.as_deref(), cli.db.as_deref())
        .map_err(|err| CodedError::new(ErrorCode::ConfigParseError, format!("{err:#}")))?;

    let log_path = tui_log_path(&config);
    let sink = if matches!(command, Commands::Ui) {
        LogSink::File(&log_path)
    } else {
        LogSink::Stderr
    };
    init_tracing(cli.verbose, &sink)?;
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let ctx = AppContext::open(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    match command {
        Commands::Ui => tui::run(&ctx, &runtime),
        Commands::Add(args) => runtime.block_on(cmd::add::run_add(&ctx, &args, output)),
        Commands::Toggle(args) => runtime.block_on(cmd::toggle::run_toggle(&ctx, &args, output)),
        Commands::List => runtime.block_on(cmd::list::run_list(&ctx, output)),
        Commands::Watch(args) => runtime.block_on(cmd::watch::run_watch(&ctx, &args, output)),
        Commands::Profile(args) => {
            runtime.block_on(cmd::profile::run_profile(&ctx, &args, output))
        }
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = resolve_output_mode(cli.format, cli.json);

    match run(cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = classify(&err);
            debug!(code = code.code(), error = %format!("{err:#}"), "command failed");
            // Nothing useful is left to do if stderr itself is gone.
            let _ = render_error(output, &CliError::coded(code, &err));
            ExitCode::FAILURE
        }
    }
}
