//! erpseed binary.
//!
//! Opens a SQLite configuration store and runs idempotent provisioning tasks
//! against it.
//!
//! # Usage
//!
//! ```text
//! erpseed --database erp.sqlite seed fixtures/base.json
//! erpseed --database erp.sqlite run default-taxes itbms-taxes
//! DB_NAME=erp.sqlite ODOO_COUNTRY_CODE=PA erpseed all
//! erpseed --database erp.sqlite dump > state.json
//! ```
//!
//! Tunables come from an optional TOML file (`--config` / `ODOO_CONF`)
//! overlaid with `ODOO_*` environment variables, e.g.
//! `ODOO_CREDIT_NOTES_JOURNAL_CODE=NC`.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use erpseed_store_sqlite::{Snapshot, SqliteStore};
use erpseed_tasks::{Settings, Task, TaskReport};
use tracing::{Level, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt as _};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "erpseed", version, about = "Idempotent ERP configuration provisioning")]
struct Cli {
  /// SQLite store to provision.
  #[arg(short, long, env = "DB_NAME", value_name = "FILE")]
  database: Option<PathBuf>,

  /// TOML file with task settings.
  #[arg(short, long, env = "ODOO_CONF", value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the given tasks in order.
  Run {
    #[arg(required = true, value_name = "TASK")]
    tasks: Vec<Task>,
  },
  /// Run every task in dependency order.
  All,
  /// List task names.
  List,
  /// Import a JSON snapshot into the store.
  Seed { file: PathBuf },
  /// Print the store as a JSON snapshot.
  Dump,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Warnings and errors on stderr, progress on stdout.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr.with_max_level(Level::WARN).or_else(std::io::stdout))
    .with_target(false)
    .init();

  let cli = Cli::parse();

  let tasks: Vec<Task> = match cli.command {
    Command::List => {
      for task in Task::all() {
        println!("{task}");
      }
      return Ok(ExitCode::SUCCESS);
    }
    Command::Run { tasks } => tasks,
    Command::All => Task::all().collect(),
    Command::Seed { file } => {
      let store = open_store(cli.database).await?;
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading snapshot {}", file.display()))?;
      let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", file.display()))?;
      store.import(snapshot).await.context("importing snapshot")?;
      return Ok(ExitCode::SUCCESS);
    }
    Command::Dump => {
      let store = open_store(cli.database).await?;
      let snapshot = store.export().await.context("exporting snapshot")?;
      println!("{}", serde_json::to_string_pretty(&snapshot)?);
      return Ok(ExitCode::SUCCESS);
    }
  };

  let settings = load_settings(cli.config)?;
  let store = open_store(cli.database).await?;

  match erpseed_tasks::run_all(&store, &settings, tasks).await {
    Ok(reports) => {
      let failed = print_reports(&reports);
      Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
    }
    Err(aborted) => {
      // Earlier tasks stay committed; show what they did.
      print_reports(&aborted.completed);
      Err(aborted).context("provisioning aborted")
    }
  }
}

/// Print one line per task. Returns whether any task failed.
fn print_reports(reports: &[(Task, TaskReport)]) -> bool {
  let mut failed = false;
  for (task, report) in reports {
    match report {
      TaskReport::Completed(summary) => println!("{task}: {summary}"),
      TaskReport::Skipped(reason) => println!("{task}: skipped ({reason})"),
      TaskReport::Failed(reason) => {
        eprintln!("{task}: failed ({reason})");
        failed = true;
      }
    }
  }
  failed
}

/// Optional TOML file, overlaid with `ODOO_*` environment variables.
fn load_settings(path: Option<PathBuf>) -> anyhow::Result<Settings> {
  let mut builder = config::Config::builder();
  if let Some(path) = path {
    builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
  }
  let settings: Settings = builder
    .add_source(config::Environment::with_prefix("ODOO"))
    .build()
    .context("failed to read settings")?
    .try_deserialize()
    .context("failed to deserialise settings")?;
  Ok(settings.normalized())
}

async fn open_store(path: Option<PathBuf>) -> anyhow::Result<SqliteStore> {
  let path = path.context("no store given; pass --database or set DB_NAME")?;
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}
