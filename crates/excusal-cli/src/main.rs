//! `excusal`: attendance exception requests from the command line.
//!
//! # Usage
//!
//! ```text
//! excusal login student1 --password password
//! excusal submit --subject Math --date 2024-03-10 --reason "fever" --to both
//! excusal login hod1 --password password
//! excusal list --status pending
//! excusal review <id> reject --reason "Invalid date"
//! excusal serve
//! ```
//!
//! Settings come from `excusal.toml` (or `--config`) and `EXCUSAL_*`
//! environment variables.

mod commands;
mod display;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Local;
use clap::{Parser, Subcommand};
use commands::{Portal, PortalCommand};
use excusal_api::{AppState, ServerConfig, Store};
use excusal_core::{RequestStore, notify::NotificationLog};
use excusal_store_file::FileBackend;
use settings::Settings;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "excusal", version, about = "Attendance exception request portal")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = settings::DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  /// Data file to use instead of the configured one.
  #[arg(long, value_name = "FILE")]
  data: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,
  #[command(flatten)]
  Portal(PortalCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let mut settings = Settings::load(&args.config)?;
  if let Some(data) = args.data {
    settings.data_path = data;
  }

  let backend = FileBackend::open(&settings.data_path)
    .with_context(|| format!("failed to open data file {}", settings.data_path.display()))?;
  let store = RequestStore::new(backend.clone(), NotificationLog::new(backend));

  match args.command {
    Command::Serve => serve(store, settings.server()).await,
    Command::Portal(command) => {
      let output = Portal::new(store).run(command, Local::now().fixed_offset())?;
      print!("{output}");
      Ok(())
    }
  }
}

async fn serve(store: Store<FileBackend>, config: ServerConfig) -> anyhow::Result<()> {
  let app = excusal_api::router(AppState::new(store));
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
