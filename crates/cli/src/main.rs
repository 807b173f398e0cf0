// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::Result;
use commands::Command;
use hourbank::{HourBank, Ports};
use hourbank_audit::Actor;
use hourbank_persistence::SqliteStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;

/// Hour bank - monthly hours and ticket bank calculations
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Analyst recorded on every write. Defaults to the system actor.
    #[arg(short, long, global = true)]
    author: Option<String>,

    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }

    /// `RUST_LOG` wins over `-v`/`-q` when set.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(self.log_level().into()))
    }

    fn actor(&self) -> Actor {
        self.author.as_deref().map_or_else(Actor::system, Actor::user)
    }
}

fn open_store(database: Option<&Path>) -> Result<SqliteStore> {
    let store: SqliteStore = if let Some(path) = database {
        info!("Using file-based database at: {}", path.display());
        SqliteStore::new_with_file(path)?
    } else {
        info!("Using in-memory database");
        SqliteStore::new_in_memory()?
    };
    Ok(store)
}

async fn execute(args: Args) -> Result<Value> {
    let store: Arc<SqliteStore> = Arc::new(open_store(args.database.as_deref())?);
    let bank: HourBank = HourBank::new(Ports::from_store(&store));
    let author: Actor = args.actor();
    args.command.run(&bank, &store, &author).await
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    // Logs go to stderr so stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(args.env_filter())
        .with_writer(std::io::stderr)
        .init();

    let output: Value = execute(args).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
