mod error;
mod play;
mod quiz;
mod shell;
mod store;

use crate::error::Result;
use crate::play::RngPositions;
use crate::shell::Terminal;
use crate::store::{import_json, seed_defaults, QuizStore, SqliteStore};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quiz_trainer", version, about = "Interactive question/answer trainer")]
struct Cli {
    /// SQLite file holding the quizzes
    #[arg(long, default_value = store::DB_PATH)]
    db: PathBuf,

    /// Keep quizzes in memory for this run only
    #[arg(long)]
    memory: bool,

    /// JSON file of quizzes to append at startup
    #[arg(long)]
    import: Option<PathBuf>,

    /// Do not seed the default quizzes into an empty store
    #[arg(long)]
    no_seed: bool,
}

fn open_store(cli: &Cli) -> Result<SqliteStore> {
    let mut store = if cli.memory {
        SqliteStore::open_in_memory()?
    } else {
        SqliteStore::open(&cli.db)?
    };

    if !cli.no_seed {
        seed_defaults(&mut store)?;
    }
    if let Some(path) = &cli.import {
        import_json(&mut store, path)?;
    }
    Ok(store)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quiz_trainer=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut store = match open_store(&cli) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening quiz store: {e}");
            process::exit(1);
        }
    };
    match store.count() {
        Ok(count) => info!(count, "quiz store ready"),
        Err(e) => warn!(error = %e, "could not count quizzes"),
    }

    println!("Welcome to Quiz Trainer");
    println!("Type 'help' to see the commands.");
    println!();

    let mut term = Terminal::stdin();
    shell::run(&mut store, &mut term, &mut RngPositions::thread());
}
