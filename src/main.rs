//! # Quest CLI
//!
//! Synthesizes and validates a program from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Print the program and table list
//! quest plan --store quest.db \
//!     --query 'a(X):-b(X),c(X);' \
//!     --schema a=string --schema b=string --schema c=string
//!
//! # Validate only, queries and schema from quest.toml
//! quest check
//! ```
//!
//! Logging goes to stderr unless `logging.file` is set; `QUEST_LOG` overrides
//! the configured filter.

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use quest::config::LoggingConfig;
use quest::schema::parse_schema_decl;
use quest::{Config, JsonFileStore, MemoryStore, Quest, QueryConfig, Store};

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Schema-driven fact synthesis and validation
#[derive(Parser, Debug)]
#[command(name = "quest")]
#[command(version)]
#[command(about = "Synthesize and validate Datalog programs from a document store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the synthesized program statements and table list
    Plan(RunArgs),
    /// Validate the program and print `ok`
    Check(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file (defaults to quest.toml + quest.local.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON document store, overrides `store.path`
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Query rule, appended after configured queries
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// Relation schema as NAME=TYPE[,TYPE...]
    #[arg(long = "schema", value_parser = parse_schema_decl)]
    schemas: Vec<(String, Vec<quest::SchemaType>)>,
}

impl RunArgs {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::load().context("loading configuration")?,
        };

        if let Some(store) = &self.store {
            config.store.path = Some(store.clone());
        }
        for query in &self.queries {
            config.program.add_query(query.clone());
        }
        for (relation, types) in &self.schemas {
            config.program.set_schema(relation.clone(), types.clone());
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (args, plan) = match &cli.command {
        Command::Plan(args) => (args, true),
        Command::Check(args) => (args, false),
    };

    let config = args.load_config()?;
    init_tracing(&config.logging);

    match &config.store.path {
        Some(path) => {
            let store = JsonFileStore::open(path)
                .with_context(|| format!("opening store {}", path.display()))?;
            execute(store, config.query_config(), plan)
        }
        None => execute(MemoryStore::new(), config.query_config(), plan),
    }
}

fn execute<S: Store>(store: S, program: &QueryConfig, plan: bool) -> anyhow::Result<()> {
    let quest = Quest::new(store);

    if !plan {
        quest.check(program)?;
        println!("ok");
        return Ok(());
    }

    let plan = quest.plan(program)?;
    for statement in plan.program.statements() {
        println!("{statement}");
    }
    println!("tables: [{}]", plan.tables.join(", "));
    Ok(())
}

fn init_tracing(logging_config: &LoggingConfig) {
    // QUEST_LOG takes precedence over the configured level
    let level = env::var("QUEST_LOG").unwrap_or_else(|_| logging_config.level.clone());
    let json = logging_config.format == "json";

    let writer = match &logging_config.file {
        Some(path) => {
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("ERROR: Unable to open log file '{}': {e}", path.display());
                    return;
                }
            };
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = TRACE_GUARD.set(guard);
            BoxMakeWriter::new(non_blocking)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if json {
        Box::new(base.json().finish())
    } else {
        Box::new(base.compact().finish())
    };

    let _ = tracing::subscriber::set_global_default(subscriber);
}
