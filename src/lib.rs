//! rWorktime library root.
//! Exposes the session engine, the CLI parser, the high-level run()
//! function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::EnvFilter;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Start => cli::commands::start::handle(cli, cfg),
        Commands::Pause => cli::commands::pause::handle(cli, cfg),
        Commands::Resume => cli::commands::resume::handle(cli, cfg),
        Commands::End { .. } => cli::commands::end::handle(cli, cfg),
        Commands::AutoEnd { .. } => cli::commands::auto_end::handle(cli, cfg),
        Commands::Resolve { .. } => cli::commands::resolve::handle(cli, cfg),
        Commands::MidnightReset => cli::commands::midnight_reset::handle(cli, cfg),
        Commands::Status => cli::commands::status::handle(cli, cfg),
        Commands::Entries { .. } => cli::commands::entries::handle(cli, cfg),
        Commands::Finalize { .. } => cli::commands::finalize::handle(cli, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over the configured level.
fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // `init` must work even when an old config file no longer parses.
    let mut cfg = match &cli.command {
        Commands::Init => Config::load().unwrap_or_default(),
        _ => Config::load()?,
    };

    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    init_tracing(&cfg);
    dispatch(&cli, &cfg)
}
