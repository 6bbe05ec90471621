//! `todo`: a local task tracker backed by SQLite.

use clap::Parser;
use std::process::ExitCode;
use todo_store::cli::commands::{report_failure, run_command};
use todo_store::cli::{Cli, EXIT_RUNTIME_ERROR, EXIT_SETUP_ERROR};
use todo_store::config::{Config, ConfigPaths};
use todo_store::db::Store;
use todo_store::logging::{LogDestination, init_logging, parse_log_level};
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(parse_log_level(&cli.log_level), &LogDestination::parse(&cli.log)) {
        eprintln!("[ERROR] Logging setup failed: {:#}", e);
        return ExitCode::from(EXIT_SETUP_ERROR);
    }

    let mut config = match Config::load(&ConfigPaths::discover(cli.config.clone())) {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, "Configuration failed");
            println!("[ERROR] Configuration failed: {:#}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };
    cli.apply_to(&mut config);
    debug!(?config, "Effective configuration");

    let store = match Store::open(&config.store.db_path, config.store.options()) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Database setup failed");
            println!("[ERROR] Database setup failed: {}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    let format = config.output.format;
    let mut stdout = std::io::stdout().lock();
    match run_command(&store, &cli.command, format, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, format, &mut stdout);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}
