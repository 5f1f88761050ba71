//! autoroute server
//!
//! Walks the configured route directories, resolves every annotated handler
//! to a `(path, verb)` row, rejects conflicts, registers the table on axum
//! and serves it.
//!
//! ```text
//!   route tree ──▶ walker ──▶ loader ──▶ builder ──▶ conflict check
//!                                                        │
//!   client ◀── error chain ◀── dispatch ◀── axum Router ◀┘
//! ```

mod routes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use autoroute::config::loader::load_config;
use autoroute::discovery::{FsSource, ModuleRegistry};
use autoroute::observability::logging;
use autoroute::{AutorouteConfig, Pipeline, Shutdown};

#[derive(Parser)]
#[command(name = "autoroute")]
#[command(about = "Serve a directory tree of route modules", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover routes, then bind and serve (default)
    Serve,
    /// Discover and validate routes, print the table and exit
    Routes {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => AutorouteConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("autoroute v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Routes { json } => print_routes(config, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn pipeline(config: AutorouteConfig) -> Pipeline {
    let registry = ModuleRegistry::collect();
    tracing::info!(
        modules = registry.len(),
        roots = config.discovery.roots.len(),
        "Configuration loaded"
    );
    Pipeline::new(config, FsSource::new(registry))
}

async fn serve(config: AutorouteConfig) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    pipeline(config).serve(&shutdown).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_routes(config: AutorouteConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let table = pipeline(config).discover()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&table.summaries())?);
    } else {
        for route in table.by_source() {
            println!("{}", route);
        }
    }
    Ok(())
}
