//! mariadb-schema-diff CLI - schema comparison and migration generation.

use clap::{Parser, Subcommand};
use mariadb_schema_diff::{Config, DiffError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "mariadb-schema-diff")]
#[command(about = "Compare two MariaDB/MySQL schemas and generate migration + rollback SQL")]
#[command(version)]
struct Cli {
    /// Path to YAML or JSON configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the schemas and write migration.sql / rollback.sql
    Compare {
        /// Override source schema
        #[arg(long)]
        source_schema: Option<String>,

        /// Override destination schema
        #[arg(long)]
        dest_schema: Option<String>,

        /// Override output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DiffError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let cancel = setup_signal_handler();

    match cli.command {
        Commands::Compare {
            source_schema,
            dest_schema,
            output_dir,
        } => {
            if let Some(schema) = source_schema {
                config.source.schema = schema;
            }
            if let Some(schema) = dest_schema {
                config.dest.schema = schema;
            }
            if let Some(dir) = output_dir {
                config.output.output_dir = dir;
            }
            config.validate()?;

            let orchestrator = Orchestrator::new(config);
            let result = orchestrator.run(cancel).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nComparison completed!");
                println!("  Source: {}", result.source_schema);
                println!("  Destination: {}", result.dest_schema);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Operations: {}", result.operation_count);
                println!(
                    "  Forward statements: {}",
                    result.forward_statements
                );
                println!(
                    "  Rollback statements: {}",
                    result.rollback_statements
                );
                println!("  Migration file: {}", result.migration_file.display());
                println!("  Rollback file: {}", result.rollback_file.display());
                println!("  Report: {}", result.report_file.display());
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config);
            let result = orchestrator.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source: {}",
                    if result.source_connected { "OK" } else { "FAILED" }
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Destination: {}",
                    if result.dest_connected { "OK" } else { "FAILED" }
                );
                if let Some(ref err) = result.dest_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(DiffError::Config("Health check failed".to_string()));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Cancellation on SIGINT/SIGTERM. The orchestrator checks the token between
/// pipeline stages; no partial output is ever written.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Cancelling...");
        token.cancel();
    });

    let token = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Cancelling...");
        token.cancel();
    });

    cancel
}

#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl-C handler");
        eprintln!("\nReceived Ctrl-C. Cancelling...");
        token.cancel();
    });
    cancel
}
