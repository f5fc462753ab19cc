//! Recon reconciliation server.
//!
//! `recon serve` answers reconciliation requests over a flat file or an
//! SQLite database; `recon convert` turns a flat file into such a database;
//! `recon import` builds either from CSV or tab-separated source files.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use recon_persistence::backends::open_store;
use recon_persistence::loader::{Dataset, ImportConfig, inspect_tables, load_tabular, write_flat};
use recon_rest::{ServerConfig, create_app, init_logging};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "recon", version, about = "Reconciliation service for tabular datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve a dataset over HTTP.
    Serve {
        #[command(flatten)]
        config: ServerConfig,

        /// Flat file (optionally gzipped) or SQLite database to serve.
        source: PathBuf,
    },

    /// Convert a flat file into an SQLite database.
    Convert {
        /// Flat file to read, gunzipped when the name ends in `.gz`.
        input: PathBuf,

        /// SQLite database to create.
        output: PathBuf,

        /// Replace the output database if it exists.
        #[arg(long)]
        force: bool,

        /// Log level (error, warn, info, debug, trace).
        #[arg(long, env = "RECON_LOG_LEVEL", default_value = "info")]
        log_level: String,
    },

    /// Import CSV or tab-separated files described by a JSON configuration.
    Import {
        /// JSON import configuration.
        config: PathBuf,

        /// Output: `-` for a flat file on stdout, a name containing `sqlite`
        /// for an SQLite database, any other name for a flat file.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Only report the column mapping of each file.
        #[arg(short = 'p', long)]
        dry_run: bool,

        /// Replace the output if it exists.
        #[arg(long)]
        force: bool,

        /// Log level (error, warn, info, debug, trace).
        #[arg(long, env = "RECON_LOG_LEVEL", default_value = "info")]
        log_level: String,
    },
}

/// Starts the Axum HTTP server and runs it until Ctrl-C.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        address = %addr,
        service_url = %config.service_url(),
        "Server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn run_serve(config: ServerConfig, source: &Path) -> anyhow::Result<()> {
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        source = %source.display(),
        port = config.port,
        host = %config.host,
        "Starting recon server"
    );
    let store = open_store(source)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", source.display(), e))?;

    let app = create_app(store, config.clone());
    serve(app, &config).await
}

#[cfg(feature = "sqlite")]
fn run_convert(input: &Path, output: &Path, force: bool) -> anyhow::Result<()> {
    use recon_persistence::backends::sqlite::SqliteStore;
    use recon_persistence::loader::{load_flat_file, resolve_dataset};

    prepare_output(output, force)?;
    let dataset = resolve_dataset(load_flat_file(input)?)?;
    let stats = SqliteStore::import(output, &dataset)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        entities = stats.entities,
        values = stats.values,
        "Conversion complete"
    );
    Ok(())
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
fn run_convert(_input: &Path, _output: &Path, _force: bool) -> anyhow::Result<()> {
    anyhow::bail!(
        "Converting to SQLite requires the 'sqlite' feature. \
         Build with: cargo build -p recon-server --features sqlite"
    )
}

/// Removes an existing output file when `force` is set, refuses otherwise.
fn prepare_output(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() {
        if !force {
            anyhow::bail!(
                "{} already exists; pass --force to replace it",
                output.display()
            );
        }
        std::fs::remove_file(output)?;
    }
    Ok(())
}

fn is_stdout(output: &Path) -> bool {
    output.as_os_str() == "-"
}

fn is_sqlite_output(output: &Path) -> bool {
    output
        .file_name()
        .is_some_and(|name| name.to_string_lossy().to_lowercase().contains("sqlite"))
}

fn run_import(config: &Path, output: &Path, dry_run: bool, force: bool) -> anyhow::Result<()> {
    let config = ImportConfig::from_path(config)?;

    if dry_run {
        let plans = inspect_tables(&config)?;
        info!(files = plans.len(), "Dry run complete, nothing written");
        return Ok(());
    }

    let dataset = load_tabular(&config)?;
    if is_stdout(output) {
        write_flat(&dataset, std::io::stdout().lock())?;
    } else if is_sqlite_output(output) {
        import_sqlite(output, dataset, force)?;
    } else {
        prepare_output(output, force)?;
        let file = std::fs::File::create(output)?;
        write_flat(&dataset, std::io::BufWriter::new(file))?;
        info!(output = %output.display(), "Wrote flat file");
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn import_sqlite(output: &Path, dataset: Dataset, force: bool) -> anyhow::Result<()> {
    use recon_persistence::backends::sqlite::SqliteStore;
    use recon_persistence::loader::resolve_dataset;

    prepare_output(output, force)?;
    let stats = SqliteStore::import(output, &resolve_dataset(dataset)?)?;
    info!(
        output = %output.display(),
        types = stats.types,
        properties = stats.properties,
        entities = stats.entities,
        values = stats.values,
        "Import complete"
    );
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn import_sqlite(_output: &Path, _dataset: Dataset, _force: bool) -> anyhow::Result<()> {
    anyhow::bail!(
        "Writing SQLite requires the 'sqlite' feature. \
         Build with: cargo build -p recon-server --features sqlite"
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Serve { config, source } => run_serve(config, &source).await,
        Command::Convert {
            input,
            output,
            force,
            log_level,
        } => {
            init_logging(&log_level);
            run_convert(&input, &output, force)
        }
        Command::Import {
            config,
            output,
            dry_run,
            force,
            log_level,
        } => {
            init_logging(&log_level);
            run_import(&config, &output, dry_run, force)
        }
    }
}
