use std::path::PathBuf;

use clap::{Parser, Subcommand};
use configuration::{LogSettings, ServerOverrides};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The main entry point for the TrackRecord API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = configuration::load_settings(cli.config.as_deref())?;
    let _log_guard = init_tracing(&settings.log)?;

    // Execute the appropriate command
    match cli.command.unwrap_or_else(|| Commands::Serve(ServerOverrides::default())) {
        Commands::Serve(overrides) => {
            overrides.apply(&mut settings);
            web_server::run_server(settings).await?;
        }
        Commands::Migrate => {
            let db_pool = database::connect(&settings.database).await?;
            database::run_migrations(&db_pool).await?;
            tracing::info!("Database migrations applied");
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Workout planning and progress tracking API.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file. Defaults to `config.toml` if present.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (the default).
    Serve(ServerOverrides),
    /// Apply pending database migrations and exit.
    Migrate,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: `RUST_LOG` if set, else `log.filter`.
/// With `log.directory` set, output is also written to a daily rolling file;
/// the returned guard must live until exit so buffered lines are flushed.
fn init_tracing(log: &LogSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log.filter))?;

    let (file_layer, guard) = match &log.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "trackrecord.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
