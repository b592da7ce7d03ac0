use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hammer::{Config, Daemon};

/// Hammer - pluggable web-application runtime
#[derive(Parser)]
#[command(name = "hammer", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "HAMMER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "HAMMER_PORT")]
    port: Option<u16>,

    /// Path to the SQLite database file
    #[arg(long, env = "HAMMER_DB")]
    database: Option<PathBuf>,

    /// Additional plugin root folder (repeatable)
    #[arg(long = "plugin-dir", env = "HAMMER_PLUGIN_DIR")]
    plugin_dirs: Vec<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hammer=info",
        1 => "info,hammer=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    config.plugins.dirs.extend(cli.plugin_dirs);

    tracing::info!(
        port = config.server.port,
        plugin_dirs = ?config.plugins.dirs,
        "starting hammer"
    );

    Daemon::new(config).run().await?;
    Ok(())
}
