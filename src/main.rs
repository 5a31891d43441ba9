// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, load the config, build a session and
//   hand it to the chosen mode.
// - Returns `anyhow::Result` so startup errors print with their causes and
//   exit non-zero.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use wolframalpha_cli::config::{self, Config};
use wolframalpha_cli::error::SIGNUP_URL;
use wolframalpha_cli::ui::{repl, single_query, Session};

/// Simple command-line interface to run queries on WolframAlpha.
///
/// With no flags, starts an interactive prompt. Type `:help` there for the
/// picture commands.
#[derive(Parser, Debug)]
#[command(name = "wa-cli", version, about, long_about = None)]
struct Cli {
    /// Perform a single query and exit.
    #[arg(short = 'q', long = "query", value_name = "TEXT")]
    query: Option<String>,

    /// Open the config file in $EDITOR.
    #[arg(long = "config", conflicts_with_all = ["query", "set_key"])]
    edit_config: bool,

    /// Save an API key to the config file.
    #[arg(long, value_name = "KEY")]
    set_key: Option<String>,

    /// Use this config file instead of the default location.
    #[arg(long, value_name = "PATH", env = "WA_CLI_CONFIG")]
    config_file: Option<PathBuf>,

    /// Log debug information to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.verbose)?;

    let path = match &cli.config_file {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    if cli.edit_config {
        config::open_in_editor(&path)?;
        return Ok(());
    }

    if let Some(key) = &cli.set_key {
        config::set_api_key(&path, key)
            .with_context(|| format!("Could not save API key to {}", path.display()))?;
        println!("API key saved to {}", path.display());
        if cli.query.is_none() {
            return Ok(());
        }
    }

    let mut config = Config::load(&path)
        .with_context(|| format!("Invalid configuration. Get an API key at {SIGNUP_URL}"))?;
    config::ensure_api_key(&mut config, &path)?;

    let session = Session::new(&config)?;
    match cli.query.as_deref() {
        Some(query) => single_query(session, query),
        None => repl(session),
    }
}

fn initialize_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
