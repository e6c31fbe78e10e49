//! roster-grid: the shared career-fair candidate roster in a terminal.
//!
//! Reads the roster through its public share link, lets recruiters tick
//! per-candidate flags, and writes changes back through the storage API with
//! debounced autosave.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use roster_grid::ui::{App, Command, Flow, Theme};
use roster_sync::{
    CredentialProvider, Credentials, Diagnostics, DropboxStore, HttpSnapshotSource, OAuthTokenEndpoint, Session,
    SnapshotReader, SnapshotWriter, SyncConfig, SyncController,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roster-grid")]
#[command(about = "Track career-fair candidates in a shared CSV roster")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "roster-grid.toml")]
    config: PathBuf,

    /// Public share link of the roster CSV (overrides config file)
    #[arg(long, env = "STATE_SHARED_CSV_URL")]
    csv_url: Option<String>,

    /// Absolute path of the roster inside the app folder (overrides config file)
    #[arg(long, env = "STATE_DBX_PATH")]
    write_path: Option<String>,

    /// Minimum gap between two saves, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Start with autosave paused
    #[arg(long)]
    no_autosave: bool,
}

fn main() -> anyhow::Result<()> {
    // Secrets may live in .env; load it before clap reads `env` arguments.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster_sync=info,roster_grid=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        SyncConfig::load(&cli.config)?
    } else {
        info!("Config file {} not found, using defaults", cli.config.display());
        SyncConfig::default()
    };

    // Apply CLI overrides
    if let Some(url) = cli.csv_url {
        config.source.shared_csv_url = Some(url);
    }
    if let Some(path) = cli.write_path {
        config.storage.write_path = Some(path);
    }
    if let Some(ms) = cli.debounce_ms {
        config.sync.debounce_ms = ms;
    }
    if cli.no_autosave {
        config.sync.autosave = false;
    }
    config.validate()?;

    let credentials = Credentials::from_env();
    let mut provider = CredentialProvider::new(credentials.clone(), OAuthTokenEndpoint::new(config.storage.token_url.clone())?);
    let token_error = if credentials.is_configured() {
        provider.get().err().map(|e| e.to_string())
    } else {
        None
    };
    let diagnostics = Diagnostics::collect(&config, &credentials, token_error);
    if let Err(reason) = &diagnostics.token {
        info!("Saving disabled until credentials work: {reason}");
    }

    let store = DropboxStore::new(&config.storage.api_base, &config.storage.content_base)?;
    let writer = SnapshotWriter::new(store, provider, config.write_path().map(str::to_string));

    let csv_url = config.shared_csv_url().context("shared CSV URL is not set")?;
    let mut reader = SnapshotReader::new(HttpSnapshotSource::new(csv_url)?, config.cache_ttl());
    let session = Session::load(&mut reader, config.sync.autosave).context("could not load the roster")?;
    info!("Loaded {} candidate(s)", session.table().len());

    let theme = Theme::new(io::stdout().is_terminal());
    let controller = SyncController::new(config.debounce());
    let mut app = App::new(session, reader, writer, controller, diagnostics, theme);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.start(Instant::now(), &mut out)?;
    writeln!(out, "type 'help' for commands")?;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if app.handle(command, &mut out)? == Flow::Quit {
                    return Ok(());
                }
            }
            Err(message) => writeln!(out, "{message}")?,
        }
    }

    writeln!(out)?;
    app.shutdown(Instant::now(), &mut out)?;
    Ok(())
}
