//! KJPP job monitor CLI
//!
//! Local execution entry point, meant to be run from cron or a CI schedule.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kjpp_monitor::{
    config::{load_config, load_url_list, preflight},
    error::Result,
    models::Config,
    pipeline,
    services::{
        HttpFetcher, Notifier, StrategySelector, Taxonomy, TelegramCredentials, TelegramNotifier,
    },
    storage::{LocalStorage, RunStorage, from_epoch_seconds},
};

/// Monitors career pages for child and adolescent psychiatry positions
#[derive(Parser, Debug)]
#[command(
    name = "kjpp-monitor",
    version,
    about = "KJPP job monitor with Telegram notifications"
)]
struct Cli {
    /// Path to the configuration file (default: {data_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the URL list, state and exports
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// URL list file (default: {data_dir}/{paths.url_list})
    #[arg(short, long)]
    urls: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan all URLs, write exports and send notifications
    Run {
        /// Skip notifications; credentials are not required
        #[arg(long)]
        no_notify: bool,
    },

    /// Validate configuration, patterns and the URL list
    Validate,

    /// Show novelty state info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Critical error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("config.toml"));
    let config = load_config(&config_path)?;
    let url_list = cli
        .urls
        .clone()
        .unwrap_or_else(|| cli.data_dir.join(&config.paths.url_list));
    let storage = LocalStorage::new(&cli.data_dir, config.paths.state_file.clone());

    match cli.command.unwrap_or(Command::Run { no_notify: false }) {
        Command::Run { no_notify } => run(&config, &url_list, &storage, no_notify).await,
        Command::Validate => validate(&config, &url_list),
        Command::Info => info(&storage).await,
    }
}

async fn run(
    config: &Config,
    url_list: &Path,
    storage: &LocalStorage,
    no_notify: bool,
) -> Result<()> {
    let credentials = if no_notify {
        None
    } else {
        TelegramCredentials::from_env()
    };
    let inputs = preflight(url_list, credentials, !no_notify)?;

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let notifier = match inputs.credentials {
        Some(credentials) => Some(TelegramNotifier::new(&config.notify, Some(credentials))?),
        None => None,
    };

    let summary = pipeline::run_monitor(
        config,
        &inputs.urls,
        fetcher,
        storage,
        notifier.as_ref().map(|n| n as &dyn Notifier),
    )
    .await?;

    log::info!("Done. New matches: {}", summary.new_matches);
    Ok(())
}

fn validate(config: &Config, url_list: &Path) -> Result<()> {
    log::info!("Validating configuration...");

    let taxonomy = Arc::new(Taxonomy::compile(&config.taxonomy)?);
    StrategySelector::new(&config.sites, &taxonomy, &config.extraction)?;
    log::info!(
        "✓ Config OK ({} site rules, patterns and selectors compile)",
        config.sites.len()
    );

    let urls = load_url_list(url_list)?;
    log::info!("✓ URL list OK ({} URLs in {})", urls.len(), url_list.display());

    log::info!("All validations passed!");
    Ok(())
}

async fn info(storage: &LocalStorage) -> Result<()> {
    log::info!("Data directory: {}", storage.root_dir().display());

    match storage.load_state().await? {
        Some(state) => {
            log::info!("Recorded identities: {}", state.len());
            if let Some(newest) = state.newest().and_then(from_epoch_seconds) {
                log::info!("Newest first sighting: {newest}");
            }
        }
        None => log::info!("No novelty state found yet."),
    }
    Ok(())
}
