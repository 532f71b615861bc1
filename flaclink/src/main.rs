//! flaclink - hardlink new albums from a downloads folder into a music library
//!
//! Usage: `flaclink [OPTIONS] <SOURCE_DIR> <TARGET_DIR>`
//!
//! Each run first registers albums already in the target, then links every
//! album in the source whose content listing has not been seen before.
//! Meant to be run repeatedly, e.g. from a timer.

use clap::Parser;
use flaclink::utils::normalize_path;
use flaclink::{Registry, SyncOrchestrator};
use flaclink_common::config::{DataDirInitializer, DataDirResolver, TomlConfig};
use flaclink_common::{DetectionStrategy, Error, Result, SyncConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Command-line arguments for flaclink
#[derive(Parser, Debug)]
#[command(name = "flaclink")]
#[command(about = "Hardlink new FLAC albums from a source folder into a library folder")]
#[command(version)]
struct Args {
    /// Folder scanned for newly downloaded albums
    #[arg(required_unless_present = "list")]
    source_dir: Option<PathBuf>,

    /// Library folder that receives hardlinked albums
    #[arg(required_unless_present = "list")]
    target_dir: Option<PathBuf>,

    /// Application-data folder holding the album registry [default: ~/.flaclink]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// How long to wait for exclusive access to the registry
    #[arg(long, env = "FLACLINK_LOCK_TIMEOUT_MS")]
    lock_timeout_ms: Option<u64>,

    /// Search every subdirectory for audio instead of only the first one
    #[arg(long)]
    exhaustive: bool,

    /// Report what would be linked without changing the library or registry
    #[arg(long)]
    dry_run: bool,

    /// Print the registered albums and exit
    #[arg(long, conflicts_with_all = ["source_dir", "target_dir"])]
    list: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting flaclink v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let data_dir = DataDirResolver::new(args.data_dir.clone()).resolve()?;
    let initializer = DataDirInitializer::new(data_dir);
    initializer.ensure_directory_exists()?;
    info!("Data directory: {}", initializer.data_dir().display());

    let registry_path = initializer.registry_path();
    info!("Album registry: {}", registry_path.display());

    let toml = TomlConfig::load(&initializer.config_path());
    let mut config = SyncConfig::new(registry_path)
        .with_toml(&toml)
        .with_dry_run(args.dry_run);
    if let Some(ms) = args.lock_timeout_ms {
        config = config.with_lock_timeout(Duration::from_millis(ms));
    }
    if args.exhaustive {
        config = config.with_detection(DetectionStrategy::Exhaustive);
    }

    if args.list {
        return list_registry(&config).await;
    }

    let (source_dir, target_dir) = match (args.source_dir, args.target_dir) {
        (Some(source), Some(target)) => (normalize_path(&source), normalize_path(&target)),
        _ => {
            return Err(Error::Usage(
                "expected <SOURCE_DIR> <TARGET_DIR>".to_string(),
            ))
        }
    };

    let orchestrator = SyncOrchestrator::new(config);
    let summary = orchestrator.run(&source_dir, &target_dir).await?;

    if orchestrator.config().dry_run {
        info!(
            "Dry run done: would link {}, {} duplicates, would register {} from library",
            summary.sync.linked, summary.sync.duplicates, summary.backfill.registered
        );
    } else {
        info!(
            "Done: {} linked, {} duplicates, {} registered from library",
            summary.sync.linked, summary.sync.duplicates, summary.backfill.registered
        );
    }

    Ok(())
}

async fn list_registry(config: &SyncConfig) -> Result<()> {
    let mut registry = Registry::open(&config.registry_path, config.lock_timeout).await?;
    info!("Registered albums in {}:", registry.path().display());

    let listed = registry
        .for_each(|entry| {
            println!("{}: {:?}", entry.name, entry.contents);
        })
        .await;

    let closed = registry.close().await;
    listed?;
    closed
}
