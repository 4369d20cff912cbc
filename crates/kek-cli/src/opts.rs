//! Global CLI options and engine setup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use kek_collections::{CollectionEngine, EngineConfig};
use kek_store::FsStore;

/// Global options for CLI commands.
#[derive(Args, Debug, Clone)]
pub struct StoreOpts {
    /// Store directory (env: KEK_STORE)
    #[arg(short = 's', long, global = true, env = "KEK_STORE", default_value = ".kek")]
    pub store: PathBuf,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress notices
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Open the file store under `--store` and build an engine over it. Engine
/// tuning comes from `KEK_*` environment variables.
pub async fn open_engine(opts: &StoreOpts) -> Result<CollectionEngine> {
    let store = FsStore::open(&opts.store)
        .await
        .with_context(|| format!("open store at {}", opts.store.display()))?;
    tracing::debug!(store = %opts.store.display(), "store opened");
    Ok(CollectionEngine::open(
        Arc::new(store),
        EngineConfig::from_env(),
    ))
}
