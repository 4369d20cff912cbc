mod commands;
mod opts;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::create::CreateArgs;
use commands::delete::DeleteArgs;
use commands::patch::PatchArgs;
use commands::resource::ResourceArgs;
use commands::show::ShowArgs;
use opts::StoreOpts;

#[derive(Parser, Debug)]
#[command(name = "kek", version, about = "Versioned collections CLI")]
struct Cli {
    #[command(flatten)]
    opts: StoreOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a collection
    Create(CreateArgs),

    /// Show a collection by id or slug
    Show(ShowArgs),

    /// List every collection
    List,

    /// Merge changes into a collection
    Patch(PatchArgs),

    /// Add a resource to a collection
    Add(ResourceArgs),

    /// Remove a resource from a collection
    Remove(ResourceArgs),

    /// Delete a collection
    Delete(DeleteArgs),

    /// Show the revision chain of a collection
    History {
        /// Collection id
        id: String,
    },

    /// Check a collection against its revision chain
    Verify {
        /// Collection id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env()?;
    setup_logging();

    let cli = Cli::parse();
    let opts = &cli.opts;

    match cli.command {
        Command::Create(args) => commands::create::cmd_create(opts, &args).await,
        Command::Show(args) => commands::show::cmd_show(opts, &args).await,
        Command::List => commands::show::cmd_list(opts).await,
        Command::Patch(args) => commands::patch::cmd_patch(opts, &args).await,
        Command::Add(args) => commands::resource::cmd_add(opts, &args).await,
        Command::Remove(args) => commands::resource::cmd_remove(opts, &args).await,
        Command::Delete(args) => commands::delete::cmd_delete(opts, &args).await,
        Command::History { id } => commands::history::cmd_history(opts, &id).await,
        Command::Verify { id } => commands::history::cmd_verify(opts, &id).await,
    }
}

/// Load `.env` from the working directory or its parents, if there is one.
/// Variables already set in the environment win.
fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("load .env"),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warn).
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
