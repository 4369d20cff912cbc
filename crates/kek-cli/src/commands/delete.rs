//! `kek delete` command.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::opts::{StoreOpts, open_engine};
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Collection id
    pub id: String,

    /// Keep the revision chain on disk
    #[arg(long)]
    pub keep_revisions: bool,
}

pub async fn cmd_delete(opts: &StoreOpts, args: &DeleteArgs) -> Result<()> {
    let engine = open_engine(opts).await?;
    engine
        .delete(&args.id, !args.keep_revisions)
        .await
        .with_context(|| format!("delete collection '{}'", args.id))?;
    let data = if opts.json || opts.pretty {
        json!({ "id": args.id, "revisions_kept": args.keep_revisions })
    } else {
        json!(format!("deleted {}", args.id))
    };
    print_success(opts, data, vec![])
}
