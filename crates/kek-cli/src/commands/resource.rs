//! `kek add` and `kek remove` commands.

use anyhow::{Context, Result};
use clap::Args;

use crate::opts::{StoreOpts, open_engine};
use crate::output::print_success;

use super::collection_json;

#[derive(Args, Debug)]
pub struct ResourceArgs {
    /// Collection id
    pub id: String,

    /// Resource id
    pub resource: String,
}

pub async fn cmd_add(opts: &StoreOpts, args: &ResourceArgs) -> Result<()> {
    let engine = open_engine(opts).await?;
    let col = engine
        .add_resource(&args.id, &args.resource)
        .await
        .with_context(|| format!("add '{}' to '{}'", args.resource, args.id))?;
    print_success(opts, collection_json(&col)?, vec![])
}

pub async fn cmd_remove(opts: &StoreOpts, args: &ResourceArgs) -> Result<()> {
    let engine = open_engine(opts).await?;
    let col = engine
        .delete_resource(&args.id, &args.resource)
        .await
        .with_context(|| format!("remove '{}' from '{}'", args.resource, args.id))?;
    print_success(opts, collection_json(&col)?, vec![])
}
