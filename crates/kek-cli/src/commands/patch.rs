//! `kek patch` command.

use anyhow::{Context, Result};
use clap::Args;
use kek_collections::CollectionPatch;

use crate::opts::{StoreOpts, open_engine};
use crate::output::print_success;

use super::collection_json;

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Collection id
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New slug; made unique if taken
    #[arg(long)]
    pub slug: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// Resource id to include (repeatable)
    #[arg(long = "add", value_name = "ID")]
    pub add: Vec<String>,

    /// Resource id to drop (repeatable)
    #[arg(long = "remove", value_name = "ID")]
    pub remove: Vec<String>,
}

pub async fn cmd_patch(opts: &StoreOpts, args: &PatchArgs) -> Result<()> {
    let engine = open_engine(opts).await?;

    let mut patch = CollectionPatch::new();
    if let Some(name) = &args.name {
        patch = patch.name(name.as_str());
    }
    if let Some(slug) = &args.slug {
        patch = patch.slug(slug.as_str());
    }
    if let Some(description) = &args.description {
        patch = patch.description(description.as_str());
    }
    for id in &args.add {
        patch = patch.include(id.as_str());
    }
    for id in &args.remove {
        patch = patch.exclude(id.as_str());
    }

    let col = engine
        .patch(&args.id, &patch)
        .await
        .with_context(|| format!("patch collection '{}'", args.id))?;
    print_success(opts, collection_json(&col)?, vec![])
}
