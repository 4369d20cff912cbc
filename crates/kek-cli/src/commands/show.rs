//! `kek show` and `kek list` commands.

use anyhow::{Context, Result};
use clap::Args;
use kek_collections::LoadOptions;
use serde_json::{Value, json};

use crate::opts::{StoreOpts, open_engine};
use crate::output::print_success;

use super::collection_json;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Collection id, or slug with --slug
    pub key: String,

    /// Treat KEY as a slug
    #[arg(long)]
    pub slug: bool,

    /// Resolve resources into docs and nested collections
    #[arg(long)]
    pub resources: bool,

    /// Attach the revision chain
    #[arg(long)]
    pub revisions: bool,
}

pub async fn cmd_show(opts: &StoreOpts, args: &ShowArgs) -> Result<()> {
    let engine = open_engine(opts).await?;
    let load = LoadOptions {
        with_resources: args.resources,
        with_revisions: args.revisions,
    };
    let col = if args.slug {
        engine.load_by_slug(&args.key, load).await
    } else {
        engine.load_by_id(&args.key, load).await
    }
    .with_context(|| format!("load collection '{}'", args.key))?;

    let mut warnings = Vec::new();
    if args.resources {
        let missing = col
            .resource_ids
            .keys()
            .filter(|id| !col.docs.contains_key(*id) && !col.collections.contains_key(*id))
            .count();
        if missing > 0 {
            warnings.push(format!("{missing} resource(s) could not be resolved"));
        }
    }
    print_success(opts, collection_json(&col)?, warnings)
}

pub async fn cmd_list(opts: &StoreOpts) -> Result<()> {
    let engine = open_engine(opts).await?;
    let all = engine
        .all(LoadOptions::record_only())
        .await
        .context("list collections")?;

    let data: Value = if opts.json || opts.pretty {
        all.values()
            .map(|col| {
                json!({
                    "id": col.id,
                    "slug": col.slug,
                    "name": col.name,
                    "resources": col.resource_ids.len(),
                    "updated_at_ns": col.updated_at_ns,
                })
            })
            .collect()
    } else {
        let lines: Vec<String> = all
            .values()
            .map(|col| format!("{}\t{}\t{}", col.id, col.slug, col.name))
            .collect();
        Value::String(lines.join("\n"))
    };
    print_success(opts, data, vec![])
}
