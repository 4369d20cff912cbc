//! `kek create` command.

use anyhow::{Context, Result};
use clap::Args;
use kek_collections::NewCollection;

use crate::opts::{StoreOpts, open_engine};
use crate::output::print_success;

use super::collection_json;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Collection name; also the default slug source
    pub name: String,

    /// Free-form description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Preferred slug (defaults to the name)
    #[arg(long)]
    pub slug: Option<String>,

    /// Resource id to include (repeatable)
    #[arg(long = "resource", value_name = "ID")]
    pub resources: Vec<String>,
}

pub async fn cmd_create(opts: &StoreOpts, args: &CreateArgs) -> Result<()> {
    let engine = open_engine(opts).await?;
    let mut new = NewCollection::named(args.name.as_str()).description(args.description.as_str());
    if let Some(slug) = &args.slug {
        new = new.slug(slug.as_str());
    }
    for resource in &args.resources {
        new = new.resource(resource.as_str(), true);
    }
    let col = engine.create(new).await.context("create collection")?;
    print_success(opts, collection_json(&col)?, vec![])
}
