//! `kek history` and `kek verify` commands.

use anyhow::{Context, Result};
use kek_collections::RevisionStatus;
use serde_json::json;

use crate::opts::{StoreOpts, open_engine};
use crate::output::print_success;

use super::chain_json;

pub async fn cmd_history(opts: &StoreOpts, id: &str) -> Result<()> {
    let engine = open_engine(opts).await?;
    let chain = engine
        .history(id)
        .await
        .with_context(|| format!("load revisions of '{id}'"))?;
    print_success(opts, chain_json(&chain), vec![])
}

pub async fn cmd_verify(opts: &StoreOpts, id: &str) -> Result<()> {
    let engine = open_engine(opts).await?;
    let status = engine
        .verify(id)
        .await
        .with_context(|| format!("verify '{id}'"))?;
    match status {
        RevisionStatus::InSync { rev, blocks } => print_success(
            opts,
            json!({ "status": "in_sync", "rev": rev, "blocks": blocks }),
            vec![],
        ),
        RevisionStatus::RecordBehind {
            record_rev,
            chain_rev,
        } => print_success(
            opts,
            json!({ "status": "record_behind", "record_rev": record_rev, "chain_rev": chain_rev }),
            vec!["record does not reflect the latest revision; re-save it".into()],
        ),
    }
}
