//! Tags command
//!
//! Usage: dynsync tags --collection <NAME> [--new-only]

use clap::Args;
use dynsync_core::model::Tag;
use dynsync_engine::list_tags;
use std::path::Path;

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[arg(long)]
    pub collection: String,

    /// Only tags first seen in the latest logged run
    #[arg(long)]
    pub new_only: bool,
}

pub fn execute(args: TagsArgs, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, conn) = super::open(config)?;
    let tags = list_tags(&conn, &args.collection, args.new_only)?;

    if tags.is_empty() {
        println!("No tags for '{}'", args.collection);
        return Ok(());
    }
    for tag in &tags {
        println!("{}", render_tag(tag));
    }
    Ok(())
}

fn render_tag(tag: &Tag) -> String {
    let sample = tag
        .sample_value
        .as_deref()
        .map(|s| format!(" e.g. {}", s))
        .unwrap_or_default();
    format!(
        "{}\t{}\tx{}\tfirst {}{}",
        tag.path,
        tag.data_type,
        tag.occurrence_count,
        tag.first_seen_at.to_rfc3339(),
        sample
    )
}
