use std::collections::HashSet;

use ansi_term::Colour;
use anyhow::Result;
use clap::Parser;

use crate::{
    engine::summarize::duplicate_groups,
    storage::{entities::join_task_records, store::TrackerStore},
};

#[derive(Debug, Parser)]
pub struct DedupCommand {
    #[arg(
        long,
        help = "Delete the duplicates, keeping the first record of each group"
    )]
    remove: bool,
}

/// Command to process `dedup`. Duplicates should never appear through the cli
/// itself, which refuses them at insert time, but older data or hand-edited
/// record files can contain them.
pub async fn process_dedup_command(store: &impl TrackerStore, command: DedupCommand) -> Result<()> {
    let tasks = store.load_tasks().await?;
    let records = store.load_records().await?;
    let snapshot = join_task_records(&tasks, &records);

    let groups = duplicate_groups(&snapshot);
    if groups.is_empty() {
        println!("No duplicate records found");
        return Ok(());
    }

    println!("Found {} groups of duplicate records:", groups.len());
    for group in &groups {
        println!(
            "{} on {} | {}-{} | {} records (ids {})",
            group.task_name,
            group.day,
            group.start_time,
            group.end_time,
            group.record_ids.len(),
            group
                .record_ids
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let removable: usize = groups.iter().map(|g| g.record_ids.len() - 1).sum();
    if !command.remove {
        println!();
        println!("{removable} records can be removed. Rerun with --remove to delete them");
        return Ok(());
    }

    let mut to_remove = HashSet::new();
    for group in &groups {
        // Ids come back ascending, so the first record of each group survives.
        for id in &group.record_ids[1..] {
            to_remove.insert(*id);
            println!(
                "Removing duplicate record {} for task '{}' on {}",
                id, group.task_name, group.day
            );
        }
    }

    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| !to_remove.contains(&r.id))
        .collect();
    store.replace_records(&kept).await?;

    println!(
        "{}",
        Colour::Green.paint(format!("Removed {} duplicate records", to_remove.len()))
    );
    Ok(())
}
