use std::collections::HashMap;

use ansi_term::Colour;
use anyhow::{anyhow, bail, Result};
use chrono::{Duration, Local, NaiveTime, Utc};
use clap::Parser;

use crate::{
    engine::{
        percentage::{performance_percentage, Percentage},
        summarize::is_duplicate,
    },
    storage::{
        entities::{join_task_records, DelayEntity, PerformanceRecordEntity},
        store::{find_or_create_task, TrackerStore},
    },
    utils::time::task_name_for,
};

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(long, help = "Target duration in minutes. Decimals are allowed: 11.5")]
    target: f64,
    #[arg(long, help = "Start time, e.g. 08:00")]
    start: String,
    #[arg(long, help = "Finish time, e.g. 09:15")]
    end: String,
    #[arg(long, help = "Optional notes stored with the record")]
    notes: Option<String>,
}

/// Adds a record for today's derived task. Input validation lives here: the
/// aggregation functions only ever see well-typed values.
pub async fn process_add_command(store: &impl TrackerStore, command: AddCommand) -> Result<()> {
    let AddCommand {
        target,
        start,
        end,
        notes,
    } = command;

    if target <= 0. {
        bail!("Target duration must be positive, got {target}");
    }
    let start_time = parse_clock_time(&start)?;
    let end_time = parse_clock_time(&end)?;

    let actual = actual_minutes(start_time, end_time);
    let percentage = performance_percentage(target, actual);

    let today = Local::now().date_naive();
    let task_name = task_name_for(today);

    let tasks = store.load_tasks().await?;
    let records = store.load_records().await?;
    let snapshot = join_task_records(&tasks, &records);

    // A duplicate aborts the write with a warning, not the whole session.
    if is_duplicate(&snapshot, &task_name, &start, &end, today) {
        println!(
            "{}: a record with the same task name and times already exists for today",
            Colour::Yellow.paint("Duplicate record")
        );
        return Ok(());
    }

    let task = find_or_create_task(store, &tasks, &task_name, target, Utc::now()).await?;
    let record = PerformanceRecordEntity {
        id: records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
        task_id: task.id,
        actual_minutes: actual,
        percentage: *percentage,
        start_time: start.into(),
        end_time: end.into(),
        notes,
        created_at: Utc::now(),
    };
    store.append_record(&record).await?;

    println!(
        "{} {task_name}: actual {actual:.2} min, performance {:.1}%",
        Colour::Green.paint("Added"),
        *percentage
    );
    Ok(())
}

#[derive(Debug, Parser)]
pub struct DelayCommand {
    #[arg(long, help = "Delay in minutes")]
    minutes: f64,
    #[arg(long, help = "Reason for the delay")]
    reason: Option<String>,
}

pub async fn process_delay_command(
    store: &impl TrackerStore,
    command: DelayCommand,
) -> Result<()> {
    if command.minutes <= 0. {
        bail!("Delay must be positive, got {}", command.minutes);
    }

    let task_name = task_name_for(Local::now().date_naive());
    let tasks = store.load_tasks().await?;
    let Some(task) = tasks
        .iter()
        .filter(|t| *t.name == *task_name)
        .max_by_key(|t| t.id)
    else {
        bail!("No task named {task_name} exists yet. Add a record first");
    };

    let delays = store.load_delays().await?;
    let delay = DelayEntity {
        id: delays.iter().map(|d| d.id).max().unwrap_or(0) + 1,
        task_id: task.id,
        delay_minutes: command.minutes,
        reason: command.reason,
        created_at: Utc::now(),
    };
    store.append_delay(&delay).await?;

    println!(
        "Recorded a delay of {:.1} min for {task_name}",
        delay.delay_minutes
    );
    Ok(())
}

#[derive(Debug, Parser)]
pub struct RecordsCommand {
    #[arg(
        short = 'p',
        long = "percentage",
        help = "Only show records with at least the specified performance percentage"
    )]
    min_percentage: Option<Percentage>,
    #[arg(long, help = "Also list recorded delays")]
    delays: bool,
}

pub async fn process_records_command(
    store: &impl TrackerStore,
    command: RecordsCommand,
) -> Result<()> {
    let tasks = store.load_tasks().await?;
    let records = store.load_records().await?;

    let mut snapshot = join_task_records(&tasks, &records);
    snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    for record in &snapshot {
        if let Some(min) = command.min_percentage {
            if record.percentage < *min {
                continue;
            }
        }
        println!(
            "{} ({}) | {}-{} | Target: {:.1} | Actual: {:.1} | Perf: {:.1}%",
            record.task_name,
            record.day.format("%Y-%m-%d"),
            record.start_time,
            record.end_time,
            record.target_minutes,
            record.actual_minutes,
            record.percentage
        );
    }

    if command.delays {
        let task_names: HashMap<u64, _> =
            tasks.iter().map(|t| (t.id, t.name.clone())).collect();
        let mut delays = store.load_delays().await?;
        delays.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for delay in &delays {
            let name = task_names
                .get(&delay.task_id)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "{} ({}) | Delay: {:.1} min | {}",
                name,
                delay.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                delay.delay_minutes,
                delay.reason.as_deref().unwrap_or("no reason given")
            );
        }
    }

    Ok(())
}

fn parse_clock_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| anyhow!("Can't parse {value} as a HH:MM time: {e}"))
}

/// A finish time before the start rolls into the next day.
fn actual_minutes(start: NaiveTime, end: NaiveTime) -> f64 {
    let mut span = end - start;
    if span < Duration::zero() {
        span = span + Duration::days(1);
    }
    span.num_seconds() as f64 / 60.
}
