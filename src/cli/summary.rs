use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{Parser, ValueEnum};

use crate::{
    engine::{
        period::{Period, PeriodStep, PeriodUnit},
        summarize::{group_by_day, group_by_week, summarize_period, PeriodSummary},
    },
    storage::{
        entities::{join_task_records, TaskRecord},
        store::TrackerStore,
    },
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(
        long,
        help = "Anchor date for the period. Examples are \"yesterday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Summarize a single unit instead of all three")]
    unit: Option<PeriodUnit>,
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Shift the period: -1 for the previous one, 1 for the next"
    )]
    offset: i32,
}

/// Command to process `summary`. Prints count and average performance for the
/// period containing the anchor date, or for all three period shapes at once.
pub async fn process_summary_command(
    store: &impl TrackerStore,
    SummaryCommand {
        date,
        date_style,
        unit,
        offset,
    }: SummaryCommand,
) -> Result<()> {
    let anchor = parse_anchor(date, date_style)?;
    let today = Local::now().date_naive();

    let tasks = store.load_tasks().await?;
    let records = store.load_records().await?;
    let snapshot = join_task_records(&tasks, &records);

    let units = match unit {
        Some(unit) => vec![unit],
        None => vec![PeriodUnit::Day, PeriodUnit::Week, PeriodUnit::Month],
    };

    for unit in units {
        let period = shift(Period::containing(unit, anchor), unit, offset, today);
        let summary = summarize_period(&snapshot, period);
        println!(
            "{:<8} {:<28} {:>4} records {:>7.1}% avg",
            unit_title(unit),
            period_label(unit, period),
            summary.count,
            *summary.average
        );
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub struct DetailsCommand {
    #[arg(value_enum, help = "Period shape to break down")]
    unit: PeriodUnit,
    #[arg(
        long,
        help = "Anchor date for the period. Examples are \"yesterday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Shift the period: -1 for the previous one, 1 for the next"
    )]
    offset: i32,
}

/// Command to process `details`. A day lists its records, a week groups them by
/// day, a month groups them by week.
pub async fn process_details_command(
    store: &impl TrackerStore,
    DetailsCommand {
        unit,
        date,
        date_style,
        offset,
    }: DetailsCommand,
) -> Result<()> {
    let anchor = parse_anchor(date, date_style)?;
    let today = Local::now().date_naive();
    let period = shift(Period::containing(unit, anchor), unit, offset, today);

    let tasks = store.load_tasks().await?;
    let records = store.load_records().await?;
    let snapshot = join_task_records(&tasks, &records);

    let summary = summarize_period(&snapshot, period);
    if summary.count == 0 {
        println!("No records for this {unit}");
        return Ok(());
    }

    println!("{}", period_label(unit, period));
    print_summary_line(unit, summary);

    let mut in_period: Vec<TaskRecord> = snapshot
        .into_iter()
        .filter(|r| period.contains(r.day))
        .collect();

    match unit {
        PeriodUnit::Day => {
            in_period.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            println!();
            for record in &in_period {
                print_record(record);
            }
        }
        PeriodUnit::Week => {
            for bucket in group_by_day(&in_period) {
                println!();
                println!(
                    "{} - {} records, {:.1}% avg",
                    bucket.key.format("%A, %B %d"),
                    bucket.summary.count,
                    *bucket.summary.average
                );
                for record in &bucket.records {
                    print_record(record);
                }
            }
        }
        PeriodUnit::Month => {
            const SAMPLE_RECORDS_PER_WEEK: usize = 3;
            for bucket in group_by_week(&in_period) {
                println!();
                println!(
                    "Week {} - {}: {} records, {:.1}% avg",
                    bucket.key.start.format("%b %d"),
                    bucket.key.end.format("%b %d"),
                    bucket.summary.count,
                    *bucket.summary.average
                );
                for record in bucket.records.iter().take(SAMPLE_RECORDS_PER_WEEK) {
                    println!(
                        "  {} {} | {}-{} | Perf: {:.1}%",
                        record.day.format("%m/%d"),
                        record.task_name,
                        record.start_time,
                        record.end_time,
                        record.percentage
                    );
                }
                if bucket.records.len() > SAMPLE_RECORDS_PER_WEEK {
                    println!(
                        "  ... and {} more records",
                        bucket.records.len() - SAMPLE_RECORDS_PER_WEEK
                    );
                }
            }
        }
    }
    Ok(())
}

fn parse_anchor(date: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    match date {
        None => Ok(Local::now().date_naive()),
        Some(s) => parse_date_string(&s, Local::now(), date_style.into())
            .map(|v| v.with_timezone(&Local).date_naive())
            .map_err(|e| anyhow!("Failed to parse date {s}: {e}")),
    }
}

fn shift(mut period: Period, unit: PeriodUnit, offset: i32, today: NaiveDate) -> Period {
    let step = if offset < 0 {
        PeriodStep::Previous
    } else {
        PeriodStep::Next
    };
    for _ in 0..offset.unsigned_abs() {
        period = period.navigate(unit, step, today);
    }
    period
}

fn unit_title(unit: PeriodUnit) -> &'static str {
    match unit {
        PeriodUnit::Day => "Daily",
        PeriodUnit::Week => "Weekly",
        PeriodUnit::Month => "Monthly",
    }
}

fn period_label(unit: PeriodUnit, period: Period) -> String {
    match unit {
        PeriodUnit::Day => period.start.format("%A, %B %d, %Y").to_string(),
        PeriodUnit::Week => format!(
            "{} - {}",
            period.start.format("%b %d"),
            period.end.format("%b %d, %Y")
        ),
        PeriodUnit::Month => period.start.format("%B %Y").to_string(),
    }
}

fn print_summary_line(unit: PeriodUnit, summary: PeriodSummary) {
    println!(
        "{} summary: {} records, {:.1}% avg performance",
        unit_title(unit),
        summary.count,
        *summary.average
    );
}

fn print_record(record: &TaskRecord) {
    println!(
        "{} | {}-{} | Perf: {:.1}%",
        record.task_name, record.start_time, record.end_time, record.percentage
    );
    println!(
        "    Target: {:.1} min | Actual: {:.1} min | Added: {}",
        record.target_minutes,
        record.actual_minutes,
        record.created_at.with_timezone(&Local).format("%H:%M")
    );
}
