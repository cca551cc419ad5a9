use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Local;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

/// A named unit of work with an expected target duration. Task identity is the
/// (name, target_minutes) pair: a new task is stored only when no existing task
/// matches both fields exactly.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct TaskEntity {
    pub id: u64,
    pub name: Arc<str>,
    pub target_minutes: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// One measurement of how long a task took. Records are immutable once stored;
/// the only delete path is the out-of-band dedup utility.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct PerformanceRecordEntity {
    pub id: u64,
    pub task_id: u64,
    pub actual_minutes: f64,
    pub percentage: f64,
    pub start_time: Arc<str>,
    pub end_time: Arc<str>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// Informational note that a task was delayed. Independent of performance records.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct DelayEntity {
    pub id: u64,
    pub task_id: u64,
    pub delay_minutes: f64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// A record joined with its task, the read-only snapshot shape the aggregation
/// functions consume. `day` is the local calendar day the record was created on,
/// precomputed so the aggregation itself never depends on a timezone.
#[derive(PartialEq, Debug, Clone)]
pub struct TaskRecord {
    pub record_id: u64,
    pub task_name: Arc<str>,
    pub target_minutes: f64,
    pub actual_minutes: f64,
    pub percentage: f64,
    pub start_time: Arc<str>,
    pub end_time: Arc<str>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub day: NaiveDate,
}

/// Joins records with their tasks. A record referencing a missing task breaks the
/// storage invariant and is skipped with a warning instead of failing the whole
/// snapshot.
pub fn join_task_records(
    tasks: &[TaskEntity],
    records: &[PerformanceRecordEntity],
) -> Vec<TaskRecord> {
    let tasks_by_id: HashMap<u64, &TaskEntity> = tasks.iter().map(|t| (t.id, t)).collect();

    records
        .iter()
        .filter_map(|record| match tasks_by_id.get(&record.task_id) {
            Some(task) => Some(TaskRecord {
                record_id: record.id,
                task_name: task.name.clone(),
                target_minutes: task.target_minutes,
                actual_minutes: record.actual_minutes,
                percentage: record.percentage,
                start_time: record.start_time.clone(),
                end_time: record.end_time.clone(),
                notes: record.notes.clone(),
                created_at: record.created_at,
                day: record.created_at.with_timezone(&Local).date_naive(),
            }),
            None => {
                warn!(
                    "Record {} references missing task {}, skipping it",
                    record.id, record.task_id
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{join_task_records, PerformanceRecordEntity, TaskEntity};

    #[test]
    fn join_skips_records_without_task() {
        let tasks = vec![TaskEntity {
            id: 1,
            name: "Wed15.05".into(),
            target_minutes: 60.,
            created_at: Utc.with_ymd_and_hms(2024, 5, 15, 7, 0, 0).unwrap(),
        }];
        let record = PerformanceRecordEntity {
            id: 1,
            task_id: 1,
            actual_minutes: 45.,
            percentage: 60. / 45. * 100.,
            start_time: "08:00".into(),
            end_time: "08:45".into(),
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 15, 8, 45, 0).unwrap(),
        };
        let orphan = PerformanceRecordEntity {
            id: 2,
            task_id: 99,
            ..record.clone()
        };

        let joined = join_task_records(&tasks, &[record, orphan]);

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].record_id, 1);
        assert_eq!(&*joined[0].task_name, "Wed15.05");
        assert_eq!(joined[0].target_minutes, 60.);
    }
}
