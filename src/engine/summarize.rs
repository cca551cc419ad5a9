use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{instrument, trace};

use crate::storage::entities::TaskRecord;

use super::{
    percentage::Percentage,
    period::{Period, PeriodUnit},
};

/// Count and average performance of the records inside one period. An empty
/// period is a defined result with count 0 and average 0%, never an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodSummary {
    pub count: usize,
    pub average: Percentage,
}

/// Records clustered under one bucket key (a calendar day or a Monday-aligned
/// week), with the bucket's own summary. Records are ordered newest first.
#[derive(Debug)]
pub struct Bucket<'a, K> {
    pub key: K,
    pub summary: PeriodSummary,
    pub records: Vec<&'a TaskRecord>,
}

/// Records sharing a duplicate identity: same derived task name, same start and
/// end time strings, same creation day.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub task_name: String,
    pub start_time: String,
    pub end_time: String,
    pub day: NaiveDate,
    pub record_ids: Vec<u64>,
}

/// Summarizes the records whose creation day falls within the period, bounds
/// inclusive. The average is the unweighted mean of the stored percentages and is
/// invariant to record order.
pub fn summarize_period(records: &[TaskRecord], period: Period) -> PeriodSummary {
    summarize(records.iter().filter(|r| period.contains(r.day)))
}

fn summarize<'a>(records: impl Iterator<Item = &'a TaskRecord>) -> PeriodSummary {
    let mut count = 0usize;
    let mut total = 0.;
    for record in records {
        count += 1;
        total += record.percentage;
    }

    let average = if count == 0 {
        Percentage::zero()
    } else {
        Percentage::new_opt(total / count as f64)
            .expect("Percentage should always be at least 0")
    };

    PeriodSummary { count, average }
}

/// Clusters records by their creation day, most recent day first.
pub fn group_by_day(records: &[TaskRecord]) -> Vec<Bucket<'_, NaiveDate>> {
    group_by(records, |record| record.day)
}

/// Clusters records by the Monday-aligned week containing their creation day,
/// most recent week first.
pub fn group_by_week(records: &[TaskRecord]) -> Vec<Bucket<'_, Period>> {
    group_by(records, |record| {
        Period::containing(PeriodUnit::Week, record.day)
    })
}

fn group_by<'a, K: Ord + Copy>(
    records: &'a [TaskRecord],
    key: impl Fn(&TaskRecord) -> K,
) -> Vec<Bucket<'a, K>> {
    let mut buckets = BTreeMap::<K, Vec<&TaskRecord>>::new();
    for record in records {
        buckets.entry(key(record)).or_default().push(record);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(key, mut records)| {
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let summary = summarize(records.iter().copied());
            Bucket {
                key,
                summary,
                records,
            }
        })
        .collect()
}

/// True when a record with the same derived task name, start and end time strings
/// and creation day already exists. A hit is a warning for the caller, not a fatal
/// error: the write is aborted, the session continues.
pub fn is_duplicate(
    records: &[TaskRecord],
    task_name: &str,
    start_time: &str,
    end_time: &str,
    day: NaiveDate,
) -> bool {
    records.iter().any(|record| {
        &*record.task_name == task_name
            && &*record.start_time == start_time
            && &*record.end_time == end_time
            && record.day == day
    })
}

/// Scans a whole snapshot for stored duplicates. Groups come back most recent day
/// first, then by task name, with record ids ascending so the caller can keep the
/// first record of each group.
#[instrument(skip(records))]
pub fn duplicate_groups(records: &[TaskRecord]) -> Vec<DuplicateGroup> {
    let mut groups = BTreeMap::<(String, String, String, NaiveDate), Vec<u64>>::new();
    for record in records {
        groups
            .entry((
                record.task_name.to_string(),
                record.start_time.to_string(),
                record.end_time.to_string(),
                record.day,
            ))
            .or_default()
            .push(record.record_id);
    }

    let mut duplicates = groups
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|((task_name, start_time, end_time, day), mut record_ids)| {
            record_ids.sort_unstable();
            DuplicateGroup {
                task_name,
                start_time,
                end_time,
                day,
                record_ids,
            }
        })
        .collect::<Vec<_>>();

    duplicates.sort_by(|a, b| b.day.cmp(&a.day).then_with(|| a.task_name.cmp(&b.task_name)));
    trace!("Found {} duplicate groups", duplicates.len());
    duplicates
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::{
        engine::period::{Period, PeriodUnit},
        storage::entities::TaskRecord,
    };

    use super::{duplicate_groups, group_by_day, group_by_week, is_duplicate, summarize_period};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(id: u64, day: NaiveDate, percentage: f64) -> TaskRecord {
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(id as i64);
        TaskRecord {
            record_id: id,
            task_name: "Wed15.05".into(),
            target_minutes: 60.,
            actual_minutes: 45.,
            percentage,
            start_time: "08:00".into(),
            end_time: "09:00".into(),
            notes: None,
            created_at,
            day,
        }
    }

    #[test]
    fn empty_period_has_zero_count_and_average() {
        let period = Period::containing(PeriodUnit::Day, date(2024, 5, 15));
        let summary = summarize_period(&[], period);
        assert_eq!(summary.count, 0);
        assert_eq!(*summary.average, 0.);
    }

    #[test]
    fn average_is_unweighted_mean_and_order_invariant() {
        let day = date(2024, 5, 15);
        let period = Period::containing(PeriodUnit::Day, day);
        let records = vec![
            record(1, day, 100.),
            record(2, day, 150.),
            record(3, day, 50.),
        ];

        let summary = summarize_period(&records, period);
        assert_eq!(summary.count, 3);
        assert_eq!(*summary.average, 100.);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(summarize_period(&reversed, period), summary);
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let period = Period {
            start: date(2024, 5, 13),
            end: date(2024, 5, 19),
        };
        let records = vec![
            record(1, date(2024, 5, 12), 80.),
            record(2, date(2024, 5, 13), 90.),
            record(3, date(2024, 5, 19), 110.),
            record(4, date(2024, 5, 20), 120.),
        ];

        let summary = summarize_period(&records, period);
        assert_eq!(summary.count, 2);
        assert_eq!(*summary.average, 100.);
    }

    #[test]
    fn day_buckets_come_back_most_recent_first() {
        let records = vec![
            record(1, date(2024, 5, 13), 80.),
            record(2, date(2024, 5, 15), 120.),
            record(3, date(2024, 5, 13), 100.),
        ];

        let buckets = group_by_day(&records);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, date(2024, 5, 15));
        assert_eq!(buckets[0].summary.count, 1);
        assert_eq!(buckets[1].key, date(2024, 5, 13));
        assert_eq!(buckets[1].summary.count, 2);
        assert_eq!(*buckets[1].summary.average, 90.);
        // Newest record first within a bucket.
        assert_eq!(buckets[1].records[0].record_id, 3);
    }

    #[test]
    fn week_buckets_align_on_monday() {
        // Wednesday 2024-05-15 belongs to the week of Monday 2024-05-13.
        let records = vec![
            record(1, date(2024, 5, 15), 100.),
            record(2, date(2024, 5, 19), 100.),
            record(3, date(2024, 5, 20), 100.),
        ];

        let buckets = group_by_week(&records);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key.start, date(2024, 5, 20));
        assert_eq!(buckets[1].key.start, date(2024, 5, 13));
        assert_eq!(buckets[1].key.end, date(2024, 5, 19));
        assert_eq!(buckets[1].summary.count, 2);
    }

    #[test]
    fn duplicate_requires_name_times_and_day_to_match() {
        let day = date(2024, 5, 15);
        let records = vec![record(1, day, 100.)];

        assert!(is_duplicate(&records, "Wed15.05", "08:00", "09:00", day));
        assert!(!is_duplicate(&records, "Wed15.05", "08:30", "09:00", day));
        assert!(!is_duplicate(&records, "Wed15.05", "08:00", "09:30", day));
        assert!(!is_duplicate(
            &records,
            "Wed15.05",
            "08:00",
            "09:00",
            date(2024, 5, 16)
        ));
        assert!(!is_duplicate(&records, "Thu16.05", "08:00", "09:00", day));
    }

    #[test]
    fn duplicate_scan_groups_stored_records() {
        let day = date(2024, 5, 15);
        let mut other = record(4, day, 100.);
        other.start_time = "10:00".into();

        let records = vec![
            record(3, day, 100.),
            record(1, day, 100.),
            record(2, day, 100.),
            other,
        ];

        let groups = duplicate_groups(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].record_ids, vec![1, 2, 3]);
        assert_eq!(groups[0].day, day);
        assert_eq!(groups[0].task_name, "Wed15.05");
    }
}
