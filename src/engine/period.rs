use std::fmt::Display;

use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
}

impl Display for PeriodUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodUnit::Day => write!(f, "day"),
            PeriodUnit::Week => write!(f, "week"),
            PeriodUnit::Month => write!(f, "month"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodStep {
    Previous,
    Next,
    Current,
}

/// An inclusive range of calendar days derived from an anchor date. The anchor
/// itself is owned by the caller; a period carries no state beyond its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Returns the day/week/month period containing `anchor`. Weeks are ISO weeks
    /// starting on Monday, months run from the first to the last day of the month.
    pub fn containing(unit: PeriodUnit, anchor: NaiveDate) -> Period {
        match unit {
            PeriodUnit::Day => Period {
                start: anchor,
                end: anchor,
            },
            PeriodUnit::Week => {
                let start =
                    anchor - Duration::days(anchor.weekday().num_days_from_monday() as i64);
                Period {
                    start,
                    end: start + Duration::days(6),
                }
            }
            PeriodUnit::Month => {
                let start = anchor.with_day(1).expect("day 1 exists in every month");
                Period {
                    start,
                    end: next_month_start(start) - Duration::days(1),
                }
            }
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Steps to the adjacent period, or back to the one containing `today`.
    /// Stepping through month boundaries never skips or duplicates a month, the
    /// December to January transition included.
    pub fn navigate(self, unit: PeriodUnit, step: PeriodStep, today: NaiveDate) -> Period {
        match step {
            PeriodStep::Previous => Period::containing(unit, self.start - Duration::days(1)),
            PeriodStep::Next => Period::containing(unit, self.end + Duration::days(1)),
            PeriodStep::Current => Period::containing(unit, today),
        }
    }
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is always valid")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Period, PeriodStep, PeriodUnit};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn day_period_is_single_date() {
        let period = Period::containing(PeriodUnit::Day, date(2024, 5, 15));
        assert_eq!(period.start, date(2024, 5, 15));
        assert_eq!(period.end, date(2024, 5, 15));
    }

    #[test]
    fn week_of_wednesday_starts_previous_monday() {
        // 2024-05-15 was a Wednesday.
        let period = Period::containing(PeriodUnit::Week, date(2024, 5, 15));
        assert_eq!(period.start, date(2024, 5, 13));
        assert_eq!(period.end, date(2024, 5, 19));

        // A Monday anchors its own week.
        let period = Period::containing(PeriodUnit::Week, date(2024, 5, 13));
        assert_eq!(period.start, date(2024, 5, 13));
    }

    #[test]
    fn month_period_covers_whole_month() {
        let period = Period::containing(PeriodUnit::Month, date(2024, 12, 15));
        assert_eq!(period.start, date(2024, 12, 1));
        assert_eq!(period.end, date(2024, 12, 31));

        // Leap year February.
        let period = Period::containing(PeriodUnit::Month, date(2024, 2, 10));
        assert_eq!(period.end, date(2024, 2, 29));
    }

    #[test]
    fn month_navigation_rolls_over_year_boundary() {
        let december = Period::containing(PeriodUnit::Month, date(2024, 12, 15));
        let next = december.navigate(PeriodUnit::Month, PeriodStep::Next, date(2024, 12, 15));
        assert_eq!(next.start, date(2025, 1, 1));
        assert_eq!(next.end, date(2025, 1, 31));

        let january = Period::containing(PeriodUnit::Month, date(2025, 1, 15));
        let previous = january.navigate(PeriodUnit::Month, PeriodStep::Previous, date(2025, 1, 15));
        assert_eq!(previous.start, date(2024, 12, 1));
        assert_eq!(previous.end, date(2024, 12, 31));
    }

    #[test]
    fn day_and_week_navigation_step_by_fixed_offsets() {
        let day = Period::containing(PeriodUnit::Day, date(2024, 5, 15));
        let previous = day.navigate(PeriodUnit::Day, PeriodStep::Previous, date(2024, 5, 15));
        assert_eq!(previous.start, date(2024, 5, 14));
        let next = day.navigate(PeriodUnit::Day, PeriodStep::Next, date(2024, 5, 15));
        assert_eq!(next.start, date(2024, 5, 16));

        let week = Period::containing(PeriodUnit::Week, date(2024, 5, 15));
        let previous = week.navigate(PeriodUnit::Week, PeriodStep::Previous, date(2024, 5, 15));
        assert_eq!(previous.start, date(2024, 5, 6));
        let next = week.navigate(PeriodUnit::Week, PeriodStep::Next, date(2024, 5, 15));
        assert_eq!(next.start, date(2024, 5, 20));
    }

    #[test]
    fn current_resets_to_period_containing_today() {
        let week = Period::containing(PeriodUnit::Week, date(2023, 1, 2));
        let reset = week.navigate(PeriodUnit::Week, PeriodStep::Current, date(2024, 5, 15));
        assert_eq!(reset, Period::containing(PeriodUnit::Week, date(2024, 5, 15)));
    }
}
